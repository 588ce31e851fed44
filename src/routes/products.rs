use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        products::{
            CreateProductRequest, ProductDetail, ProductList, ProductSummary, StockUpdateRequest,
            UpdateProductRequest,
        },
        reviews::{CreateReviewRequest, ReviewList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    routes::{
        extract::ValidatedJson,
        params::{CountQuery, PageQuery, ProductQuery, SearchQuery},
    },
    services::{
        product_service::{self, ProductPreset},
        review_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/featured", get(featured_products))
        .route("/new", get(new_products))
        .route("/on-sale", get(on_sale_products))
        .route("/best-sellers", get(best_sellers))
        .route("/popular", get(popular_products))
        .route("/low-stock", get(low_stock))
        .route("/slug/{slug}", get(get_product_by_slug))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/related", get(related_products))
        .route("/{id}/stock", put(update_stock))
        .route("/{id}/reviews", get(list_reviews).post(create_review))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("q" = Option<String>, Query, description = "Matches name, description or SKU"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("subcategory_id" = Option<Uuid>, Query, description = "Filter by subcategory"),
        ("brand_id" = Option<Uuid>, Query, description = "Filter by brand"),
        ("min_price" = Option<i64>, Query, description = "Minimum price in cents"),
        ("max_price" = Option<i64>, Query, description = "Maximum price in cents"),
        ("sort_by" = Option<String>, Query, description = "name|price|date|popularity|sales"),
        ("sort_order" = Option<String>, Query, description = "asc|desc"),
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/search",
    params(
        ("q" = String, Query, description = "Search term"),
        ("category_id" = Option<Uuid>, Query, description = "Restrict to a category"),
    ),
    responses(
        (status = 200, description = "Matching products", body = ApiResponse<Vec<ProductSummary>>),
        (status = 400, description = "Search query is required")
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    let resp = product_service::search_products(&state, query.q, query.category_id).await?;
    Ok(Json(resp))
}

async fn preset(
    state: &AppState,
    preset: ProductPreset,
    query: &CountQuery,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    let resp = product_service::list_preset(state, preset, query.count_or(10)).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    params(("count" = Option<u64>, Query, description = "Number of products, default 10")),
    responses((status = 200, description = "Featured products", body = ApiResponse<Vec<ProductSummary>>)),
    tag = "Products"
)]
pub async fn featured_products(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    preset(&state, ProductPreset::Featured, &query).await
}

#[utoipa::path(
    get,
    path = "/api/products/new",
    params(("count" = Option<u64>, Query, description = "Number of products, default 10")),
    responses((status = 200, description = "New arrivals", body = ApiResponse<Vec<ProductSummary>>)),
    tag = "Products"
)]
pub async fn new_products(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    preset(&state, ProductPreset::New, &query).await
}

#[utoipa::path(
    get,
    path = "/api/products/on-sale",
    params(("count" = Option<u64>, Query, description = "Number of products, default 10")),
    responses((status = 200, description = "Discounted products, largest discount first", body = ApiResponse<Vec<ProductSummary>>)),
    tag = "Products"
)]
pub async fn on_sale_products(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    preset(&state, ProductPreset::OnSale, &query).await
}

#[utoipa::path(
    get,
    path = "/api/products/best-sellers",
    params(("count" = Option<u64>, Query, description = "Number of products, default 10")),
    responses((status = 200, description = "Best selling products", body = ApiResponse<Vec<ProductSummary>>)),
    tag = "Products"
)]
pub async fn best_sellers(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    preset(&state, ProductPreset::BestSellers, &query).await
}

#[utoipa::path(
    get,
    path = "/api/products/popular",
    params(("count" = Option<u64>, Query, description = "Number of products, default 10")),
    responses((status = 200, description = "Most viewed products", body = ApiResponse<Vec<ProductSummary>>)),
    tag = "Products"
)]
pub async fn popular_products(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    preset(&state, ProductPreset::Popular, &query).await
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product(&state, user.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/slug/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product_by_slug(&state, user.as_ref(), &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/related",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("count" = Option<u64>, Query, description = "Number of products, default 4"),
    ),
    responses((status = 200, description = "Related products", body = ApiResponse<Vec<ProductSummary>>)),
    tag = "Products"
)]
pub async fn related_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    let resp = product_service::related_products(&state, id, query.count_or(4)).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<ProductDetail>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductDetail>>)> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Update product", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted or deactivated"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockUpdateRequest,
    responses((status = 200, description = "Stock updated", body = ApiResponse<ProductDetail>)),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<StockUpdateRequest>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::update_stock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
    ),
    responses((status = 200, description = "Products at or below their threshold", body = ApiResponse<ProductList>)),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_low_stock(&state, &user, query.page, query.per_page).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
    ),
    responses((status = 200, description = "Reviews, newest first", body = ApiResponse<ReviewList>)),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&state, id, query.pagination()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = CreateReviewRequest,
    responses((status = 201, description = "Review created", body = ApiResponse<Review>)),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let resp = review_service::create_review(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
