use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::categories::{
        CreateCategoryRequest, FeaturedCategory, SubcategoryRequest, UpdateCategoryRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Category, Subcategory},
    response::ApiResponse,
    routes::{extract::ValidatedJson, params::CountQuery},
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/top", get(top_categories))
        .route("/featured", get(featured_categories))
        .route("/slug/{slug}", get(get_category_by_slug))
        .route(
            "/subcategories/{id}",
            put(update_subcategory).delete(delete_subcategory),
        )
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route(
            "/{id}/subcategories",
            get(list_subcategories).post(create_subcategory),
        )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Active top-level categories", body = ApiResponse<Vec<Category>>)),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/top",
    params(("count" = Option<u64>, Query, description = "Number of categories, default 6")),
    responses((status = 200, description = "Menu categories", body = ApiResponse<Vec<Category>>)),
    tag = "Categories"
)]
pub async fn top_categories(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let resp = category_service::top_categories(&state, query.count_or(6)).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/featured",
    params(("count" = Option<u64>, Query, description = "Number of categories, default 3")),
    responses((status = 200, description = "Homepage category tiles", body = ApiResponse<Vec<FeaturedCategory>>)),
    tag = "Categories"
)]
pub async fn featured_categories(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<FeaturedCategory>>>> {
    let resp = category_service::featured_categories(&state, query.count_or(3)).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/slug/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category_by_slug(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/subcategories",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses((status = 200, description = "Active subcategories", body = ApiResponse<Vec<Subcategory>>)),
    tag = "Categories"
)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Subcategory>>>> {
    let resp = category_service::list_subcategories(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 400, description = "Slug already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let resp = category_service::create_category(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses((status = 200, description = "Category updated", body = ApiResponse<Category>)),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::update_category(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses((status = 200, description = "Category deleted or deactivated")),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_category(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories/{id}/subcategories",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = SubcategoryRequest,
    responses((status = 201, description = "Subcategory created", body = ApiResponse<Subcategory>)),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_subcategory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SubcategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Subcategory>>)> {
    let resp = category_service::create_subcategory(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/categories/subcategories/{id}",
    params(("id" = Uuid, Path, description = "Subcategory ID")),
    request_body = SubcategoryRequest,
    responses((status = 200, description = "Subcategory updated", body = ApiResponse<Subcategory>)),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_subcategory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SubcategoryRequest>,
) -> AppResult<Json<ApiResponse<Subcategory>>> {
    let resp = category_service::update_subcategory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/categories/subcategories/{id}",
    params(("id" = Uuid, Path, description = "Subcategory ID")),
    responses((status = 200, description = "Subcategory deleted or deactivated")),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_subcategory(&state, &user, id).await?;
    Ok(Json(resp))
}
