use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::recommendations::{Bundle, CreateBundleRequest, ReorderBundleRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::FrequentlyBoughtTogetherLink,
    response::ApiResponse,
    routes::extract::ValidatedJson,
    services::recommendation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_links))
        .route("/{id}", delete(delete_link))
        .route("/product/{product_id}", get(get_bundle))
        .route("/product/{product_id}/reorder", put(reorder_links))
        .route("/product/{product_id}/seed", post(seed_links))
        .route("/admin/product/{product_id}", get(list_links))
}

#[utoipa::path(
    get,
    path = "/api/frequently-bought-together/product/{product_id}",
    params(("product_id" = Uuid, Path, description = "Main product ID")),
    responses(
        (status = 200, description = "Bundle with totals", body = ApiResponse<Bundle>),
        (status = 404, description = "Product not found")
    ),
    tag = "Recommendations"
)]
pub async fn get_bundle(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Bundle>>> {
    let resp = recommendation_service::get_bundle(&state, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/frequently-bought-together/admin/product/{product_id}",
    params(("product_id" = Uuid, Path, description = "Main product ID")),
    responses((status = 200, description = "Association rows", body = ApiResponse<Vec<FrequentlyBoughtTogetherLink>>)),
    security(("bearer_auth" = [])),
    tag = "Recommendations"
)]
pub async fn list_links(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>>> {
    let resp = recommendation_service::list_links(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/frequently-bought-together",
    request_body = CreateBundleRequest,
    responses((status = 201, description = "Links created", body = ApiResponse<Vec<FrequentlyBoughtTogetherLink>>)),
    security(("bearer_auth" = [])),
    tag = "Recommendations"
)]
pub async fn create_links(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateBundleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>>)> {
    let resp = recommendation_service::create_links(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/frequently-bought-together/product/{product_id}/reorder",
    params(("product_id" = Uuid, Path, description = "Main product ID")),
    request_body = ReorderBundleRequest,
    responses((status = 200, description = "Links replaced", body = ApiResponse<Vec<FrequentlyBoughtTogetherLink>>)),
    security(("bearer_auth" = [])),
    tag = "Recommendations"
)]
pub async fn reorder_links(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ReorderBundleRequest>,
) -> AppResult<Json<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>>> {
    let resp = recommendation_service::reorder_links(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/frequently-bought-together/{id}",
    params(("id" = Uuid, Path, description = "Link ID")),
    responses(
        (status = 200, description = "Link deleted"),
        (status = 404, description = "Link not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recommendations"
)]
pub async fn delete_link(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = recommendation_service::delete_link(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/frequently-bought-together/product/{product_id}/seed",
    params(("product_id" = Uuid, Path, description = "Main product ID")),
    responses(
        (status = 200, description = "Random links added", body = ApiResponse<Vec<FrequentlyBoughtTogetherLink>>),
        (status = 400, description = "No products available")
    ),
    security(("bearer_auth" = [])),
    tag = "Recommendations"
)]
pub async fn seed_links(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>>> {
    let resp = recommendation_service::seed_links(&state, &user, product_id).await?;
    Ok(Json(resp))
}
