use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::brands::{CreateBrandRequest, UpdateBrandRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Brand,
    response::ApiResponse,
    routes::extract::ValidatedJson,
    services::brand_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/featured", get(featured_brands))
        .route(
            "/{id}",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
}

#[utoipa::path(
    get,
    path = "/api/brands",
    responses((status = 200, description = "All brands", body = ApiResponse<Vec<Brand>>)),
    tag = "Brands"
)]
pub async fn list_brands(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Brand>>>> {
    let resp = brand_service::list_brands(&state, false).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands/featured",
    responses((status = 200, description = "Featured brands", body = ApiResponse<Vec<Brand>>)),
    tag = "Brands"
)]
pub async fn featured_brands(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Brand>>>> {
    let resp = brand_service::list_brands(&state, true).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand", body = ApiResponse<Brand>),
        (status = 404, description = "Brand not found")
    ),
    tag = "Brands"
)]
pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    let resp = brand_service::get_brand(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/brands",
    request_body = CreateBrandRequest,
    responses((status = 201, description = "Brand created", body = ApiResponse<Brand>)),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateBrandRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Brand>>)> {
    let resp = brand_service::create_brand(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    request_body = UpdateBrandRequest,
    responses((status = 200, description = "Brand updated", body = ApiResponse<Brand>)),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn update_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateBrandRequest>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    let resp = brand_service::update_brand(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand deleted"),
        (status = 400, description = "Brand has associated products")
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn delete_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = brand_service::delete_brand(&state, &user, id).await?;
    Ok(Json(resp))
}
