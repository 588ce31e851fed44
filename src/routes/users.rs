use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        products::ProductSummary,
        users::{AddressRequest, UpdateProfileRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Address, User},
    response::ApiResponse,
    routes::{extract::ValidatedJson, params::CountQuery},
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/addresses", get(list_addresses).post(create_address))
        .route(
            "/addresses/{id}",
            get(get_address).put(update_address).delete(delete_address),
        )
        .route("/addresses/{id}/default", put(set_default_address))
        .route("/recently-viewed", get(recently_viewed))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses((status = 200, description = "Current user", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Profile updated", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/addresses",
    responses((status = 200, description = "Addresses, default first", body = ApiResponse<Vec<Address>>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let resp = user_service::list_addresses(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address", body = ApiResponse<Address>),
        (status = 404, description = "Address not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = user_service::get_address(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/addresses",
    request_body = AddressRequest,
    responses((status = 201, description = "Address created", body = ApiResponse<Address>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_address(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<AddressRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Address>>)> {
    let resp = user_service::create_address(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/users/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Address updated", body = ApiResponse<Address>),
        (status = 404, description = "Address not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AddressRequest>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = user_service::update_address(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted"),
        (status = 404, description = "Address not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::delete_address(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/users/addresses/{id}/default",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses((status = 200, description = "Default address set", body = ApiResponse<Address>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn set_default_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = user_service::set_default_address(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/recently-viewed",
    params(("count" = Option<u64>, Query, description = "Number of products, default 10")),
    responses((status = 200, description = "Recently viewed products", body = ApiResponse<Vec<ProductSummary>>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn recently_viewed(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    let resp = user_service::recently_viewed(&state, &user, query.count_or(10)).await?;
    Ok(Json(resp))
}
