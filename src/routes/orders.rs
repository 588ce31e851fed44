use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        ConfirmPaymentRequest, CreateOrderRequest, OrderDetail, OrderList, PaymentIntentRequest,
        PaymentIntentResponse, UpdateOrderStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    payments::webhook::SIGNATURE_HEADER,
    response::ApiResponse,
    routes::{extract::ValidatedJson, params::OrderListQuery},
    services::{order_service, payment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_orders).post(create_order))
        .route("/mine", get(list_my_orders))
        .route("/number/{order_number}", get(get_order_by_number))
        .route("/payment-intent", post(create_payment_intent))
        .route("/webhook", post(webhook))
        .route("/{id}", get(get_order))
        .route("/{id}/status", put(update_order_status))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/confirm-payment", post(confirm_payment))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Empty order, unavailable products or insufficient stock")
    ),
    security((), ("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderDetail>>)> {
    let resp = order_service::create_order(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found")
    ),
    security((), ("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_service::get_order(&state, user.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/number/{order_number}",
    params(("order_number" = String, Path, description = "Order number, e.g. ORD-20250101120000-0042")),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_service::get_order_by_number(&state, &order_number).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/mine",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_order" = Option<String>, Query, description = "asc|desc, default desc"),
    ),
    responses((status = 200, description = "Caller's orders", body = ApiResponse<OrderList>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_my_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_order" = Option<String>, Query, description = "asc|desc, default desc"),
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid order status")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Only pending orders can be cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = ApiResponse<PaymentIntentResponse>),
        (status = 502, description = "Payment gateway error")
    ),
    tag = "Payments"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PaymentIntentRequest>,
) -> AppResult<Json<ApiResponse<PaymentIntentResponse>>> {
    let resp = payment_service::create_payment_intent(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/confirm-payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Payment not completed, or intent or amount does not match the order"),
        (status = 401, description = "Member order and no token"),
        (status = 403, description = "Order belongs to another user")
    ),
    security((), ("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ConfirmPaymentRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = payment_service::confirm_payment(&state, user.as_ref(), id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/webhook",
    request_body(content = String, description = "Raw gateway event", content_type = "application/json"),
    params(("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Invalid signature or payload")
    ),
    tag = "Payments"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let resp = payment_service::handle_webhook(&state, signature, &body).await?;
    Ok(Json(resp))
}
