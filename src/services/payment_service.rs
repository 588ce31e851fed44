use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{
    dto::orders::{ConfirmPaymentRequest, OrderDetail, PaymentIntentRequest, PaymentIntentResponse},
    entity::orders::{
        ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        OrderStatus, PaymentStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    payments::{
        PaymentError,
        webhook::{self, DEFAULT_TOLERANCE_SECS},
    },
    response::ApiResponse,
    services::order_service::{ensure_order_access, find_order, order_detail, record_status},
    state::AppState,
};

pub async fn create_payment_intent(
    state: &AppState,
    payload: PaymentIntentRequest,
) -> AppResult<ApiResponse<PaymentIntentResponse>> {
    let intent = state
        .payments
        .create_payment_intent(payload.amount, &state.config.currency)
        .await?;
    tracing::debug!(payment_intent_id = %intent.id, amount = intent.amount, "payment intent created");

    Ok(ApiResponse::success(
        "Payment intent created",
        PaymentIntentResponse {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            amount: intent.amount,
        },
        None,
    ))
}

pub async fn confirm_payment(
    state: &AppState,
    viewer: Option<&AuthUser>,
    order_id: Uuid,
    payload: ConfirmPaymentRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = find_order(&state.orm, order_id).await?;
    ensure_order_access(viewer, &order)?;
    let foreign_intent = match order.payment_intent_id.as_deref() {
        Some(bound) => bound != payload.payment_intent_id,
        None => {
            Orders::find()
                .filter(OrderCol::PaymentIntentId.eq(payload.payment_intent_id.as_str()))
                .filter(OrderCol::Id.ne(order.id))
                .count(&state.orm)
                .await?
                > 0
        }
    };
    if foreign_intent {
        return Err(AppError::BadRequest(
            "Payment intent does not belong to this order".into(),
        ));
    }

    let intent = state
        .payments
        .retrieve_payment_intent(&payload.payment_intent_id)
        .await?;
    if !intent.is_succeeded() {
        return Err(AppError::BadRequest("Payment not completed".into()));
    }
    if intent.amount != order.total {
        tracing::warn!(order_id = %order.id, payment_intent_id = %intent.id, intent_amount = intent.amount, order_total = order.total, "payment amount mismatch");
        return Err(AppError::BadRequest(
            "Payment amount does not match order total".into(),
        ));
    }

    let txn = state.orm.begin().await?;
    let order = mark_paid(&txn, order, &intent.id, viewer.map(|v| v.user_id), "Payment confirmed")
        .await?;
    let detail = order_detail(&txn, order).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Payment confirmed", detail, None))
}

/// Apply a signed gateway callback. Unknown event types are acknowledged.
pub async fn handle_webhook(
    state: &AppState,
    signature: Option<&str>,
    body: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let secret = state
        .config
        .stripe
        .webhook_secret
        .as_ref()
        .ok_or(PaymentError::NotConfigured)?;
    let signature =
        signature.ok_or_else(|| AppError::BadRequest("Missing webhook signature".into()))?;

    webhook::verify_signature(
        body,
        signature,
        secret.expose_secret(),
        Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )
    .map_err(|err| AppError::BadRequest(err.to_string()))?;
    let event = webhook::parse_event(body).map_err(|err| AppError::BadRequest(err.to_string()))?;

    let Some(intent_id) = event.payment_intent_id() else {
        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "webhook ignored");
        return Ok(ApiResponse::empty("Event received"));
    };

    let order = Orders::find()
        .filter(OrderCol::PaymentIntentId.eq(intent_id))
        .one(&state.orm)
        .await?;
    let Some(order) = order else {
        tracing::warn!(event_id = %event.id, payment_intent_id = intent_id, "no order for payment intent");
        return Ok(ApiResponse::empty("Event received"));
    };

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let txn = state.orm.begin().await?;
            mark_paid(&txn, order, intent_id, None, "Payment succeeded").await?;
            txn.commit().await?;
        }
        "payment_intent.payment_failed" => {
            if matches!(
                order.payment_status,
                PaymentStatus::Succeeded | PaymentStatus::Refunded
            ) {
                tracing::info!(order_id = %order.id, payment_intent_id = intent_id, "late failure event ignored");
                return Ok(ApiResponse::empty("Event received"));
            }
            let mut active: OrderActive = order.into();
            active.payment_status = Set(PaymentStatus::Failed);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?;
        }
        other => {
            tracing::debug!(event_id = %event.id, event_type = other, "webhook ignored");
        }
    }

    Ok(ApiResponse::empty("Event received"))
}

/// Record a captured payment. Orders already paid or refunded are left untouched, and an
/// intent id is only stored on orders that had none.
async fn mark_paid<C: sea_orm::ConnectionTrait>(
    db: &C,
    order: OrderModel,
    intent_id: &str,
    user_id: Option<Uuid>,
    note: &str,
) -> AppResult<OrderModel> {
    if matches!(
        order.payment_status,
        PaymentStatus::Succeeded | PaymentStatus::Refunded
    ) {
        return Ok(order);
    }

    let advance = order.status == OrderStatus::Pending;
    let bound = order.payment_intent_id.is_some();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Succeeded);
    if !bound {
        active.payment_intent_id = Set(Some(intent_id.to_string()));
    }
    active.stripe_payment_id = Set(Some(intent_id.to_string()));
    if advance {
        active.status = Set(OrderStatus::Processing);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(db).await?;

    if advance {
        record_status(db, order.id, OrderStatus::Processing, Some(note), user_id).await?;
    }
    tracing::info!(order_id = %order.id, payment_intent_id = intent_id, "payment recorded");
    Ok(order)
}
