use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderDetail, OrderList, OrderSummary, UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        order_status_history::{
            ActiveModel as HistoryActive, Column as HistoryCol, Entity as OrderStatusHistory,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            OrderStatus, PaymentStatus,
        },
        product_variants::{Column as VariantCol, Entity as ProductVariants},
        products::{Column as ProductCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, OrderStatusEntry},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service,
        pricing::{self, Totals},
    },
    state::AppState,
};

const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// `ORD-YYYYMMDDHHMMSS-NNNN` with a random four digit suffix.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("ORD-{}-{:04}", now.format("%Y%m%d%H%M%S"), suffix)
}

struct PricedLine {
    product_id: Uuid,
    variant_id: Option<Uuid>,
    product_name: String,
    product_image: String,
    quantity: i32,
    price: i64,
    shipping_cost: i64,
}

pub async fn create_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product_ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProductCol::Id.is_in(product_ids.clone()))
        .filter(ProductCol::IsActive.eq(true))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut missing: Vec<String> = product_ids
        .iter()
        .filter(|id| !products.contains_key(id))
        .map(Uuid::to_string)
        .collect();
    if !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(AppError::BadRequestWithErrors {
            message: "Some products in your order are no longer available".into(),
            errors: vec![format!("Products with IDs {} do not exist", missing.join(", "))],
        });
    }

    let variant_ids: Vec<Uuid> = payload.items.iter().filter_map(|i| i.variant_id).collect();
    let variants: HashMap<Uuid, _> = ProductVariants::find()
        .filter(VariantCol::Id.is_in(variant_ids))
        .filter(VariantCol::IsActive.eq(true))
        .all(&txn)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let mut product_stock: HashMap<Uuid, i32> =
        products.values().map(|p| (p.id, p.stock_quantity)).collect();
    let mut variant_stock: HashMap<Uuid, i32> =
        variants.values().map(|v| (v.id, v.stock_quantity)).collect();

    let mut lines = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let Some(product) = products.get(&item.product_id) else {
            continue;
        };
        let variant = match item.variant_id {
            Some(variant_id) => match variants.get(&variant_id) {
                Some(v) if v.product_id == product.id => Some(v),
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "Invalid variant for product {}",
                        product.name
                    )));
                }
            },
            None => None,
        };

        let remaining = match variant {
            Some(v) => variant_stock.get_mut(&v.id),
            None => product_stock.get_mut(&product.id),
        };
        match remaining {
            Some(stock) if *stock >= item.quantity => *stock -= item.quantity,
            _ => {
                return Err(AppError::BadRequest(format!(
                    "Insufficient stock for {}",
                    product.name
                )));
            }
        }

        lines.push(PricedLine {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            product_name: product.name.clone(),
            product_image: variant
                .and_then(|v| v.image_url.clone())
                .unwrap_or_else(|| product.image_url.clone()),
            quantity: item.quantity,
            price: pricing::unit_price(product, variant),
            shipping_cost: pricing::line_shipping(product),
        });
    }

    let subtotal = lines.iter().map(|l| l.price * l.quantity as i64).sum();
    let shipping = lines.iter().map(|l| l.shipping_cost).sum();
    let totals = Totals::compute(subtotal, shipping, state.config.tax_rate_bps);

    let now = Utc::now();
    let order_number = unique_order_number(&txn, now).await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        user_id: Set(user.map(|u| u.user_id)),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        company_name: Set(payload.company_name),
        email: Set(payload.email),
        phone_number: Set(payload.phone_number),
        street_address: Set(payload.street_address),
        apartment_suite: Set(payload.apartment_suite),
        city: Set(payload.city),
        state: Set(payload.state),
        country: Set(payload.country),
        zip_code: Set(payload.zip_code),
        subtotal: Set(totals.subtotal),
        shipping_cost: Set(totals.shipping),
        tax: Set(totals.tax),
        total: Set(totals.total),
        order_notes: Set(payload.order_notes),
        payment_method: Set(payload.payment_method),
        payment_intent_id: Set(payload.payment_intent_id),
        stripe_payment_id: Set(None),
        payment_status: Set(PaymentStatus::Pending),
        status: Set(OrderStatus::Pending),
        shipped_at: Set(None),
        delivered_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for line in lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            variant_id: Set(line.variant_id),
            product_name: Set(line.product_name),
            product_image: Set(Some(line.product_image)),
            quantity: Set(line.quantity),
            price: Set(line.price),
            total: Set(line.price * line.quantity as i64),
            shipping_type: Set(Some(
                if line.shipping_cost == 0 { "free" } else { "standard" }.to_string(),
            )),
            shipping_cost: Set(line.shipping_cost),
        }
        .insert(&txn)
        .await?;

        adjust_stock(&txn, line.product_id, line.variant_id, -line.quantity).await?;
    }

    record_status(
        &txn,
        order.id,
        OrderStatus::Pending,
        Some("Order created"),
        user.map(|u| u.user_id),
    )
    .await?;

    if let Some(user) = user {
        cart_service::clear_for_user(&txn, user.user_id).await?;
    }

    let detail = order_detail(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(
        order_number = %detail.order.order_number,
        total = detail.order.total,
        "order created"
    );
    Ok(ApiResponse::success("Order created", detail, None))
}

/// Owners see their orders, admins see all, anonymous callers see guest orders only.
pub async fn get_order(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = find_order(&state.orm, id).await?;
    ensure_order_access(viewer, &order)?;

    let detail = order_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order", detail, None))
}

pub async fn get_order_by_number(
    state: &AppState,
    order_number: &str,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find()
        .filter(OrderCol::OrderNumber.eq(order_number))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    let detail = order_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order", detail, None))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_orders(state, condition, query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    list_orders(state, Condition::all(), query).await
}

async fn list_orders(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status.as_deref().filter(|s| !s.trim().is_empty()) {
        condition = condition.add(OrderCol::Status.eq(parse_status(status)?));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let quantities: Vec<(Uuid, i32)> = OrderItems::find()
        .select_only()
        .column(OrderItemCol::OrderId)
        .column(OrderItemCol::Quantity)
        .filter(OrderItemCol::OrderId.is_in(ids))
        .into_tuple()
        .all(&state.orm)
        .await?;
    let mut item_counts: HashMap<Uuid, i64> = HashMap::new();
    for (order_id, quantity) in quantities {
        *item_counts.entry(order_id).or_insert(0) += quantity as i64;
    }

    let items = orders
        .into_iter()
        .map(|o| OrderSummary {
            item_count: item_counts.get(&o.id).copied().unwrap_or(0),
            id: o.id,
            order_number: o.order_number,
            total: o.total,
            status: o.status,
            payment_status: o.payment_status,
            created_at: o.created_at.with_timezone(&Utc),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Any status may follow any other; only the timestamps and refund have side effects.
/// The refund is issued inside the transaction, so a gateway failure rolls the
/// status change back.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    let status = parse_status(&payload.status)?;

    let txn = state.orm.begin().await?;
    let order = find_order(&txn, id).await?;
    let refund = status == OrderStatus::Refunded
        && order.payment_status == PaymentStatus::Succeeded;
    let intent_id = order.payment_intent_id.clone();

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.status = Set(status);
    match status {
        OrderStatus::Shipped => active.shipped_at = Set(Some(now.into())),
        OrderStatus::Delivered => active.delivered_at = Set(Some(now.into())),
        _ => {}
    }
    if refund {
        active.payment_status = Set(PaymentStatus::Refunded);
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    let mut notes = payload.notes;
    let mut refund_id = None;
    if refund {
        let intent_id = intent_id
            .ok_or_else(|| AppError::BadRequest("Order has no payment to refund".into()))?;
        let issued = state.payments.create_refund(&intent_id, None).await?;
        tracing::info!(order_id = %order.id, refund_id = %issued.id, "payment refunded");
        notes = Some(match notes {
            Some(text) => format!("{text} (refund {})", issued.id),
            None => format!("Refund {}", issued.id),
        });
        refund_id = Some(issued.id);
    }

    record_status(&txn, order.id, status, notes.as_deref(), Some(user.user_id)).await?;
    let detail = order_detail(&txn, order).await?;
    if let Err(err) = txn.commit().await {
        if let Some(refund_id) = refund_id {
            tracing::error!(order_id = %id, refund_id = %refund_id, error = %err, "refund issued but order update failed");
        }
        return Err(err.into());
    }

    Ok(ApiResponse::success("Order status updated", detail, None))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = find_order(&state.orm, id).await?;
    if !user.is_admin() && order.user_id != Some(user.user_id) {
        return Err(AppError::not_found("Order"));
    }

    let txn = state.orm.begin().await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let claimed = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Cancelled))
        .col_expr(OrderCol::PaymentStatus, Expr::value(PaymentStatus::Cancelled))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending))
        .exec(&txn)
        .await?;
    if claimed.rows_affected == 0 {
        return Err(AppError::BadRequest(
            "Only pending orders can be cancelled".into(),
        ));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .all(&txn)
        .await?;
    for item in &items {
        adjust_stock(&txn, item.product_id, item.variant_id, item.quantity).await?;
    }

    record_status(
        &txn,
        id,
        OrderStatus::Cancelled,
        Some("Order cancelled by user"),
        Some(user.user_id),
    )
    .await?;
    let order = find_order(&txn, id).await?;
    let intent_id = order.payment_intent_id.clone();
    let detail = order_detail(&txn, order).await?;
    txn.commit().await?;

    if let Some(intent_id) = intent_id.as_deref() {
        if let Err(err) = state.payments.cancel_payment_intent(intent_id).await {
            tracing::warn!(order_id = %id, error = %err, "failed to cancel payment intent");
        }
    }

    Ok(ApiResponse::success("Order cancelled", detail, None))
}

pub(crate) fn ensure_order_access(viewer: Option<&AuthUser>, order: &OrderModel) -> AppResult<()> {
    match (viewer, order.user_id) {
        (Some(v), _) if v.is_admin() => Ok(()),
        (Some(v), Some(owner)) if v.user_id == owner => Ok(()),
        (Some(_), Some(_)) => Err(AppError::Forbidden),
        (None, Some(_)) => Err(AppError::Unauthorized(
            "Sign in to view this order".into(),
        )),
        (_, None) => Ok(()),
    }
}

pub fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid order status".into()))
}

pub(crate) async fn find_order<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

pub(crate) async fn record_status<C: ConnectionTrait>(
    db: &C,
    order_id: Uuid,
    status: OrderStatus,
    notes: Option<&str>,
    user_id: Option<Uuid>,
) -> AppResult<()> {
    HistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status.to_string()),
        notes: Set(notes.map(str::to_string)),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    Ok(())
}

pub(crate) async fn order_detail<C: ConnectionTrait>(
    db: &C,
    order: OrderModel,
) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(db)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    let status_history = OrderStatusHistory::find()
        .filter(HistoryCol::OrderId.eq(order.id))
        .order_by_asc(HistoryCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(OrderStatusEntry::from)
        .collect();

    Ok(OrderDetail {
        order: Order::from(order),
        items,
        status_history,
    })
}

/// Moves stock by `delta` and the sales count by `-delta`.
async fn adjust_stock<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    delta: i32,
) -> AppResult<()> {
    let mut update = Products::update_many()
        .col_expr(
            ProductCol::SalesCount,
            Expr::col(ProductCol::SalesCount).sub(delta),
        )
        .filter(ProductCol::Id.eq(product_id));
    if variant_id.is_none() {
        update = update.col_expr(
            ProductCol::StockQuantity,
            Expr::col(ProductCol::StockQuantity).add(delta),
        );
    }
    update.exec(db).await?;

    if let Some(variant_id) = variant_id {
        ProductVariants::update_many()
            .col_expr(
                VariantCol::StockQuantity,
                Expr::col(VariantCol::StockQuantity).add(delta),
            )
            .filter(VariantCol::Id.eq(variant_id))
            .exec(db)
            .await?;
    }
    Ok(())
}

async fn unique_order_number<C: ConnectionTrait>(db: &C, now: DateTime<Utc>) -> AppResult<String> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let candidate = generate_order_number(now);
        let taken = Orders::find()
            .filter(OrderCol::OrderNumber.eq(candidate.clone()))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique order number"
    )))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_number_has_timestamp_and_suffix() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("ORD-20250309140507-"), "{number}");
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn status_parsing_ignores_case() {
        assert_eq!(parse_status("shipped").unwrap(), OrderStatus::Shipped);
        assert_eq!(parse_status(" DELIVERED ").unwrap(), OrderStatus::Delivered);
        assert!(parse_status("lost").is_err());
    }
}
