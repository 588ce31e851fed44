use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartCount, CartLine, CartSummary, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel, Column, Entity as CartItems},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
        products::{Column as ProductCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::pricing::{self, Totals},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartSummary>> {
    let summary = cart_summary(&state.orm, user.user_id, state.config.tax_rate_bps).await?;
    Ok(ApiResponse::success("Cart", summary, None))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    let invalid = || AppError::BadRequest("Product not found or invalid variant".into());

    Products::find_by_id(payload.product_id)
        .filter(ProductCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;
    if let Some(variant_id) = payload.variant_id {
        ProductVariants::find_by_id(variant_id)
            .filter(VariantCol::ProductId.eq(payload.product_id))
            .filter(VariantCol::IsActive.eq(true))
            .one(&state.orm)
            .await?
            .ok_or_else(invalid)?;
    }

    let mut finder = CartItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::ProductId.eq(payload.product_id));
    finder = match payload.variant_id {
        Some(variant_id) => finder.filter(Column::VariantId.eq(variant_id)),
        None => finder.filter(Column::VariantId.is_null()),
    };

    let now = Utc::now();
    match finder.one(&state.orm).await? {
        Some(line) => {
            let quantity = line.quantity + payload.quantity;
            let mut active: ActiveModel = line.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(now.into());
            active.update(&state.orm).await?;
        }
        None => {
            ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(payload.product_id),
                variant_id: Set(payload.variant_id),
                quantity: Set(payload.quantity),
                added_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&state.orm)
            .await?;
        }
    }

    let summary = cart_summary(&state.orm, user.user_id, state.config.tax_rate_bps).await?;
    Ok(ApiResponse::success("Item added to cart", summary, None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    let line = CartItems::find_by_id(payload.cart_item_id)
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item"))?;

    let message = if payload.quantity <= 0 {
        CartItems::delete_by_id(line.id).exec(&state.orm).await?;
        "Item removed from cart"
    } else {
        let mut active: ActiveModel = line.into();
        active.quantity = Set(payload.quantity);
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
        "Cart updated"
    };

    let summary = cart_summary(&state.orm, user.user_id, state.config.tax_rate_bps).await?;
    Ok(ApiResponse::success(message, summary, None))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CartSummary>> {
    let result = CartItems::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Cart item"));
    }

    let summary = cart_summary(&state.orm, user.user_id, state.config.tax_rate_bps).await?;
    Ok(ApiResponse::success("Item removed from cart", summary, None))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = clear_for_user(&state.orm, user.user_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Cart is already empty".into()));
    }
    Ok(ApiResponse::empty("Cart cleared"))
}

pub async fn cart_count(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartCount>> {
    let quantities: Vec<i32> = CartItems::find()
        .select_only()
        .column(Column::Quantity)
        .filter(Column::UserId.eq(user.user_id))
        .into_tuple()
        .all(&state.orm)
        .await?;
    let count = quantities.into_iter().map(i64::from).sum();
    Ok(ApiResponse::success("Cart count", CartCount { count }, None))
}

pub(crate) async fn clear_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Priced view of a user's cart. Lines whose product has been deactivated are skipped.
pub async fn cart_summary<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    tax_rate_bps: i64,
) -> AppResult<CartSummary> {
    let rows = CartItems::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::AddedAt)
        .find_also_related(Products)
        .all(db)
        .await?;

    let variant_ids: Vec<Uuid> = rows.iter().filter_map(|(line, _)| line.variant_id).collect();
    let variants: HashMap<Uuid, _> = ProductVariants::find()
        .filter(VariantCol::Id.is_in(variant_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let mut items = Vec::with_capacity(rows.len());
    let mut subtotal = 0;
    let mut shipping = 0;
    let mut item_count = 0;
    for (line, product) in rows {
        let Some(product) = product.filter(|p| p.is_active) else {
            continue;
        };
        let variant = line.variant_id.and_then(|id| variants.get(&id));
        let unit_price = pricing::unit_price(&product, variant);
        let line_total = unit_price * line.quantity as i64;
        let line_shipping = pricing::line_shipping(&product);

        subtotal += line_total;
        shipping += line_shipping;
        item_count += line.quantity as i64;

        items.push(CartLine {
            id: line.id,
            product_id: product.id,
            product_name: product.name,
            product_slug: product.slug,
            image_url: variant
                .and_then(|v| v.image_url.clone())
                .unwrap_or(product.image_url),
            variant_id: line.variant_id,
            variant_name: variant.and_then(|v| v.variant_name.clone()),
            unit_price,
            quantity: line.quantity,
            line_total,
            shipping_cost: line_shipping,
            free_shipping: product.free_shipping,
            stock_quantity: variant.map(|v| v.stock_quantity).unwrap_or(product.stock_quantity),
        });
    }

    let totals = Totals::compute(subtotal, shipping, tax_rate_bps);
    Ok(CartSummary {
        items,
        subtotal: totals.subtotal,
        shipping_cost: totals.shipping,
        tax: totals.tax,
        total: totals.total,
        item_count,
    })
}
