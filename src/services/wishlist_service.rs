use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::wishlist::{AddToWishlistRequest, Wishlist, WishlistEntry},
    entity::{
        products::{Column as ProductCol, Entity as Products},
        wishlist_items::{ActiveModel, Column, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub async fn get_wishlist(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Wishlist>> {
    let rows = WishlistItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::AddedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let (added, products): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .filter_map(|(item, product)| product.filter(|p| p.is_active).map(|p| (item.added_at, p)))
        .unzip();
    let summaries = product_service::summarize(&state.orm, products).await?;

    let items = added
        .into_iter()
        .zip(summaries)
        .map(|(added_at, product)| WishlistEntry {
            added_at: added_at.with_timezone(&Utc),
            product,
        })
        .collect();

    Ok(ApiResponse::success("Wishlist", Wishlist { items }, None))
}

pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: AddToWishlistRequest,
) -> AppResult<ApiResponse<Wishlist>> {
    let product = Products::find_by_id(payload.product_id)
        .filter(ProductCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    if product.is_none() {
        return Err(AppError::not_found("Product"));
    }

    let existing = WishlistItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?;
    if existing.is_none() {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            product_id: Set(payload.product_id),
            added_at: Set(Utc::now().into()),
        }
        .insert(&state.orm)
        .await?;
    }

    let mut resp = get_wishlist(state, user).await?;
    resp.message = "Added to wishlist".into();
    Ok(resp)
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = WishlistItems::delete_many()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Wishlist item"));
    }
    Ok(ApiResponse::empty("Removed from wishlist"))
}
