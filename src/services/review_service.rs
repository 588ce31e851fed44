use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewList},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Relation as OrderItemRel},
        orders::{Column as OrderCol, OrderStatus},
        product_reviews::{ActiveModel, Column, Entity as ProductReviews, Model as ReviewModel},
        products::{Column as ProductCol, Entity as Products},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();
    ensure_product(state, product_id).await?;

    let finder = ProductReviews::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let reviews = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let user_ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
    let names: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    let items = reviews
        .into_iter()
        .map(|r| {
            let user_name = names.get(&r.user_id).cloned().unwrap_or_default();
            to_review(r, user_name)
        })
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_product(state, product_id).await?;
    let reviewer = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;

    let purchased = OrderItems::find()
        .join(JoinType::InnerJoin, OrderItemRel::Orders.def())
        .filter(OrderItemCol::ProductId.eq(product_id))
        .filter(OrderCol::UserId.eq(user.user_id))
        .filter(OrderCol::Status.ne(OrderStatus::Cancelled))
        .count(&state.orm)
        .await?;

    let now = Utc::now();
    let review = ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        user_id: Set(user.user_id),
        rating: Set(payload.rating),
        title: Set(payload.title),
        comment: Set(payload.comment),
        is_verified_purchase: Set(purchased > 0),
        helpful_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Review created",
        to_review(review, reviewer.display_name()),
        None,
    ))
}

async fn ensure_product(state: &AppState, product_id: Uuid) -> AppResult<()> {
    let found = Products::find_by_id(product_id)
        .filter(ProductCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Product")),
    }
}

fn to_review(model: ReviewModel, user_name: String) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user_id: model.user_id,
        user_name,
        rating: model.rating,
        title: model.title,
        comment: model.comment,
        is_verified_purchase: model.is_verified_purchase,
        helpful_count: model.helpful_count,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
