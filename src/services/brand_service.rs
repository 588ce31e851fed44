use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::brands::{CreateBrandRequest, UpdateBrandRequest},
    entity::{
        brands::{ActiveModel, Column, Entity as Brands},
        products::{Column as ProductCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Brand,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub async fn list_brands(state: &AppState, featured_only: bool) -> AppResult<ApiResponse<Vec<Brand>>> {
    let mut finder = Brands::find();
    if featured_only {
        finder = finder.filter(Column::IsFeatured.eq(true));
    }
    let brands = finder
        .order_by_asc(Column::DisplayOrder)
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;

    let counts = product_service::count_active_by(&state.orm, ProductCol::BrandId).await?;
    let items = brands
        .into_iter()
        .map(|b| {
            let count = counts.get(&b.id).copied().unwrap_or(0);
            Brand::from_entity(b, count)
        })
        .collect();

    Ok(ApiResponse::success("Brands", items, None))
}

pub async fn get_brand(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Brand>> {
    let brand = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Brand"))?;
    let count = active_product_count(state, id).await?;
    Ok(ApiResponse::success("Brand", Brand::from_entity(brand, count), None))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let brand = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        logo_url: Set(payload.logo_url),
        description: Set(payload.description),
        is_featured: Set(payload.is_featured),
        display_order: Set(payload.display_order),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success("Brand created", Brand::from_entity(brand, 0), None))
}

pub async fn update_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let existing = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Brand"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(logo_url) = payload.logo_url {
        active.logo_url = Set(Some(logo_url));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(display_order) = payload.display_order {
        active.display_order = Set(display_order);
    }
    let brand = active.update(&state.orm).await?;

    let count = active_product_count(state, id).await?;
    Ok(ApiResponse::success("Brand updated", Brand::from_entity(brand, count), None))
}

pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if Brands::find_by_id(id).one(&state.orm).await?.is_none() {
        return Err(AppError::not_found("Brand"));
    }

    let products = Products::find()
        .filter(ProductCol::BrandId.eq(id))
        .count(&state.orm)
        .await?;
    if products > 0 {
        return Err(AppError::BadRequest("Brand has associated products".into()));
    }

    Brands::delete_by_id(id).exec(&state.orm).await?;
    Ok(ApiResponse::empty("Brand deleted"))
}

async fn active_product_count(state: &AppState, brand_id: Uuid) -> AppResult<i64> {
    let count = Products::find()
        .filter(ProductCol::BrandId.eq(brand_id))
        .filter(ProductCol::IsActive.eq(true))
        .count(&state.orm)
        .await?;
    Ok(count as i64)
}
