use std::collections::HashSet;

use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::recommendations::{Bundle, BundleItem, CreateBundleRequest, ReorderBundleRequest},
    entity::{
        frequently_bought_together::{
            ActiveModel, Column, Entity as FrequentlyBoughtTogether,
        },
        products::{Column as ProductCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::FrequentlyBoughtTogetherLink,
    response::ApiResponse,
    state::AppState,
};

const SEED_SIZE: usize = 3;

pub async fn get_bundle(state: &AppState, product_id: Uuid) -> AppResult<ApiResponse<Bundle>> {
    let main = Products::find_by_id(product_id)
        .filter(ProductCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let related_ids: Vec<Uuid> = FrequentlyBoughtTogether::find()
        .select_only()
        .column(Column::RelatedProductId)
        .filter(Column::ProductId.eq(product_id))
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::DisplayOrder)
        .into_tuple()
        .all(&state.orm)
        .await?;
    let mut related = Products::find()
        .filter(ProductCol::Id.is_in(related_ids.clone()))
        .filter(ProductCol::IsActive.eq(true))
        .all(&state.orm)
        .await?;
    related.sort_by_key(|p| related_ids.iter().position(|id| *id == p.id));

    let products: Vec<ProductModel> = std::iter::once(main).chain(related).collect();
    Ok(ApiResponse::success("Bundle", build_bundle(product_id, products), None))
}

pub fn build_bundle(main_product_id: Uuid, products: Vec<ProductModel>) -> Bundle {
    let total_price: i64 = products.iter().map(|p| p.price).sum();
    let total_old_price: i64 = products
        .iter()
        .map(|p| p.old_price.unwrap_or(p.price))
        .sum();
    let items = products
        .into_iter()
        .map(|p| BundleItem {
            id: p.id,
            name: p.name,
            price: p.price,
            old_price: p.old_price,
            image_url: p.image_url,
            selected: true,
        })
        .collect();

    Bundle {
        main_product_id,
        items,
        total_price,
        total_old_price,
        total_savings: (total_old_price - total_price).max(0),
    }
}

pub async fn list_links(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>> {
    ensure_admin(user)?;
    let items = FrequentlyBoughtTogether::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_asc(Column::DisplayOrder)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(FrequentlyBoughtTogetherLink::from)
        .collect();
    Ok(ApiResponse::success("Bundle links", items, None))
}

pub async fn create_links(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBundleRequest,
) -> AppResult<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>> {
    ensure_admin(user)?;
    ensure_product(state, payload.product_id).await?;

    let txn = state.orm.begin().await?;
    let existing: HashSet<Uuid> = FrequentlyBoughtTogether::find()
        .select_only()
        .column(Column::RelatedProductId)
        .filter(Column::ProductId.eq(payload.product_id))
        .into_tuple::<Uuid>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let links =
        insert_links(&txn, payload.product_id, &payload.related_product_ids, existing).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Bundle links created", links, None))
}

/// Replace every link of a product, ordered as given.
pub async fn reorder_links(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: ReorderBundleRequest,
) -> AppResult<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>> {
    ensure_admin(user)?;
    ensure_product(state, product_id).await?;

    let txn = state.orm.begin().await?;
    FrequentlyBoughtTogether::delete_many()
        .filter(Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    let links =
        insert_links(&txn, product_id, &payload.related_product_ids, HashSet::new()).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Bundle reordered", links, None))
}

pub async fn delete_link(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = FrequentlyBoughtTogether::delete_by_id(id)
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Bundle link"));
    }
    Ok(ApiResponse::empty("Bundle link deleted"))
}

/// Link a few random active products that are not linked yet.
pub async fn seed_links(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Vec<FrequentlyBoughtTogetherLink>>> {
    ensure_admin(user)?;
    ensure_product(state, product_id).await?;

    let txn = state.orm.begin().await?;
    let existing: HashSet<Uuid> = FrequentlyBoughtTogether::find()
        .select_only()
        .column(Column::RelatedProductId)
        .filter(Column::ProductId.eq(product_id))
        .into_tuple::<Uuid>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let mut candidates: Vec<Uuid> = Products::find()
        .select_only()
        .column(ProductCol::Id)
        .filter(ProductCol::IsActive.eq(true))
        .filter(ProductCol::Id.ne(product_id))
        .into_tuple::<Uuid>()
        .all(&txn)
        .await?
        .into_iter()
        .filter(|id| !existing.contains(id))
        .collect();
    if candidates.is_empty() {
        return Err(AppError::BadRequest(
            "No products available to recommend".into(),
        ));
    }
    candidates.shuffle(&mut rand::rng());
    candidates.truncate(SEED_SIZE);

    let links = insert_links(&txn, product_id, &candidates, existing).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Bundle seeded", links, None))
}

async fn ensure_product(state: &AppState, product_id: Uuid) -> AppResult<()> {
    match Products::find_by_id(product_id).one(&state.orm).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Product")),
    }
}

/// Inserts links after the current last position, skipping self references,
/// repeats, unknown products and anything in `skip`.
async fn insert_links<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    related_ids: &[Uuid],
    mut skip: HashSet<Uuid>,
) -> AppResult<Vec<FrequentlyBoughtTogetherLink>> {
    let known: HashSet<Uuid> = Products::find()
        .select_only()
        .column(ProductCol::Id)
        .filter(ProductCol::Id.is_in(related_ids.to_vec()))
        .into_tuple::<Uuid>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let last: Option<i32> = FrequentlyBoughtTogether::find()
        .select_only()
        .column(Column::DisplayOrder)
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::DisplayOrder)
        .into_tuple()
        .one(db)
        .await?;
    let mut position = last.map(|p| p + 1).unwrap_or(0);

    skip.insert(product_id);
    let mut links = Vec::new();
    for related_id in related_ids {
        if !known.contains(related_id) || !skip.insert(*related_id) {
            continue;
        }
        let link = ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            related_product_id: Set(*related_id),
            display_order: Set(position),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await?;
        position += 1;
        links.push(FrequentlyBoughtTogetherLink::from(link));
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(price: i64, old_price: Option<i64>) -> ProductModel {
        let now = Utc::now().into();
        ProductModel {
            id: Uuid::new_v4(),
            sku: None,
            name: format!("Item {price}"),
            subtitle: None,
            slug: Uuid::new_v4().to_string(),
            description: None,
            image_url: "/img.png".into(),
            price,
            old_price,
            brand_id: None,
            category_id: Uuid::new_v4(),
            subcategory_id: None,
            stock_quantity: 1,
            low_stock_threshold: 10,
            is_active: true,
            is_featured: false,
            is_new: false,
            is_on_sale: false,
            free_shipping: false,
            shipping_cost: 0,
            views_count: 0,
            sales_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn bundle_totals_use_price_when_no_old_price() {
        let main = product(10_000, Some(12_000));
        let main_id = main.id;
        let bundle = build_bundle(main_id, vec![main, product(2_500, None)]);

        assert_eq!(bundle.items.len(), 2);
        assert_eq!(bundle.items[0].id, main_id);
        assert_eq!(bundle.total_price, 12_500);
        assert_eq!(bundle.total_old_price, 14_500);
        assert_eq!(bundle.total_savings, 2_000);
    }

    #[test]
    fn bundle_savings_never_negative() {
        let main = product(5_000, Some(4_000));
        let bundle = build_bundle(main.id, vec![main]);
        assert_eq!(bundle.total_savings, 0);
    }
}
