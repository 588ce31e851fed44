use std::collections::HashMap;

use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::products::{
        CreateProductRequest, ProductDetail, ProductList, ProductSummary, StockUpdateRequest,
        TagInput, UpdateProductRequest, VariantInput,
    },
    entity::{
        brands::{Column as BrandCol, Entity as Brands},
        categories::{Column as CategoryCol, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        product_reviews::{Column as ReviewCol, Entity as ProductReviews},
        product_tags::{ActiveModel as TagActive, Column as TagCol, Entity as ProductTags},
        product_variants::{
            ActiveModel as VariantActive, Column as VariantCol, Entity as ProductVariants,
        },
        products::{
            ActiveModel, Column, Entity as Products, Model as ProductModel, Relation as ProductRel,
        },
        recently_viewed::{
            ActiveModel as ViewedActive, Column as ViewedCol, Entity as RecentlyViewed,
        },
        subcategories::{Column as SubcategoryCol, Entity as Subcategories},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ProductTag, ProductVariant},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

const SEARCH_LIMIT: usize = 20;
const SEARCH_CANDIDATES: u64 = 200;

#[derive(Debug, Clone, Copy)]
pub enum ProductPreset {
    Featured,
    New,
    OnSale,
    BestSellers,
    Popular,
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(Column::Name.contains(search))
                .add(Column::Description.contains(search))
                .add(Column::Sku.contains(search)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(subcategory_id) = query.subcategory_id {
        condition = condition.add(Column::SubcategoryId.eq(subcategory_id));
    }
    if let Some(brand_id) = query.brand_id {
        condition = condition.add(Column::BrandId.eq(brand_id));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or_default() {
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Date => Column::CreatedAt,
        ProductSortBy::Popularity => Column::ViewsCount,
        ProductSortBy::Sales => Column::SalesCount,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let products = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = summarize(&state.orm, products).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn search_products(
    state: &AppState,
    q: Option<String>,
    category_id: Option<Uuid>,
) -> AppResult<ApiResponse<Vec<ProductSummary>>> {
    let term = q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::BadRequest("Search query is required".into()));
    }

    let mut finder = Products::find()
        .join(JoinType::LeftJoin, ProductRel::Brands.def())
        .join(JoinType::LeftJoin, ProductRel::Categories.def())
        .join(JoinType::LeftJoin, ProductRel::Subcategories.def())
        .filter(Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(Column::Name.contains(term))
                .add(Column::Description.contains(term))
                .add(Column::Subtitle.contains(term))
                .add(BrandCol::Name.contains(term))
                .add(CategoryCol::Name.contains(term))
                .add(SubcategoryCol::Name.contains(term)),
        );
    if let Some(category_id) = category_id {
        finder = finder.filter(Column::CategoryId.eq(category_id));
    }

    let mut products = finder
        .order_by_desc(Column::ViewsCount)
        .limit(SEARCH_CANDIDATES)
        .all(&state.orm)
        .await?;

    let needle = term.to_lowercase();
    products.sort_by_key(|p| !p.name.to_lowercase().starts_with(&needle));
    products.truncate(SEARCH_LIMIT);

    let items = summarize(&state.orm, products).await?;
    Ok(ApiResponse::success("Search results", items, None))
}

pub async fn get_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    view_product(state, viewer, product).await
}

pub async fn get_product_by_slug(
    state: &AppState,
    viewer: Option<&AuthUser>,
    slug: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .filter(Column::Slug.eq(slug))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    view_product(state, viewer, product).await
}

async fn view_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    mut product: ProductModel,
) -> AppResult<ApiResponse<ProductDetail>> {
    record_view(&state.orm, viewer.map(|u| u.user_id), product.id).await?;
    product.views_count += 1;

    let detail = product_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product", detail, None))
}

async fn record_view<C: ConnectionTrait>(
    db: &C,
    user_id: Option<Uuid>,
    product_id: Uuid,
) -> AppResult<()> {
    Products::update_many()
        .col_expr(Column::ViewsCount, Expr::col(Column::ViewsCount).add(1))
        .filter(Column::Id.eq(product_id))
        .exec(db)
        .await?;

    if let Some(user_id) = user_id {
        let viewed = ViewedActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            viewed_at: Set(Utc::now().into()),
        };
        RecentlyViewed::insert(viewed)
            .on_conflict(
                OnConflict::columns([ViewedCol::UserId, ViewedCol::ProductId])
                    .update_column(ViewedCol::ViewedAt)
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

pub async fn list_preset(
    state: &AppState,
    preset: ProductPreset,
    count: u64,
) -> AppResult<ApiResponse<Vec<ProductSummary>>> {
    let finder = Products::find().filter(Column::IsActive.eq(true));
    let finder = match preset {
        ProductPreset::Featured => finder
            .filter(Column::IsFeatured.eq(true))
            .order_by_desc(Column::CreatedAt),
        ProductPreset::New => finder
            .filter(Column::IsNew.eq(true))
            .order_by_desc(Column::CreatedAt),
        ProductPreset::OnSale => finder
            .filter(Column::IsOnSale.eq(true))
            .filter(Column::OldPrice.is_not_null())
            .filter(Column::OldPrice.gt(0))
            .order_by(
                Expr::cust("CAST(products.old_price - products.price AS REAL) / products.old_price"),
                Order::Desc,
            ),
        ProductPreset::BestSellers => finder
            .order_by_desc(Column::SalesCount)
            .order_by_desc(Column::ViewsCount),
        ProductPreset::Popular => finder.order_by_desc(Column::ViewsCount),
    };

    let products = finder.limit(count).all(&state.orm).await?;
    let items = summarize(&state.orm, products).await?;
    Ok(ApiResponse::success("Products", items, None))
}

/// Products sharing the category or subcategory, sampled from the most viewed.
pub async fn related_products(
    state: &AppState,
    id: Uuid,
    count: u64,
) -> AppResult<ApiResponse<Vec<ProductSummary>>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let mut shared = Condition::any().add(Column::CategoryId.eq(product.category_id));
    if let Some(subcategory_id) = product.subcategory_id {
        shared = shared.add(Column::SubcategoryId.eq(subcategory_id));
    }

    let mut candidates = Products::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::Id.ne(product.id))
        .filter(shared)
        .order_by_desc(Column::ViewsCount)
        .limit(count * 3)
        .all(&state.orm)
        .await?;

    candidates.shuffle(&mut rand::rng());
    candidates.truncate(count as usize);

    let items = summarize(&state.orm, candidates).await?;
    Ok(ApiResponse::success("Related products", items, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    ensure_unique_slug(&txn, &payload.slug, None).await?;
    if let Some(sku) = payload.sku.as_deref() {
        ensure_unique_sku(&txn, sku, None).await?;
    }
    ensure_classification(&txn, payload.category_id, payload.subcategory_id, payload.brand_id)
        .await?;

    let now = Utc::now();
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(payload.sku),
        name: Set(payload.name),
        subtitle: Set(payload.subtitle),
        slug: Set(payload.slug),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        price: Set(payload.price),
        old_price: Set(payload.old_price),
        brand_id: Set(payload.brand_id),
        category_id: Set(payload.category_id),
        subcategory_id: Set(payload.subcategory_id),
        stock_quantity: Set(payload.stock_quantity),
        low_stock_threshold: Set(payload.low_stock_threshold.unwrap_or(10)),
        is_active: Set(true),
        is_featured: Set(payload.is_featured),
        is_new: Set(payload.is_new),
        is_on_sale: Set(payload.is_on_sale),
        free_shipping: Set(payload.free_shipping),
        shipping_cost: Set(payload.shipping_cost),
        views_count: Set(0),
        sales_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    insert_variants(&txn, product.id, payload.variants).await?;
    insert_tags(&txn, product.id, payload.tags).await?;

    let detail = product_detail(&txn, product).await?;
    txn.commit().await?;

    tracing::info!(product_id = %detail.summary.id, "product created");
    Ok(ApiResponse::success("Product created", detail, None))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;
    for variant in payload.variants.iter().flatten() {
        variant.validate()?;
    }
    for tag in payload.tags.iter().flatten() {
        tag.validate()?;
    }

    let txn = state.orm.begin().await?;
    let existing = Products::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    if let Some(slug) = payload.slug.as_deref() {
        ensure_unique_slug(&txn, slug, Some(id)).await?;
    }
    if let Some(sku) = payload.sku.as_deref() {
        ensure_unique_sku(&txn, sku, Some(id)).await?;
    }
    if payload.category_id.is_some()
        || payload.subcategory_id.is_some()
        || payload.brand_id.is_some()
    {
        ensure_classification(
            &txn,
            payload.category_id.unwrap_or(existing.category_id),
            payload.subcategory_id.or(existing.subcategory_id),
            payload.brand_id.or(existing.brand_id),
        )
        .await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(sku) = payload.sku {
        active.sku = Set(Some(sku));
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(subtitle) = payload.subtitle {
        active.subtitle = Set(Some(subtitle));
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(old_price) = payload.old_price {
        active.old_price = Set(Some(old_price));
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(subcategory_id) = payload.subcategory_id {
        active.subcategory_id = Set(Some(subcategory_id));
    }
    if let Some(threshold) = payload.low_stock_threshold {
        active.low_stock_threshold = Set(threshold);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(is_new) = payload.is_new {
        active.is_new = Set(is_new);
    }
    if let Some(is_on_sale) = payload.is_on_sale {
        active.is_on_sale = Set(is_on_sale);
    }
    if let Some(free_shipping) = payload.free_shipping {
        active.free_shipping = Set(free_shipping);
    }
    if let Some(shipping_cost) = payload.shipping_cost {
        active.shipping_cost = Set(shipping_cost);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;

    if let Some(variants) = payload.variants {
        ProductVariants::delete_many()
            .filter(VariantCol::ProductId.eq(product.id))
            .exec(&txn)
            .await?;
        insert_variants(&txn, product.id, variants).await?;
    }
    if let Some(tags) = payload.tags {
        ProductTags::delete_many()
            .filter(TagCol::ProductId.eq(product.id))
            .exec(&txn)
            .await?;
        insert_tags(&txn, product.id, tags).await?;
    }

    let detail = product_detail(&txn, product).await?;
    txn.commit().await?;
    Ok(ApiResponse::success("Product updated", detail, None))
}

/// Products that appear on orders are deactivated; others are removed.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;

    if ordered > 0 {
        let mut active: ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
        return Ok(ApiResponse::empty("Product deactivated"));
    }

    Products::delete_by_id(id).exec(&state.orm).await?;
    Ok(ApiResponse::empty("Product deleted"))
}

pub async fn update_stock(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: StockUpdateRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let product = match payload.variant_id {
        Some(variant_id) => {
            let variant = ProductVariants::find_by_id(variant_id)
                .filter(VariantCol::ProductId.eq(id))
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::not_found("Variant"))?;
            let mut active: VariantActive = variant.into();
            active.stock_quantity = Set(payload.quantity);
            active.update(&state.orm).await?;
            product
        }
        None => {
            let mut active: ActiveModel = product.into();
            active.stock_quantity = Set(payload.quantity);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
    };

    let detail = product_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Stock updated", detail, None))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    page: Option<i64>,
    per_page: Option<i64>,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) =
        Pagination::new(page, per_page).normalize();

    let finder = Products::find()
        .filter(Column::IsActive.eq(true))
        .filter(Expr::col(Column::StockQuantity).lte(Expr::col(Column::LowStockThreshold)))
        .order_by_asc(Column::StockQuantity);

    let total = finder.clone().count(&state.orm).await? as i64;
    let products = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = summarize(&state.orm, products).await?;

    Ok(ApiResponse::success(
        "Low stock products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Project products to summaries, batch-loading names and rating aggregates.
/// Order of the input is preserved.
pub async fn summarize<C: ConnectionTrait>(
    db: &C,
    products: Vec<ProductModel>,
) -> AppResult<Vec<ProductSummary>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let brand_ids: Vec<Uuid> = products.iter().filter_map(|p| p.brand_id).collect();
    let category_ids: Vec<Uuid> = products.iter().map(|p| p.category_id).collect();
    let subcategory_ids: Vec<Uuid> = products.iter().filter_map(|p| p.subcategory_id).collect();

    let brands: HashMap<Uuid, String> = Brands::find()
        .filter(BrandCol::Id.is_in(brand_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b.name))
        .collect();
    let categories: HashMap<Uuid, String> = Categories::find()
        .filter(CategoryCol::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let subcategories: HashMap<Uuid, String> = Subcategories::find()
        .filter(SubcategoryCol::Id.is_in(subcategory_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let ratings: Vec<(Uuid, i32)> = ProductReviews::find()
        .select_only()
        .column(ReviewCol::ProductId)
        .column(ReviewCol::Rating)
        .filter(ReviewCol::ProductId.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;
    let mut rating_totals: HashMap<Uuid, (i64, i64)> = HashMap::new();
    for (product_id, rating) in ratings {
        let entry = rating_totals.entry(product_id).or_insert((0, 0));
        entry.0 += rating as i64;
        entry.1 += 1;
    }

    let summaries = products
        .into_iter()
        .map(|p| {
            let (rating_sum, review_count) = rating_totals.get(&p.id).copied().unwrap_or((0, 0));
            let average_rating = if review_count > 0 {
                ((rating_sum as f64 / review_count as f64) * 10.0).round() / 10.0
            } else {
                0.0
            };
            ProductSummary {
                brand_name: p.brand_id.and_then(|id| brands.get(&id).cloned()),
                category_name: categories.get(&p.category_id).cloned(),
                subcategory_name: p.subcategory_id.and_then(|id| subcategories.get(&id).cloned()),
                id: p.id,
                sku: p.sku,
                name: p.name,
                subtitle: p.subtitle,
                slug: p.slug,
                image_url: p.image_url,
                price: p.price,
                old_price: p.old_price,
                brand_id: p.brand_id,
                category_id: p.category_id,
                subcategory_id: p.subcategory_id,
                stock_quantity: p.stock_quantity,
                is_featured: p.is_featured,
                is_new: p.is_new,
                is_on_sale: p.is_on_sale,
                free_shipping: p.free_shipping,
                shipping_cost: p.shipping_cost,
                average_rating,
                review_count,
            }
        })
        .collect();
    Ok(summaries)
}

pub async fn product_detail<C: ConnectionTrait>(
    db: &C,
    product: ProductModel,
) -> AppResult<ProductDetail> {
    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.eq(product.id))
        .filter(VariantCol::IsActive.eq(true))
        .order_by_asc(VariantCol::DisplayOrder)
        .all(db)
        .await?
        .into_iter()
        .map(ProductVariant::from)
        .collect();
    let tags = ProductTags::find()
        .filter(TagCol::ProductId.eq(product.id))
        .order_by_asc(TagCol::TagName)
        .all(db)
        .await?
        .into_iter()
        .map(ProductTag::from)
        .collect();

    let description = product.description.clone();
    let low_stock_threshold = product.low_stock_threshold;
    let views_count = product.views_count;
    let sales_count = product.sales_count;
    let is_active = product.is_active;
    let created_at = product.created_at.with_timezone(&Utc);
    let updated_at = product.updated_at.with_timezone(&Utc);

    let summary = summarize(db, vec![product])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("product summary missing")))?;

    Ok(ProductDetail {
        summary,
        description,
        low_stock_threshold,
        views_count,
        sales_count,
        is_active,
        variants,
        tags,
        created_at,
        updated_at,
    })
}

/// Active product counts grouped by one of the classification columns.
pub async fn count_active_by<C: ConnectionTrait>(
    db: &C,
    column: Column,
) -> AppResult<HashMap<Uuid, i64>> {
    let rows: Vec<(Option<Uuid>, i64)> = Products::find()
        .select_only()
        .column(column)
        .column_as(Expr::col(Column::Id).count(), "product_count")
        .filter(Column::IsActive.eq(true))
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(id, count)| id.map(|id| (id, count)))
        .collect())
}

async fn ensure_unique_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.count(db).await? > 0 {
        return Err(AppError::BadRequest("Product slug already exists".into()));
    }
    Ok(())
}

async fn ensure_unique_sku<C: ConnectionTrait>(
    db: &C,
    sku: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Sku.eq(sku));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.count(db).await? > 0 {
        return Err(AppError::BadRequest("Product SKU already exists".into()));
    }
    Ok(())
}

async fn ensure_classification<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
    subcategory_id: Option<Uuid>,
    brand_id: Option<Uuid>,
) -> AppResult<()> {
    if Categories::find_by_id(category_id).one(db).await?.is_none() {
        return Err(AppError::BadRequest("Category does not exist".into()));
    }
    if let Some(subcategory_id) = subcategory_id {
        let found = Subcategories::find_by_id(subcategory_id)
            .filter(SubcategoryCol::CategoryId.eq(category_id))
            .one(db)
            .await?;
        if found.is_none() {
            return Err(AppError::BadRequest(
                "Subcategory does not belong to the category".into(),
            ));
        }
    }
    if let Some(brand_id) = brand_id {
        if Brands::find_by_id(brand_id).one(db).await?.is_none() {
            return Err(AppError::BadRequest("Brand does not exist".into()));
        }
    }
    Ok(())
}

async fn insert_variants<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    variants: Vec<VariantInput>,
) -> AppResult<()> {
    for variant in variants {
        VariantActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            variant_name: Set(variant.variant_name),
            color: Set(variant.color),
            size: Set(variant.size),
            image_url: Set(variant.image_url),
            price_adjustment: Set(variant.price_adjustment),
            stock_quantity: Set(variant.stock_quantity),
            sku: Set(variant.sku),
            display_order: Set(variant.display_order),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn insert_tags<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    tags: Vec<TagInput>,
) -> AppResult<()> {
    let mut seen = std::collections::HashSet::new();
    for tag in tags {
        if !seen.insert(tag.tag_name.to_lowercase()) {
            continue;
        }
        TagActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            tag_name: Set(tag.tag_name),
            tag_type: Set(tag.tag_type),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}
