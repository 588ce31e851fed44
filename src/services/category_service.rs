use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::categories::{
        CreateCategoryRequest, FeaturedCategory, SubcategoryRequest, UpdateCategoryRequest,
    },
    entity::{
        categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
        products::{Column as ProductCol, Entity as Products},
        subcategories::{
            ActiveModel as SubcategoryActive, Column as SubcategoryCol, Entity as Subcategories,
            Model as SubcategoryModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Subcategory},
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

const FEATURED_SUBCATEGORY_LIMIT: usize = 4;
const DEFAULT_TILE_COLOR: &str = "#475569";

/// Tile colour for the homepage, keyed by words in the category name.
pub fn background_color(name: &str) -> &'static str {
    let name = name.to_lowercase();
    let keyed = [
        ("audio", "#334155"),
        ("camera", "#334155"),
        ("gaming", "#F1F5F9"),
        ("office", "#374151"),
        ("computer", "#1E293B"),
        ("mobile", "#0F172A"),
    ];
    keyed
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_TILE_COLOR)
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories = Categories::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::ParentId.is_null())
        .order_by_asc(Column::DisplayOrder)
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;
    let items = with_subcategories(&state.orm, categories).await?;
    Ok(ApiResponse::success("Categories", items, None))
}

pub async fn top_categories(state: &AppState, count: u64) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories = top_level(&state.orm, count).await?;
    let items = with_subcategories(&state.orm, categories).await?;
    Ok(ApiResponse::success("Top categories", items, None))
}

pub async fn featured_categories(
    state: &AppState,
    count: u64,
) -> AppResult<ApiResponse<Vec<FeaturedCategory>>> {
    let categories = top_level(&state.orm, count).await?;
    let counts = product_service::count_active_by(&state.orm, ProductCol::SubcategoryId).await?;

    let mut items = Vec::with_capacity(categories.len());
    for category in categories {
        let mut showcase = Products::find()
            .filter(ProductCol::CategoryId.eq(category.id))
            .filter(ProductCol::IsActive.eq(true))
            .filter(ProductCol::IsFeatured.eq(true))
            .order_by_desc(ProductCol::CreatedAt)
            .one(&state.orm)
            .await?;
        if showcase.is_none() {
            showcase = Products::find()
                .filter(ProductCol::CategoryId.eq(category.id))
                .filter(ProductCol::IsActive.eq(true))
                .order_by_desc(ProductCol::CreatedAt)
                .one(&state.orm)
                .await?;
        }
        let featured_product = match showcase {
            Some(product) => product_service::summarize(&state.orm, vec![product])
                .await?
                .into_iter()
                .next(),
            None => None,
        };

        let subcategories = Subcategories::find()
            .filter(SubcategoryCol::CategoryId.eq(category.id))
            .filter(SubcategoryCol::IsActive.eq(true))
            .order_by_asc(SubcategoryCol::DisplayOrder)
            .order_by_asc(SubcategoryCol::Name)
            .limit(FEATURED_SUBCATEGORY_LIMIT as u64)
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|s| {
                let count = counts.get(&s.id).copied().unwrap_or(0);
                Subcategory::from_entity(s, count)
            })
            .collect();

        items.push(FeaturedCategory {
            background_color: background_color(&category.name).to_string(),
            id: category.id,
            name: category.name,
            slug: category.slug,
            featured_product,
            subcategories,
        });
    }

    Ok(ApiResponse::success("Featured categories", items, None))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    single(state, category, "Category").await
}

pub async fn get_category_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find()
        .filter(Column::Slug.eq(slug))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    single(state, category, "Category").await
}

pub async fn list_subcategories(
    state: &AppState,
    category_id: Uuid,
) -> AppResult<ApiResponse<Vec<Subcategory>>> {
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("Category"));
    }
    let counts = product_service::count_active_by(&state.orm, ProductCol::SubcategoryId).await?;
    let items = Subcategories::find()
        .filter(SubcategoryCol::CategoryId.eq(category_id))
        .filter(SubcategoryCol::IsActive.eq(true))
        .order_by_asc(SubcategoryCol::DisplayOrder)
        .order_by_asc(SubcategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|s| {
            let count = counts.get(&s.id).copied().unwrap_or(0);
            Subcategory::from_entity(s, count)
        })
        .collect();
    Ok(ApiResponse::success("Subcategories", items, None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    ensure_category_slug(&state.orm, &payload.slug, None).await?;
    if let Some(parent_id) = payload.parent_id {
        if Categories::find_by_id(parent_id).one(&state.orm).await?.is_none() {
            return Err(AppError::BadRequest("Parent category does not exist".into()));
        }
    }

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
        icon_class: Set(payload.icon_class),
        image_url: Set(payload.image_url),
        parent_id: Set(payload.parent_id),
        display_order: Set(payload.display_order),
        is_active: Set(true),
        show_in_menu: Set(payload.show_in_menu),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    single(state, category, "Category created").await
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    if let Some(slug) = payload.slug.as_deref() {
        ensure_category_slug(&state.orm, slug, Some(id)).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(icon_class) = payload.icon_class {
        active.icon_class = Set(Some(icon_class));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(display_order) = payload.display_order {
        active.display_order = Set(display_order);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(show_in_menu) = payload.show_in_menu {
        active.show_in_menu = Set(show_in_menu);
    }
    let category = active.update(&state.orm).await?;

    single(state, category, "Category updated").await
}

/// Categories still referenced by products, directly or through a subcategory,
/// are deactivated together with their subcategories; others are removed.
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let existing = Categories::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let subcategory_ids: Vec<Uuid> = Subcategories::find()
        .select_only()
        .column(SubcategoryCol::Id)
        .filter(SubcategoryCol::CategoryId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;
    let referenced = Products::find()
        .filter(
            sea_orm::Condition::any()
                .add(ProductCol::CategoryId.eq(id))
                .add(ProductCol::SubcategoryId.is_in(subcategory_ids)),
        )
        .count(&txn)
        .await?;

    let message = if referenced > 0 {
        Subcategories::update_many()
            .col_expr(SubcategoryCol::IsActive, Expr::value(false))
            .filter(SubcategoryCol::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        let mut active: ActiveModel = existing.into();
        active.is_active = Set(false);
        active.update(&txn).await?;
        "Category deactivated"
    } else {
        Categories::delete_by_id(id).exec(&txn).await?;
        "Category deleted"
    };

    txn.commit().await?;
    tracing::info!(category_id = %id, message, "category removed");
    Ok(ApiResponse::empty(message))
}

pub async fn create_subcategory(
    state: &AppState,
    user: &AuthUser,
    category_id: Uuid,
    payload: SubcategoryRequest,
) -> AppResult<ApiResponse<Subcategory>> {
    ensure_admin(user)?;
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("Category"));
    }
    ensure_subcategory_slug(&state.orm, &payload.slug, None).await?;

    let subcategory = SubcategoryActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
        icon_class: Set(payload.icon_class),
        image_url: Set(payload.image_url),
        display_order: Set(payload.display_order),
        is_active: Set(payload.is_active),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Subcategory created",
        Subcategory::from_entity(subcategory, 0),
        None,
    ))
}

pub async fn update_subcategory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SubcategoryRequest,
) -> AppResult<ApiResponse<Subcategory>> {
    ensure_admin(user)?;
    let existing = find_subcategory(state, id).await?;
    ensure_subcategory_slug(&state.orm, &payload.slug, Some(id)).await?;

    let mut active: SubcategoryActive = existing.into();
    active.name = Set(payload.name);
    active.slug = Set(payload.slug);
    active.description = Set(payload.description);
    active.icon_class = Set(payload.icon_class);
    active.image_url = Set(payload.image_url);
    active.display_order = Set(payload.display_order);
    active.is_active = Set(payload.is_active);
    let subcategory = active.update(&state.orm).await?;

    let count = Products::find()
        .filter(ProductCol::SubcategoryId.eq(id))
        .filter(ProductCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    Ok(ApiResponse::success(
        "Subcategory updated",
        Subcategory::from_entity(subcategory, count),
        None,
    ))
}

pub async fn delete_subcategory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = find_subcategory(state, id).await?;

    let referenced = Products::find()
        .filter(ProductCol::SubcategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        let mut active: SubcategoryActive = existing.into();
        active.is_active = Set(false);
        active.update(&state.orm).await?;
        return Ok(ApiResponse::empty("Subcategory deactivated"));
    }

    Subcategories::delete_by_id(id).exec(&state.orm).await?;
    Ok(ApiResponse::empty("Subcategory deleted"))
}

async fn find_subcategory(state: &AppState, id: Uuid) -> AppResult<SubcategoryModel> {
    Subcategories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Subcategory"))
}

async fn top_level<C: ConnectionTrait>(db: &C, count: u64) -> AppResult<Vec<CategoryModel>> {
    Ok(Categories::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::ShowInMenu.eq(true))
        .filter(Column::ParentId.is_null())
        .order_by_asc(Column::DisplayOrder)
        .order_by_asc(Column::Name)
        .limit(count)
        .all(db)
        .await?)
}

async fn single(
    state: &AppState,
    category: CategoryModel,
    message: &str,
) -> AppResult<ApiResponse<Category>> {
    let item = with_subcategories(&state.orm, vec![category])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("category projection missing")))?;
    Ok(ApiResponse::success(message, item, None))
}

/// Attach active subcategories and product counts to each category.
async fn with_subcategories<C: ConnectionTrait>(
    db: &C,
    categories: Vec<CategoryModel>,
) -> AppResult<Vec<Category>> {
    let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let category_counts = product_service::count_active_by(db, ProductCol::CategoryId).await?;
    let subcategory_counts = product_service::count_active_by(db, ProductCol::SubcategoryId).await?;

    let mut grouped: HashMap<Uuid, Vec<Subcategory>> = HashMap::new();
    let subcategories = Subcategories::find()
        .filter(SubcategoryCol::CategoryId.is_in(ids))
        .filter(SubcategoryCol::IsActive.eq(true))
        .order_by_asc(SubcategoryCol::DisplayOrder)
        .order_by_asc(SubcategoryCol::Name)
        .all(db)
        .await?;
    for sub in subcategories {
        let count = subcategory_counts.get(&sub.id).copied().unwrap_or(0);
        grouped
            .entry(sub.category_id)
            .or_default()
            .push(Subcategory::from_entity(sub, count));
    }

    Ok(categories
        .into_iter()
        .map(|c| {
            let count = category_counts.get(&c.id).copied().unwrap_or(0);
            let subs = grouped.remove(&c.id).unwrap_or_default();
            Category::from_entity(c, count, subs)
        })
        .collect())
}

async fn ensure_category_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Categories::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.count(db).await? > 0 {
        return Err(AppError::BadRequest("Category slug already exists".into()));
    }
    Ok(())
}

async fn ensure_subcategory_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Subcategories::find().filter(SubcategoryCol::Slug.eq(slug));
    if let Some(id) = except {
        finder = finder.filter(SubcategoryCol::Id.ne(id));
    }
    if finder.count(db).await? > 0 {
        return Err(AppError::BadRequest("Subcategory slug already exists".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::background_color;

    #[test]
    fn tile_colors_follow_name_keywords() {
        assert_eq!(background_color("Audio & Video"), "#334155");
        assert_eq!(background_color("Cameras"), "#334155");
        assert_eq!(background_color("PC Gaming"), "#F1F5F9");
        assert_eq!(background_color("Home Office"), "#374151");
        assert_eq!(background_color("Computers"), "#1E293B");
        assert_eq!(background_color("Mobile Phones"), "#0F172A");
        assert_eq!(background_color("Garden"), "#475569");
    }
}
