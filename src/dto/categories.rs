use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dto::products::ProductSummary, models::Subcategory};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub slug: String,
    pub description: Option<String>,
    pub icon_class: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub show_in_menu: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon_class: Option<String>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
    pub show_in_menu: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubcategoryRequest {
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub slug: String,
    pub description: Option<String>,
    pub icon_class: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Homepage tile: a category with one showcase product and a few subcategories.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeaturedCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub background_color: String,
    pub featured_product: Option<ProductSummary>,
    pub subcategories: Vec<Subcategory>,
}

fn default_true() -> bool {
    true
}
