use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{ProductTag, ProductVariant};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub subtitle: Option<String>,
    pub slug: String,
    pub image_url: String,
    pub price: i64,
    pub old_price: Option<i64>,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub subcategory_id: Option<Uuid>,
    pub subcategory_name: Option<String>,
    pub stock_quantity: i32,
    pub is_featured: bool,
    pub is_new: bool,
    pub is_on_sale: bool,
    pub free_shipping: bool,
    pub shipping_cost: i64,
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub description: Option<String>,
    pub low_stock_threshold: i32,
    pub views_count: i32,
    pub sales_count: i32,
    pub is_active: bool,
    pub variants: Vec<ProductVariant>,
    pub tags: Vec<ProductTag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductSummary>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VariantInput {
    #[validate(length(max = 100))]
    pub variant_name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub price_adjustment: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    pub sku: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TagInput {
    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub tag_name: String,
    pub tag_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(max = 100))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub subtitle: Option<String>,
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub slug: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 500, message = "is required"))]
    pub image_url: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub old_price: Option<i64>,
    pub brand_id: Option<Uuid>,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    pub low_stock_threshold: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default)]
    pub free_shipping: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub shipping_cost: i64,
    #[serde(default)]
    #[validate]
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    #[validate]
    pub tags: Vec<TagInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub subtitle: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    pub old_price: Option<i64>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub low_stock_threshold: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
    pub free_shipping: Option<bool>,
    #[validate(range(min = 0))]
    pub shipping_cost: Option<i64>,
    /// Replaces all variants when present.
    pub variants: Option<Vec<VariantInput>>,
    /// Replaces all tags when present.
    pub tags: Option<Vec<TagInput>>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StockUpdateRequest {
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: i32,
    pub variant_id: Option<Uuid>,
}
