use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 999, message = "must be between 1 and 999"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCartItemRequest {
    pub cart_item_id: Uuid,
    /// Zero or less removes the line.
    #[validate(range(max = 999))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub image_url: String,
    pub variant_id: Option<Uuid>,
    pub variant_name: Option<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
    pub shipping_cost: i64,
    pub free_shipping: bool,
    pub stock_quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub tax: i64,
    pub total: i64,
    pub item_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartCount {
    pub count: i64,
}

fn default_quantity() -> i32 {
    1
}
