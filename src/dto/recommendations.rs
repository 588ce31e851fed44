use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct BundleItem {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub old_price: Option<i64>,
    pub image_url: String,
    pub selected: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Bundle {
    pub main_product_id: Uuid,
    pub items: Vec<BundleItem>,
    pub total_price: i64,
    pub total_old_price: i64,
    pub total_savings: i64,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateBundleRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, message = "must contain at least one product"))]
    pub related_product_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderBundleRequest {
    pub related_product_ids: Vec<Uuid>,
}
