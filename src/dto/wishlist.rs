use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::products::ProductSummary;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToWishlistRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistEntry {
    pub added_at: DateTime<Utc>,
    pub product: ProductSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Wishlist {
    pub items: Vec<WishlistEntry>,
}
