use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateBrandRequest {
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateBrandRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_featured: Option<bool>,
    pub display_order: Option<i32>,
}
