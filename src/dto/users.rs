use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

/// Used for both create and full update of an address.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AddressRequest {
    #[serde(default = "default_address_type")]
    #[validate(length(min = 1, max = 20))]
    pub address_type: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub last_name: String,
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub street_address: String,
    #[validate(length(max = 255))]
    pub apartment_suite: Option<String>,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub country: String,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone_number: String,
    #[serde(default)]
    pub is_default: bool,
}

fn default_address_type() -> String {
    "shipping".to_string()
}
