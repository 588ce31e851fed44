use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entity::orders::{OrderStatus, PaymentStatus},
    models::{Order, OrderItem, OrderStatusEntry},
};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 999, message = "must be between 1 and 999"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub last_name: String,
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone_number: String,
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
    #[validate(length(max = 2000))]
    pub order_notes: Option<String>,
    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub payment_method: String,
    pub payment_intent_id: Option<String>,
    #[validate]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub status_history: Vec<OrderStatusEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub total: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderSummary>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub status: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PaymentIntentRequest {
    /// Amount in minor currency units.
    #[validate(range(min = 1, message = "must be greater than zero"))]
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    pub amount: i64,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub payment_intent_id: String,
}
