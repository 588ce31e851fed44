use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    brands, categories, frequently_bought_together, order_items, order_status_history,
    orders::{self, OrderStatus, PaymentStatus},
    product_tags, product_variants, subcategories, user_addresses, users,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            last_login_at: model.last_login_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub address_type: String,
    pub first_name: String,
    pub last_name: String,
    pub company_name: Option<String>,
    pub street_address: String,
    pub apartment_suite: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone_number: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user_addresses::Model> for Address {
    fn from(model: user_addresses::Model) -> Self {
        Self {
            id: model.id,
            address_type: model.address_type,
            first_name: model.first_name,
            last_name: model.last_name,
            company_name: model.company_name,
            street_address: model.street_address,
            apartment_suite: model.apartment_suite,
            city: model.city,
            state: model.state,
            country: model.country,
            zip_code: model.zip_code,
            phone_number: model.phone_number,
            is_default: model.is_default,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_featured: bool,
    pub display_order: i32,
    pub product_count: i64,
}

impl Brand {
    pub fn from_entity(model: brands::Model, product_count: i64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            logo_url: model.logo_url,
            description: model.description,
            is_featured: model.is_featured,
            display_order: model.display_order,
            product_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Subcategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon_class: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub product_count: i64,
}

impl Subcategory {
    pub fn from_entity(model: subcategories::Model, product_count: i64) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            icon_class: model.icon_class,
            image_url: model.image_url,
            display_order: model.display_order,
            is_active: model.is_active,
            product_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon_class: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub is_active: bool,
    pub show_in_menu: bool,
    pub product_count: i64,
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    pub fn from_entity(
        model: categories::Model,
        product_count: i64,
        subcategories: Vec<Subcategory>,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            icon_class: model.icon_class,
            image_url: model.image_url,
            parent_id: model.parent_id,
            display_order: model.display_order,
            is_active: model.is_active,
            show_in_menu: model.show_in_menu,
            product_count,
            subcategories,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub variant_name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub image_url: Option<String>,
    pub price_adjustment: i64,
    pub stock_quantity: i32,
    pub sku: Option<String>,
    pub display_order: i32,
}

impl From<product_variants::Model> for ProductVariant {
    fn from(model: product_variants::Model) -> Self {
        Self {
            id: model.id,
            variant_name: model.variant_name,
            color: model.color,
            size: model.size,
            image_url: model.image_url,
            price_adjustment: model.price_adjustment,
            stock_quantity: model.stock_quantity,
            sku: model.sku,
            display_order: model.display_order,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductTag {
    pub id: Uuid,
    pub tag_name: String,
    pub tag_type: Option<String>,
}

impl From<product_tags::Model> for ProductTag {
    fn from(model: product_tags::Model) -> Self {
        Self {
            id: model.id,
            tag_name: model.tag_name,
            tag_type: model.tag_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_verified_purchase: bool,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub price: i64,
    pub total: i64,
    pub shipping_type: Option<String>,
    pub shipping_cost: i64,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            product_name: model.product_name,
            product_image: model.product_image,
            quantity: model.quantity,
            price: model.price,
            total: model.total,
            shipping_type: model.shipping_type,
            shipping_cost: model.shipping_cost,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderStatusEntry {
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_status_history::Model> for OrderStatusEntry {
    fn from(model: order_status_history::Model) -> Self {
        Self {
            status: model.status,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub company_name: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub street_address: String,
    pub apartment_suite: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub tax: i64,
    pub total: i64,
    pub order_notes: Option<String>,
    pub payment_method: String,
    pub payment_intent_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            first_name: model.first_name,
            last_name: model.last_name,
            company_name: model.company_name,
            email: model.email,
            phone_number: model.phone_number,
            street_address: model.street_address,
            apartment_suite: model.apartment_suite,
            city: model.city,
            state: model.state,
            country: model.country,
            zip_code: model.zip_code,
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            tax: model.tax,
            total: model.total,
            order_notes: model.order_notes,
            payment_method: model.payment_method,
            payment_intent_id: model.payment_intent_id,
            payment_status: model.payment_status,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
            delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FrequentlyBoughtTogetherLink {
    pub id: Uuid,
    pub product_id: Uuid,
    pub related_product_id: Uuid,
    pub display_order: i32,
    pub is_active: bool,
}

impl From<frequently_bought_together::Model> for FrequentlyBoughtTogetherLink {
    fn from(model: frequently_bought_together::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            related_product_id: model.related_product_id,
            display_order: model.display_order,
            is_active: model.is_active,
        }
    }
}
