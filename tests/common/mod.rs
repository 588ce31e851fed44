#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{CreateOrderRequest, OrderLineRequest},
    entity::{
        categories::ActiveModel as CategoryActive, product_variants::ActiveModel as VariantActive,
        products::{ActiveModel as ProductActive, Model as ProductModel},
        users::ActiveModel as UserActive,
    },
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER},
    payments::{PaymentError, PaymentGateway, PaymentIntent, Refund},
    routes::build_app,
    services::auth_service::{hash_password, issue_token},
    state::AppState,
};

pub const PASSWORD: &str = "secret123";

/// In-process gateway. Intents registered through [`FakeGateway::settle`] report as
/// succeeded for the settled amount; every other id is still awaiting payment.
#[derive(Default)]
pub struct FakeGateway {
    pub settled: Mutex<HashMap<String, i64>>,
    pub cancelled: Mutex<Vec<String>>,
    pub refunded: Mutex<Vec<String>>,
    pub fail_refunds: AtomicBool,
}

impl FakeGateway {
    pub fn settle(&self, id: &str, amount: i64) {
        self.settled.lock().unwrap().insert(id.to_string(), amount);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        Ok(PaymentIntent {
            id: format!("pi_{}", Uuid::new_v4().simple()),
            client_secret: Some("secret_test".into()),
            amount,
            currency: currency.to_string(),
            status: "requires_payment_method".into(),
        })
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let settled = self.settled.lock().unwrap().get(id).copied();
        let status = match settled {
            Some(_) => "succeeded",
            None => "requires_payment_method",
        };
        Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: None,
            amount: settled.unwrap_or(0),
            currency: "usd".into(),
            status: status.into(),
        })
    }

    async fn cancel_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.cancelled.lock().unwrap().push(id.to_string());
        Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: None,
            amount: 0,
            currency: "usd".into(),
            status: "canceled".into(),
        })
    }

    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<i64>,
    ) -> Result<Refund, PaymentError> {
        if self.fail_refunds.load(Ordering::SeqCst) {
            return Err(PaymentError::Api("card_declined".into()));
        }
        self.refunded.lock().unwrap().push(payment_intent_id.to_string());
        Ok(Refund {
            id: format!("re_{}", Uuid::new_v4().simple()),
            amount: amount.unwrap_or(0),
            status: "succeeded".into(),
        })
    }
}

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
}

pub async fn setup() -> anyhow::Result<TestApp> {
    let config = AppConfig::for_tests("sqlite::memory:");
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let gateway = Arc::new(FakeGateway::default());
    let state = AppState {
        orm: create_orm_conn(pool),
        config: Arc::new(config),
        payments: gateway.clone(),
    };
    Ok(TestApp { state, gateway })
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_app(self.state.clone())
    }

    pub async fn user(&self, email: &str) -> anyhow::Result<AuthUser> {
        create_user(&self.state, email, ROLE_CUSTOMER).await
    }

    pub async fn admin(&self) -> anyhow::Result<AuthUser> {
        create_user(&self.state, "admin@example.com", ROLE_ADMIN).await
    }

    pub async fn category(&self, slug: &str) -> anyhow::Result<Uuid> {
        let category = CategoryActive {
            id: Set(Uuid::new_v4()),
            name: Set(slug.to_uppercase()),
            slug: Set(slug.to_string()),
            description: Set(None),
            icon_class: Set(None),
            image_url: Set(None),
            parent_id: Set(None),
            display_order: Set(0),
            is_active: Set(true),
            show_in_menu: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.state.orm)
        .await?;
        Ok(category.id)
    }

    /// Active product with standard shipping of 500 unless `free_shipping`.
    pub async fn product(
        &self,
        category_id: Uuid,
        slug: &str,
        price: i64,
        stock: i32,
        free_shipping: bool,
    ) -> anyhow::Result<ProductModel> {
        let now = Utc::now();
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            sku: Set(None),
            name: Set(slug.replace('-', " ")),
            subtitle: Set(None),
            slug: Set(slug.to_string()),
            description: Set(None),
            image_url: Set(format!("/img/{slug}.jpg")),
            price: Set(price),
            old_price: Set(None),
            brand_id: Set(None),
            category_id: Set(category_id),
            subcategory_id: Set(None),
            stock_quantity: Set(stock),
            low_stock_threshold: Set(5),
            is_active: Set(true),
            is_featured: Set(false),
            is_new: Set(false),
            is_on_sale: Set(false),
            free_shipping: Set(free_shipping),
            shipping_cost: Set(500),
            views_count: Set(0),
            sales_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.state.orm)
        .await?;
        Ok(product)
    }

    pub async fn variant(
        &self,
        product_id: Uuid,
        name: &str,
        price_adjustment: i64,
        stock: i32,
    ) -> anyhow::Result<Uuid> {
        let variant = VariantActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            variant_name: Set(Some(name.to_string())),
            color: Set(Some(name.to_string())),
            size: Set(None),
            image_url: Set(None),
            price_adjustment: Set(price_adjustment),
            stock_quantity: Set(stock),
            sku: Set(None),
            display_order: Set(0),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.state.orm)
        .await?;
        Ok(variant.id)
    }

    pub fn token(&self, user: &AuthUser) -> anyhow::Result<String> {
        let model = storefront_api::entity::users::Model {
            id: user.user_id,
            email: user.email.clone(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            phone: None,
            role: user.role.clone(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let (token, _) = issue_token(&self.state.config.jwt, &model)?;
        Ok(token)
    }

    /// Sends a request through the full router and decodes the envelope.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }
}

async fn create_user(state: &AppState, email: &str, role: &str) -> anyhow::Result<AuthUser> {
    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(PASSWORD)?),
        first_name: Set(Some("Test".into())),
        last_name: Set(Some("User".into())),
        phone: Set(None),
        role: Set(role.to_string()),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}

pub fn order_request(items: Vec<(Uuid, Option<Uuid>, i32)>) -> CreateOrderRequest {
    CreateOrderRequest {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        company_name: None,
        email: "ada@example.com".into(),
        phone_number: "5550100".into(),
        street_address: "1 Analytical Way".into(),
        apartment_suite: None,
        city: "London".into(),
        state: "LDN".into(),
        country: "UK".into(),
        zip_code: "N1".into(),
        order_notes: None,
        payment_method: "card".into(),
        payment_intent_id: None,
        items: items
            .into_iter()
            .map(|(product_id, variant_id, quantity)| OrderLineRequest {
                product_id,
                variant_id,
                quantity,
            })
            .collect(),
    }
}
