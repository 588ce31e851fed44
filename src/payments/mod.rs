//! Card payment integration.
//!
//! The order flow talks to a [`PaymentGateway`]; production wires in
//! [`StripeClient`], tests substitute an in-process fake.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod stripe;
pub mod webhook;

pub use stripe::StripeClient;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment gateway is not configured")]
    NotConfigured,

    #[error("request to payment gateway failed: {0}")]
    Request(String),

    #[error("unexpected payment gateway response: {0}")]
    Response(String),

    #[error("payment gateway rejected the request: {0}")]
    Api(String),

    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),
}

/// The gateway's view of an in-progress charge.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;

    async fn cancel_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Refund a captured intent; `None` refunds the full amount.
    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<i64>,
    ) -> Result<Refund, PaymentError>;
}
