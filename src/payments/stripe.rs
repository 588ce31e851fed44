use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, error, instrument};

use super::{PaymentError, PaymentGateway, PaymentIntent, Refund};
use crate::config::StripeConfig;

/// Stripe REST client covering the payment-intent calls the storefront needs.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: Option<SecretString>,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeClient {
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn key(&self) -> Result<&str, PaymentError> {
        self.secret_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or(PaymentError::NotConfigured)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, PaymentError> {
        let response = self
            .client
            .post(format!("{}{path}", self.api_base))
            .bearer_auth(self.key()?)
            .form(form)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;
        Self::parse(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PaymentError> {
        let response = self
            .client
            .get(format!("{}{path}", self.api_base))
            .bearer_auth(self.key()?)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, PaymentError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Response(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            error!(%status, error = %message, "Stripe API error");
            return Err(PaymentError::Api(message));
        }

        serde_json::from_str(&body).map_err(|e| PaymentError::Response(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        let intent: PaymentIntent = self.post_form("/v1/payment_intents", &form).await?;
        debug!(payment_intent_id = %intent.id, "payment intent created");
        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.get(&format!("/v1/payment_intents/{id}")).await
    }

    #[instrument(skip(self))]
    async fn cancel_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.post_form(&format!("/v1/payment_intents/{id}/cancel"), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<i64>,
    ) -> Result<Refund, PaymentError> {
        let mut form = vec![("payment_intent", payment_intent_id.to_string())];
        if let Some(amount) = amount {
            form.push(("amount", amount.to_string()));
        }
        self.post_form("/v1/refunds", &form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_fails_without_network() {
        let client = StripeClient::new(&StripeConfig {
            secret_key: None,
            webhook_secret: None,
            api_base: "https://api.stripe.com/".to_string(),
        });
        let err = client.create_payment_intent(1000, "usd").await.unwrap_err();
        assert!(matches!(err, PaymentError::NotConfigured));
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let client = StripeClient::new(&StripeConfig {
            secret_key: Some(SecretString::from("sk_live_secret".to_string())),
            webhook_secret: None,
            api_base: "https://api.stripe.com".to_string(),
        });
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk_live_secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
