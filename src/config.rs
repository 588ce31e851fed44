use std::env;

use secrecy::SecretString;

#[derive(Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
    /// Tax applied to order and cart subtotals, in basis points.
    pub tax_rate_bps: i64,
    pub currency: String,
    pub cors_origin: String,
    pub frontend_url: String,
}

#[derive(Debug)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub expires_days: i64,
}

#[derive(Debug)]
pub struct StripeConfig {
    pub secret_key: Option<SecretString>,
    pub webhook_secret: Option<SecretString>,
    pub api_base: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://storefront.db".to_string());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let jwt = JwtConfig {
            secret: SecretString::from(
                env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?,
            ),
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "storefront-api".to_string()),
            expires_days: parse_or("JWT_EXPIRES_DAYS", 7),
        };

        let stripe = StripeConfig {
            secret_key: env::var("STRIPE_SECRET_KEY").ok().map(SecretString::from),
            webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").ok().map(SecretString::from),
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            stripe,
            tax_rate_bps: parse_or("TAX_RATE_BPS", 800),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:4200".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:4200".to_string()),
        })
    }

    /// Configuration for tests and tooling that never touches the environment.
    pub fn for_tests(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt: JwtConfig {
                secret: SecretString::from("test-secret".to_string()),
                issuer: "storefront-api".to_string(),
                expires_days: 7,
            },
            stripe: StripeConfig {
                secret_key: None,
                webhook_secret: Some(SecretString::from("whsec_test".to_string())),
                api_base: "http://127.0.0.1:9".to_string(),
            },
            tax_rate_bps: 800,
            currency: "usd".to_string(),
            cors_origin: "http://localhost:4200".to_string(),
            frontend_url: "http://localhost:4200".to_string(),
        }
    }
}

fn parse_or(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}
