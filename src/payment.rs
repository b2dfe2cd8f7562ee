//! Payment-intent creation at the third-party gateway.

use serde::Deserialize;

use crate::config::Payment;
use crate::error::{Result, ServerError};

const DEFAULT_ENDPOINT: &str = "https://api.stripe.com";
const DEFAULT_CURRENCY: &str = "inr";
const DEFAULT_METHOD_TYPE: &str = "card";

/// Prices are accepted in whole units and sent in the gateway's smallest
/// denomination.
const MINOR_UNITS: i64 = 100;

/// Intent as returned by the gateway; only what the frontend needs.
#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Payment gateway client.
///
/// A client without configuration rejects every request with a permanent
/// upstream error instead of failing at startup.
#[derive(Debug, Clone, Default)]
pub struct PaymentClient {
    http: reqwest::Client,
    config: Option<Payment>,
}

impl PaymentClient {
    /// Create a new [`PaymentClient`].
    pub fn new(config: &Payment) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: Some(config.clone()),
        }
    }

    /// Create a payment intent for `amount` whole currency units.
    ///
    /// Gateway rejections (4xx) are permanent; connectivity failures and
    /// gateway 5xx are transient. Neither is retried here.
    pub async fn create_intent(
        &self,
        amount: i64,
        currency: Option<&str>,
        method_types: &[String],
        description: &str,
    ) -> Result<PaymentIntent> {
        let Some(config) = &self.config else {
            return Err(ServerError::upstream_permanent(
                "payment gateway not configured",
            ));
        };

        let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let currency = currency
            .or(config.currency.as_deref())
            .unwrap_or(DEFAULT_CURRENCY);

        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), (amount * MINOR_UNITS).to_string()),
            ("currency".into(), currency.to_owned()),
            ("description".into(), description.to_owned()),
        ];
        if method_types.is_empty() {
            form.push((
                "payment_method_types[]".into(),
                DEFAULT_METHOD_TYPE.to_owned(),
            ));
        } else {
            for method in method_types {
                form.push(("payment_method_types[]".into(), method.clone()));
            }
        }

        let response = self
            .http
            .post(format!("{endpoint}/v1/payment_intents"))
            .bearer_auth(&config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|err| ServerError::upstream_transient(err.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "payment gateway rejected the intent");
            return Err(ServerError::upstream_permanent(format!(
                "payment gateway returned {status}",
            )));
        }
        if !status.is_success() {
            return Err(ServerError::upstream_transient(format!(
                "payment gateway returned {status}",
            )));
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|err| ServerError::upstream_transient(err.to_string()))
    }
}
