//! Payment gateway client.
//!
//! Checkout only needs one gateway call: creating a remote order that the
//! browser then pays against. [`PaymentProvider`] is the seam the order
//! service depends on; [`RazorpayClient`] is the production implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RazorpayConfig;

/// Errors that can occur when calling the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success status.
    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Gateway response could not be understood.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Request to create an order at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteOrderRequest {
    /// Amount in minor units (paise for INR).
    pub amount: i64,
    pub currency: String,
    /// Merchant receipt reference.
    pub receipt: String,
}

/// Order created at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Gateway capability used at checkout.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a remote order. Not retried by callers.
    async fn create_order(
        &self,
        request: RemoteOrderRequest,
    ) -> Result<RemoteOrder, PaymentProviderError>;
}

/// Razorpay Orders API client.
#[derive(Clone)]
pub struct RazorpayClient {
    inner: Arc<RazorpayClientInner>,
}

struct RazorpayClientInner {
    client: reqwest::Client,
    orders_url: String,
    key_id: String,
    key_secret: SecretString,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl RazorpayClient {
    /// Create a new Razorpay client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &RazorpayConfig, timeout: Duration) -> Result<Self, PaymentProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RazorpayClientInner {
                client,
                orders_url: format!("{}/v1/orders", config.api_base),
                key_id: config.key_id.clone(),
                key_secret: config.key_secret.clone(),
            }),
        })
    }
}

#[async_trait]
impl PaymentProvider for RazorpayClient {
    async fn create_order(
        &self,
        request: RemoteOrderRequest,
    ) -> Result<RemoteOrder, PaymentProviderError> {
        let response = self
            .inner
            .client
            .post(&self.inner.orders_url)
            .basic_auth(&self.inner.key_id, Some(self.inner.key_secret.expose_secret()))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response_text).map_or_else(
                |_| response_text.chars().take(200).collect::<String>(),
                |envelope| {
                    let code = envelope.error.code.unwrap_or_default();
                    let description = envelope.error.description.unwrap_or_default();
                    format!("{code} {description}").trim().to_string()
                },
            );
            tracing::error!(
                status = %status,
                receipt = %request.receipt,
                message = %message,
                "Razorpay order creation failed"
            );
            return Err(PaymentProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let order: RemoteOrder = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Razorpay order response"
            );
            PaymentProviderError::InvalidResponse(e.to_string())
        })?;

        tracing::info!(razorpay_id = %order.id, amount = order.amount, "Razorpay order created");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_gateway_fields() {
        let request = RemoteOrderRequest {
            amount: 20040,
            currency: "INR".to_owned(),
            receipt: "receipt_abc".to_owned(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 20040);
        assert_eq!(json["currency"], "INR");
        assert_eq!(json["receipt"], "receipt_abc");
    }

    #[tokio::test]
    async fn test_unresponsive_gateway_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = RazorpayConfig {
            key_id: "rzp_test_key".to_owned(),
            key_secret: SecretString::from("Kq8vN2xLpT5wR9mZ3cY7bH1d".to_owned()),
            api_base: format!("http://{addr}"),
        };
        let client = RazorpayClient::new(&config, Duration::from_millis(150)).unwrap();

        let err = client
            .create_order(RemoteOrderRequest {
                amount: 20040,
                currency: "INR".to_owned(),
                receipt: "receipt_slow".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentProviderError::Http(ref e) if e.is_timeout()));
    }

    #[test]
    fn test_remote_order_ignores_extra_fields() {
        let body = r#"{"id":"order_Q1","entity":"order","amount":20040,"amount_paid":0,
            "currency":"INR","receipt":"receipt_abc","status":"created","attempts":0}"#;
        let order: RemoteOrder = serde_json::from_str(body).unwrap();
        assert_eq!(order.id, "order_Q1");
        assert_eq!(order.amount, 20040);
    }
}
