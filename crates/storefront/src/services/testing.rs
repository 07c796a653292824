//! Shared fixtures for service tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use stride_core::{Product, ProductId};

use super::razorpay::{PaymentProvider, PaymentProviderError, RemoteOrder, RemoteOrderRequest};
use crate::config::CommerceSettings;

pub fn settings() -> CommerceSettings {
    CommerceSettings {
        operation_timeout: Duration::from_millis(500),
        ..CommerceSettings::default()
    }
}

pub fn product(name: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_owned(),
        brand: "Stride".to_owned(),
        description: format!("{name} description"),
        quantity: 10,
        price,
        category: "shoes".to_owned(),
        images: vec![format!("https://cdn.example.test/{name}.jpg")],
        in_cart: false,
        cart_item_count: None,
        size: None,
    }
}

/// Provider that echoes requests back as remote orders.
#[derive(Default)]
pub struct ScriptedProvider {
    pub requests: Mutex<Vec<RemoteOrderRequest>>,
    pub(crate) calls: AtomicUsize,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn create_order(
        &self,
        request: RemoteOrderRequest,
    ) -> Result<RemoteOrder, PaymentProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(PaymentProviderError::Api {
                status: 400,
                message: "BAD_REQUEST_ERROR amount invalid".to_owned(),
            });
        }
        let order = RemoteOrder {
            id: format!("order_test_{call}"),
            amount: request.amount,
            currency: request.currency.clone(),
        };
        self.requests.lock().await.push(request);
        Ok(order)
    }
}
