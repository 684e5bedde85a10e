//! Payment service client.
//!
//! The client only ever handles payment *intents*; card details and the
//! 3-D-secure challenge live inside the hosted payment widget, which is fed
//! the `client_secret` from [`PaymentInitResponse`].

use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use souk_core::OrderId;

use crate::error::ApiError;
use crate::models::{PaymentInitRequest, PaymentInitResponse};
use crate::transport::Transport;

/// Client for the payment service.
#[derive(Clone)]
pub struct PaymentClient {
    transport: Transport,
    base: String,
}

impl PaymentClient {
    /// Create a payment client.
    #[must_use]
    pub const fn new(transport: Transport, base: String) -> Self {
        Self { transport, base }
    }

    /// Create a payment intent for an order.
    ///
    /// Each attempt carries a fresh `Idempotency-Key`, so re-submitting
    /// after a failure creates a new intent rather than replaying a stale
    /// one, while the payment service stays safe against duplicate
    /// deliveries of a single attempt.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the payment service call fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn initiate(
        &self,
        order_id: OrderId,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentInitResponse, ApiError> {
        let body = PaymentInitRequest {
            order_id,
            amount,
            currency: currency.to_owned(),
        };
        let request = self
            .transport
            .http()
            .post(format!("{}/initiate", self.base))
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .json(&body);
        self.transport.send(request).await
    }

    /// Ask the payment service to verify an order's payment state.
    ///
    /// This reconciles the client-observed widget result with the backend,
    /// covering the window where the asynchronous webhook confirmation is
    /// delayed or lost.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the verification call itself fails; the
    /// boolean result reports whether the payment is confirmed backend-side.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn verify(&self, order_id: OrderId) -> Result<bool, ApiError> {
        let request = self
            .transport
            .http()
            .post(format!("{}/verify/{order_id}", self.base))
            .json(&serde_json::json!({}));
        self.transport.send(request).await
    }
}
