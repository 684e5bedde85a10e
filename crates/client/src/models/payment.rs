//! Payment service contracts and the durable pending-payment record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use souk_core::{OrderId, PaymentId, PaymentStatus};

/// Request body for `POST /payments/initiate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitRequest {
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// Response from `POST /payments/initiate`.
///
/// `client_secret` is handed to the embedded payment widget; the client
/// never touches card details itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitResponse {
    pub payment_id: PaymentId,
    #[serde(default)]
    pub stripe_payment_intent_id: Option<String>,
    pub client_secret: String,
    pub status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// The durable pending-payment record.
///
/// Written when a payment intent is obtained, deleted exactly when payment
/// success is confirmed. Its presence at startup resumes the checkout flow
/// directly at the payment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayment {
    pub order_id: OrderId,
    pub client_secret: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// When the record was written. Absent on records written by older
    /// clients; those are honored regardless of any max-age setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PendingPayment {
    /// Whether the record is still fresh enough to honor.
    ///
    /// `max_age: None` trusts every record, which is the platform's
    /// historical behavior. A record without a timestamp cannot be judged
    /// and is honored.
    #[must_use]
    pub fn is_fresh(&self, max_age: Option<std::time::Duration>, now: DateTime<Utc>) -> bool {
        match (max_age, self.saved_at) {
            (Some(max), Some(saved_at)) => {
                let age = now.signed_duration_since(saved_at);
                age <= chrono::Duration::from_std(max).unwrap_or(chrono::Duration::MAX)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(saved_at: Option<DateTime<Utc>>) -> PendingPayment {
        PendingPayment {
            order_id: OrderId::new(7),
            client_secret: "cs_x".to_owned(),
            amount: Decimal::new(42, 0),
            saved_at,
        }
    }

    #[test]
    fn test_record_roundtrips_source_shape() {
        let json = r#"{"orderId":7,"clientSecret":"cs_x","amount":42.0}"#;
        let parsed: PendingPayment = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, record(None));
    }

    #[test]
    fn test_no_max_age_trusts_everything() {
        let old = Utc::now() - chrono::Duration::days(365);
        assert!(record(Some(old)).is_fresh(None, Utc::now()));
    }

    #[test]
    fn test_max_age_rejects_stale_record() {
        let now = Utc::now();
        let old = now - chrono::Duration::hours(2);
        let max = Some(Duration::from_secs(3600));
        assert!(!record(Some(old)).is_fresh(max, now));
        assert!(record(Some(now)).is_fresh(max, now));
    }

    #[test]
    fn test_untimestamped_record_is_honored() {
        assert!(record(None).is_fresh(Some(Duration::from_secs(1)), Utc::now()));
    }
}
