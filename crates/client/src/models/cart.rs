//! Cart and checkout contracts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use souk_core::{ProductId, UserId};

/// The backend cart snapshot.
///
/// `discount` is non-null only when `promo_code` is set and was accepted by
/// the cart service; the two always change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl CartItem {
    /// Line total (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Request body for `POST /cart/items`.
///
/// The cart service denormalizes name, price and images into the cart so it
/// never has to call back into the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Paypal,
    BankTransfer,
}

/// Request body for `POST /cart/checkout`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
}

/// Request body for `POST /cart/checkout/direct` (single-item buy that
/// bypasses the persisted cart).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectCheckoutRequest {
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Response from both checkout endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub order: OrderSummary,
}

/// Summary of the order created by checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: souk_core::OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: souk_core::OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub items: Vec<OrderItemSummary>,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One line of a checkout order summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemSummary {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_cart() -> Cart {
        serde_json::from_str(
            r#"{
                "userId": "u1",
                "items": [
                    {"productId": 1, "productName": "Lantern", "price": 15.0, "quantity": 2, "imageUrl": "l.jpg"},
                    {"productId": 2, "productName": "Rug", "price": 80.0, "quantity": 1}
                ],
                "subtotal": 110.0,
                "totalAmount": 100.0,
                "promoCode": "EID10",
                "discount": 10.0
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_cart_item_count_sums_quantities() {
        assert_eq!(sample_cart().item_count(), 3);
    }

    #[test]
    fn test_line_total() {
        let cart = sample_cart();
        let lantern = cart.items.first().unwrap();
        assert_eq!(lantern.line_total(), Decimal::new(30, 0));
    }

    #[test]
    fn test_promo_and_discount_travel_together() {
        let cart = sample_cart();
        assert_eq!(cart.promo_code.as_deref(), Some("EID10"));
        assert_eq!(cart.discount, Some(Decimal::new(10, 0)));
    }

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"CREDIT_CARD\""
        );
    }
}
