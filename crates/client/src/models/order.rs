//! Order and admin-statistics contracts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use souk_core::{OrderId, OrderStatus, ProductId, UserId};

/// A full order as returned by the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    // Client info, enriched on admin endpoints only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Back-office dashboard counters (`GET /orders/stats`).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub pending_orders: u64,
    #[serde(default)]
    pub confirmed_orders: u64,
    #[serde(default)]
    pub processing_orders: u64,
    #[serde(default)]
    pub shipped_orders: u64,
    #[serde(default)]
    pub delivered_orders: u64,
    #[serde(default)]
    pub orders_this_month: u64,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub revenue_this_month: Decimal,
    #[serde(default)]
    pub new_users_this_month: u64,
}

/// One month of revenue (`GET /orders/stats/revenue`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

/// A best-selling product (`GET /orders/stats/top-products`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub total_sold: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_customer_shape() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 7,
                "userId": "u1",
                "orderNumber": "ORD-2024-0007",
                "status": "PENDING",
                "totalAmount": 42.0,
                "shippingAddress": "3 Rue des Consuls, 10020 Rabat, Morocco - Tel: +212600000000",
                "paymentMethod": "CREDIT_CARD",
                "promoCode": null,
                "discount": null,
                "items": [
                    {"id": 1, "productId": 3, "productName": "Teapot", "quantity": 1, "price": 42.0}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(order.id, OrderId::new(7));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.client_email.is_none());
    }

    #[test]
    fn test_admin_stats_tolerates_missing_counters() {
        let stats: AdminStats =
            serde_json::from_str(r#"{"totalOrders": 12, "totalRevenue": 340.5}"#).unwrap();
        assert_eq!(stats.total_orders, 12);
        assert_eq!(stats.pending_orders, 0);
        assert_eq!(stats.total_revenue, Decimal::new(3405, 1));
    }
}
