//! Integration test harness for Souk.
//!
//! Spins up a [`wiremock::MockServer`] standing in for the platform
//! gateway, and builds a [`Souk`] client over it with an in-memory durable
//! store. Tests seed the store to simulate prior process state (an existing
//! session, an in-flight payment) and register mocks for the endpoints they
//! exercise.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p souk-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use wiremock::MockServer;

use souk_client::storage::{self, KeyValueStore, MemoryStore, keys};
use souk_client::{Souk, SoukConfig};

/// One test's world: a mock gateway, a client over it, and the shared
/// durable store (kept separately so tests can inspect and reseed it).
pub struct TestContext {
    pub server: MockServer,
    pub souk: Souk,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    /// Fresh context with an empty store (unauthenticated).
    pub async fn new() -> Self {
        Self::build(|_| {}).await
    }

    /// Context whose store already holds a session, as if a previous run
    /// had logged in: `access` token, a `rt-seed` refresh token, and a
    /// cached customer snapshot.
    pub async fn authenticated(access: &str) -> Self {
        Self::build(|store| {
            store.put(keys::ACCESS_TOKEN, access);
            store.put(keys::REFRESH_TOKEN, "rt-seed");
            storage::write_json(store, keys::CURRENT_USER, &sample_user());
        })
        .await
    }

    async fn build(seed: impl FnOnce(&MemoryStore)) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        seed(&store);

        let config = SoukConfig::new(
            server
                .uri()
                .parse()
                .expect("mock server URI is a valid URL"),
        );
        let souk = Souk::with_store(config, Arc::clone(&store) as Arc<dyn KeyValueStore>)
            .expect("client construction cannot fail over a memory store");

        Self {
            server,
            souk,
            store,
        }
    }

    /// Rebuild the client over the same store and server, simulating a
    /// process restart (page reload).
    pub fn restart(&self) -> Souk {
        let config = SoukConfig::new(
            self.server
                .uri()
                .parse()
                .expect("mock server URI is a valid URL"),
        );
        Souk::with_store(config, Arc::clone(&self.store) as Arc<dyn KeyValueStore>)
            .expect("client construction cannot fail over a memory store")
    }
}

/// The customer snapshot used across tests.
pub fn sample_user() -> serde_json::Value {
    serde_json::json!({
        "id": "u-amina",
        "email": "amina@example.com",
        "name": "Amina El Fassi",
        "role": "CUSTOMER"
    })
}

/// An auth-service response carrying the given tokens.
pub fn auth_response(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "accessToken": access,
        "refreshToken": refresh,
        "tokenType": "Bearer",
        "expiresIn": 900,
        "user": sample_user()
    })
}

/// A one-line cart: `quantity` units of a product at `unit_price`, with an
/// optional accepted promo discount.
pub fn cart_json(unit_price: f64, quantity: u32, discount: Option<f64>) -> serde_json::Value {
    let subtotal = unit_price * f64::from(quantity);
    serde_json::json!({
        "userId": "u-amina",
        "items": [{
            "productId": 1,
            "productName": "Brass lantern",
            "price": unit_price,
            "quantity": quantity,
            "imageUrl": "lantern.jpg"
        }],
        "subtotal": subtotal,
        "totalAmount": subtotal - discount.unwrap_or(0.0),
        "promoCode": discount.map(|_| "EID10"),
        "discount": discount
    })
}

/// A successful checkout response creating PENDING order `order_id`.
pub fn checkout_response(order_id: i64, total: f64) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "message": "Order created",
        "order": {
            "id": order_id,
            "userId": "u-amina",
            "orderNumber": format!("ORD-{order_id:06}"),
            "status": "PENDING",
            "totalAmount": total,
            "items": [],
            "shippingAddress": "3 Rue des Consuls, 10020 Rabat, Morocco - Tel: +212600000000",
            "paymentMethod": "CREDIT_CARD"
        }
    })
}

/// A payment-intent response for `order_id`.
pub fn payment_init_response(order_id: i64, client_secret: &str, amount: f64) -> serde_json::Value {
    serde_json::json!({
        "paymentId": order_id * 100,
        "stripePaymentIntentId": format!("pi_{order_id}"),
        "clientSecret": client_secret,
        "status": "INITIATED",
        "amount": amount,
        "currency": "eur"
    })
}
