//! Process-wide cart state.
//!
//! The cart service owns the truth; this is the latest snapshot the rest of
//! the app reads synchronously (header badge, checkout entry). State is
//! published through `watch` channels: latest value, multicast, visible to
//! late subscribers. Only the cart client and the checkout flow write here.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{Cart, CartItem};

/// Shared cart snapshot plus the staged direct-buy item.
#[derive(Clone)]
pub struct CartState {
    inner: Arc<CartStateInner>,
}

struct CartStateInner {
    cart_tx: watch::Sender<Option<Cart>>,
    count_tx: watch::Sender<u32>,
    direct_buy_tx: watch::Sender<Option<CartItem>>,
}

impl CartState {
    /// Create an empty cart state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CartStateInner {
                cart_tx: watch::Sender::new(None),
                count_tx: watch::Sender::new(0),
                direct_buy_tx: watch::Sender::new(None),
            }),
        }
    }

    /// Publish a new cart snapshot (or `None` after clear/checkout).
    pub fn publish(&self, cart: Option<Cart>) {
        let count = cart.as_ref().map_or(0, Cart::item_count);
        self.inner.cart_tx.send_replace(cart);
        self.inner.count_tx.send_replace(count);
    }

    /// Latest cart snapshot.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.inner.cart_tx.borrow().clone()
    }

    /// Total units across cart lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        *self.inner.count_tx.borrow()
    }

    /// Subscribe to cart snapshot changes.
    #[must_use]
    pub fn cart_updates(&self) -> watch::Receiver<Option<Cart>> {
        self.inner.cart_tx.subscribe()
    }

    /// Subscribe to item-count changes (header badge).
    #[must_use]
    pub fn count_updates(&self) -> watch::Receiver<u32> {
        self.inner.count_tx.subscribe()
    }

    /// Stage a single item for a direct buy.
    pub fn set_direct_buy_item(&self, item: CartItem) {
        self.inner.direct_buy_tx.send_replace(Some(item));
    }

    /// The staged direct-buy item, if any.
    #[must_use]
    pub fn direct_buy_item(&self) -> Option<CartItem> {
        self.inner.direct_buy_tx.borrow().clone()
    }

    /// Drop the staged direct-buy item.
    pub fn clear_direct_buy_item(&self) {
        self.inner.direct_buy_tx.send_replace(None);
    }

    /// Reset all local cart state (called on logout).
    pub fn reset(&self) {
        self.publish(None);
        self.clear_direct_buy_item();
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use souk_core::{ProductId, UserId};

    fn cart_with_items(quantities: &[u32]) -> Cart {
        Cart {
            user_id: UserId::new("u1"),
            items: quantities
                .iter()
                .enumerate()
                .map(|(i, &quantity)| CartItem {
                    product_id: ProductId::new(i as i64 + 1),
                    product_name: format!("item-{i}"),
                    price: Decimal::new(10, 0),
                    quantity,
                    image_url: None,
                    images: None,
                })
                .collect(),
            subtotal: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            promo_code: None,
            discount: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_publish_updates_count() {
        let state = CartState::new();
        assert_eq!(state.item_count(), 0);

        state.publish(Some(cart_with_items(&[2, 3])));
        assert_eq!(state.item_count(), 5);

        state.publish(None);
        assert_eq!(state.item_count(), 0);
    }

    #[test]
    fn test_late_subscriber_sees_latest_value() {
        let state = CartState::new();
        state.publish(Some(cart_with_items(&[1])));

        // Subscribing after the publish still observes the snapshot.
        let rx = state.cart_updates();
        assert!(rx.borrow().is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let state = CartState::new();
        state.publish(Some(cart_with_items(&[1])));
        state.set_direct_buy_item(CartItem {
            product_id: ProductId::new(9),
            product_name: "Mirror".to_owned(),
            price: Decimal::new(120, 0),
            quantity: 1,
            image_url: None,
            images: None,
        });

        state.reset();
        assert!(state.cart().is_none());
        assert!(state.direct_buy_item().is_none());
        assert_eq!(state.item_count(), 0);
    }
}
