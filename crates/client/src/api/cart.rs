//! Cart service client.
//!
//! Every mutation returns the fresh cart snapshot, which is published to
//! the shared [`CartState`] so the rest of the app observes it immediately.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;

use souk_core::ProductId;

use crate::cart_state::CartState;
use crate::error::ApiError;
use crate::models::{
    AddToCartRequest, Cart, CheckoutRequest, CheckoutResponse, DirectCheckoutRequest,
    PaymentMethod, Product,
};
use crate::transport::Transport;

/// Client for the cart service.
#[derive(Clone)]
pub struct CartClient {
    transport: Transport,
    base: String,
    state: CartState,
}

impl CartClient {
    /// Create a cart client publishing into `state`.
    #[must_use]
    pub const fn new(transport: Transport, base: String, state: CartState) -> Self {
        Self {
            transport,
            base,
            state,
        }
    }

    /// The shared cart state this client publishes to.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Fetch the cart and publish the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the cart service call fails.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Cart, ApiError> {
        let request = self.transport.http().get(&self.base);
        let cart: Cart = self.transport.send(request).await?;
        self.state.publish(Some(cart.clone()));
        Ok(cart)
    }

    /// Add a product to the cart.
    ///
    /// The cart service denormalizes the product's name, price and images,
    /// so the full [`Product`] is required, not just its id.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the cart service call fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_product(&self, product: &Product, quantity: u32) -> Result<Cart, ApiError> {
        let body = AddToCartRequest {
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            quantity,
            images: product.images.clone().unwrap_or_default(),
        };
        let request = self
            .transport
            .http()
            .post(format!("{}/items", self.base))
            .json(&body);
        let cart: Cart = self.transport.send(request).await?;
        self.state.publish(Some(cart.clone()));
        Ok(cart)
    }

    /// Change a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the cart service call fails.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let request = self
            .transport
            .http()
            .put(format!("{}/items/{product_id}", self.base))
            .json(&json!({ "productId": product_id, "quantity": quantity }));
        let cart: Cart = self.transport.send(request).await?;
        self.state.publish(Some(cart.clone()));
        Ok(cart)
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the cart service call fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<Cart, ApiError> {
        let request = self
            .transport
            .http()
            .delete(format!("{}/items/{product_id}", self.base));
        let cart: Cart = self.transport.send(request).await?;
        self.state.publish(Some(cart.clone()));
        Ok(cart)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the cart service call fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ApiError> {
        let request = self.transport.http().delete(format!("{}/clear", self.base));
        self.transport.send_unit(request).await?;
        self.state.publish(None);
        Ok(())
    }

    /// Apply a promo code.
    ///
    /// The backend either accepts it (returning the cart with `promo_code`
    /// and `discount` set together) or rejects it with its own message,
    /// surfaced verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the backend message for an invalid
    /// or expired code.
    #[instrument(skip(self))]
    pub async fn apply_promo(&self, promo_code: &str) -> Result<Cart, ApiError> {
        if promo_code.trim().is_empty() {
            return Err(ApiError::Validation("promo code is required".to_owned()));
        }
        let request = self
            .transport
            .http()
            .post(format!("{}/promo", self.base))
            .json(&json!({ "promoCode": promo_code }));
        let cart: Cart = self.transport.send(request).await?;
        self.state.publish(Some(cart.clone()));
        Ok(cart)
    }

    /// Remove the applied promo code.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the cart service call fails.
    #[instrument(skip(self))]
    pub async fn remove_promo(&self) -> Result<Cart, ApiError> {
        let request = self.transport.http().delete(format!("{}/promo", self.base));
        let cart: Cart = self.transport.send(request).await?;
        self.state.publish(Some(cart.clone()));
        Ok(cart)
    }

    /// Check out the persisted cart, creating a PENDING order.
    ///
    /// On success the backend has emptied the cart; the local snapshot is
    /// cleared to match.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if order creation fails; the cart is left
    /// untouched in that case.
    #[instrument(skip(self, shipping_address))]
    pub async fn checkout(
        &self,
        shipping_address: &str,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutResponse, ApiError> {
        let body = CheckoutRequest {
            shipping_address: shipping_address.to_owned(),
            payment_method,
        };
        let request = self
            .transport
            .http()
            .post(format!("{}/checkout", self.base))
            .json(&body);
        let response: CheckoutResponse = self.transport.send(request).await?;
        if response.success {
            self.state.publish(None);
        }
        Ok(response)
    }

    /// Check out a single item directly, bypassing the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if order creation fails.
    #[instrument(skip(self, shipping_address))]
    pub async fn checkout_direct(
        &self,
        shipping_address: &str,
        product_id: ProductId,
        quantity: u32,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutResponse, ApiError> {
        let body = DirectCheckoutRequest {
            shipping_address: shipping_address.to_owned(),
            payment_method,
            product_id,
            quantity,
        };
        let request = self
            .transport
            .http()
            .post(format!("{}/checkout/direct", self.base))
            .json(&body);
        let response: CheckoutResponse = self.transport.send(request).await?;
        if response.success {
            self.state.clear_direct_buy_item();
        }
        Ok(response)
    }

    /// Stage a product for a direct buy. Convenience over
    /// [`CartState::set_direct_buy_item`].
    pub fn stage_direct_buy(&self, product: &Product, quantity: u32) {
        self.state.set_direct_buy_item(crate::models::CartItem {
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            quantity,
            image_url: product.image_url.clone(),
            images: product.images.clone(),
        });
    }

    /// Subtotal of the latest snapshot, zero when no cart is loaded.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.state.cart().map_or(Decimal::ZERO, |cart| cart.subtotal)
    }

    /// Discounted total of the latest snapshot, zero when no cart is loaded.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.state
            .cart()
            .map_or(Decimal::ZERO, |cart| cart.total_amount)
    }
}
