//! Checkout flow controller.
//!
//! Drives a purchase from line items to confirmed payment:
//!
//! ```text
//! CART --(proceed, items non-empty)--> SHIPPING
//! SHIPPING --(back)--> CART
//! SHIPPING --(submit valid address)--> order-create --> PAYMENT
//! PAYMENT --(widget success)--> verify (best-effort) --> CONFIRMATION
//! ```
//!
//! Two entry modes exist: the regular cart checkout and the direct
//! single-item buy, which skips CART and starts at SHIPPING with one staged
//! line. A third entry is recovery: when the durable store holds a
//! pending-payment record, the flow resumes directly at PAYMENT, bypassing
//! cart and shipping entirely - that is what survives a process restart
//! mid-payment.
//!
//! The order is always created backend-side (status PENDING) and a payment
//! intent obtained before any payment capture UI is shown; the pending
//! record is deleted exactly when payment success is confirmed, never
//! before.

mod form;

pub use form::{AddressForm, FieldError};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use souk_core::OrderId;

use crate::api::{AccountClient, CartClient, PaymentClient};
use crate::config::SoukConfig;
use crate::error::ApiError;
use crate::models::{Cart, CartItem, PaymentMethod, PendingPayment};
use crate::storage::{self, KeyValueStore, keys};

/// Steps of the checkout state machine, in flow order.
///
/// Absent the explicit back transition, the step only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    Cart,
    Shipping,
    Payment,
    Confirmation,
}

/// How the flow was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Check out the persisted backend cart.
    Cart,
    /// Buy the single staged item, bypassing the cart.
    Direct,
}

/// Where the submitted shipping address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// Picked from the saved-address list; nothing to persist.
    Saved,
    /// Freshly entered; auto-saved to the profile in the background.
    New,
}

/// Checkout failures.
///
/// Network failures during order creation or payment initiation are
/// terminal for the current attempt - there is no automatic retry, and the
/// flow stays on (or returns to) SHIPPING so the user can re-submit.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Proceeding with zero items.
    #[error("your cart is empty")]
    EmptyCart,

    /// Direct mode was entered without a staged item (e.g., state lost).
    #[error("no item staged for direct buy")]
    MissingDirectItem,

    /// The shipping form failed validation; nothing was sent.
    #[error("invalid shipping address")]
    InvalidForm(Vec<FieldError>),

    /// The operation does not apply to the current step.
    #[error("operation not available at step {step:?}")]
    WrongStep {
        /// Step the flow was actually in.
        step: CheckoutStep,
    },

    /// Order creation failed; the user can re-submit from SHIPPING.
    #[error("could not create the order, please try again")]
    OrderCreation(#[source] ApiError),

    /// Payment initiation failed; the flow returned to SHIPPING.
    #[error("could not start the payment, please try again")]
    PaymentInitiation(#[source] ApiError),

    /// Any other backend failure, surfaced as-is.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Pricing and recovery knobs, extracted from [`SoukConfig`].
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    /// Flat shipping fee below the free-shipping threshold.
    pub shipping_fee: Decimal,
    /// Subtotal at or above which shipping is waived.
    pub free_shipping_threshold: Decimal,
    /// Currency code sent to the payment service.
    pub currency: String,
    /// Maximum age of a pending-payment record honored on resume.
    pub pending_payment_max_age: Option<Duration>,
}

impl CheckoutOptions {
    /// Extract the checkout-relevant settings.
    #[must_use]
    pub fn from_config(config: &SoukConfig) -> Self {
        Self {
            shipping_fee: config.shipping_fee,
            free_shipping_threshold: config.free_shipping_threshold,
            currency: config.currency.clone(),
            pending_payment_max_age: config.pending_payment_max_age,
        }
    }
}

/// The checkout flow for one purchase.
///
/// Steps are strictly sequential; each operation gates on the current step,
/// so no two checkout operations can interleave for the same flow.
pub struct CheckoutFlow {
    cart: CartClient,
    payments: PaymentClient,
    account: AccountClient,
    store: Arc<dyn KeyValueStore>,
    options: CheckoutOptions,

    mode: StartMode,
    step: CheckoutStep,
    items: Vec<CartItem>,
    promo_code: Option<String>,
    discount: Decimal,
    payment_method: PaymentMethod,

    order_id: Option<OrderId>,
    client_secret: Option<String>,
    pending_amount: Option<Decimal>,
}

impl CheckoutFlow {
    /// Enter the checkout flow.
    ///
    /// Recovery takes precedence over the requested mode: a fresh
    /// pending-payment record in the durable store resumes directly at
    /// PAYMENT with the persisted order id, client secret and amount. A
    /// record older than the configured max age is discarded.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingDirectItem` in direct mode without a
    /// staged item, or the underlying [`ApiError`] when the cart snapshot
    /// cannot be loaded.
    #[instrument(skip(cart, payments, account, store, options))]
    pub async fn start(
        cart: CartClient,
        payments: PaymentClient,
        account: AccountClient,
        store: Arc<dyn KeyValueStore>,
        options: CheckoutOptions,
        mode: StartMode,
    ) -> Result<Self, CheckoutError> {
        let mut flow = Self {
            cart,
            payments,
            account,
            store,
            options,
            mode,
            step: CheckoutStep::Cart,
            items: Vec::new(),
            promo_code: None,
            discount: Decimal::ZERO,
            payment_method: PaymentMethod::CreditCard,
            order_id: None,
            client_secret: None,
            pending_amount: None,
        };

        if let Some(pending) = flow.load_pending_record() {
            info!(order_id = %pending.order_id, "Resuming checkout at payment step");
            flow.order_id = Some(pending.order_id);
            flow.client_secret = Some(pending.client_secret);
            flow.pending_amount = Some(pending.amount);
            flow.step = CheckoutStep::Payment;
            return Ok(flow);
        }

        match mode {
            StartMode::Direct => {
                let item = flow
                    .cart
                    .state()
                    .direct_buy_item()
                    .ok_or(CheckoutError::MissingDirectItem)?;
                flow.items = vec![item];
                flow.step = CheckoutStep::Shipping;
            }
            StartMode::Cart => {
                let snapshot = flow.cart.fetch().await?;
                flow.sync_from(&snapshot);
            }
        }

        Ok(flow)
    }

    // =========================================================================
    // Step transitions
    // =========================================================================

    /// Advance from CART to SHIPPING.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` with the step unchanged when there
    /// is nothing to buy; no backend call is made.
    pub fn proceed_to_shipping(&mut self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Cart)?;
        if self.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// Step back from SHIPPING to CART - the only backward transition.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::WrongStep` outside SHIPPING.
    pub fn back_to_cart(&mut self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        self.step = CheckoutStep::Cart;
        Ok(())
    }

    /// Submit the shipping address, create the order and initiate payment.
    ///
    /// A freshly entered address (`AddressSource::New`) is persisted to the
    /// profile in the background; a failure there is logged and never blocks
    /// checkout. On success the backend holds a PENDING order, a payment
    /// intent exists, the pending record is durable, and the flow sits at
    /// PAYMENT.
    ///
    /// # Errors
    ///
    /// `InvalidForm` keeps the flow at SHIPPING without any network call;
    /// `OrderCreation` and `PaymentInitiation` keep or return it to
    /// SHIPPING for a manual re-submit.
    #[instrument(skip(self, address))]
    pub async fn submit_order(
        &mut self,
        address: &AddressForm,
        source: AddressSource,
    ) -> Result<OrderId, CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        address.validate().map_err(CheckoutError::InvalidForm)?;

        if source == AddressSource::New {
            let account = self.account.clone();
            let new_address = address.to_address();
            tokio::spawn(async move {
                match account.add_address(&new_address).await {
                    Ok(saved) => debug!(id = ?saved.id, "Address auto-saved"),
                    Err(e) => warn!(error = %e, "Failed to auto-save address"),
                }
            });
        }

        let shipping_line = address.shipping_line();
        let response = match self.mode {
            StartMode::Direct => {
                let item = self.items.first().ok_or(CheckoutError::EmptyCart)?;
                self.cart
                    .checkout_direct(
                        &shipping_line,
                        item.product_id,
                        item.quantity,
                        self.payment_method,
                    )
                    .await
            }
            StartMode::Cart => {
                self.cart
                    .checkout(&shipping_line, self.payment_method)
                    .await
            }
        }
        .map_err(CheckoutError::OrderCreation)?;

        if !response.success {
            return Err(CheckoutError::OrderCreation(ApiError::Rejected(
                response.message,
            )));
        }

        let order_id = response.order.id;
        info!(%order_id, "Order created, initiating payment");
        self.order_id = Some(order_id);
        self.initiate_payment_flow(order_id).await?;
        Ok(order_id)
    }

    /// Obtain a payment intent for `order_id` and enter PAYMENT.
    ///
    /// The payable amount is the current total; each attempt carries a
    /// fresh idempotency key. The `{orderId, clientSecret, amount}` record
    /// is written to durable storage before PAYMENT is entered, so a reload
    /// from here on resumes at the payment step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::PaymentInitiation` with the flow back at
    /// SHIPPING.
    #[instrument(skip(self))]
    pub async fn initiate_payment_flow(&mut self, order_id: OrderId) -> Result<(), CheckoutError> {
        let amount = self.total();
        let response = match self
            .payments
            .initiate(order_id, amount, &self.options.currency)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.step = CheckoutStep::Shipping;
                return Err(CheckoutError::PaymentInitiation(e));
            }
        };

        let record = PendingPayment {
            order_id,
            client_secret: response.client_secret.clone(),
            amount: response.amount,
            saved_at: Some(Utc::now()),
        };
        storage::write_json(self.store.as_ref(), keys::PENDING_PAYMENT, &record);

        self.order_id = Some(order_id);
        self.client_secret = Some(response.client_secret);
        self.pending_amount = Some(response.amount);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Complete the flow after the payment widget reports success.
    ///
    /// A server-side verification call reconciles the widget result with
    /// backend order state; it is advisory only - whether it succeeds,
    /// fails, or reports "not yet confirmed", the flow enters CONFIRMATION,
    /// the local cart is cleared, and the pending record is deleted exactly
    /// once.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::WrongStep` outside PAYMENT (including a
    /// second invocation after the first already confirmed).
    #[instrument(skip(self))]
    pub async fn on_payment_success(&mut self) -> Result<OrderId, CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        let order_id = self.order_id.ok_or(CheckoutError::WrongStep {
            step: self.step,
        })?;

        match self.payments.verify(order_id).await {
            Ok(true) => debug!(%order_id, "Payment verified backend-side"),
            Ok(false) => warn!(%order_id, "Payment not yet confirmed backend-side (webhook may be delayed)"),
            Err(e) => warn!(%order_id, error = %e, "Payment verification failed (proceeding anyway)"),
        }

        self.cart.state().reset();
        self.store.remove(keys::PENDING_PAYMENT);
        self.step = CheckoutStep::Confirmation;
        info!(%order_id, "Checkout confirmed");
        Ok(order_id)
    }

    // =========================================================================
    // Cart-step operations (cart mode only)
    // =========================================================================

    /// Change a line's quantity while on the CART step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::WrongStep` outside CART or in direct mode.
    pub async fn update_quantity(
        &mut self,
        product_id: souk_core::ProductId,
        quantity: u32,
    ) -> Result<(), CheckoutError> {
        self.expect_cart_mutation()?;
        let snapshot = self.cart.update_quantity(product_id, quantity).await?;
        self.sync_from(&snapshot);
        Ok(())
    }

    /// Remove a line while on the CART step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::WrongStep` outside CART or in direct mode.
    pub async fn remove_item(
        &mut self,
        product_id: souk_core::ProductId,
    ) -> Result<(), CheckoutError> {
        self.expect_cart_mutation()?;
        let snapshot = self.cart.remove_item(product_id).await?;
        self.sync_from(&snapshot);
        Ok(())
    }

    /// Apply a promo code while on the CART step.
    ///
    /// # Errors
    ///
    /// Surfaces the backend's rejection message for an invalid or expired
    /// code.
    pub async fn apply_promo(&mut self, code: &str) -> Result<(), CheckoutError> {
        self.expect_cart_mutation()?;
        let snapshot = self.cart.apply_promo(code).await?;
        self.sync_from(&snapshot);
        Ok(())
    }

    /// Remove the applied promo code while on the CART step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::WrongStep` outside CART or in direct mode.
    pub async fn remove_promo(&mut self) -> Result<(), CheckoutError> {
        self.expect_cart_mutation()?;
        let snapshot = self.cart.remove_promo().await?;
        self.sync_from(&snapshot);
        Ok(())
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Sum of line totals over the working items.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Flat fee, waived at or above the free-shipping threshold.
    #[must_use]
    pub fn shipping_cost(&self) -> Decimal {
        if self.subtotal() >= self.options.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.options.shipping_fee
        }
    }

    /// Payable total: subtotal plus shipping minus discount.
    ///
    /// Identical math on the cart and direct paths.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.shipping_cost() - self.discount
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Entry mode.
    #[must_use]
    pub const fn mode(&self) -> StartMode {
        self.mode
    }

    /// The working line items.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The applied promo code, if any.
    #[must_use]
    pub fn promo_code(&self) -> Option<&str> {
        self.promo_code.as_deref()
    }

    /// The applied discount (zero when no promo code is accepted).
    #[must_use]
    pub const fn discount(&self) -> Decimal {
        self.discount
    }

    /// The created order's id, once the order exists.
    #[must_use]
    pub const fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    /// The payment intent's client secret, once obtained. Fed to the
    /// payment widget; the flow itself never interprets it.
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// The amount the pending payment was created over.
    #[must_use]
    pub const fn pending_amount(&self) -> Option<Decimal> {
        self.pending_amount
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn load_pending_record(&self) -> Option<PendingPayment> {
        let record: PendingPayment =
            storage::read_json(self.store.as_ref(), keys::PENDING_PAYMENT)?;
        if record.is_fresh(self.options.pending_payment_max_age, Utc::now()) {
            Some(record)
        } else {
            warn!(order_id = %record.order_id, "Discarding stale pending-payment record");
            self.store.remove(keys::PENDING_PAYMENT);
            None
        }
    }

    fn sync_from(&mut self, snapshot: &Cart) {
        self.items = snapshot.items.clone();
        self.promo_code = snapshot.promo_code.clone();
        self.discount = snapshot.discount.unwrap_or(Decimal::ZERO);
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep { step: self.step })
        }
    }

    fn expect_cart_mutation(&self) -> Result<(), CheckoutError> {
        if self.mode == StartMode::Direct {
            return Err(CheckoutError::WrongStep { step: self.step });
        }
        self.expect_step(CheckoutStep::Cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart_state::CartState;
    use crate::session::SessionManager;
    use crate::storage::MemoryStore;
    use crate::transport::Transport;
    use souk_core::ProductId;

    fn options() -> CheckoutOptions {
        CheckoutOptions {
            shipping_fee: Decimal::new(599, 2),
            free_shipping_threshold: Decimal::new(50, 0),
            currency: "eur".to_owned(),
            pending_payment_max_age: None,
        }
    }

    fn item(price: Decimal, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(1),
            product_name: "Lantern".to_owned(),
            price,
            quantity,
            image_url: None,
            images: None,
        }
    }

    /// Build a flow without touching the network: stage a direct item (or a
    /// pending record) and start against an unroutable base URL.
    async fn direct_flow(
        store: Arc<dyn KeyValueStore>,
        staged: Option<CartItem>,
    ) -> Result<CheckoutFlow, CheckoutError> {
        let cart_state = CartState::new();
        if let Some(staged) = staged {
            cart_state.set_direct_buy_item(staged);
        }
        let http = reqwest::Client::new();
        let session = SessionManager::new(
            http.clone(),
            "http://127.0.0.1:9/api/auth".to_owned(),
            Arc::clone(&store),
            cart_state.clone(),
        );
        let transport = Transport::new(http, session);
        let cart = CartClient::new(
            transport.clone(),
            "http://127.0.0.1:9/api/cart".to_owned(),
            cart_state,
        );
        let payments = PaymentClient::new(
            transport.clone(),
            "http://127.0.0.1:9/api/payments".to_owned(),
        );
        let account = AccountClient::new(transport, "http://127.0.0.1:9/api/auth".to_owned());
        CheckoutFlow::start(cart, payments, account, store, options(), StartMode::Direct).await
    }

    #[tokio::test]
    async fn test_direct_mode_starts_at_shipping() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let flow = direct_flow(Arc::clone(&store), Some(item(Decimal::new(40, 0), 1)))
            .await
            .unwrap();
        assert_eq!(flow.step(), CheckoutStep::Shipping);
        assert_eq!(flow.items().len(), 1);
        assert_eq!(flow.discount(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_direct_mode_without_staged_item_fails() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let result = direct_flow(store, None).await;
        assert!(matches!(result, Err(CheckoutError::MissingDirectItem)));
    }

    #[tokio::test]
    async fn test_pending_record_resumes_at_payment() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage::write_json(
            store.as_ref(),
            keys::PENDING_PAYMENT,
            &PendingPayment {
                order_id: OrderId::new(7),
                client_secret: "cs_x".to_owned(),
                amount: Decimal::new(42, 0),
                saved_at: None,
            },
        );

        // No staged item needed: recovery takes precedence over the mode.
        let flow = direct_flow(store, None).await.unwrap();
        assert_eq!(flow.step(), CheckoutStep::Payment);
        assert_eq!(flow.order_id(), Some(OrderId::new(7)));
        assert_eq!(flow.client_secret(), Some("cs_x"));
        assert_eq!(flow.pending_amount(), Some(Decimal::new(42, 0)));
    }

    #[tokio::test]
    async fn test_totals_below_free_shipping_threshold() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut flow = direct_flow(store, Some(item(Decimal::new(40, 0), 1)))
            .await
            .unwrap();
        flow.discount = Decimal::new(5, 0);

        assert_eq!(flow.subtotal(), Decimal::new(40, 0));
        assert_eq!(flow.shipping_cost(), Decimal::new(599, 2));
        // 40 + 5.99 - 5 = 40.99
        assert_eq!(flow.total(), Decimal::new(4099, 2));
    }

    #[tokio::test]
    async fn test_totals_at_free_shipping_threshold() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let flow = direct_flow(store, Some(item(Decimal::new(60, 0), 1)))
            .await
            .unwrap();

        assert_eq!(flow.shipping_cost(), Decimal::ZERO);
        assert_eq!(flow.total(), Decimal::new(60, 0));
    }

    #[tokio::test]
    async fn test_back_is_only_allowed_from_shipping() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut flow = direct_flow(store, Some(item(Decimal::new(10, 0), 1)))
            .await
            .unwrap();

        flow.back_to_cart().unwrap();
        assert_eq!(flow.step(), CheckoutStep::Cart);

        // Already at CART: a second back is refused.
        assert!(matches!(
            flow.back_to_cart(),
            Err(CheckoutError::WrongStep { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_cart_guard_leaves_step_unchanged() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut flow = direct_flow(store, Some(item(Decimal::new(10, 0), 1)))
            .await
            .unwrap();
        flow.back_to_cart().unwrap();
        flow.items.clear();

        assert!(matches!(
            flow.proceed_to_shipping(),
            Err(CheckoutError::EmptyCart)
        ));
        assert_eq!(flow.step(), CheckoutStep::Cart);
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_network() {
        // The backend base is unroutable; a network attempt would surface
        // Unreachable rather than InvalidForm.
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut flow = direct_flow(store, Some(item(Decimal::new(10, 0), 1)))
            .await
            .unwrap();

        let result = flow
            .submit_order(&AddressForm::default(), AddressSource::New)
            .await;
        assert!(matches!(result, Err(CheckoutError::InvalidForm(_))));
        assert_eq!(flow.step(), CheckoutStep::Shipping);
    }

    #[tokio::test]
    async fn test_steps_are_ordered() {
        assert!(CheckoutStep::Cart < CheckoutStep::Shipping);
        assert!(CheckoutStep::Shipping < CheckoutStep::Payment);
        assert!(CheckoutStep::Payment < CheckoutStep::Confirmation);
    }

    #[tokio::test]
    async fn test_stale_pending_record_is_discarded() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage::write_json(
            store.as_ref(),
            keys::PENDING_PAYMENT,
            &PendingPayment {
                order_id: OrderId::new(7),
                client_secret: "cs_x".to_owned(),
                amount: Decimal::new(42, 0),
                saved_at: Some(Utc::now() - chrono::Duration::days(3)),
            },
        );

        let cart_state = CartState::new();
        cart_state.set_direct_buy_item(item(Decimal::new(10, 0), 1));
        let http = reqwest::Client::new();
        let session = SessionManager::new(
            http.clone(),
            "http://127.0.0.1:9/api/auth".to_owned(),
            Arc::clone(&store),
            cart_state.clone(),
        );
        let transport = Transport::new(http, session);
        let cart = CartClient::new(
            transport.clone(),
            "http://127.0.0.1:9/api/cart".to_owned(),
            cart_state,
        );
        let payments = PaymentClient::new(
            transport.clone(),
            "http://127.0.0.1:9/api/payments".to_owned(),
        );
        let account = AccountClient::new(transport, "http://127.0.0.1:9/api/auth".to_owned());

        let mut opts = options();
        opts.pending_payment_max_age = Some(Duration::from_secs(3600));
        let flow = CheckoutFlow::start(
            cart,
            payments,
            account,
            Arc::clone(&store),
            opts,
            StartMode::Direct,
        )
        .await
        .unwrap();

        // The stale record was ignored and deleted; the staged item won.
        assert_eq!(flow.step(), CheckoutStep::Shipping);
        assert!(store.get(keys::PENDING_PAYMENT).is_none());
    }
}
