//! Top-level client state wiring every component together.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::api::{AccountClient, CartClient, CatalogClient, OrderClient, PaymentClient};
use crate::cart_state::CartState;
use crate::checkout::{CheckoutError, CheckoutFlow, CheckoutOptions, StartMode};
use crate::config::SoukConfig;
use crate::notifications::NotificationFeed;
use crate::session::SessionManager;
use crate::storage::{FileStore, KeyValueStore};
use crate::transport::{Route, Transport};

/// Errors creating the client state.
#[derive(Debug, Error)]
pub enum SoukInitError {
    /// The durable data directory could not be prepared.
    #[error("cannot open data directory: {0}")]
    Storage(#[from] std::io::Error),
    /// The HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// The assembled Souk client.
///
/// Cheaply cloneable; all clones share one session, one transport and one
/// durable store. This is the single construction point - session, cart
/// state and API clients are wired here exactly once.
#[derive(Clone)]
pub struct Souk {
    inner: Arc<SoukInner>,
}

struct SoukInner {
    config: SoukConfig,
    store: Arc<dyn KeyValueStore>,
    session: SessionManager,
    transport: Transport,
    cart_state: CartState,
    catalog: CatalogClient,
    cart: CartClient,
    orders: OrderClient,
    payments: PaymentClient,
    account: AccountClient,
}

impl Souk {
    /// Create a client backed by a [`FileStore`] under the configured data
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`SoukInitError`] when the data directory or HTTP client
    /// cannot be set up.
    pub fn new(config: SoukConfig) -> Result<Self, SoukInitError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.data_dir)?);
        Self::with_store(config, store)
    }

    /// Create a client over an explicit store (tests use a memory store).
    ///
    /// # Errors
    ///
    /// Returns [`SoukInitError::Http`] when the HTTP client cannot be built.
    pub fn with_store(
        config: SoukConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, SoukInitError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cart_state = CartState::new();
        let session = SessionManager::new(
            http.clone(),
            config.service_url("auth"),
            Arc::clone(&store),
            cart_state.clone(),
        );
        let transport = Transport::new(http, session.clone());

        let catalog = CatalogClient::new(
            transport.clone(),
            config.service_url("products"),
            config.service_url("categories"),
        );
        let cart = CartClient::new(
            transport.clone(),
            config.service_url("cart"),
            cart_state.clone(),
        );
        let orders = OrderClient::new(transport.clone(), config.service_url("orders"));
        let payments = PaymentClient::new(transport.clone(), config.service_url("payments"));
        let account = AccountClient::new(transport.clone(), config.service_url("auth"));

        Ok(Self {
            inner: Arc::new(SoukInner {
                config,
                store,
                session,
                transport,
                cart_state,
                catalog,
                cart,
                orders,
                payments,
                account,
            }),
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &SoukConfig {
        &self.inner.config
    }

    /// The session manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// The shared cart state.
    #[must_use]
    pub fn cart_state(&self) -> &CartState {
        &self.inner.cart_state
    }

    /// The catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// The cart client.
    #[must_use]
    pub fn cart(&self) -> &CartClient {
        &self.inner.cart
    }

    /// The order client.
    #[must_use]
    pub fn orders(&self) -> &OrderClient {
        &self.inner.orders
    }

    /// The payment client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// The account (profile/address) client.
    #[must_use]
    pub fn account(&self) -> &AccountClient {
        &self.inner.account
    }

    /// Subscribe to navigation requests from the request pipeline
    /// (login redirect after auth failure, home redirect after a 403).
    #[must_use]
    pub fn routes(&self) -> watch::Receiver<Option<Route>> {
        self.inner.transport.routes()
    }

    /// Enter the checkout flow.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::start`].
    pub async fn checkout(&self, mode: StartMode) -> Result<CheckoutFlow, CheckoutError> {
        CheckoutFlow::start(
            self.inner.cart.clone(),
            self.inner.payments.clone(),
            self.inner.account.clone(),
            Arc::clone(&self.inner.store),
            CheckoutOptions::from_config(&self.inner.config),
            mode,
        )
        .await
    }

    /// Build the admin notification feed.
    #[must_use]
    pub fn notification_feed(&self) -> NotificationFeed {
        NotificationFeed::new(
            self.inner.orders.clone(),
            self.inner.catalog.clone(),
            Arc::clone(&self.inner.store),
        )
    }
}
