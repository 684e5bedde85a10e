//! Order service client.
//!
//! Customer-facing order queries plus the admin back-office endpoints
//! (listing all orders, status changes, dashboard statistics). The backend
//! enforces the admin role; a customer token hitting an admin endpoint gets
//! a 403 and the transport's neutral-route redirect.

use serde_json::json;
use tracing::instrument;

use souk_core::{OrderId, OrderStatus, UserId};

use crate::error::ApiError;
use crate::models::{AdminStats, MonthlyRevenue, Order, TopProduct};
use crate::transport::Transport;

/// Client for the order service.
#[derive(Clone)]
pub struct OrderClient {
    transport: Transport,
    base: String,
}

impl OrderClient {
    /// Create an order client.
    #[must_use]
    pub const fn new(transport: Transport, base: String) -> Self {
        Self { transport, base }
    }

    // =========================================================================
    // Customer endpoints
    // =========================================================================

    /// List the authenticated user's orders.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the order service call fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let request = self.transport.http().get(&self.base);
        self.transport.send(request).await
    }

    /// Fetch one order by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub async fn order(&self, id: OrderId) -> Result<Order, ApiError> {
        let request = self.transport.http().get(format!("{}/{id}", self.base));
        self.transport.send(request).await
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the order is past the cancellable
    /// stages.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order, ApiError> {
        let request = self
            .transport
            .http()
            .put(format!("{}/{id}/cancel", self.base))
            .json(&json!({}));
        self.transport.send(request).await
    }

    // =========================================================================
    // Admin endpoints
    // =========================================================================

    /// List every order on the platform (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin callers.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        let request = self.transport.http().get(format!("{}/all", self.base));
        self.transport.send(request).await
    }

    /// Change an order's status (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for an invalid transition.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let request = self
            .transport
            .http()
            .patch(format!("{}/{id}/status", self.base))
            .query(&[("status", status.wire_name())])
            .json(&json!({}));
        self.transport.send(request).await
    }

    /// Dashboard counters (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin callers.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<AdminStats, ApiError> {
        let request = self.transport.http().get(format!("{}/stats", self.base));
        self.transport.send(request).await
    }

    /// Monthly revenue series (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin callers.
    pub async fn revenue(&self) -> Result<Vec<MonthlyRevenue>, ApiError> {
        let request = self
            .transport
            .http()
            .get(format!("{}/stats/revenue", self.base));
        self.transport.send(request).await
    }

    /// Best-selling products (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin callers.
    pub async fn top_products(&self) -> Result<Vec<TopProduct>, ApiError> {
        let request = self
            .transport
            .http()
            .get(format!("{}/stats/top-products", self.base));
        self.transport.send(request).await
    }

    /// Most recent orders (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin callers.
    pub async fn recent_orders(&self) -> Result<Vec<Order>, ApiError> {
        let request = self.transport.http().get(format!("{}/recent", self.base));
        self.transport.send(request).await
    }

    /// All orders placed by one user (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin callers.
    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError> {
        let request = self
            .transport
            .http()
            .get(format!("{}/user/{user_id}", self.base));
        self.transport.send(request).await
    }
}
