//! Admin notification feed.
//!
//! Polls the admin statistics and the catalog, diffs them against the last
//! observed values, and turns changes into notifications: new orders and
//! low-stock products. The list and the unseen-badge counter are published
//! as latest-value channels and the list is persisted, so a restart
//! restores past notifications (with the badge cleared).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::api::{CatalogClient, OrderClient};
use crate::error::ApiError;
use crate::models::ProductFilters;
use crate::storage::{self, KeyValueStore, keys};

/// Stock page size used by the low-stock sweep.
const STOCK_SWEEP_PAGE_SIZE: u32 = 100;

/// Kind of admin notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Order,
    Stock,
    System,
}

/// Display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One back-office notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub priority: Priority,
}

/// The admin notification feed.
pub struct NotificationFeed {
    orders: OrderClient,
    catalog: CatalogClient,
    store: Arc<dyn KeyValueStore>,
    list_tx: watch::Sender<Vec<AdminNotification>>,
    unseen_tx: watch::Sender<u32>,
    diff: std::sync::Mutex<DiffState>,
}

/// Last observed order count, for change detection. `None` before the
/// first successful poll - the first poll syncs silently instead of
/// notifying about every historical order.
#[derive(Default)]
struct DiffState {
    total_orders: Option<u64>,
}

impl NotificationFeed {
    /// Create a feed, restoring the persisted list with the badge cleared.
    #[must_use]
    pub fn new(orders: OrderClient, catalog: CatalogClient, store: Arc<dyn KeyValueStore>) -> Self {
        let restored: Vec<AdminNotification> =
            storage::read_json(store.as_ref(), keys::ADMIN_NOTIFICATIONS).unwrap_or_default();

        Self {
            orders,
            catalog,
            store,
            list_tx: watch::Sender::new(restored),
            unseen_tx: watch::Sender::new(0),
            diff: std::sync::Mutex::new(DiffState::default()),
        }
    }

    /// Subscribe to the notification list.
    #[must_use]
    pub fn notifications(&self) -> watch::Receiver<Vec<AdminNotification>> {
        self.list_tx.subscribe()
    }

    /// Subscribe to the unseen-badge counter.
    #[must_use]
    pub fn unseen_count(&self) -> watch::Receiver<u32> {
        self.unseen_tx.subscribe()
    }

    /// Poll the admin statistics once and notify about new orders.
    ///
    /// The stats call is retried once, matching the polling loop's
    /// historical behavior.
    ///
    /// # Errors
    ///
    /// Returns the final [`ApiError`] when both attempts fail.
    #[instrument(skip(self))]
    pub async fn poll_stats_once(&self) -> Result<(), ApiError> {
        let stats = match self.orders.stats().await {
            Ok(stats) => stats,
            Err(first) => {
                warn!(error = %first, "Stats poll failed, retrying once");
                self.orders.stats().await?
            }
        };

        let new_orders = {
            let mut diff = self
                .diff
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let delta = diff
                .total_orders
                .map(|last| stats.total_orders.saturating_sub(last));
            diff.total_orders = Some(stats.total_orders);
            delta.unwrap_or(0)
        };

        if new_orders > 0 {
            self.push(AdminNotification {
                id: Uuid::new_v4().to_string(),
                kind: NotificationKind::Order,
                message: format!("{new_orders} new order(s) received"),
                link: Some("/admin/orders".to_owned()),
                timestamp: Utc::now(),
                read: false,
                priority: Priority::High,
            });
        }
        Ok(())
    }

    /// Sweep the catalog once and raise a low-stock notification.
    ///
    /// At most one stock notification is kept in the list at a time.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the catalog call fails.
    #[instrument(skip(self))]
    pub async fn poll_stock_once(&self) -> Result<(), ApiError> {
        let page = self
            .catalog
            .products(&ProductFilters {
                size: Some(STOCK_SWEEP_PAGE_SIZE),
                ..ProductFilters::default()
            })
            .await?;

        let low_stock = page.content.iter().filter(|p| p.is_low_stock()).count();
        if low_stock == 0 {
            return Ok(());
        }

        let already_flagged = self
            .list_tx
            .borrow()
            .iter()
            .any(|n| n.kind == NotificationKind::Stock);
        if !already_flagged {
            self.push(AdminNotification {
                id: Uuid::new_v4().to_string(),
                kind: NotificationKind::Stock,
                message: format!("{low_stock} product(s) low on stock"),
                link: Some("/admin/products".to_owned()),
                timestamp: Utc::now(),
                read: false,
                priority: Priority::Medium,
            });
        }
        Ok(())
    }

    /// Run both polls forever at the given cadences. Poll failures are
    /// logged and the loop keeps going.
    pub async fn run(&self, stats_every: Duration, stock_every: Duration) {
        let mut stats_tick = tokio::time::interval(stats_every);
        let mut stock_tick = tokio::time::interval(stock_every);
        loop {
            tokio::select! {
                _ = stats_tick.tick() => {
                    if let Err(e) = self.poll_stats_once().await {
                        error!(error = %e, "Notification stats poll error");
                    }
                }
                _ = stock_tick.tick() => {
                    if let Err(e) = self.poll_stock_once().await {
                        error!(error = %e, "Notification stock poll error");
                    }
                }
            }
        }
    }

    /// Prepend a notification and bump the badge.
    pub fn push(&self, notification: AdminNotification) {
        self.list_tx.send_modify(|list| list.insert(0, notification));
        self.unseen_tx.send_modify(|count| *count += 1);
        self.persist();
    }

    /// Clear the badge (the admin opened the dropdown).
    pub fn clear_badge(&self) {
        self.unseen_tx.send_replace(0);
    }

    /// Remove one notification from the list.
    pub fn dismiss(&self, id: &str) {
        self.list_tx.send_modify(|list| list.retain(|n| n.id != id));
        self.persist();
    }

    /// Drop every notification and clear the badge.
    pub fn clear_all(&self) {
        self.list_tx.send_replace(Vec::new());
        self.unseen_tx.send_replace(0);
        self.persist();
    }

    fn persist(&self) {
        let list = self.list_tx.borrow().clone();
        storage::write_json(self.store.as_ref(), keys::ADMIN_NOTIFICATIONS, &list);
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

    fn feed(store: Arc<dyn KeyValueStore>) -> NotificationFeed {
        let http = reqwest::Client::new();
        let session = SessionManager::new(
            http.clone(),
            "http://127.0.0.1:9/api/auth".to_owned(),
            Arc::clone(&store),
            CartState::new(),
        );
        let transport = Transport::new(http, session);
        let orders = OrderClient::new(transport.clone(), "http://127.0.0.1:9/api/orders".to_owned());
        let catalog = CatalogClient::new(
            transport,
            "http://127.0.0.1:9/api/products".to_owned(),
            "http://127.0.0.1:9/api/categories".to_owned(),
        );
        NotificationFeed::new(orders, catalog, store)
    }

    fn notification(id: &str, kind: NotificationKind) -> AdminNotification {
        AdminNotification {
            id: id.to_owned(),
            kind,
            message: "msg".to_owned(),
            link: None,
            timestamp: Utc::now(),
            read: false,
            priority: Priority::Low,
        }
    }

    #[tokio::test]
    async fn test_push_prepends_and_bumps_badge() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let feed = feed(store);

        feed.push(notification("a", NotificationKind::Order));
        feed.push(notification("b", NotificationKind::Stock));

        let list = feed.notifications().borrow().clone();
        assert_eq!(list.first().unwrap().id, "b");
        assert_eq!(*feed.unseen_count().borrow(), 2);

        feed.clear_badge();
        assert_eq!(*feed.unseen_count().borrow(), 0);
    }

    #[tokio::test]
    async fn test_dismiss_removes_by_id() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let feed = feed(store);
        feed.push(notification("a", NotificationKind::Order));
        feed.push(notification("b", NotificationKind::Order));

        feed.dismiss("a");
        let list = feed.notifications().borrow().clone();
        assert_eq!(list.len(), 1);
        assert_eq!(list.first().unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_restart_restores_list_with_badge_cleared() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        {
            let feed = feed(Arc::clone(&store));
            feed.push(notification("a", NotificationKind::Order));
            assert_eq!(*feed.unseen_count().borrow(), 1);
        }

        let reopened = feed(store);
        let list = reopened.notifications().borrow().clone();
        assert_eq!(list.len(), 1);
        assert_eq!(*reopened.unseen_count().borrow(), 0);
    }

    #[test]
    fn test_notification_serde_shape() {
        let n = notification("x", NotificationKind::Stock);
        let json = serde_json::to_value(&n).unwrap();
        // The wire field is `type`, not `kind`.
        assert_eq!(json["type"], "STOCK");
        assert_eq!(json["priority"], "LOW");
    }
}
