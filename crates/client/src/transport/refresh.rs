//! Single-flight refresh coordination.
//!
//! Any number of requests can hit a 401 while sharing one expired token;
//! exactly one of them may perform the refresh call. The coordinator is an
//! explicit object injected into the transport rather than module-level
//! state, so the guarantee survives multiple client instances in one
//! process - each transport has its own coordinator guarding its own
//! session.

use tokio::sync::{Mutex, broadcast};

use crate::error::ApiError;

/// Broadcast payload: the new access token, or `None` when refresh failed.
type RefreshOutcome = Option<String>;

/// Guards the session's refresh operation with a single-flight protocol.
///
/// The first caller to arrive becomes the leader: it installs a broadcast
/// slot, performs the refresh, and publishes the outcome. Callers arriving
/// while the slot is occupied subscribe and wait; they never issue a second
/// refresh call. Waiters are woken only after the refresh completes, with
/// no ordering guarantee among themselves.
///
/// Invariant: the task that installs the slot always settles it - refresh
/// futures are driven to completion by the transport, never dropped midway.
pub struct RefreshCoordinator {
    inflight: Mutex<Option<broadcast::Sender<RefreshOutcome>>>,
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(None),
        }
    }

    /// Run `refresh_fn` under the single-flight guard.
    ///
    /// If a refresh is already in flight, waits for its broadcast outcome
    /// instead of starting another. All callers racing on the same expired
    /// token therefore observe the same result.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the shared refresh failed, or
    /// whatever error the leader's `refresh_fn` produced for the leader
    /// itself.
    pub async fn run<F, Fut>(&self, refresh_fn: F) -> Result<String, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ApiError>>,
    {
        let mut slot = self.inflight.lock().await;

        if let Some(sender) = slot.as_ref() {
            // A refresh is in flight: queue behind it.
            let mut receiver = sender.subscribe();
            drop(slot);
            return match receiver.recv().await {
                Ok(Some(token)) => Ok(token),
                _ => Err(ApiError::Unauthorized),
            };
        }

        // No refresh in flight: become the leader.
        let (sender, _) = broadcast::channel(1);
        *slot = Some(sender);
        drop(slot);

        let result = refresh_fn().await;

        // Vacate the slot before publishing so that a caller arriving after
        // the broadcast starts a fresh refresh instead of waiting forever.
        let sender = self
            .inflight
            .lock()
            .await
            .take()
            .unwrap_or_else(|| broadcast::channel(1).0);

        match result {
            Ok(token) => {
                let _ = sender.send(Some(token.clone()));
                Ok(token)
            }
            Err(e) => {
                let _ = sender.send(None);
                Err(e)
            }
        }
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_lone_caller_refreshes() {
        let coordinator = RefreshCoordinator::new();
        let token = coordinator
            .run(|| async { Ok("fresh".to_owned()) })
            .await
            .unwrap();
        assert_eq!(token, "fresh");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                coordinator
                    .run(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // Hold the slot long enough for every task to queue.
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok("shared".to_owned())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waiters_observe_leader_failure() {
        let coordinator = Arc::new(RefreshCoordinator::new());

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .run(|| async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(ApiError::Unauthorized)
                    })
                    .await
            })
        };
        // Give the leader time to install the slot.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let waiter = coordinator.run(|| async { Ok("never-called".to_owned()) }).await;
        assert!(matches!(waiter, Err(ApiError::Unauthorized)));
        assert!(matches!(leader.await.unwrap(), Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_slot_is_vacated_after_completion() {
        let coordinator = RefreshCoordinator::new();
        coordinator
            .run(|| async { Ok("first".to_owned()) })
            .await
            .unwrap();

        // A later caller is a fresh leader, not a stuck waiter.
        let token = coordinator
            .run(|| async { Ok("second".to_owned()) })
            .await
            .unwrap();
        assert_eq!(token, "second");
    }
}
