//! Outbound request pipeline.
//!
//! Every call to a platform service (other than the auth endpoints, which
//! [`crate::session::SessionManager`] posts directly and are therefore
//! never retried here) flows through [`Transport`]:
//!
//! 1. The request is decorated with `Authorization: Bearer <token>` when a
//!    token is held.
//! 2. A 401 response triggers the single-flight refresh protocol: the first
//!    request to fail performs the refresh, everyone else queues behind it,
//!    and each request is replayed once with the refreshed token. A failed
//!    refresh clears the session and publishes a redirect to the login
//!    route.
//! 3. A 403 publishes a redirect to the home route and is not retried -
//!    the user is authenticated but not authorized.
//!
//! Each request thus carries at most one refresh call and one replay of
//! itself.

mod refresh;

pub use refresh::RefreshCoordinator;

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{ApiError, ErrorBody};
use crate::session::SessionManager;

/// Navigation targets the transport can request from the embedding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Neutral landing page (after a 403).
    Home,
    /// Login page (after an irrecoverable authentication failure).
    Login,
}

/// The shared request pipeline.
///
/// Cheaply cloneable; all clones share one session, one refresh coordinator
/// and one route channel.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    http: reqwest::Client,
    session: SessionManager,
    refresh: RefreshCoordinator,
    route_tx: watch::Sender<Option<Route>>,
}

impl Transport {
    /// Create a transport over `session`.
    #[must_use]
    pub fn new(http: reqwest::Client, session: SessionManager) -> Self {
        Self {
            inner: Arc::new(TransportInner {
                http,
                session,
                refresh: RefreshCoordinator::new(),
                route_tx: watch::Sender::new(None),
            }),
        }
    }

    /// The underlying HTTP client, for building requests.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// The session this transport authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Subscribe to navigation requests (login/home redirects).
    #[must_use]
    pub fn routes(&self) -> watch::Receiver<Option<Route>> {
        self.inner.route_tx.subscribe()
    }

    /// Send a request and deserialize the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the client-wide taxonomy.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::UnexpectedPayload(e.to_string()))
    }

    /// Send a request, discarding any response body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the client-wide taxonomy.
    pub async fn send_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.execute(request).await.map(drop)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        // Clone before consuming the builder; the clone is the one replay
        // we are allowed after a refresh. Requests with streaming bodies
        // cannot be cloned and are simply not replayed.
        let replay = request.try_clone();

        let decorated = match self.inner.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = decorated.send().await.map_err(ApiError::from)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                debug!(url = %response.url(), "401 received, entering refresh protocol");
                self.refresh_and_replay(replay).await
            }
            StatusCode::FORBIDDEN => {
                self.navigate(Route::Home);
                Err(ApiError::Forbidden)
            }
            _ => Self::check_status(response).await,
        }
    }

    async fn refresh_and_replay(
        &self,
        replay: Option<RequestBuilder>,
    ) -> Result<Response, ApiError> {
        let Some(replay) = replay else {
            return Err(ApiError::Unauthorized);
        };

        let session = self.inner.session.clone();
        let token = match self
            .inner
            .refresh
            .run(move || async move { session.refresh_token().await })
            .await
        {
            Ok(token) => token,
            Err(e) => {
                // Refresh failed: the session is already cleared; send the
                // user back to login.
                self.navigate(Route::Login);
                return Err(e);
            }
        };

        let response = replay
            .bearer_auth(token)
            .send()
            .await
            .map_err(ApiError::from)?;

        match response.status() {
            // A 401 on the replayed request is terminal: one refresh, one
            // replay, never a second round.
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => {
                self.navigate(Route::Home);
                Err(ApiError::Forbidden)
            }
            _ => Self::check_status(response).await,
        }
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(match code {
            404 => ApiError::NotFound(body.message_or("resource not found")),
            code if code >= 500 => ApiError::Server { status: code },
            _ => ApiError::Rejected(body.message_or("request rejected")),
        })
    }

    fn navigate(&self, route: Route) {
        self.inner.route_tx.send_replace(Some(route));
    }
}
