//! Session manager.
//!
//! Owns the access/refresh token pair and the authenticated-user snapshot.
//! Tokens and user are written atomically: a cached user implies the access
//! token was present at the time it was stored, and a missing access token
//! with a cached user only occurs transiently while a refresh is in flight.
//!
//! Auth-service endpoints are called directly here, outside the
//! [`crate::transport::Transport`] pipeline, so they can never recurse into
//! the 401 refresh protocol.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::watch;
use tracing::{instrument, warn};

use souk_core::Email;

use crate::cart_state::CartState;
use crate::error::{ApiError, ErrorBody};
use crate::models::{AuthResponse, User};
use crate::storage::{self, KeyValueStore, keys};

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 8;

/// The authenticated session and its refresh operation.
///
/// Cheaply cloneable; all clones share one session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: reqwest::Client,
    /// Auth service base, e.g. `https://shop.example.com/api/auth`.
    base: String,
    store: Arc<dyn KeyValueStore>,
    tokens: RwLock<TokenPair>,
    user_tx: watch::Sender<Option<User>>,
    authed_tx: watch::Sender<bool>,
    cart_state: CartState,
}

#[derive(Default)]
struct TokenPair {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

impl SessionManager {
    /// Create a session manager, hydrating tokens and the user snapshot
    /// from the durable store.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        auth_base: String,
        store: Arc<dyn KeyValueStore>,
        cart_state: CartState,
    ) -> Self {
        let access = store.get(keys::ACCESS_TOKEN).map(SecretString::from);
        let refresh = store.get(keys::REFRESH_TOKEN).map(SecretString::from);
        let user: Option<User> = storage::read_json(store.as_ref(), keys::CURRENT_USER);
        let authenticated = access.is_some() && user.is_some();

        Self {
            inner: Arc::new(SessionInner {
                http,
                base: auth_base,
                store,
                tokens: RwLock::new(TokenPair { access, refresh }),
                user_tx: watch::Sender::new(user),
                authed_tx: watch::Sender::new(authenticated),
                cart_state,
            }),
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in with email and password.
    ///
    /// On success, tokens and user snapshot are stored atomically and the
    /// session becomes authenticated. There is no retry.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` on a 401, `ApiError::Unreachable`
    /// when the auth service cannot be reached.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = Email::parse(email).map_err(|e| ApiError::Validation(e.to_string()))?;
        if password.is_empty() {
            return Err(ApiError::Validation("password is required".to_owned()));
        }

        let response = self
            .post_auth(
                "/login",
                &json!({ "email": email.as_str(), "password": password }),
            )
            .await?;

        self.save_auth_data(&response);
        Ok(response.user)
    }

    /// Register a new account.
    ///
    /// On success the session is authenticated immediately, exactly as after
    /// a login. A duplicate email surfaces the backend's own message.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` on client-side failures,
    /// `ApiError::Rejected` when the auth service refuses the registration.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let email = Email::parse(email).map_err(|e| ApiError::Validation(e.to_string()))?;
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name is required".to_owned()));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let response = self
            .post_auth(
                "/register",
                &json!({ "name": name, "email": email.as_str(), "password": password }),
            )
            .await?;

        self.save_auth_data(&response);
        Ok(response.user)
    }

    /// Log out optimistically.
    ///
    /// Local state (tokens, user, cart) is cleared synchronously so the UI
    /// reacts immediately; the backend revocation call is fire-and-forget
    /// and its failure is only logged.
    ///
    /// Must be called from within a tokio runtime.
    pub fn logout(&self) {
        let refresh = self
            .inner
            .tokens
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .refresh
            .as_ref()
            .map(|token| token.expose_secret().to_owned());

        self.clear_auth_data();
        self.inner.cart_state.reset();

        if let Some(refresh) = refresh {
            let http = self.inner.http.clone();
            let url = format!("{}/logout", self.inner.base);
            tokio::spawn(async move {
                let result = http
                    .post(url)
                    .json(&json!({ "refreshToken": refresh }))
                    .send()
                    .await;
                if let Err(e) = result {
                    warn!(error = %e, "Backend logout failed (ignored)");
                }
            });
        }
    }

    /// Exchange the stored refresh token for a fresh token pair.
    ///
    /// On success the tokens and user snapshot are replaced atomically and
    /// the new access token is returned. On any failure the whole session is
    /// cleared, forcing a re-login. No retry.
    ///
    /// Callers inside the request pipeline must go through
    /// [`crate::transport::RefreshCoordinator`] so that at most one refresh
    /// call is ever in flight.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when no refresh token is stored or
    /// the auth service rejects it.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<String, ApiError> {
        let Some(refresh) = self
            .inner
            .tokens
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .refresh
            .as_ref()
            .map(|token| token.expose_secret().to_owned())
        else {
            self.clear_auth_data();
            return Err(ApiError::Unauthorized);
        };

        let result = self
            .post_auth("/refresh", &json!({ "refreshToken": refresh }))
            .await;

        match result {
            Ok(response) => {
                let token = response.access_token.clone();
                self.save_auth_data(&response);
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.clear_auth_data();
                self.inner.cart_state.reset();
                Err(match e {
                    ApiError::Unreachable => ApiError::Unreachable,
                    _ => ApiError::Unauthorized,
                })
            }
        }
    }

    /// Request a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the auth service rejects the request.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let email = Email::parse(email).map_err(|e| ApiError::Validation(e.to_string()))?;
        self.post_message("/forgot-password", &json!({ "email": email.as_str() }))
            .await
    }

    /// Complete a password reset with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the token is invalid or expired.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        self.post_message(
            "/reset-password",
            &json!({ "token": token, "newPassword": new_password }),
        )
        .await
    }

    // =========================================================================
    // Synchronous state reads
    // =========================================================================

    /// The current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .tokens
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .access
            .as_ref()
            .map(|token| token.expose_secret().to_owned())
    }

    /// Whether an access token is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .tokens
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .access
            .is_some()
    }

    /// The cached user snapshot.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.user_tx.borrow().clone()
    }

    /// Subscribe to user snapshot changes.
    #[must_use]
    pub fn user_updates(&self) -> watch::Receiver<Option<User>> {
        self.inner.user_tx.subscribe()
    }

    /// Subscribe to authentication-state changes.
    #[must_use]
    pub fn auth_updates(&self) -> watch::Receiver<bool> {
        self.inner.authed_tx.subscribe()
    }

    // =========================================================================
    // State writes
    // =========================================================================

    /// Replace the cached user snapshot (profile refresh/update).
    pub(crate) fn store_user(&self, user: User) {
        storage::write_json(self.inner.store.as_ref(), keys::CURRENT_USER, &user);
        self.inner.user_tx.send_replace(Some(user));
    }

    fn save_auth_data(&self, response: &AuthResponse) {
        // Tokens, durable copies and the user snapshot move together; the
        // write guard spans all of it.
        let mut tokens = self
            .inner
            .tokens
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tokens.access = Some(SecretString::from(response.access_token.clone()));
        self.inner
            .store
            .put(keys::ACCESS_TOKEN, &response.access_token);
        if let Some(ref refresh) = response.refresh_token {
            tokens.refresh = Some(SecretString::from(refresh.clone()));
            self.inner.store.put(keys::REFRESH_TOKEN, refresh);
        }
        storage::write_json(self.inner.store.as_ref(), keys::CURRENT_USER, &response.user);
        drop(tokens);

        self.inner.user_tx.send_replace(Some(response.user.clone()));
        self.inner.authed_tx.send_replace(true);
    }

    pub(crate) fn clear_auth_data(&self) {
        let mut tokens = self
            .inner
            .tokens
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tokens.access = None;
        tokens.refresh = None;
        self.inner.store.remove(keys::ACCESS_TOKEN);
        self.inner.store.remove(keys::REFRESH_TOKEN);
        self.inner.store.remove(keys::CURRENT_USER);
        drop(tokens);

        self.inner.user_tx.send_replace(None);
        self.inner.authed_tx.send_replace(false);
    }

    // =========================================================================
    // Auth-service HTTP
    // =========================================================================

    async fn post_auth(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<AuthResponse, ApiError> {
        let response = self
            .inner
            .http
            .post(format!("{}{path}", self.inner.base))
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<AuthResponse>()
                .await
                .map_err(|e| ApiError::UnexpectedPayload(e.to_string()));
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 => ApiError::InvalidCredentials,
            403 => ApiError::Forbidden,
            status_code if status_code >= 500 => ApiError::Server {
                status: status_code,
            },
            _ => ApiError::Rejected(body.message_or("request rejected")),
        })
    }

    async fn post_message(&self, path: &str, body: &serde_json::Value) -> Result<(), ApiError> {
        let response = self
            .inner
            .http
            .post(format!("{}{path}", self.inner.base))
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(match status.as_u16() {
            status_code if status_code >= 500 => ApiError::Server {
                status: status_code,
            },
            _ => ApiError::Rejected(body.message_or("request rejected")),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use souk_core::{UserId, UserRole};

    fn user() -> User {
        User {
            id: UserId::new("u1"),
            email: "amina@souk.io".to_owned(),
            name: "Amina".to_owned(),
            role: UserRole::Customer,
            oauth_provider: None,
            created_at: None,
            updated_at: None,
            phone_number: None,
            address: None,
            avatar_url: None,
            bio: None,
        }
    }

    fn manager(store: Arc<dyn KeyValueStore>) -> SessionManager {
        SessionManager::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/api/auth".to_owned(),
            store,
            CartState::new(),
        )
    }

    #[test]
    fn test_fresh_session_is_unauthenticated() {
        let session = manager(Arc::new(MemoryStore::new()));
        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_hydration_restores_tokens_and_user() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.put(keys::ACCESS_TOKEN, "at-1");
        store.put(keys::REFRESH_TOKEN, "rt-1");
        storage::write_json(store.as_ref(), keys::CURRENT_USER, &user());

        let session = manager(store);
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("at-1"));
        assert_eq!(session.current_user().unwrap().name, "Amina");
    }

    #[test]
    fn test_hydration_with_corrupt_user_yields_no_user() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.put(keys::ACCESS_TOKEN, "at-1");
        store.put(keys::CURRENT_USER, "{corrupt");

        let session = manager(store);
        // Token survives; the unparsable snapshot reads as absent.
        assert!(session.is_authenticated());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_state_synchronously() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.put(keys::ACCESS_TOKEN, "at-1");
        store.put(keys::REFRESH_TOKEN, "rt-1");
        storage::write_json(store.as_ref(), keys::CURRENT_USER, &user());

        let session = manager(Arc::clone(&store));
        session.logout();

        // Local state is gone before any backend call resolves.
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert!(store.get(keys::ACCESS_TOKEN).is_none());
        assert!(store.get(keys::REFRESH_TOKEN).is_none());
        assert!(store.get(keys::CURRENT_USER).is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_token_clears_session() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.put(keys::ACCESS_TOKEN, "at-1");

        let session = manager(store);
        let result = session.refresh_token().await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_login_rejects_malformed_email_before_network() {
        // The base URL is unroutable; reaching the network would error
        // differently than Validation.
        let session = manager(Arc::new(MemoryStore::new()));
        let result =
            tokio::runtime::Runtime::new().unwrap().block_on(session.login("not-an-email", "pw"));
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
