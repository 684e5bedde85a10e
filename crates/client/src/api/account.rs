//! Account client: profile and saved addresses.
//!
//! These are protected auth-service endpoints, so unlike the login/refresh
//! calls in [`crate::session::SessionManager`] they flow through the
//! transport and participate in the 401 refresh protocol. Successful
//! profile reads and writes re-store the session's cached user snapshot.

use tracing::instrument;

use souk_core::AddressId;

use crate::error::ApiError;
use crate::models::{Address, ProfileUpdate, User};
use crate::transport::Transport;

/// Client for profile and address management.
#[derive(Clone)]
pub struct AccountClient {
    transport: Transport,
    base: String,
}

impl AccountClient {
    /// Create an account client.
    #[must_use]
    pub const fn new(transport: Transport, base: String) -> Self {
        Self { transport, base }
    }

    /// Fetch the profile and refresh the cached user snapshot.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the auth service call fails.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<User, ApiError> {
        let request = self.transport.http().get(format!("{}/profile", self.base));
        let user: User = self.transport.send(request).await?;
        self.transport.session().store_user(user.clone());
        Ok(user)
    }

    /// Update the profile and refresh the cached user snapshot.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the auth service call fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = self
            .transport
            .http()
            .put(format!("{}/profile", self.base))
            .json(update);
        let user: User = self.transport.send(request).await?;
        self.transport.session().store_user(user.clone());
        Ok(user)
    }

    /// List the saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the auth service call fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        let request = self
            .transport
            .http()
            .get(format!("{}/addresses", self.base));
        self.transport.send(request).await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the auth service call fails.
    #[instrument(skip(self, address))]
    pub async fn add_address(&self, address: &Address) -> Result<Address, ApiError> {
        let request = self
            .transport
            .http()
            .post(format!("{}/addresses", self.base))
            .json(address);
        self.transport.send(request).await
    }

    /// Update a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the address has no id yet.
    #[instrument(skip(self, address))]
    pub async fn update_address(&self, address: &Address) -> Result<Address, ApiError> {
        let Some(id) = address.id else {
            return Err(ApiError::Validation(
                "cannot update an address that was never saved".to_owned(),
            ));
        };
        let request = self
            .transport
            .http()
            .put(format!("{}/addresses/{id}", self.base))
            .json(address);
        self.transport.send(request).await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the auth service call fails.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        let request = self
            .transport
            .http()
            .delete(format!("{}/addresses/{id}", self.base));
        self.transport.send_unit(request).await
    }
}
