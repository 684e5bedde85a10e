//! CLI command implementations.

pub mod admin;
pub mod auth;
pub mod shop;

pub use admin::AdminCommand;
pub use auth::AuthCommand;
pub use shop::{CartCommand, CheckoutCommand, OrdersCommand, ProductsCommand};

use thiserror::Error;

/// Top-level CLI failure.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] souk_client::config::ConfigError),
    #[error(transparent)]
    Init(#[from] souk_client::state::SoukInitError),
    #[error(transparent)]
    Api(#[from] souk_client::ApiError),
    #[error(transparent)]
    Checkout(#[from] souk_client::checkout::CheckoutError),
    #[error("{0}")]
    Usage(String),
}
