//! Souk client library.
//!
//! A typed SDK for the Souk e-commerce platform's REST services: auth,
//! catalog, cart, orders and payments. The crate owns the two pieces of
//! coordination every embedding UI relies on:
//!
//! - [`session::SessionManager`] - the access/refresh token pair, the cached
//!   user snapshot, and the refresh operation the request pipeline
//!   coordinates.
//! - [`checkout::CheckoutFlow`] - the cart -> shipping -> payment ->
//!   confirmation state machine, with durable recovery of an in-flight
//!   payment across process restarts.
//!
//! Everything else is typed endpoint plumbing in [`api`], flowing through a
//! [`transport::Transport`] that decorates bearer tokens and performs the
//! single-flight 401 refresh-and-replay protocol.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart_state;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod notifications;
pub mod session;
pub mod state;
pub mod storage;
pub mod transport;

pub use config::SoukConfig;
pub use error::ApiError;
pub use state::Souk;
