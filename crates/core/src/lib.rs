//! Souk Core - Shared types library.
//!
//! This crate provides common types used across all Souk components:
//! - `client` - Typed SDK for the platform's REST services
//! - `cli` - Command-line shop client
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
