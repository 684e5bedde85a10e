//! Typed contracts for every backend payload.
//!
//! The platform services speak camelCase JSON; each response the client
//! touches has an explicit shape here, and a mismatch surfaces as
//! [`crate::ApiError::UnexpectedPayload`] instead of being silently
//! defaulted away.

pub mod address;
pub mod cart;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use address::Address;
pub use cart::{
    AddToCartRequest, Cart, CartItem, CheckoutRequest, CheckoutResponse, DirectCheckoutRequest,
    OrderSummary, PaymentMethod,
};
pub use order::{AdminStats, MonthlyRevenue, Order, OrderItem, TopProduct};
pub use payment::{PaymentInitRequest, PaymentInitResponse, PendingPayment};
pub use product::{Category, Product, ProductFilters, ProductPage};
pub use user::{AuthResponse, ProfileUpdate, User};
