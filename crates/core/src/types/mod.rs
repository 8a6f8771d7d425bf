//! Core types for Giftify.
//!
//! This module provides type-safe wrappers for catalog and identity concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod quantity;
pub mod user;

pub use id::ProductId;
pub use price::{CurrencyCode, Price};
pub use product::Product;
pub use quantity::{Quantity, QuantityError};
pub use user::UserInfo;
