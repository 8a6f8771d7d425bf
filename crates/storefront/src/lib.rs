//! Giftify storefront home screen.
//!
//! Client-side orchestration for the landing page: catalog loading, session
//! tracking, the shared cart and the cart-to-checkout handoff. The crate
//! produces render models and never markup; see [`home::HomeView`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod home;
pub mod identity;
pub mod observability;
pub mod surface;

pub use home::{Home, HomeState, HomeView};
