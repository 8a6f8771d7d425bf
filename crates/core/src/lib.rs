//! Giftify Core - Shared domain types.
//!
//! This crate provides the types exchanged between the Giftify storefront
//! orchestration layer and its collaborators (catalog service, identity
//! provider, presentation components).
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and usable from any renderer.
//!
//! # Modules
//!
//! - [`types`] - Product records, prices, quantities and user identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
