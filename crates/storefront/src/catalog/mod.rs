//! Catalog loading.
//!
//! # Architecture
//!
//! - [`CatalogSource`] is the seam to the catalog service; [`CatalogClient`]
//!   is the HTTP implementation
//! - [`load`] performs exactly one fetch and folds the outcome into a
//!   [`CatalogResult`]. No caching and no retry loop: every trigger (mount,
//!   sign-in, sign-out, "Try Again") issues a fresh request
//! - Whether a result is still wanted is decided by the caller; see
//!   [`crate::home`]

mod client;

use async_trait::async_trait;
use giftify_core::Product;
use thiserror::Error;
use tracing::{debug, error};

pub use client::CatalogClient;

use crate::error::StorefrontError;
use crate::identity::AccessToken;

/// Message shown in the catalog panel when loading fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load products. Please try again later.";

/// Maximum number of response body characters kept for diagnostics.
const MAX_LOGGED_BODY_CHARS: usize = 500;

/// Errors that can occur when fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connect, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog service answered with a non-2xx status.
    #[error("catalog service returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body, for logs only.
        body: String,
    },

    /// Response body was not a product list.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tri-state outcome of the most recent catalog request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogResult {
    /// A request is in flight.
    #[default]
    Pending,
    /// The service returned this product list, in service order.
    Success(Vec<Product>),
    /// The request failed; the message is safe to display.
    Failure(String),
}

impl CatalogResult {
    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Loaded products, if the last request succeeded.
    #[must_use]
    pub fn products(&self) -> Option<&[Product]> {
        match self {
            Self::Success(products) => Some(products),
            _ => None,
        }
    }

    /// Display message, if the last request failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure(message) => Some(message),
            _ => None,
        }
    }
}

/// Source of the product list.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full product list, sending `token` as a bearer credential
    /// when present.
    async fn fetch_products(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<Product>, CatalogError>;
}

/// Fetch the catalog once and fold the outcome into a [`CatalogResult`].
///
/// The underlying error is logged; the returned failure carries only
/// [`LOAD_FAILED_MESSAGE`].
pub async fn load(source: &dyn CatalogSource, token: Option<&AccessToken>) -> CatalogResult {
    let authenticated = token.is_some();
    match source.fetch_products(token).await {
        Ok(products) => {
            debug!(count = products.len(), authenticated, "Catalog loaded");
            CatalogResult::Success(products)
        }
        Err(e) => {
            error!(error = %e, authenticated, "Failed to fetch products");
            CatalogResult::Failure(StorefrontError::from(e).user_message().to_string())
        }
    }
}

/// Keep the first characters of a response body for diagnostics.
fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_LOGGED_BODY_CHARS).collect()
}
