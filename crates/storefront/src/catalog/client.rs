//! HTTP client for the catalog service.
//!
//! `GET {base}/api/products`, with `Authorization: Bearer <token>` only when
//! the visitor is signed in.

use std::sync::Arc;

use async_trait::async_trait;
use giftify_core::Product;
use reqwest::header::{ACCEPT, HeaderValue};
use tracing::instrument;
use url::Url;

use super::{CatalogError, CatalogSource, truncate_body};
use crate::config::CatalogConfig;
use crate::identity::AccessToken;

/// Client for the catalog service.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    products_url: Url,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                products_url: config.products_url().clone(),
            }),
        })
    }

    /// Endpoint this client fetches from.
    #[must_use]
    pub fn products_url(&self) -> &Url {
        &self.inner.products_url
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    #[instrument(skip(self, token), fields(url = %self.inner.products_url, authenticated = token.is_some()))]
    async fn fetch_products(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<Product>, CatalogError> {
        let mut request = self
            .inner
            .client
            .get(self.inner.products_url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate_body(&response_text),
                "Catalog service returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: truncate_body(&response_text),
            });
        }

        serde_json::from_str::<Vec<Product>>(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate_body(&response_text),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("products_url", &self.inner.products_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_endpoint() {
        let config = CatalogConfig::new("http://127.0.0.1:8080/shop").unwrap();
        let client = CatalogClient::new(&config).unwrap();
        assert_eq!(
            client.products_url().as_str(),
            "http://127.0.0.1:8080/shop/api/products"
        );
        assert!(format!("{client:?}").contains("/shop/api/products"));
    }
}
