//! Identity provider adapter.
//!
//! # Architecture
//!
//! - [`IdentityProvider`] is the seam to the hosted identity service (sign-in
//!   redirect, token storage and userinfo endpoint all live behind it)
//! - [`AuthSession`] wraps a provider and applies the storefront's
//!   degradation rules: a failed token fetch means "browse unauthenticated",
//!   a failed userinfo lookup means "show no identity"
//! - [`AnonymousIdentity`] is used when no identity provider is configured
//!
//! Tokens are wrapped in [`AccessToken`] so they never reach `Debug` output
//! or logs.

mod error;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use giftify_core::UserInfo;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

pub use error::IdentityError;

/// Bearer token issued by the identity provider.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Raw token value, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Client of the hosted identity provider.
///
/// Only [`IdentityProvider::is_authenticated`] is synchronous; it reports the
/// provider's current view of the session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the visitor currently holds a session.
    fn is_authenticated(&self) -> bool;

    /// Start or complete the sign-in flow.
    async fn sign_in(&self) -> Result<(), IdentityError>;

    /// End the session.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Fetch the visitor's basic profile.
    async fn get_basic_user_info(&self) -> Result<UserInfo, IdentityError>;

    /// Fetch a bearer token for API calls.
    async fn get_access_token(&self) -> Result<AccessToken, IdentityError>;

    /// Receiver that changes whenever the authentication flag does.
    ///
    /// Providers that cannot publish changes return `None`; their hosts call
    /// `Home::sync_session` instead.
    fn watch_authenticated(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}

/// Session view used by the home screen.
///
/// Cheap to clone; clones share the same provider.
#[derive(Clone)]
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthSession {
    /// Wrap an identity provider.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Session with no identity provider behind it.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Arc::new(AnonymousIdentity))
    }

    /// Current authentication flag.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.provider.is_authenticated()
    }

    /// Session change notifications, if the provider publishes them.
    #[must_use]
    pub fn watch_authenticated(&self) -> Option<watch::Receiver<bool>> {
        self.provider.watch_authenticated()
    }

    /// Sign in through the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; it is also logged.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<(), IdentityError> {
        self.provider
            .sign_in()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Sign-in failed"))
    }

    /// Sign out through the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; it is also logged.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.provider
            .sign_out()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Sign-out failed"))
    }

    /// Fetch the visitor's basic profile.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotAuthenticated`] without calling the
    /// provider when there is no session, or the provider's error.
    #[instrument(skip(self))]
    pub async fn user_info(&self) -> Result<UserInfo, IdentityError> {
        if !self.is_authenticated() {
            return Err(IdentityError::NotAuthenticated);
        }
        self.provider
            .get_basic_user_info()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to fetch user info"))
    }

    /// Token for the catalog request, if one can be had.
    ///
    /// Returns `None` when unauthenticated. A provider failure is logged and
    /// also yields `None`, so the caller proceeds unauthenticated.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Option<AccessToken> {
        if !self.is_authenticated() {
            return None;
        }
        match self.provider.get_access_token().await {
            Ok(token) => {
                debug!("Access token acquired");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch access token, continuing unauthenticated");
                None
            }
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("is_authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// Provider for deployments without sign-in. Never authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    fn is_authenticated(&self) -> bool {
        false
    }

    async fn sign_in(&self) -> Result<(), IdentityError> {
        Err(IdentityError::Unsupported("sign-in"))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn get_basic_user_info(&self) -> Result<UserInfo, IdentityError> {
        Err(IdentityError::NotAuthenticated)
    }

    async fn get_access_token(&self) -> Result<AccessToken, IdentityError> {
        Err(IdentityError::NotAuthenticated)
    }
}
