//! Unified error handling with Sentry integration.
//!
//! Module errors convert into [`StorefrontError`]. Nothing in this crate lets
//! an error escape to the page: failures are logged, captured by Sentry via
//! the tracing layer, and turned into a safe message with
//! [`StorefrontError::user_message`].

use giftify_core::UserInfo;
use thiserror::Error;

use crate::catalog::{CatalogError, LOAD_FAILED_MESSAGE};
use crate::config::ConfigError;
use crate::identity::IdentityError;

/// Storefront-level error type.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Catalog service operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl StorefrontError {
    /// Message safe to show the visitor.
    ///
    /// Never includes backend detail such as status codes or response bodies.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "The store is temporarily unavailable.",
            Self::Identity(err) => match err {
                IdentityError::SignIn(_) | IdentityError::Unsupported(_) => {
                    "Sign-in is unavailable right now. Please try again later."
                }
                IdentityError::SignOut(_) => "Sign-out did not complete. Please try again.",
                _ => "We couldn't load your account details.",
            },
            Self::Catalog(_) => LOAD_FAILED_MESSAGE,
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from the visitor's profile.
///
/// Call this once user info arrives so later errors are attributed.
pub fn set_sentry_user(user: &UserInfo) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: user.sub.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the visitor.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Opened cart drawer", Some(&[("items", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
