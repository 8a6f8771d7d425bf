//! Identity provider error types.

use thiserror::Error;

/// Errors reported by the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The operation needs a signed-in visitor.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Sign-in could not be started or completed.
    #[error("sign-in failed: {0}")]
    SignIn(String),

    /// Sign-out could not be completed.
    #[error("sign-out failed: {0}")]
    SignOut(String),

    /// The userinfo lookup failed.
    #[error("user info unavailable: {0}")]
    UserInfo(String),

    /// No access token could be obtained.
    #[error("access token unavailable: {0}")]
    AccessToken(String),

    /// The provider does not implement this operation.
    #[error("identity provider does not support {0}")]
    Unsupported(&'static str),
}
