//! Identity-provider user information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Basic profile of the signed-in visitor.
///
/// Field names follow common OIDC userinfo claims. Claims the storefront does
/// not use are preserved in [`UserInfo::claims`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Subject identifier.
    #[serde(default)]
    pub sub: Option<String>,
    /// Login name.
    #[serde(default)]
    pub username: Option<String>,
    /// Human-readable name.
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    /// Email address, unverified.
    #[serde(default)]
    pub email: Option<String>,
    /// Remaining provider claims.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl UserInfo {
    /// Best available label for the visitor: display name, then username,
    /// then email.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .or(self.email.as_deref())
    }
}
