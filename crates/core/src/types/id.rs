//! Product identifiers.
//!
//! The catalog schema is owned by the catalog service, which may key products
//! by number or by string. [`ProductId`] accepts both on the wire and always
//! serializes back as a string.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a catalog product.
///
/// # Example
///
/// ```rust
/// # use giftify_core::ProductId;
/// let from_number: ProductId = serde_json::from_str("42").unwrap();
/// let from_string: ProductId = serde_json::from_str("\"42\"").unwrap();
/// assert_eq!(from_number, from_string);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireId::deserialize(deserializer)? {
            WireId::Text(id) => Self(id),
            WireId::Signed(id) => Self(id.to_string()),
            WireId::Unsigned(id) => Self(id.to_string()),
        })
    }
}
