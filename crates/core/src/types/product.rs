//! Catalog product records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CurrencyCode, Price, ProductId};

/// A purchasable gift as returned by the catalog service.
///
/// Only the fields the storefront renders are typed. Everything else the
/// service sends is kept in [`Product::extra`] and handed to the item renderer
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display name.
    #[serde(alias = "title")]
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Image URL.
    #[serde(default, alias = "imageUrl", alias = "image_url")]
    pub image: Option<String>,
    /// Short marketing description.
    #[serde(default)]
    pub description: Option<String>,
    /// Provider-defined fields the storefront does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with no extra fields.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
            description: None,
            extra: Map::new(),
        }
    }

    /// Unit price in the store currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::new(self.price, CurrencyCode::USD)
    }
}
