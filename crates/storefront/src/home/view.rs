//! Render models for the home screen.
//!
//! Each model is the complete input of one presentation component. They are
//! derived from [`HomeState`] and the cart on every render and hold no state
//! of their own.

use giftify_core::{Product, ProductId, UserInfo};
use serde::Serialize;
use serde_json::{Map, Value};

use super::HomeState;
use crate::cart::{self, CartLine};
use crate::catalog::CatalogResult;

/// Label of the catalog retry control.
pub const RETRY_LABEL: &str = "Try Again";

/// Everything the home screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub navbar: NavbarModel,
    pub catalog: CatalogGrid,
    /// Present only while user info is loaded.
    pub user_profile: Option<UserProfileModel>,
    pub cart_drawer: CartDrawerModel,
    /// Present only while the purchase form is open.
    pub purchase_form: Option<PurchaseFormModel>,
}

/// Navbar: cart badge and auth controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavbarModel {
    pub cart_count: u32,
    pub is_authenticated: bool,
    pub user: Option<UserInfo>,
}

/// Catalog grid body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CatalogGrid {
    /// Request in flight.
    Spinner,
    /// Request failed; offer a retry.
    Error {
        message: String,
        retry_label: &'static str,
    },
    /// One item per product, in catalog order.
    Items { items: Vec<GiftItemModel> },
}

/// One catalog tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GiftItemModel {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub description: Option<String>,
    /// Provider fields passed through to the tile untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Floating identity badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfileModel {
    pub label: Option<String>,
    pub email: Option<String>,
}

/// Cart drawer contents. Always built so the drawer can animate closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartDrawerModel {
    pub open: bool,
    pub lines: Vec<CartLineModel>,
    pub total_quantity: u32,
    pub subtotal: String,
}

/// Purchase form order summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseFormModel {
    pub lines: Vec<CartLineModel>,
    pub total_quantity: u32,
    pub subtotal: String,
}

/// One cart line as displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineModel {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl HomeView {
    /// Derive the view from coordinator state and the cart lines.
    #[must_use]
    pub fn build(state: &HomeState, lines: &[CartLine], is_authenticated: bool) -> Self {
        let total_quantity = cart::badge_count(lines);
        let subtotal = cart::subtotal(lines).display();
        let line_models: Vec<CartLineModel> = lines.iter().map(CartLineModel::from).collect();

        let purchase_form = state.surface.purchase_form_open().then(|| PurchaseFormModel {
            lines: line_models.clone(),
            total_quantity,
            subtotal: subtotal.clone(),
        });

        Self {
            navbar: NavbarModel {
                cart_count: total_quantity,
                is_authenticated,
                user: state.user.clone(),
            },
            catalog: CatalogGrid::from(&state.catalog),
            user_profile: state.user.as_ref().map(UserProfileModel::from),
            cart_drawer: CartDrawerModel {
                open: state.surface.cart_drawer_open(),
                lines: line_models,
                total_quantity,
                subtotal,
            },
            purchase_form,
        }
    }
}

impl From<&CatalogResult> for CatalogGrid {
    fn from(result: &CatalogResult) -> Self {
        match result {
            CatalogResult::Pending => Self::Spinner,
            CatalogResult::Failure(message) => Self::Error {
                message: message.clone(),
                retry_label: RETRY_LABEL,
            },
            CatalogResult::Success(products) => Self::Items {
                items: products.iter().map(GiftItemModel::from).collect(),
            },
        }
    }
}

impl From<&Product> for GiftItemModel {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.unit_price().display(),
            image: product.image.clone(),
            description: product.description.clone(),
            extra: product.extra.clone(),
        }
    }
}

impl From<&UserInfo> for UserProfileModel {
    fn from(user: &UserInfo) -> Self {
        Self {
            label: user.label().map(str::to_string),
            email: user.email.clone(),
        }
    }
}

impl From<&CartLine> for CartLineModel {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            name: line.product.name.clone(),
            image: line.product.image.clone(),
            quantity: line.quantity.get(),
            unit_price: line.product.unit_price().display(),
            line_total: line.line_total().display(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use giftify_core::Quantity;
    use rust_decimal::Decimal;

    use super::*;
    use crate::surface::ActiveSurface;

    fn line(id: &str, cents: i64, count: u32) -> CartLine {
        CartLine {
            product: Product::new(id, format!("Gift {id}"), Decimal::new(cents, 2)),
            quantity: Quantity::new(count).unwrap(),
        }
    }

    #[test]
    fn test_pending_renders_spinner() {
        let view = HomeView::build(&HomeState::default(), &[], false);
        assert_eq!(view.catalog, CatalogGrid::Spinner);
        assert!(view.user_profile.is_none());
        assert!(view.purchase_form.is_none());
        assert!(!view.cart_drawer.open);
        assert_eq!(view.navbar.cart_count, 0);
    }

    #[test]
    fn test_failure_renders_retry_panel() {
        let state = HomeState {
            catalog: CatalogResult::Failure("nope".to_string()),
            ..HomeState::default()
        };
        let view = HomeView::build(&state, &[], false);
        assert_eq!(
            view.catalog,
            CatalogGrid::Error {
                message: "nope".to_string(),
                retry_label: "Try Again",
            }
        );
    }

    #[test]
    fn test_success_renders_one_item_per_product() {
        let products = vec![
            Product::new("1", "Mug", Decimal::new(899, 2)),
            Product::new("2", "Plant", Decimal::from(20)),
        ];
        let state = HomeState {
            catalog: CatalogResult::Success(products),
            ..HomeState::default()
        };
        let CatalogGrid::Items { items } = HomeView::build(&state, &[], false).catalog else {
            panic!("expected items");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, "$8.99");
        assert_eq!(items[1].name, "Plant");
    }

    #[test]
    fn test_user_profile_only_with_user() {
        let state = HomeState {
            user: Some(UserInfo {
                display_name: Some("Ana".to_string()),
                ..UserInfo::default()
            }),
            ..HomeState::default()
        };
        let view = HomeView::build(&state, &[], true);
        assert_eq!(
            view.user_profile.unwrap().label.as_deref(),
            Some("Ana")
        );
        assert!(view.navbar.is_authenticated);
    }

    #[test]
    fn test_checkout_summary_matches_drawer() {
        let lines = [line("a", 1000, 2), line("b", 250, 1)];
        let state = HomeState {
            surface: ActiveSurface::Checkout,
            ..HomeState::default()
        };
        let view = HomeView::build(&state, &lines, true);

        assert!(!view.cart_drawer.open);
        let form = view.purchase_form.unwrap();
        assert_eq!(form.total_quantity, 3);
        assert_eq!(form.subtotal, "$22.50");
        assert_eq!(form.lines, view.cart_drawer.lines);
        assert_eq!(view.navbar.cart_count, 3);
    }

    #[test]
    fn test_catalog_grid_serializes_tagged() {
        let json = serde_json::to_value(CatalogGrid::Spinner).unwrap();
        assert_eq!(json, serde_json::json!({"state": "spinner"}));
    }
}
