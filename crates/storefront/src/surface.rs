//! Overlay surfaces on the home screen: the cart drawer and the purchase form.
//!
//! The two are mutually exclusive, so they are one tagged value rather than two
//! flags. The only way into the purchase form is the drawer's checkout action,
//! and the form only closes when the visitor dismisses it.

use serde::Serialize;

/// Which overlay, if any, is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveSurface {
    /// No overlay; the visitor is browsing the catalog.
    #[default]
    Browsing,
    /// The cart drawer is open.
    Cart,
    /// The purchase form is open.
    Checkout,
}

/// Visitor actions that move between surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceAction {
    /// Cart icon in the navbar.
    OpenCart,
    /// Drawer dismissed without checking out.
    CloseCart,
    /// Drawer's checkout button.
    Checkout,
    /// Purchase form dismissed.
    ClosePurchaseForm,
}

impl SurfaceAction {
    /// Short label for logs and breadcrumbs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OpenCart => "Opened cart drawer",
            Self::CloseCart => "Closed cart drawer",
            Self::Checkout => "Proceeded to checkout",
            Self::ClosePurchaseForm => "Closed purchase form",
        }
    }
}

impl ActiveSurface {
    /// Surface after `action`, or `None` when the action does not apply here.
    ///
    /// | from       | action              | to         |
    /// |------------|---------------------|------------|
    /// | `Browsing` | `OpenCart`          | `Cart`     |
    /// | `Cart`     | `CloseCart`         | `Browsing` |
    /// | `Cart`     | `Checkout`          | `Checkout` |
    /// | `Checkout` | `ClosePurchaseForm` | `Browsing` |
    #[must_use]
    pub const fn apply(self, action: SurfaceAction) -> Option<Self> {
        match (self, action) {
            (Self::Browsing, SurfaceAction::OpenCart) => Some(Self::Cart),
            (Self::Cart, SurfaceAction::CloseCart)
            | (Self::Checkout, SurfaceAction::ClosePurchaseForm) => Some(Self::Browsing),
            (Self::Cart, SurfaceAction::Checkout) => Some(Self::Checkout),
            _ => None,
        }
    }

    /// Whether the cart drawer is showing.
    #[must_use]
    pub const fn cart_drawer_open(self) -> bool {
        matches!(self, Self::Cart)
    }

    /// Whether the purchase form is showing.
    #[must_use]
    pub const fn purchase_form_open(self) -> bool {
        matches!(self, Self::Checkout)
    }
}
