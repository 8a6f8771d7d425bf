//! Cart drawer to purchase form handoff.

use std::sync::Arc;

use giftify_core::{Product, ProductId, Quantity};
use giftify_integration_tests::{FakeIdentity, ScriptedCatalog, home_with};
use giftify_storefront::Home;
use giftify_storefront::surface::ActiveSurface;
use rust_decimal::Decimal;
use serde_json::json;

fn qty(n: u32) -> Quantity {
    Quantity::new(n).expect("positive quantity")
}

async fn signed_in_home_with_cart() -> Home {
    let home = home_with(
        Arc::new(FakeIdentity::new(true)),
        Arc::new(ScriptedCatalog::new()),
    );
    home.mount();
    home.settle().await;

    let cart = home.cart();
    cart.add(Product::new("A", "Orchid", Decimal::new(3250, 2)), qty(2));
    cart.add(Product::new("B", "Tea Sampler", Decimal::from(18)), qty(1));
    home
}

#[tokio::test]
async fn test_checkout_closes_drawer_and_opens_form() {
    let home = signed_in_home_with_cart().await;
    assert_eq!(home.render().navbar.cart_count, 3);

    assert!(home.open_cart());
    let view = home.render();
    assert!(view.cart_drawer.open);
    assert!(view.purchase_form.is_none());
    assert_eq!(view.navbar.cart_count, 3);
    assert_eq!(view.cart_drawer.total_quantity, 3);

    assert!(home.checkout());
    let view = home.render();
    assert!(!view.cart_drawer.open);
    let form = view.purchase_form.expect("purchase form open");
    assert_eq!(form.total_quantity, 3);
    assert_eq!(form.subtotal, "$83.00");
    assert_eq!(form.lines.len(), 2);
    assert_eq!(form.lines[0].product_id, ProductId::new("A"));
    assert_eq!(form.lines[0].quantity, 2);
    assert_eq!(form.lines[0].line_total, "$65.00");
    assert_eq!(view.navbar.cart_count, 3);

    assert!(home.close_purchase_form());
    let view = home.render();
    assert!(!view.cart_drawer.open);
    assert!(view.purchase_form.is_none());
    assert_eq!(view.navbar.cart_count, 3);
}

#[tokio::test]
async fn test_checkout_is_one_state_change() {
    let home = signed_in_home_with_cart().await;
    home.open_cart();
    let mut rx = home.subscribe();

    home.checkout();

    assert!(rx.has_changed().expect("home alive"));
    assert_eq!(rx.borrow_and_update().surface, ActiveSurface::Checkout);
    assert!(!rx.has_changed().expect("home alive"));
}

#[tokio::test]
async fn test_cart_icon_ignored_during_checkout() {
    let home = signed_in_home_with_cart().await;
    home.open_cart();
    home.checkout();

    assert!(!home.open_cart());
    assert!(!home.close_cart());
    assert!(!home.checkout());
    assert_eq!(home.state().surface, ActiveSurface::Checkout);
}

#[tokio::test]
async fn test_drawer_close_without_checkout() {
    let home = signed_in_home_with_cart().await;
    home.open_cart();

    assert!(home.close_cart());
    let view = home.render();
    assert!(!view.cart_drawer.open);
    assert!(view.purchase_form.is_none());
    assert!(!home.close_purchase_form());
}

#[tokio::test]
async fn test_cart_edits_show_in_open_form() {
    let home = signed_in_home_with_cart().await;
    home.open_cart();
    home.checkout();

    home.cart().set_quantity(&ProductId::new("B"), 4);
    let view = home.render();
    assert_eq!(view.navbar.cart_count, 6);
    assert_eq!(view.purchase_form.expect("form open").total_quantity, 6);
}

#[tokio::test]
async fn test_view_serializes_for_renderers() {
    let home = signed_in_home_with_cart().await;
    home.open_cart();

    let value = serde_json::to_value(home.render()).expect("view serializes");

    assert_eq!(value["navbar"]["cart_count"], json!(3));
    assert_eq!(value["cart_drawer"]["open"], json!(true));
    assert_eq!(value["cart_drawer"]["subtotal"], json!("$83.00"));
    assert_eq!(value["purchase_form"], json!(null));
    assert_eq!(value["catalog"]["state"], json!("items"));
}
