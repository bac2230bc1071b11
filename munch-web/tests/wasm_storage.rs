#![cfg(target_arch = "wasm32")]

use munch_core::{CheckoutConfig, KeyValueStore, Money, OrderingSession};
use munch_web::LocalStore;
use munch_web::dom;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn scoped_config(prefix: &str) -> CheckoutConfig {
    let mut config = CheckoutConfig::default_config();
    config.cart_key = format!("{prefix}.cart");
    config.history_key = format!("{prefix}.orderHistory");
    config
}

#[wasm_bindgen_test]
fn local_store_round_trips_values() {
    let store = LocalStore;
    store.set_item("munch.test.key", "[1,2,3]").expect("write");
    assert_eq!(
        store.get_item("munch.test.key").expect("read").as_deref(),
        Some("[1,2,3]")
    );
    store.remove_item("munch.test.key").expect("remove");
    assert_eq!(store.get_item("munch.test.key").expect("read"), None);
}

#[wasm_bindgen_test]
fn session_cart_survives_reload() {
    let config = scoped_config("munch.test.reload");
    let _ = LocalStore.remove_item(&config.cart_key);

    let mut session = OrderingSession::new(LocalStore, config.clone());
    session.set_quantity("p1", "Pizza", Money::from_major(250.0), 2);
    session.set_quantity("c1", "Coke", Money::from_major(50.0), 1);
    assert!(session.cart().is_persisted());

    let reloaded = OrderingSession::new(LocalStore, config.clone());
    assert_eq!(reloaded.total_quantity(), 3);
    assert_eq!(reloaded.total_price(), Money::from_major(550.0));

    let _ = LocalStore.remove_item(&config.cart_key);
}

#[wasm_bindgen_test]
fn corrupt_stored_cart_restores_empty() {
    let config = scoped_config("munch.test.corrupt");
    LocalStore
        .set_item(&config.cart_key, "{not json")
        .expect("write");
    let session = OrderingSession::new(LocalStore, config.clone());
    assert_eq!(session.total_quantity(), 0);
    let _ = LocalStore.remove_item(&config.cart_key);
}

#[wasm_bindgen_test]
fn browser_window_is_available() {
    assert!(dom::window().is_some());
    assert!(dom::local_storage().is_ok());
}
