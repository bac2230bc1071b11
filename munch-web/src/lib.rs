#![forbid(unsafe_code)]
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod bridge;
pub mod dom;
pub mod location;
pub mod logger;
pub mod presenter;
pub mod storage;

pub use bridge::FoodMunch;
pub use storage::{LocalStore, WebStorageError};

/// Convert to a plain JS value (objects rather than `Map`s, numbers for integers).
///
/// # Errors
/// Returns an error if `value` cannot be represented in JS.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);
}
