use js_sys::{Array, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, Response, Storage, Window};

/// Retrieve the global `window` object, if running in a browser.
#[must_use]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Log an error message to the browser console.
pub fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from(message));
}

/// A promise that rejects once `timeout_ms` has elapsed.
fn reject_after(window: &Window, timeout_ms: u32) -> Promise {
    let delay = i32::try_from(timeout_ms).unwrap_or(i32::MAX);
    Promise::new(&mut |_resolve, reject| {
        let timer = Closure::once_into_js(move || {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("request timed out"));
        });
        let _ = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(timer.unchecked_ref(), delay);
    })
}

/// Fetch `url` as JSON, giving up after `timeout_ms`.
///
/// # Errors
/// Returns an error if no browser window is available, the request fails or
/// times out, the response status is not 2xx, or the body is not JSON.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn fetch_json(url: &str, timeout_ms: u32) -> Result<serde_json::Value, JsValue> {
    let window = window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let request = Request::new_with_str(url)?;
    request.headers().set("Accept", "application/json")?;

    let fetch = window.fetch_with_request(&request);
    let timeout = reject_after(&window, timeout_ms);
    let raced = Promise::race(&Array::of2(&fetch, &timeout));
    let response: Response = JsFuture::from(raced).await?.dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }

    let body = JsFuture::from(response.text()?).await?;
    let text = body
        .as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))?;
    serde_json::from_str(&text).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Access the browser `localStorage` handle.
///
/// # Errors
/// Returns an error if the browser window cannot be accessed or `localStorage` is unavailable.
pub fn local_storage() -> Result<Storage, JsValue> {
    window()
        .ok_or_else(|| JsValue::from_str("window unavailable"))?
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("localStorage unavailable"))
}
