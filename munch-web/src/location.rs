//! Browser location lookups: device geolocation, reverse geocoding and IP fallback.
use js_sys::{Object, Promise, Reflect};
use munch_core::{Coordinates, LocationAssistant, NetworkLocation, PositionUnavailable};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::PositionOptions;

use crate::dom::{fetch_json, js_error_message, window};

pub const REVERSE_GEOCODE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";
pub const IP_LOOKUP_URL: &str = "https://ipapi.co/json/";

#[must_use]
pub fn reverse_geocode_url(coords: Coordinates) -> String {
    format!(
        "{REVERSE_GEOCODE_ENDPOINT}?lat={}&lon={}&format=json",
        coords.latitude, coords.longitude
    )
}

/// Pull the display address out of a reverse-geocode response.
#[must_use]
pub fn parse_display_name(body: &Value) -> Option<String> {
    body.get("display_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Read an IP lookup response; error payloads read as `None`.
#[must_use]
pub fn parse_network_location(body: Value) -> Option<NetworkLocation> {
    if body.get("error").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    serde_json::from_value(body).ok()
}

/// Location assistant backed by public web APIs.
#[derive(Debug, Clone, Copy)]
pub struct BrowserLocator {
    timeout_ms: u32,
}

impl BrowserLocator {
    #[must_use]
    pub const fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

#[async_trait::async_trait(?Send)]
impl LocationAssistant for BrowserLocator {
    async fn lookup_address(&self, coords: Coordinates) -> Option<String> {
        match fetch_json(&reverse_geocode_url(coords), self.timeout_ms).await {
            Ok(body) => parse_display_name(&body),
            Err(err) => {
                log::warn!("Reverse geocode failed: {}", js_error_message(&err));
                None
            }
        }
    }

    async fn lookup_by_network_address(&self) -> Option<NetworkLocation> {
        match fetch_json(IP_LOOKUP_URL, self.timeout_ms).await {
            Ok(body) => parse_network_location(body),
            Err(err) => {
                log::warn!("IP location lookup failed: {}", js_error_message(&err));
                None
            }
        }
    }
}

fn position_options(timeout_ms: u32) -> Result<PositionOptions, JsValue> {
    let options = Object::new();
    Reflect::set(&options, &"enableHighAccuracy".into(), &JsValue::TRUE)?;
    Reflect::set(&options, &"timeout".into(), &JsValue::from(timeout_ms))?;
    Reflect::set(&options, &"maximumAge".into(), &JsValue::from(0))?;
    Ok(options.unchecked_into())
}

fn read_coordinates(position: &JsValue) -> Option<Coordinates> {
    let coords = Reflect::get(position, &"coords".into()).ok()?;
    let latitude = Reflect::get(&coords, &"latitude".into()).ok()?.as_f64()?;
    let longitude = Reflect::get(&coords, &"longitude".into()).ok()?.as_f64()?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

/// Ask the browser for a one-off high-accuracy position fix.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn current_position(timeout_ms: u32) -> Result<Coordinates, PositionUnavailable> {
    let geolocation = window()
        .and_then(|win| win.navigator().geolocation().ok())
        .ok_or(PositionUnavailable::Unsupported)?;
    let options = position_options(timeout_ms).map_err(|_| PositionUnavailable::Unsupported)?;

    let promise = Promise::new(&mut |resolve, reject| {
        let fail = reject.clone();
        let on_success = Closure::once_into_js(move |position: JsValue| {
            let _ = resolve.call1(&JsValue::NULL, &position);
        });
        let on_error = Closure::once_into_js(move |error: JsValue| {
            let _ = reject.call1(&JsValue::NULL, &error);
        });
        if let Err(err) = geolocation.get_current_position_with_error_callback_and_options(
            on_success.unchecked_ref(),
            Some(on_error.unchecked_ref()),
            &options,
        ) {
            let _ = fail.call1(&JsValue::NULL, &err);
        }
    });

    match JsFuture::from(promise).await {
        Ok(position) => read_coordinates(&position).ok_or(PositionUnavailable::Failed),
        Err(err) => {
            log::warn!("Geolocation failed: {}", js_error_message(&err));
            Err(PositionUnavailable::Failed)
        }
    }
}
