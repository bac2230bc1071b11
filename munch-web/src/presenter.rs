//! Presenter that forwards render instructions to page-provided JS hooks.
//!
//! The page passes an object such as
//! `{ openCheckout, showToast, showPayment, showOrderPlaced, alert }`.
//! Missing hooks are logged and skipped.
use js_sys::{Function, Reflect};
use munch_core::{CheckoutView, PendingPayment, PlacedOrder, Presenter};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::dom::{js_error_message, window};

pub struct JsPresenter {
    hooks: JsValue,
    currency_symbol: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutPayload<'a> {
    #[serde(flatten)]
    view: &'a CheckoutView,
    subtotal_text: String,
    tax_text: String,
    total_text: String,
    confirmation_lines: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToastPayload<'a> {
    name: &'a str,
    emoji: &'static str,
    summary: String,
}

impl JsPresenter {
    #[must_use]
    pub fn new(hooks: JsValue, currency_symbol: impl Into<String>) -> Self {
        Self {
            hooks,
            currency_symbol: currency_symbol.into(),
        }
    }

    fn hook(&self, name: &str) -> Option<Function> {
        let hook = Reflect::get(&self.hooks, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok());
        if hook.is_none() {
            log::error!("Presentation hook `{name}` is not available; skipping");
        }
        hook
    }

    fn call<T: Serialize + ?Sized>(&self, name: &str, payload: &T) {
        let Some(hook) = self.hook(name) else {
            return;
        };
        let arg = match crate::to_js(payload) {
            Ok(arg) => arg,
            Err(err) => {
                log::error!("Failed to encode `{name}` payload: {err}");
                return;
            }
        };
        if let Err(err) = hook.call1(&self.hooks, &arg) {
            log::error!("Presentation hook `{name}` threw: {}", js_error_message(&err));
        }
    }

    fn checkout_payload<'a>(&self, view: &'a CheckoutView) -> CheckoutPayload<'a> {
        let symbol = self.currency_symbol.as_str();
        CheckoutPayload {
            view,
            subtotal_text: view.subtotal.display_with(symbol),
            tax_text: view.tax.display_with(symbol),
            total_text: view.total.display_with(symbol),
            confirmation_lines: view.confirmation_lines(symbol),
        }
    }
}

impl Presenter for JsPresenter {
    fn show_checkout(&self, view: &CheckoutView) {
        self.call("openCheckout", &self.checkout_payload(view));
    }

    fn show_added_toast(&self, item_name: &str, view: &CheckoutView) {
        let payload = ToastPayload {
            name: item_name,
            emoji: munch_core::food_emoji(item_name),
            summary: view.toast_summary(&self.currency_symbol),
        };
        self.call("showToast", &payload);
    }

    fn show_payment(&self, pending: &PendingPayment) {
        self.call("showPayment", pending);
    }

    fn show_order_placed(&self, placed: &PlacedOrder) {
        self.call("showOrderPlaced", placed);
    }

    fn alert(&self, message: &str) {
        if let Some(hook) = Reflect::get(&self.hooks, &JsValue::from_str("alert"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
        {
            let _ = hook.call1(&self.hooks, &JsValue::from_str(message));
            return;
        }
        match window() {
            Some(win) => {
                let _ = win.alert_with_message(message);
            }
            None => crate::dom::console_error(message),
        }
    }
}
