//! JS-facing facade over the ordering session.
//!
//! Page handlers (menu +/- buttons, checkout buttons, payment modal events)
//! call into [`FoodMunch`]. The session is never borrowed while a JS hook
//! runs, so hooks may call back into the facade.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::Utc;
use js_sys::Function;
use munch_core::{
    CartChange, CheckoutConfig, CheckoutForm, ConfigError, Money, OrderingSession, PendingToken,
    Presenter, SubmissionOutcome, detect_address, present_location_error, present_submission,
};
use wasm_bindgen::prelude::*;

use crate::dom::js_error_message;
use crate::location::{BrowserLocator, current_position};
use crate::presenter::JsPresenter;
use crate::storage::LocalStore;
use crate::to_js;

/// Resolve the session config from an optional JSON override.
///
/// # Errors
///
/// Returns an error if the override is not a valid config document.
pub fn session_config(override_json: Option<&str>) -> Result<CheckoutConfig, ConfigError> {
    override_json.map_or_else(
        || Ok(CheckoutConfig::default_config()),
        CheckoutConfig::from_json,
    )
}

#[wasm_bindgen]
pub struct FoodMunch {
    session: RefCell<OrderingSession<LocalStore>>,
    presenter: JsPresenter,
    changes: Rc<RefCell<Vec<CartChange>>>,
    listeners: RefCell<Vec<Function>>,
    checkout_open: Cell<bool>,
}

#[wasm_bindgen]
impl FoodMunch {
    /// Restore the stored cart and wire the page's presentation hooks.
    ///
    /// # Errors
    /// Returns an error if `config_json` is given but invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(hooks: JsValue, config_json: Option<String>) -> Result<Self, JsValue> {
        let config = session_config(config_json.as_deref())
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let presenter = JsPresenter::new(hooks, config.currency_symbol.clone());
        let mut session = OrderingSession::new(LocalStore, config);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let queue = Rc::clone(&changes);
        session.subscribe(move |change| queue.borrow_mut().push(change.clone()));
        // No page listeners yet; each gets its own replay in `onCartChange`.
        changes.borrow_mut().clear();
        log::info!(
            "FoodMunch ready with {} items in cart",
            session.total_quantity()
        );
        Ok(Self {
            session: RefCell::new(session),
            presenter,
            changes,
            listeners: RefCell::new(Vec::new()),
            checkout_open: Cell::new(false),
        })
    }

    /// Register a callback receiving `{id, quantity, totalQuantity}` after each cart change.
    /// The current cart is replayed to it first, with `id: null` for the whole-cart entry.
    #[wasm_bindgen(js_name = onCartChange)]
    pub fn on_cart_change(&self, callback: Function) {
        let replay = self.session.borrow().cart().current_state();
        notify(std::slice::from_ref(&callback), &replay);
        self.listeners.borrow_mut().push(callback);
    }

    #[wasm_bindgen(js_name = setQuantity)]
    pub fn set_quantity(&self, id: &str, name: &str, price: f64, quantity: i32) -> u32 {
        let total = self.session.borrow_mut().set_quantity(
            id,
            name,
            Money::from_major(price),
            i64::from(quantity),
        );
        self.after_mutation();
        total
    }

    /// Menu +/- press. Returns the new quantity for `id`.
    #[wasm_bindgen(js_name = changeQuantity)]
    pub fn change_quantity(&self, id: &str, name: &str, price: f64, delta: i32) -> u32 {
        let change = self.session.borrow_mut().change_quantity(
            id,
            name,
            Money::from_major(price),
            i64::from(delta),
        );
        self.after_mutation();
        if change.added {
            let view = self.session.borrow().checkout_view();
            self.presenter.show_added_toast(name, &view);
        }
        change.quantity
    }

    pub fn increment(&self, id: &str) -> Option<u32> {
        let quantity = self.session.borrow_mut().increment(id);
        self.after_mutation();
        quantity
    }

    pub fn decrement(&self, id: &str) -> Option<u32> {
        let quantity = self.session.borrow_mut().decrement(id);
        self.after_mutation();
        quantity
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.session.borrow_mut().remove(id);
        self.after_mutation();
        removed
    }

    pub fn clear(&self) {
        self.session.borrow_mut().clear();
        self.after_mutation();
    }

    #[wasm_bindgen(js_name = totalQuantity)]
    pub fn total_quantity(&self) -> u32 {
        self.session.borrow().total_quantity()
    }

    #[wasm_bindgen(js_name = totalPrice)]
    pub fn total_price(&self) -> f64 {
        self.session.borrow().total_price().to_major()
    }

    #[wasm_bindgen(js_name = quantityOf)]
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.session.borrow().cart().quantity_of(id)
    }

    /// # Errors
    /// Returns an error if the view cannot be converted to a JS value.
    #[wasm_bindgen(js_name = checkoutView)]
    pub fn checkout_view(&self) -> Result<JsValue, JsValue> {
        let view = self.session.borrow().checkout_view();
        to_js(&view).map_err(Into::into)
    }

    #[wasm_bindgen(js_name = openCheckout)]
    pub fn open_checkout(&self) {
        self.checkout_open.set(true);
        let view = self.session.borrow().checkout_view();
        self.presenter.show_checkout(&view);
    }

    #[wasm_bindgen(js_name = closeCheckout)]
    pub fn close_checkout(&self) {
        self.checkout_open.set(false);
    }

    /// Submit the checkout form. Both "Place Order" and "Confirm" buttons use this.
    /// Resolves to the outcome, or `null` when the order was rejected.
    ///
    /// # Errors
    /// Returns an error if `form` does not have the checkout form shape.
    #[wasm_bindgen(js_name = placeOrder)]
    pub fn place_order(&self, form: JsValue) -> Result<JsValue, JsValue> {
        let form: CheckoutForm = serde_wasm_bindgen::from_value(form)?;
        let result = self
            .session
            .borrow_mut()
            .begin_submission(&form, Utc::now());
        if matches!(result, Ok(SubmissionOutcome::Placed(_))) {
            self.checkout_open.set(false);
        }
        self.after_mutation();
        present_submission(&self.presenter, &result);
        to_js(&result.ok()).map_err(Into::into)
    }

    /// Payment view dismissed: record the parked order and clear the cart.
    ///
    /// # Errors
    /// Returns an error if the placed order cannot be converted to a JS value.
    #[wasm_bindgen(js_name = completePayment)]
    pub fn complete_payment(&self, token: u32) -> Result<JsValue, JsValue> {
        let result = self
            .session
            .borrow_mut()
            .complete_submission(PendingToken::new(u64::from(token)));
        self.after_mutation();
        match result {
            Ok(placed) => {
                self.checkout_open.set(false);
                self.presenter.show_order_placed(&placed);
                to_js(&placed).map_err(Into::into)
            }
            Err(err) => {
                log::warn!("Payment completion failed: {err}");
                self.presenter.alert(&err.user_message());
                Ok(JsValue::NULL)
            }
        }
    }

    #[wasm_bindgen(js_name = cancelPayment)]
    pub fn cancel_payment(&self, token: u32) -> bool {
        self.session
            .borrow_mut()
            .cancel_submission(PendingToken::new(u64::from(token)))
    }

    /// # Errors
    /// Returns an error if the history cannot be converted to a JS value.
    #[wasm_bindgen(js_name = orderHistory)]
    pub fn order_history(&self) -> Result<JsValue, JsValue> {
        let orders = self.session.borrow().order_history();
        to_js(&orders).map_err(Into::into)
    }

    /// Timeout applied to each location lookup, for [`detect_location`].
    #[wasm_bindgen(getter, js_name = lookupTimeoutMs)]
    pub fn lookup_timeout_ms(&self) -> u32 {
        self.session.borrow().config().lookup_timeout_ms
    }
}

impl FoodMunch {
    fn after_mutation(&self) {
        let pending: Vec<CartChange> = self.changes.borrow_mut().drain(..).collect();
        if pending.is_empty() {
            return;
        }
        let listeners = self.listeners.borrow().clone();
        notify(&listeners, &pending);
        if self.checkout_open.get() {
            let view = self.session.borrow().checkout_view();
            self.presenter.show_checkout(&view);
        }
    }
}

fn notify(listeners: &[Function], changes: &[CartChange]) {
    for change in changes {
        let Ok(arg) = to_js(change) else {
            continue;
        };
        for listener in listeners {
            if let Err(err) = listener.call1(&JsValue::NULL, &arg) {
                log::error!("Cart change listener threw: {}", js_error_message(&err));
            }
        }
    }
}

/// Detect the customer's address, alerting through `hooks` with a retry hint
/// on failure. Resolves to `{deliveryLocation, customerAddress}` or `null`.
///
/// # Errors
/// Returns an error if the detected address cannot be converted to a JS value.
#[wasm_bindgen(js_name = detectLocation)]
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn detect_location(hooks: JsValue, timeout_ms: Option<u32>) -> Result<JsValue, JsValue> {
    let timeout_ms =
        timeout_ms.unwrap_or_else(|| CheckoutConfig::default_config().lookup_timeout_ms);
    match locate(timeout_ms).await {
        Ok(detected) => to_js(&detected).map_err(Into::into),
        Err(err) => {
            present_location_error(&JsPresenter::new(hooks, ""), err);
            Ok(JsValue::NULL)
        }
    }
}

#[allow(clippy::future_not_send)]
async fn locate(timeout_ms: u32) -> Result<munch_core::DetectedAddress, munch_core::LocationError> {
    let fix = current_position(timeout_ms).await;
    detect_address(&BrowserLocator::new(timeout_ms), fix).await
}

#[wasm_bindgen(js_name = foodEmoji)]
#[must_use]
pub fn food_emoji(name: &str) -> String {
    munch_core::food_emoji(name).to_string()
}

#[wasm_bindgen(js_name = escapeHtml)]
#[must_use]
pub fn escape_html(text: &str) -> String {
    munch_core::escape_html(text)
}

#[wasm_bindgen(js_name = sanitizeTableNumber)]
#[must_use]
pub fn sanitize_table_number(raw: &str) -> String {
    munch_core::sanitize_table_number(raw)
}
