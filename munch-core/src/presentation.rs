//! Presentation contract (modals, toasts, alerts) and text helpers.
//!
//! No business logic lives behind [`Presenter`]; it only receives render
//! instructions derived from the cart and submission outcomes.
use crate::checkout::CheckoutView;
use crate::error::SubmissionError;
use crate::location::LocationError;
use crate::submit::{PendingPayment, PlacedOrder, SubmissionOutcome};

pub trait Presenter {
    /// Open (or refresh) the checkout modal.
    fn show_checkout(&self, view: &CheckoutView);

    /// "Added to cart" toast for `item_name`.
    fn show_added_toast(&self, item_name: &str, view: &CheckoutView);

    /// Payment view for a deferred-confirmation order.
    fn show_payment(&self, pending: &PendingPayment);

    /// Success popup once an order is recorded.
    fn show_order_placed(&self, placed: &PlacedOrder);

    /// Plain alert-style message.
    fn alert(&self, message: &str);
}

/// Route a submission result to the matching presenter call.
pub fn present_submission<P: Presenter + ?Sized>(
    presenter: &P,
    result: &Result<SubmissionOutcome, SubmissionError>,
) {
    match result {
        Ok(SubmissionOutcome::Placed(placed)) => presenter.show_order_placed(placed),
        Ok(SubmissionOutcome::AwaitingPayment(pending)) => presenter.show_payment(pending),
        Err(err) => presenter.alert(&err.user_message()),
    }
}

pub fn present_location_error<P: Presenter + ?Sized>(presenter: &P, err: LocationError) {
    presenter.alert(&err.to_string());
}

/// Pick a dish emoji from keywords in the item name.
#[must_use]
pub fn food_emoji(name: &str) -> &'static str {
    let name = name.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|key| name.contains(key));
    if has(&["pizza"]) {
        "🍕"
    } else if has(&["pasta"]) {
        "🍝"
    } else if has(&["salad"]) {
        "🥗"
    } else if has(&["cake", "ice", "dessert", "brownie"]) {
        "🍨"
    } else if has(&["chicken", "fish", "prawns"]) {
        "🍗"
    } else {
        "🍽"
    }
}

/// Escape text for insertion into HTML markup.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}
