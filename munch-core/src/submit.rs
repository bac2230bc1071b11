//! Order submission: validation, snapshot, history append and cart reset.
//!
//! Submission is two-phase for payment methods that need an external
//! confirmation (UPI QR). [`OrderSubmitter::begin`] then hands back a
//! [`PendingPayment`] and the append-and-clear only runs once the payment view
//! is dismissed and [`OrderSubmitter::complete`] is called with its token.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::KeyValueStore;
use crate::config::CheckoutConfig;
use crate::error::{SubmissionError, ValidationError};
use crate::history::OrderHistory;
use crate::money::Money;
use crate::order::{Customer, Order, OrderType, PaymentMethod};
use crate::store::CartStore;

/// Raw checkout form values as read from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutForm {
    pub name: String,
    pub phone: String,
    /// Address typed by the customer.
    pub address: String,
    /// Address text filled in by location detection.
    pub detected_location: String,
    pub order_type: String,
    pub table_number: String,
    pub payment: String,
}

impl CheckoutForm {
    /// The customer's own address wins over a detected one.
    #[must_use]
    pub fn resolved_address(&self) -> &str {
        let typed = self.address.trim();
        if typed.is_empty() {
            self.detected_location.trim()
        } else {
            typed
        }
    }
}

/// Keep only the digits of a table-number entry.
#[must_use]
pub fn sanitize_table_number(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Check the form against the cart in a fixed order and build the customer
/// record. The first failing check wins.
///
/// # Errors
///
/// Returns the [`ValidationError`] describing the first missing or invalid field.
pub fn validate_checkout(
    form: &CheckoutForm,
    cart_is_empty: bool,
    config: &CheckoutConfig,
) -> Result<Customer, ValidationError> {
    if cart_is_empty {
        return Err(ValidationError::EmptyCart);
    }
    let order_type = OrderType::parse(&form.order_type).ok_or(ValidationError::MissingOrderType)?;
    let name = form.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let phone = form.phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::MissingPhone);
    }

    let (address, table_number) = match order_type {
        OrderType::Delivery => {
            let address = form.resolved_address();
            if address.chars().count() < config.min_address_len {
                return Err(ValidationError::InvalidAddress);
            }
            (address.to_string(), None)
        }
        OrderType::DineIn => {
            let table = sanitize_table_number(&form.table_number);
            if table.is_empty() {
                return Err(ValidationError::MissingTableNumber);
            }
            (format!("Table {table}"), Some(table))
        }
    };

    let payment = form.payment.trim();
    Ok(Customer {
        name: name.to_string(),
        address,
        phone: phone.to_string(),
        payment_method: (!payment.is_empty()).then(|| PaymentMethod::from(payment.to_string())),
        order_type,
        table_number,
    })
}

/// Single-use handle for an order awaiting payment confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingToken(u64);

impl PendingToken {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PendingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the payment view needs to show while an order waits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayment {
    pub token: PendingToken,
    pub method: PaymentMethod,
    pub upi_id: String,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub history_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionOutcome {
    Placed(PlacedOrder),
    AwaitingPayment(PendingPayment),
}

#[derive(Debug)]
pub struct OrderSubmitter {
    config: CheckoutConfig,
    pending: HashMap<PendingToken, Order>,
    next_token: u64,
}

impl Default for OrderSubmitter {
    fn default() -> Self {
        Self::new(CheckoutConfig::default())
    }
}

impl OrderSubmitter {
    #[must_use]
    pub fn new(config: CheckoutConfig) -> Self {
        Self {
            config,
            pending: HashMap::new(),
            next_token: 1,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Validate and snapshot the cart into an order.
    ///
    /// Immediate payment methods record the order and clear the cart now.
    /// Deferred methods park the snapshot and return a token for [`Self::complete`].
    /// A valid submission supersedes any order still waiting for payment, so
    /// only the latest snapshot of the cart can be recorded.
    ///
    /// # Errors
    ///
    /// Returns a validation error (cart untouched) or a storage error when the
    /// history cannot be written (cart untouched, so the customer can retry).
    pub fn begin<S: KeyValueStore>(
        &mut self,
        form: &CheckoutForm,
        cart: &mut CartStore<S>,
        history: &OrderHistory<S>,
        placed_at: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let customer = validate_checkout(form, cart.cart().is_empty(), &self.config)?;
        let deferred = customer
            .payment_method
            .as_ref()
            .filter(|method| self.config.is_deferred(method))
            .cloned();
        let order = Order::new(cart.snapshot(), self.config.tax_rate_bp, customer, placed_at);
        self.drop_superseded();

        if let Some(method) = deferred {
            let token = PendingToken(self.next_token);
            self.next_token += 1;
            let pending = PendingPayment {
                token,
                method,
                upi_id: self.config.upi_id.clone(),
                total: order.total(),
            };
            log::debug!("Order {token} awaiting {} confirmation", pending.method.code());
            self.pending.insert(token, order);
            return Ok(SubmissionOutcome::AwaitingPayment(pending));
        }

        Self::record(order, cart, history).map(SubmissionOutcome::Placed)
    }

    /// Record a parked order after its payment view was dismissed.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::UnknownToken`] for unknown or already used
    /// tokens, or a storage error (the order stays parked for a retry).
    pub fn complete<S: KeyValueStore>(
        &mut self,
        token: PendingToken,
        cart: &mut CartStore<S>,
        history: &OrderHistory<S>,
    ) -> Result<PlacedOrder, SubmissionError> {
        let order = self
            .pending
            .remove(&token)
            .ok_or(SubmissionError::UnknownToken(token))?;
        match history.append(&order) {
            Ok(history_len) => {
                cart.clear();
                Ok(PlacedOrder { order, history_len })
            }
            Err(err) => {
                self.pending.insert(token, order);
                Err(err.into())
            }
        }
    }

    /// Drop a parked order without recording it.
    pub fn cancel(&mut self, token: PendingToken) -> bool {
        self.pending.remove(&token).is_some()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn drop_superseded(&mut self) {
        for token in self.pending.keys() {
            log::debug!("Order {token} superseded by a new submission");
        }
        self.pending.clear();
    }

    fn record<S: KeyValueStore>(
        order: Order,
        cart: &mut CartStore<S>,
        history: &OrderHistory<S>,
    ) -> Result<PlacedOrder, SubmissionError> {
        let history_len = history.append(&order)?;
        cart.clear();
        Ok(PlacedOrder { order, history_len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(order_type: &str) -> CheckoutForm {
        CheckoutForm {
            name: "A".to_string(),
            phone: "1".to_string(),
            order_type: order_type.to_string(),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn checks_run_in_fixed_order() {
        let cfg = CheckoutConfig::default();
        let blank = CheckoutForm::default();
        assert_eq!(
            validate_checkout(&blank, true, &cfg),
            Err(ValidationError::EmptyCart)
        );
        assert_eq!(
            validate_checkout(&blank, false, &cfg),
            Err(ValidationError::MissingOrderType)
        );
        let mut f = form("delivery");
        f.name = "  ".to_string();
        assert_eq!(
            validate_checkout(&f, false, &cfg),
            Err(ValidationError::MissingName)
        );
        f.name = "A".to_string();
        f.phone.clear();
        assert_eq!(
            validate_checkout(&f, false, &cfg),
            Err(ValidationError::MissingPhone)
        );
        f.phone = "1".to_string();
        assert_eq!(
            validate_checkout(&f, false, &cfg),
            Err(ValidationError::InvalidAddress)
        );
        assert_eq!(
            validate_checkout(&form("dinein"), false, &cfg),
            Err(ValidationError::MissingTableNumber)
        );
    }

    #[test]
    fn delivery_falls_back_to_detected_location() {
        let cfg = CheckoutConfig::default();
        let mut f = form("delivery");
        f.address = "abc".to_string();
        assert_eq!(
            validate_checkout(&f, false, &cfg),
            Err(ValidationError::InvalidAddress)
        );
        f.address.clear();
        f.detected_location = "Park Street, Kolkata".to_string();
        let customer = validate_checkout(&f, false, &cfg).unwrap();
        assert_eq!(customer.address, "Park Street, Kolkata");
        assert_eq!(customer.table_number, None);
    }

    #[test]
    fn dine_in_labels_the_table() {
        let cfg = CheckoutConfig::default();
        let mut f = form("dinein");
        f.table_number = "T-12".to_string();
        f.payment = "Card".to_string();
        let customer = validate_checkout(&f, false, &cfg).unwrap();
        assert_eq!(customer.address, "Table 12");
        assert_eq!(customer.table_number.as_deref(), Some("12"));
        assert_eq!(customer.payment_method, Some(PaymentMethod::Card));

        f.table_number = "abc".to_string();
        assert_eq!(
            validate_checkout(&f, false, &cfg),
            Err(ValidationError::MissingTableNumber)
        );
    }

    #[test]
    fn default_submitter_issues_tokens_from_one() {
        let submitter = OrderSubmitter::default();
        assert_eq!(submitter.next_token, 1);
        assert_eq!(submitter.pending_count(), 0);
        assert_eq!(submitter.config(), &CheckoutConfig::default());
    }

    #[test]
    fn table_numbers_keep_digits_only() {
        assert_eq!(sanitize_table_number(" 1a2 "), "12");
        assert_eq!(sanitize_table_number("x"), "");
    }
}
