//! Checkout configuration
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::order::PaymentMethod;

const DEFAULT_CHECKOUT_DATA: &str =
    include_str!("../../munch-web/static/assets/data/checkout.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Tax applied on top of the subtotal, in basis points (500 = 5%).
    #[serde(default = "default_tax_rate_bp")]
    pub tax_rate_bp: u32,
    /// Minimum characters for a delivery address to be accepted.
    #[serde(default = "default_min_address_len")]
    pub min_address_len: usize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_cart_key")]
    pub cart_key: String,
    #[serde(default = "default_history_key")]
    pub history_key: String,
    /// Payment methods whose order is only recorded once the payment view is dismissed.
    #[serde(default = "default_deferred_methods")]
    pub deferred_payment_methods: Vec<String>,
    #[serde(default = "default_upi_id")]
    pub upi_id: String,
    /// Upper bound for each location lookup request.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            tax_rate_bp: default_tax_rate_bp(),
            min_address_len: default_min_address_len(),
            currency_symbol: default_currency_symbol(),
            cart_key: default_cart_key(),
            history_key: default_history_key(),
            deferred_payment_methods: default_deferred_methods(),
            upi_id: default_upi_id(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl CheckoutConfig {
    /// Parse a configuration document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CHECKOUT_DATA).unwrap_or_else(|err| {
            log::error!("Bundled checkout config is invalid, using defaults: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self::load_from_static()
    }

    /// Whether orders paid with `method` wait for the payment view to close.
    #[must_use]
    pub fn is_deferred(&self, method: &PaymentMethod) -> bool {
        self.deferred_payment_methods
            .iter()
            .any(|code| code.eq_ignore_ascii_case(method.code()))
    }
}

const fn default_tax_rate_bp() -> u32 {
    500
}

const fn default_min_address_len() -> usize {
    5
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_cart_key() -> String {
    "cart".to_string()
}

fn default_history_key() -> String {
    "orderHistory".to_string()
}

fn default_deferred_methods() -> Vec<String> {
    vec!["UPI".to_string()]
}

fn default_upi_id() -> String {
    "foodmunch@upi".to_string()
}

const fn default_lookup_timeout_ms() -> u32 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_config_matches_defaults() {
        assert_eq!(CheckoutConfig::load_from_static(), CheckoutConfig::default());
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let cfg = CheckoutConfig::from_json(r#"{"tax_rate_bp": 1200, "upi_id": "shop@upi"}"#)
            .unwrap();
        assert_eq!(cfg.tax_rate_bp, 1200);
        assert_eq!(cfg.upi_id, "shop@upi");
        assert_eq!(cfg.cart_key, "cart");
        assert_eq!(cfg.min_address_len, 5);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = CheckoutConfig::from_json(r#"{"tax_rate_bp": "lots"}"#).unwrap_err();
        assert!(err.to_string().contains("config"));
    }

    #[test]
    fn deferred_methods_match_case_insensitively() {
        let cfg = CheckoutConfig::default();
        assert!(cfg.is_deferred(&PaymentMethod::Upi));
        assert!(!cfg.is_deferred(&PaymentMethod::CashOnDelivery));
        assert!(cfg.is_deferred(&PaymentMethod::from("upi".to_string())));
    }
}
