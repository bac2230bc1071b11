//! Orders and their customer details
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "delivery")]
    Delivery,
    #[serde(rename = "dinein")]
    DineIn,
}

impl OrderType {
    /// Parse the order-type selector value; blank or unknown values are unset.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "delivery" => Some(Self::Delivery),
            "dinein" | "dine-in" => Some(Self::DineIn),
            _ => None,
        }
    }
}

/// How the customer intends to pay. Unknown selector values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
    Upi,
    Other(String),
}

impl PaymentMethod {
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::CashOnDelivery => "COD",
            Self::Card => "Card",
            Self::Upi => "UPI",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "COD" | "CASH" => Self::CashOnDelivery,
            "CARD" => Self::Card,
            "UPI" => Self::Upi,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(value: PaymentMethod) -> Self {
        value.code().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    /// Delivery address, or `Table <n>` for dine-in orders.
    pub address: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
}

/// A completed purchase. Built once from a cart snapshot and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    items: Vec<LineItem>,
    total: Money,
    customer: Customer,
    timestamp: DateTime<Utc>,
}

impl Order {
    /// Snapshot `items` into an order whose total includes tax at `tax_rate_bp`.
    #[must_use]
    pub fn new(
        items: Vec<LineItem>,
        tax_rate_bp: u32,
        customer: Customer,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let subtotal: Money = items.iter().map(LineItem::line_subtotal).sum();
        Self {
            items,
            total: subtotal + subtotal.rate_bp(tax_rate_bp),
            customer,
            timestamp,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    #[must_use]
    pub const fn customer(&self) -> &Customer {
        &self.customer
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
