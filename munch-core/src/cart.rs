//! Shopping cart line items
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::money::Money;

/// A line item in the shopping cart.
///
/// Serialized as `{id, name, price, qty}` with `price` in major units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Money,
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl LineItem {
    #[must_use]
    pub const fn line_subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Shopping cart state.
///
/// Items are unique by id and always carry a positive quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create a new empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a cart line by item ID.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Set the quantity for an item, inserting or removing the line as needed.
    /// Returns the quantity now held for that id.
    pub fn set_quantity(&mut self, id: &str, name: &str, unit_price: Money, quantity: i64) -> u32 {
        let idx = self.position(id);
        let Some(quantity) = positive_quantity(quantity) else {
            if let Some(idx) = idx {
                self.items.remove(idx);
            }
            return 0;
        };
        match idx.and_then(|idx| self.items.get_mut(idx)) {
            Some(line) => line.quantity = quantity,
            None => self.items.push(LineItem {
                id: id.to_string(),
                name: name.to_string(),
                unit_price,
                quantity,
            }),
        }
        quantity
    }

    /// Remove all of an item from the cart. Returns whether a line was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Clear the entire cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Get the current quantity of an item in the cart.
    #[must_use]
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.find(id).map_or(0, |item| item.quantity)
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |sum, item| sum.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn total_price(&self) -> Money {
        self.items.iter().map(LineItem::line_subtotal).sum()
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Rebuild a cart from its stored JSON form.
    ///
    /// Anything that is not an array yields an empty cart. Each record is
    /// coerced individually: non-numeric prices and quantities count as zero,
    /// records without an id or with a non-positive quantity are dropped, and
    /// later duplicates of an id are ignored.
    #[must_use]
    pub fn restore_from_json(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Stored cart is not valid JSON, starting empty: {err}");
                return Self::new();
            }
        };
        let Value::Array(records) = value else {
            log::warn!("Stored cart is not an array, starting empty");
            return Self::new();
        };

        let mut cart = Self::new();
        for record in &records {
            match coerce_line(record) {
                Some(line) if cart.find(&line.id).is_none() => cart.items.push(line),
                Some(line) => log::warn!("Dropping duplicate stored cart line {}", line.id),
                None => log::debug!("Dropping unusable stored cart record {record}"),
            }
        }
        cart
    }
}

fn positive_quantity(quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        None
    } else {
        Some(u32::try_from(quantity).unwrap_or(u32::MAX))
    }
}

fn coerce_line(record: &Value) -> Option<LineItem> {
    let id = match record.get("id")? {
        Value::String(id) => id.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let name = record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let unit_price = Money::from_major(coerce_number(record.get("price")));
    #[allow(clippy::cast_possible_truncation)]
    let quantity = positive_quantity(coerce_number(record.get("qty")).floor() as i64)?;
    Some(LineItem {
        id,
        name,
        unit_price,
        quantity,
    })
}

fn coerce_number(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if number.is_finite() { number } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pizza() -> Money {
        Money::from_major(250.0)
    }

    #[test]
    fn set_quantity_upserts_and_removes() {
        let mut cart = Cart::new();
        assert_eq!(cart.set_quantity("p1", "Pizza", pizza(), 1), 1);
        assert_eq!(cart.total_quantity(), 1);
        assert_eq!(cart.total_price(), Money::from_major(250.0));

        cart.set_quantity("p1", "Pizza", pizza(), 3);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.total_price(), Money::from_major(750.0));

        assert_eq!(cart.set_quantity("p1", "Pizza", pizza(), 0), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn negative_quantity_for_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.set_quantity("p2", "Pasta", pizza(), -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_reports_presence() {
        let mut cart = Cart::new();
        cart.set_quantity("p1", "Pizza", pizza(), 2);
        assert!(!cart.remove("missing"));
        assert!(cart.remove("p1"));
        assert!(cart.is_empty());
    }

    #[test]
    fn serializes_in_storage_layout() {
        let mut cart = Cart::new();
        cart.set_quantity("p1", "Pizza", Money::from_major(99.5), 2);
        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(json, r#"[{"id":"p1","name":"Pizza","price":99.5,"qty":2}]"#);
    }

    #[test]
    fn restore_normalizes_bad_records() {
        let raw = r#"[
            {"id": "a", "name": "Salad", "price": "120", "qty": "2"},
            {"id": 7, "price": 80, "qty": 1},
            {"id": "b", "name": "Cake", "price": "free", "qty": 1},
            {"id": "c", "name": "Soup", "price": 50, "qty": "many"},
            {"id": "d", "name": "Tea", "price": 20, "qty": -1},
            {"name": "No id", "price": 20, "qty": 1},
            {"id": "a", "name": "Salad again", "price": 1, "qty": 9},
            "garbage"
        ]"#;
        let cart = Cart::restore_from_json(raw);
        let ids: Vec<&str> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "7", "b"]);
        assert_eq!(cart.quantity_of("a"), 2);
        assert_eq!(cart.find("a").unwrap().unit_price, Money::from_major(120.0));
        assert_eq!(cart.find("7").unwrap().name, "");
        assert_eq!(cart.find("b").unwrap().unit_price, Money::ZERO);
    }

    #[test]
    fn restore_from_non_array_is_empty() {
        assert!(Cart::restore_from_json(r#"{"id":"a"}"#).is_empty());
        assert!(Cart::restore_from_json("not json").is_empty());
        assert!(Cart::restore_from_json("null").is_empty());
    }
}
