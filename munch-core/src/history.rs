//! Append-only order history kept in key-value storage
use crate::KeyValueStore;
use crate::error::StorageError;
use crate::order::Order;

/// Suffix for the key that preserves an unreadable history before it is replaced.
const CORRUPT_SUFFIX: &str = ".corrupt";

#[derive(Debug, Clone)]
pub struct OrderHistory<S: KeyValueStore> {
    storage: S,
    key: String,
}

impl<S: KeyValueStore> OrderHistory<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// All recorded orders, oldest first. Unreadable history reads as empty.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        match self.read() {
            Ok(orders) => orders,
            Err(err) => {
                log::warn!("Failed to read order history: {err}");
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `order` and return the new history length.
    ///
    /// A stored history that cannot be parsed is copied aside under
    /// `<key>.corrupt` and a fresh log is started.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written.
    pub fn append(&self, order: &Order) -> Result<usize, StorageError> {
        let mut orders = match self.read() {
            Ok(orders) => orders,
            Err(StorageError::Serialization(err)) => {
                log::warn!("Order history is corrupt, starting a new log: {err}");
                self.set_aside_corrupt()?;
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        orders.push(order.clone());
        let json = serde_json::to_string(&orders)?;
        self.storage
            .set_item(&self.key, &json)
            .map_err(StorageError::from_backend)?;
        log::info!(
            "Recorded order #{} totalling {}",
            orders.len(),
            order.total()
        );
        Ok(orders.len())
    }

    fn read(&self) -> Result<Vec<Order>, StorageError> {
        let raw = self
            .storage
            .get_item(&self.key)
            .map_err(StorageError::from_backend)?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn set_aside_corrupt(&self) -> Result<(), StorageError> {
        let raw = self
            .storage
            .get_item(&self.key)
            .map_err(StorageError::from_backend)?;
        if let Some(raw) = raw {
            let backup = format!("{}{CORRUPT_SUFFIX}", self.key);
            self.storage
                .set_item(&backup, &raw)
                .map_err(StorageError::from_backend)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::LineItem;
    use crate::money::Money;
    use crate::order::{Customer, OrderType};
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn order(name: &str) -> Order {
        Order::new(
            vec![LineItem {
                id: "p1".to_string(),
                name: "Pizza".to_string(),
                unit_price: Money::from_major(100.0),
                quantity: 1,
            }],
            500,
            Customer {
                name: name.to_string(),
                address: "12 Long Street".to_string(),
                phone: "555".to_string(),
                payment_method: None,
                order_type: OrderType::Delivery,
                table_number: None,
            },
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        )
    }

    #[test]
    fn appends_in_order() {
        let history = OrderHistory::new(MemoryStore::new(), "orderHistory");
        assert!(history.is_empty());
        assert_eq!(history.append(&order("first")).unwrap(), 1);
        assert_eq!(history.append(&order("second")).unwrap(), 2);
        let names: Vec<String> = history
            .orders()
            .iter()
            .map(|o| o.customer().name.clone())
            .collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn corrupt_history_is_set_aside() {
        let storage = MemoryStore::new();
        storage.insert_raw("orderHistory", "oops");
        let history = OrderHistory::new(storage.clone(), "orderHistory");
        assert!(history.orders().is_empty());
        assert_eq!(history.append(&order("fresh")).unwrap(), 1);
        assert_eq!(storage.raw("orderHistory.corrupt").as_deref(), Some("oops"));
    }

    #[test]
    fn quota_failure_keeps_its_kind() {
        let storage = MemoryStore::new();
        storage.set_reject_writes(true);
        let history = OrderHistory::new(storage, "orderHistory");
        let err = history.append(&order("lost")).unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded { ref key } if key == "orderHistory"
        ));
    }
}
