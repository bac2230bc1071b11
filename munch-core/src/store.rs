//! Cart store: the session's single source of truth for line items.
//!
//! Every mutation goes through here so the positive-quantity invariant holds,
//! the stored mirror stays current and subscribers hear about the change.
use serde::Serialize;

use crate::KeyValueStore;
use crate::cart::{Cart, LineItem};
use crate::money::Money;

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Notification emitted after every cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartChange {
    /// The item that changed; absent when the whole cart changed at once
    /// (cleared, or replayed to a new subscriber).
    pub id: Option<String>,
    /// Quantity now held for `id` (0 when removed).
    pub quantity: u32,
    pub total_quantity: u32,
}

/// Result of a +/- press on a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityChange {
    pub quantity: u32,
    pub total_quantity: u32,
    /// The press raised the quantity, so the "added to cart" toast applies.
    pub added: bool,
}

type Listener = Box<dyn FnMut(&CartChange)>;

pub struct CartStore<S: KeyValueStore> {
    cart: Cart,
    storage: S,
    key: String,
    persisted: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Restore the cart stored under `key`, degrading to an empty cart when the
    /// stored value is missing, unreadable or corrupt.
    pub fn restore(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = match storage.get_item(&key) {
            Ok(Some(raw)) => Cart::restore_from_json(&raw),
            Ok(None) => Cart::new(),
            Err(err) => {
                log::warn!("Failed to load cart from storage: {err}");
                Cart::new()
            }
        };
        log::debug!(
            "Restored cart with {} lines ({} items)",
            cart.len(),
            cart.total_quantity()
        );
        Self {
            cart,
            storage,
            key,
            persisted: true,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Upsert `id` at `quantity`, removing it when `quantity <= 0`.
    /// Returns the total quantity across the cart.
    pub fn set_quantity(&mut self, id: &str, name: &str, unit_price: Money, quantity: i64) -> u32 {
        let held = self.cart.set_quantity(id, name, unit_price, quantity);
        self.commit(Some(id), held);
        self.cart.total_quantity()
    }

    /// Apply a +/- step to the menu counter for `id`, never going below zero.
    pub fn change_quantity(
        &mut self,
        id: &str,
        name: &str,
        unit_price: Money,
        delta: i64,
    ) -> QuantityChange {
        let previous = self.cart.quantity_of(id);
        let target = i64::from(previous).saturating_add(delta).max(0);
        let total_quantity = self.set_quantity(id, name, unit_price, target);
        let quantity = self.cart.quantity_of(id);
        QuantityChange {
            quantity,
            total_quantity,
            added: delta > 0 && quantity > previous,
        }
    }

    /// Raise an existing line by one. Unknown ids are ignored.
    pub fn increment(&mut self, id: &str) -> Option<u32> {
        self.step_existing(id, 1)
    }

    /// Lower an existing line by one, removing it at zero. Unknown ids are ignored.
    pub fn decrement(&mut self, id: &str) -> Option<u32> {
        self.step_existing(id, -1)
    }

    fn step_existing(&mut self, id: &str, delta: i64) -> Option<u32> {
        let line = self.cart.find(id)?.clone();
        let target = i64::from(line.quantity) + delta;
        self.set_quantity(&line.id, &line.name, line.unit_price, target);
        Some(self.cart.quantity_of(id))
    }

    /// Delete the line for `id` if present.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.cart.remove(id);
        self.commit(Some(id), 0);
        removed
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.commit(None, 0);
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.cart.total_quantity()
    }

    #[must_use]
    pub fn total_price(&self) -> Money {
        self.cart.total_price()
    }

    #[must_use]
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.cart.quantity_of(id)
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Deep copy of the current lines.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.cart.items().to_vec()
    }

    /// Whether the last write reached storage.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Register `listener` for every later mutation.
    ///
    /// The current cart is replayed to it straight away (see
    /// [`Self::current_state`]), so counters shown for a restored cart sync on
    /// page load.
    pub fn subscribe(
        &mut self,
        mut listener: impl FnMut(&CartChange) + 'static,
    ) -> SubscriptionId {
        for change in self.current_state() {
            listener(&change);
        }
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// The cart as a sequence of changes: a whole-cart reset carrying the
    /// total, then one entry per line.
    #[must_use]
    pub fn current_state(&self) -> Vec<CartChange> {
        let total_quantity = self.cart.total_quantity();
        let reset = CartChange {
            id: None,
            quantity: 0,
            total_quantity,
        };
        std::iter::once(reset)
            .chain(self.cart.items().iter().map(|line| CartChange {
                id: Some(line.id.clone()),
                quantity: line.quantity,
                total_quantity,
            }))
            .collect()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, id: Option<&str>, quantity: u32) {
        self.persist();
        let change = CartChange {
            id: id.map(str::to_string),
            quantity,
            total_quantity: self.cart.total_quantity(),
        };
        log::debug!(
            "Cart {} now {quantity}, {} items in total",
            id.unwrap_or("(all)"),
            change.total_quantity
        );
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }

    fn persist(&mut self) {
        let written = serde_json::to_string(&self.cart)
            .map_err(|err| err.to_string())
            .and_then(|json| {
                self.storage
                    .set_item(&self.key, &json)
                    .map_err(|err| err.to_string())
            });
        self.persisted = match written {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to save cart: {err}");
                false
            }
        };
    }
}

impl<S: KeyValueStore> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("key", &self.key)
            .field("persisted", &self.persisted)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn price(major: f64) -> Money {
        Money::from_major(major)
    }

    #[test]
    fn mutations_are_mirrored_to_storage() {
        let storage = MemoryStore::new();
        let mut store = CartStore::restore(storage.clone(), "cart");
        assert_eq!(store.set_quantity("p1", "Pizza", price(250.0), 2), 2);
        assert_eq!(
            storage.raw("cart").as_deref(),
            Some(r#"[{"id":"p1","name":"Pizza","price":250,"qty":2}]"#)
        );

        let restored = CartStore::restore(storage.clone(), "cart");
        assert_eq!(restored.cart(), store.cart());

        store.clear();
        assert_eq!(storage.raw("cart").as_deref(), Some("[]"));
    }

    #[test]
    fn change_quantity_clamps_and_flags_additions() {
        let mut store = CartStore::restore(MemoryStore::new(), "cart");
        let first = store.change_quantity("p1", "Pizza", price(250.0), 1);
        assert_eq!(
            first,
            QuantityChange {
                quantity: 1,
                total_quantity: 1,
                added: true
            }
        );
        let down = store.change_quantity("p1", "Pizza", price(250.0), -5);
        assert_eq!(down.quantity, 0);
        assert!(!down.added);
        assert!(store.cart().is_empty());
        let still_zero = store.change_quantity("p1", "Pizza", price(250.0), -1);
        assert_eq!(still_zero.quantity, 0);
    }

    #[test]
    fn increment_and_decrement_ignore_unknown_ids() {
        let mut store = CartStore::restore(MemoryStore::new(), "cart");
        assert_eq!(store.increment("ghost"), None);
        store.set_quantity("p1", "Pizza", price(250.0), 1);
        assert_eq!(store.increment("p1"), Some(2));
        assert_eq!(store.decrement("p1"), Some(1));
        assert_eq!(store.decrement("p1"), Some(0));
        assert!(store.cart().is_empty());
        assert_eq!(store.decrement("p1"), None);
    }

    #[test]
    fn failed_writes_keep_memory_state() {
        let storage = MemoryStore::new();
        storage.set_reject_writes(true);
        let mut store = CartStore::restore(storage.clone(), "cart");
        store.set_quantity("p1", "Pizza", price(10.0), 1);
        assert!(!store.is_persisted());
        assert_eq!(store.total_quantity(), 1);
        assert!(storage.raw("cart").is_none());

        storage.set_reject_writes(false);
        store.increment("p1");
        assert!(store.is_persisted());
    }

    #[test]
    fn subscribers_receive_changes_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = CartStore::restore(MemoryStore::new(), "cart");
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        store.set_quantity("p1", "Pizza", price(250.0), 2);
        store.remove("p1");
        assert!(store.unsubscribe(sub));
        store.set_quantity("p2", "Pasta", price(180.0), 1);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].id, None);
        assert_eq!(seen[0].total_quantity, 0);
        assert_eq!(seen[1].id.as_deref(), Some("p1"));
        assert_eq!(seen[1].quantity, 2);
        assert_eq!(seen[2].quantity, 0);
        assert_eq!(seen[2].total_quantity, 0);
    }

    #[test]
    fn restored_cart_is_replayed_to_new_subscribers() {
        let storage = MemoryStore::new();
        storage.insert_raw(
            "cart",
            r#"[{"id":"p1","name":"Pizza","price":250,"qty":2},{"id":"c1","name":"Coke","price":50,"qty":1}]"#,
        );
        let mut store = CartStore::restore(storage, "cart");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        let seen = seen.borrow();
        assert_eq!(*seen, store.current_state());
        assert_eq!(
            *seen,
            vec![
                CartChange {
                    id: None,
                    quantity: 0,
                    total_quantity: 3
                },
                CartChange {
                    id: Some("p1".to_string()),
                    quantity: 2,
                    total_quantity: 3
                },
                CartChange {
                    id: Some("c1".to_string()),
                    quantity: 1,
                    total_quantity: 3
                },
            ]
        );
    }

    #[test]
    fn corrupt_storage_restores_empty() {
        let storage = MemoryStore::new();
        storage.insert_raw("cart", "{not json");
        let store = CartStore::restore(storage, "cart");
        assert!(store.cart().is_empty());
    }
}
