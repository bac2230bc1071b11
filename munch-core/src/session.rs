//! Ordering session: the explicitly owned state behind one page visit.
use chrono::{DateTime, Utc};

use crate::KeyValueStore;
use crate::checkout::CheckoutView;
use crate::config::CheckoutConfig;
use crate::error::SubmissionError;
use crate::history::OrderHistory;
use crate::money::Money;
use crate::order::Order;
use crate::store::{CartChange, CartStore, QuantityChange, SubscriptionId};
use crate::submit::{CheckoutForm, OrderSubmitter, PendingToken, PlacedOrder, SubmissionOutcome};

pub struct OrderingSession<S: KeyValueStore + Clone> {
    cart: CartStore<S>,
    history: OrderHistory<S>,
    submitter: OrderSubmitter,
}

impl<S: KeyValueStore + Clone> OrderingSession<S> {
    /// Start a session, restoring any cart left in `storage`.
    pub fn new(storage: S, config: CheckoutConfig) -> Self {
        let cart = CartStore::restore(storage.clone(), config.cart_key.clone());
        let history = OrderHistory::new(storage, config.history_key.clone());
        Self {
            cart,
            history,
            submitter: OrderSubmitter::new(config),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        self.submitter.config()
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    pub fn set_quantity(&mut self, id: &str, name: &str, unit_price: Money, quantity: i64) -> u32 {
        self.cart.set_quantity(id, name, unit_price, quantity)
    }

    pub fn change_quantity(
        &mut self,
        id: &str,
        name: &str,
        unit_price: Money,
        delta: i64,
    ) -> QuantityChange {
        self.cart.change_quantity(id, name, unit_price, delta)
    }

    pub fn increment(&mut self, id: &str) -> Option<u32> {
        self.cart.increment(id)
    }

    pub fn decrement(&mut self, id: &str) -> Option<u32> {
        self.cart.decrement(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.cart.remove(id)
    }

    pub fn clear(&mut self) {
        self.cart.clear();
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.cart.total_quantity()
    }

    #[must_use]
    pub fn total_price(&self) -> Money {
        self.cart.total_price()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CartChange) + 'static) -> SubscriptionId {
        self.cart.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.cart.unsubscribe(id)
    }

    #[must_use]
    pub fn checkout_view(&self) -> CheckoutView {
        CheckoutView::build(self.cart.cart(), self.config().tax_rate_bp)
    }

    /// Validate the form and place the order, or park it for payment confirmation.
    /// Every checkout button goes through here.
    ///
    /// # Errors
    ///
    /// See [`OrderSubmitter::begin`].
    pub fn begin_submission(
        &mut self,
        form: &CheckoutForm,
        placed_at: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.submitter
            .begin(form, &mut self.cart, &self.history, placed_at)
    }

    /// Continue a parked order once its payment view is dismissed.
    ///
    /// # Errors
    ///
    /// See [`OrderSubmitter::complete`].
    pub fn complete_submission(
        &mut self,
        token: PendingToken,
    ) -> Result<PlacedOrder, SubmissionError> {
        self.submitter
            .complete(token, &mut self.cart, &self.history)
    }

    pub fn cancel_submission(&mut self, token: PendingToken) -> bool {
        self.submitter.cancel(token)
    }

    #[must_use]
    pub fn pending_submissions(&self) -> usize {
        self.submitter.pending_count()
    }

    #[must_use]
    pub fn order_history(&self) -> Vec<Order> {
        self.history.orders()
    }
}

impl<S: KeyValueStore + Clone> std::fmt::Debug for OrderingSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderingSession")
            .field("cart", &self.cart)
            .field("submitter", &self.submitter)
            .finish_non_exhaustive()
    }
}
