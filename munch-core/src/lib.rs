//! FoodMunch Ordering Engine
//!
//! Platform-agnostic cart and checkout logic for the FoodMunch restaurant page.
//! This crate holds the cart, checkout projection and order submission without
//! UI or platform-specific dependencies.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod history;
pub mod location;
pub mod money;
pub mod order;
pub mod presentation;
pub mod session;
pub mod storage;
pub mod store;
pub mod submit;

// Re-export commonly used types
pub use cart::{Cart, LineItem};
pub use checkout::{CheckoutView, LineRow};
pub use config::CheckoutConfig;
pub use error::{ConfigError, StorageError, SubmissionError, ValidationError};
pub use history::OrderHistory;
pub use location::{
    Coordinates, DetectedAddress, LocationAssistant, LocationError, NetworkLocation,
    PositionUnavailable, detect_address, maps_link,
};
pub use money::Money;
pub use order::{Customer, Order, OrderType, PaymentMethod};
pub use presentation::{
    Presenter, escape_html, food_emoji, present_location_error, present_submission,
};
pub use session::OrderingSession;
pub use storage::MemoryStore;
pub use store::{CartChange, CartStore, QuantityChange, SubscriptionId};
pub use submit::{
    CheckoutForm, OrderSubmitter, PendingPayment, PendingToken, PlacedOrder, SubmissionOutcome,
    sanitize_table_number, validate_checkout,
};

/// Trait for abstracting string key-value persistence
/// Platform-specific implementations should provide this
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be accessed.
    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written (unavailable, quota exceeded).
    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be accessed.
    fn remove_item(&self, key: &str) -> Result<(), Self::Error>;
}
