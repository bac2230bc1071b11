//! Error types shared across the ordering engine
use std::error::Error;

use crate::submit::PendingToken;

/// Failure of the underlying key-value storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Backend(#[source] Box<dyn Error + Send + Sync>),
    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Lift a backend error, keeping a `StorageError` backend's own variant.
    pub fn from_backend<E: Error + Send + Sync + 'static>(err: E) -> Self {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(err);
        match boxed.downcast::<Self>() {
            Ok(own) => *own,
            Err(other) => Self::Backend(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid checkout config: {0}")]
    Json(#[from] serde_json::Error),
}

/// A required checkout field is missing or invalid.
///
/// The `Display` text is the message shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("🛒 Your cart is empty! Please add items before placing order.")]
    EmptyCart,
    #[error("⚠️ Please select Order Type (Delivery or Dine-In).")]
    MissingOrderType,
    #[error("Full name is required.")]
    MissingName,
    #[error("Phone number is required.")]
    MissingPhone,
    #[error("📍 Please enter a valid Delivery Address.")]
    InvalidAddress,
    #[error("🍽 Please enter your Table Number.")]
    MissingTableNumber,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Could not record order: {0}")]
    Storage(#[from] StorageError),
    #[error("No pending order for token {0}")]
    UnknownToken(PendingToken),
}

impl SubmissionError {
    /// Message suitable for an alert shown to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Storage(_) => "⚠️ We couldn't save your order. Please try again.".to_string(),
            Self::UnknownToken(_) => {
                "⚠️ This payment has already been handled. Please place the order again."
                    .to_string()
            }
        }
    }
}
