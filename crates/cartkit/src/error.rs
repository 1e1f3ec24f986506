//! Cart error types.

use thiserror::Error;

use crate::ids::RowId;

/// Result alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// Errors that can occur in cart operations.
#[derive(Error, Debug)]
pub enum CartError {
    /// Quantity is zero, negative, non-numeric or not finite.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Unit price is non-numeric, not finite or negative.
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Tax rate is non-numeric or not finite.
    #[error("Invalid tax rate: {0}")]
    InvalidTaxRate(String),

    /// An option value that cannot be stored, such as a NaN number.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The cart does not contain the row.
    #[error("The cart does not contain rowId {0}")]
    RowNotFound(RowId),

    /// A derived amount or a sum left the decimal range.
    #[error("Arithmetic overflow in cart calculation")]
    Overflow,

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] cartkit_store::StoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for CartError {
    fn from(e: toml::de::Error) -> Self {
        CartError::Config(e.to_string())
    }
}
