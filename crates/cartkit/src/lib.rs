//! Session-scoped shopping cart.
//!
//! - **LineItem**: one product with its selected options, quantity, unit
//!   price and tax rate. Its row id is derived from the product and the
//!   options, so the same product with the same options always lands on
//!   the same row.
//! - **CartContents**: the rows of one cart instance, stored as a unit.
//! - **Cart**: named instances (`"shop"`, `"wishlist"`, ...) over a
//!   [`cartkit_store::KvStore`], with add/update/remove and totals.
//!
//! # Example
//!
//! ```rust,ignore
//! use cartkit::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let mut cart = Cart::new(MemoryStore::new());
//! let shirt = cart.add(
//!     "sku-1",
//!     "T-Shirt",
//!     2,
//!     dec!(19.99),
//!     ItemOptions::new().with("size", "L"),
//! )?;
//! cart.set_tax_rate(shirt.row_id(), 20)?;
//!
//! println!("Total: {}", cart.total_formatted(cart.number_format())?);
//! ```

pub mod cart;
pub mod config;
pub mod error;
pub mod ids;
pub mod money;

pub use cart::{Cart, CartContents, CartTotals, ItemDescriptor, ItemOptions, ItemUpdate, LineItem};
pub use config::CartConfig;
pub use error::{CartError, CartResult};
pub use ids::{ProductId, RowId};
pub use money::{NumberFormat, Numeric};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cart::{
        Cart, CartContents, CartTotals, FormattedTotals, ItemDescriptor, ItemOptions, ItemUpdate,
        LineItem, OptionValue,
    };
    pub use crate::config::CartConfig;
    pub use crate::error::{CartError, CartResult};
    pub use crate::ids::{ProductId, RowId};
    pub use crate::money::{NumberFormat, Numeric};

    pub use cartkit_store::{KvStore, MemoryStore, SessionId, SessionStore};
}
