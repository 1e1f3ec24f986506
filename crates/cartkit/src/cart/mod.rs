//! Shopping cart module.
//!
//! Contains line items, the stored contents of a cart instance, totals and
//! the cart itself.

mod cart;
mod contents;
mod item;
mod pricing;

pub use cart::Cart;
pub use contents::CartContents;
pub use item::{ItemDescriptor, ItemOptions, ItemUpdate, LineItem, OptionValue};
pub use pricing::{CartTotals, FormattedTotals};
