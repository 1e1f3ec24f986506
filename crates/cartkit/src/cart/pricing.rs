//! Cart-level totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartContents;
use crate::error::{CartError, CartResult};
use crate::money::NumberFormat;

/// Aggregate figures for a cart, computed in one pass over its contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Number of distinct rows.
    pub item_count: usize,
    /// Sum of quantities.
    pub quantity: Decimal,
    /// Sum of `quantity * unit_price`.
    pub subtotal: Decimal,
    /// Sum of line tax.
    pub tax: Decimal,
    /// Sum of `quantity * price_with_tax`.
    pub total: Decimal,
}

impl CartTotals {
    /// Compute totals over `contents`.
    ///
    /// Returns [`CartError::Overflow`] if a line amount or a sum leaves the
    /// decimal range.
    pub fn from_contents(contents: &CartContents) -> CartResult<Self> {
        let sums = contents.fold(
            Some((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)),
            |acc, item| {
                let (quantity, subtotal, tax, total) = acc?;
                Some((
                    quantity.checked_add(item.quantity())?,
                    subtotal.checked_add(item.checked_subtotal()?)?,
                    tax.checked_add(item.checked_tax()?)?,
                    total.checked_add(item.checked_total()?)?,
                ))
            },
        );
        let (quantity, subtotal, tax, total) = sums.ok_or(CartError::Overflow)?;

        Ok(Self {
            item_count: contents.len(),
            quantity,
            subtotal,
            tax,
            total,
        })
    }

    /// Check if the cart had no rows.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Render the monetary figures with `format`.
    pub fn formatted(&self, format: &NumberFormat) -> FormattedTotals {
        FormattedTotals {
            subtotal: format.format(self.subtotal),
            tax: format.format(self.tax),
            total: format.format(self.total),
        }
    }
}

/// Display strings for the monetary cart totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTotals {
    pub subtotal: String,
    pub tax: String,
    pub total: String,
}
