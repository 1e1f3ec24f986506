//! Numeric coercion and locale-style number formatting.
//!
//! All monetary amounts and quantities are [`Decimal`] so that tax and
//! totals stay exact. Loosely typed input (integers, floats, text from a
//! form) goes through [`Numeric`] before it reaches a line item.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value that may be coerced into a [`Decimal`].
///
/// Returns `None` for input that is not a finite number.
pub trait Numeric: fmt::Debug {
    /// Coerce to a decimal.
    fn to_decimal(&self) -> Option<Decimal>;
}

impl Numeric for Decimal {
    fn to_decimal(&self) -> Option<Decimal> {
        Some(*self)
    }
}

macro_rules! numeric_int {
    ($($int:ty),+) => {
        $(
            impl Numeric for $int {
                fn to_decimal(&self) -> Option<Decimal> {
                    Some(Decimal::from(*self))
                }
            }
        )+
    };
}

numeric_int!(i32, i64, u32, u64, usize);

impl Numeric for f64 {
    fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_f64(*self)
    }
}

impl Numeric for f32 {
    fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_f32(*self)
    }
}

impl Numeric for str {
    fn to_decimal(&self) -> Option<Decimal> {
        let s = self.trim();
        s.parse::<Decimal>()
            .ok()
            .or_else(|| Decimal::from_scientific(s).ok())
    }
}

impl Numeric for String {
    fn to_decimal(&self) -> Option<Decimal> {
        self.as_str().to_decimal()
    }
}

impl<T: Numeric + ?Sized> Numeric for &T {
    fn to_decimal(&self) -> Option<Decimal> {
        (**self).to_decimal()
    }
}

/// How to render a number: decimal places and separators.
///
/// Defaults to two places, `.` as the decimal point and `,` between
/// thousands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    /// Digits after the decimal point.
    pub decimals: u32,
    /// Decimal point.
    pub decimal_point: String,
    /// Separator between groups of three integer digits.
    pub thousands_separator: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimals: 2,
            decimal_point: ".".to_string(),
            thousands_separator: ",".to_string(),
        }
    }
}

impl NumberFormat {
    /// Create a format.
    pub fn new(
        decimals: u32,
        decimal_point: impl Into<String>,
        thousands_separator: impl Into<String>,
    ) -> Self {
        Self {
            decimals,
            decimal_point: decimal_point.into(),
            thousands_separator: thousands_separator.into(),
        }
    }

    /// Format a value, rounding half away from zero.
    ///
    /// ```
    /// use cartkit::money::NumberFormat;
    /// use rust_decimal::Decimal;
    ///
    /// let fmt = NumberFormat::new(2, ",", ".");
    /// assert_eq!(fmt.format(Decimal::new(123456789, 3)), "123.456,79");
    /// ```
    pub fn format(&self, value: Decimal) -> String {
        let mut rounded =
            value.round_dp_with_strategy(self.decimals, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        rounded.set_sign_positive(true);
        rounded.rescale(self.decimals);

        let digits = rounded.to_string();
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits.as_str(), None),
        };

        let mut out = String::with_capacity(digits.len() + 8);
        if negative {
            out.push('-');
        }
        out.push_str(&group_thousands(int_part, &self.thousands_separator));
        if let Some(frac) = frac_part {
            out.push_str(&self.decimal_point);
            out.push_str(frac);
        }
        out
    }
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}
