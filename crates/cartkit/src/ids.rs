//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up a product ID with the
//! row ID of the line that holds it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Opaque product identifier supplied by the catalog.
    ///
    /// Numeric catalog keys convert to their decimal text, so `42` and
    /// `"42"` name the same product.
    ProductId
);

define_id!(
    /// Content-derived identifier of one cart line.
    ///
    /// See [`crate::cart::LineItem::row_id`] for how it is computed.
    RowId
);

macro_rules! product_id_from_int {
    ($($int:ty),+) => {
        $(
            impl From<$int> for ProductId {
                fn from(id: $int) -> Self {
                    Self(id.to_string())
                }
            }
        )+
    };
}

product_id_from_int!(i32, i64, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("prod-123");
        assert_eq!(id.as_str(), "prod-123");
    }

    #[test]
    fn test_id_from_string() {
        let id: ProductId = "prod-456".into();
        assert_eq!(id.as_str(), "prod-456");
    }

    #[test]
    fn test_product_id_from_integer() {
        assert_eq!(ProductId::from(42_u64), ProductId::from("42"));
        assert_eq!(ProductId::from(-7_i64).as_str(), "-7");
    }

    #[test]
    fn test_id_display() {
        let id = RowId::new("abc");
        assert_eq!(format!("{}", id), "abc");
    }

    #[test]
    fn test_row_id_serializes_as_string() {
        let id = RowId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc""#);
    }
}
