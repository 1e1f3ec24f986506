//! The stored set of line items for one cart instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::ids::RowId;

/// Line items keyed by row id.
///
/// This is the unit of persistence: the whole mapping is written back to the
/// store after every change. It trusts the row ids it is given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartContents {
    items: HashMap<RowId, LineItem>,
}

impl CartContents {
    /// An empty set of rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a row exists.
    pub fn has(&self, row_id: &RowId) -> bool {
        self.items.contains_key(row_id)
    }

    /// Insert or replace the item stored under `row_id`.
    pub fn put(&mut self, row_id: RowId, item: LineItem) {
        self.items.insert(row_id, item);
    }

    /// Look up a row; absence is not an error here.
    pub fn get(&self, row_id: &RowId) -> Option<&LineItem> {
        self.items.get(row_id)
    }

    /// Mutable access to a row.
    pub fn get_mut(&mut self, row_id: &RowId) -> Option<&mut LineItem> {
        self.items.get_mut(row_id)
    }

    /// Remove a row, returning it if it was present.
    pub fn remove(&mut self, row_id: &RowId) -> Option<LineItem> {
        self.items.remove(row_id)
    }

    /// Reduce over all items. Iteration order is unspecified.
    pub fn fold<R>(&self, init: R, f: impl FnMut(R, &LineItem) -> R) -> R {
        self.items.values().fold(init, f)
    }

    /// Iterate over the stored items.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.values()
    }

    /// Number of distinct rows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for CartContents {
    type Item = (RowId, LineItem);
    type IntoIter = std::collections::hash_map::IntoIter<RowId, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
