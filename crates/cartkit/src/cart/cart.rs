//! The cart: named instances over a session store.

use cartkit_store::{store_key, Cache, KvStore};
use rust_decimal::Decimal;
use tracing::debug;

use crate::cart::{CartContents, CartTotals, ItemDescriptor, ItemOptions, ItemUpdate, LineItem};
use crate::config::CartConfig;
use crate::error::{CartError, CartResult};
use crate::ids::{ProductId, RowId};
use crate::money::{NumberFormat, Numeric};

/// A shopping cart bound to one instance in a key-value store.
///
/// The cart holds no items itself. Each mutation loads the contents stored
/// under `"<prefix>.<instance>"`, applies the change and writes the whole
/// contents back; queries load and read. Instances are independent: a
/// `"wishlist"` cart never sees the `"shop"` cart's rows.
///
/// # Example
///
/// ```
/// use cartkit::prelude::*;
/// use rust_decimal::Decimal;
///
/// let mut cart = Cart::new(MemoryStore::new());
/// let item = cart
///     .add("sku-1", "T-Shirt", 2, Decimal::new(1999, 2), ItemOptions::new().with("size", "L"))
///     .unwrap();
/// assert_eq!(cart.subtotal().unwrap(), Decimal::new(3998, 2));
///
/// cart.instance("wishlist");
/// assert_eq!(cart.item_count().unwrap(), 0);
/// # let _ = item;
/// ```
#[derive(Debug)]
pub struct Cart<S> {
    cache: Cache<S>,
    config: CartConfig,
    instance: String,
    key: String,
}

impl<S: KvStore> Cart<S> {
    /// Create a cart over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, CartConfig::default())
    }

    /// Create a cart over `store` with `config`.
    pub fn with_config(store: S, config: CartConfig) -> Self {
        let instance = config.default_instance.clone();
        let key = store_key!(config.key_prefix.as_str(), instance);
        Self {
            cache: Cache::new(store),
            config,
            instance,
            key,
        }
    }

    /// Select the instance used by subsequent calls.
    ///
    /// An empty name selects the default instance. Stored data is untouched.
    pub fn instance(&mut self, name: impl AsRef<str>) -> &mut Self {
        let name = name.as_ref();
        self.instance = if name.is_empty() {
            self.config.default_instance.clone()
        } else {
            name.to_string()
        };
        self.key = store_key!(self.config.key_prefix.as_str(), self.instance);
        debug!(instance = %self.instance, key = %self.key, "cart instance selected");
        self
    }

    /// Name of the current instance.
    pub fn current_instance(&self) -> &str {
        &self.instance
    }

    /// Store key of the current instance.
    pub fn store_key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    /// Default format for rendered amounts.
    pub fn number_format(&self) -> &NumberFormat {
        &self.config.number_format
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        self.cache.store()
    }

    /// Add an item.
    ///
    /// If a row for the same product and options already exists, the
    /// quantities are summed; name, price and tax rate come from the new
    /// item.
    pub fn add(
        &self,
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        quantity: impl Numeric,
        unit_price: impl Numeric,
        options: ItemOptions,
    ) -> CartResult<LineItem> {
        let item = LineItem::new(product_id, name, quantity, unit_price, options)?;
        self.add_item(item)
    }

    /// Add an already built item, merging with an existing row.
    pub fn add_item(&self, mut item: LineItem) -> CartResult<LineItem> {
        let mut contents = self.load()?;

        if let Some(existing) = contents.get(item.row_id()) {
            let merged = item
                .quantity()
                .checked_add(existing.quantity())
                .ok_or(CartError::Overflow)?;
            debug!(
                instance = %self.instance,
                row_id = %item.row_id(),
                quantity = %merged,
                "merging into existing row"
            );
            item.assign_quantity(merged);
        } else {
            debug!(instance = %self.instance, row_id = %item.row_id(), "adding row");
        }

        contents.put(item.row_id().clone(), item.clone());
        self.save(&contents)?;
        Ok(item)
    }

    /// Add each descriptor in turn, returning the resulting items.
    ///
    /// Items added before a failing descriptor stay in the cart.
    pub fn add_many(
        &self,
        descriptors: impl IntoIterator<Item = ItemDescriptor>,
    ) -> CartResult<Vec<LineItem>> {
        descriptors
            .into_iter()
            .map(|descriptor| self.add_item(descriptor.into_line_item()?))
            .collect()
    }

    /// Set the quantity of a row.
    ///
    /// A quantity of zero or less removes the row and returns `None`.
    pub fn update(&self, row_id: &RowId, quantity: impl Numeric) -> CartResult<Option<LineItem>> {
        let quantity = quantity
            .to_decimal()
            .ok_or_else(|| CartError::InvalidQuantity(format!("{:?}", quantity)))?;
        self.update_with(row_id, ItemUpdate::quantity(quantity))
    }

    /// Apply a general update to a row.
    ///
    /// Changing the product or options moves the item to a new row id. If
    /// that row already exists, the quantities are merged and the merged
    /// quantity must be positive. As with [`Cart::update`], a resulting
    /// quantity of zero or less removes the item.
    pub fn update_with(&self, row_id: &RowId, update: ItemUpdate) -> CartResult<Option<LineItem>> {
        let mut contents = self.load()?;
        let current = contents
            .get(row_id)
            .cloned()
            .ok_or_else(|| self.not_found(row_id))?;

        let mut item = current.updated(update)?;

        if item.row_id() != row_id {
            contents.remove(row_id);
            if let Some(existing) = contents.get(item.row_id()) {
                let merged = existing
                    .quantity()
                    .checked_add(item.quantity())
                    .ok_or(CartError::Overflow)?;
                item.set_quantity(merged)?;
            }
            debug!(
                instance = %self.instance,
                from = %row_id,
                to = %item.row_id(),
                "row re-keyed"
            );
        }

        if item.quantity() <= Decimal::ZERO {
            contents.remove(item.row_id());
            self.save(&contents)?;
            debug!(instance = %self.instance, row_id = %item.row_id(), "row removed by update");
            return Ok(None);
        }

        contents.put(item.row_id().clone(), item.clone());
        self.save(&contents)?;
        debug!(
            instance = %self.instance,
            row_id = %item.row_id(),
            quantity = %item.quantity(),
            "row updated"
        );
        Ok(Some(item))
    }

    /// Set the tax rate, in percent, of a row.
    pub fn set_tax_rate(&self, row_id: &RowId, rate: impl Numeric) -> CartResult<LineItem> {
        let mut contents = self.load()?;
        let item = contents
            .get_mut(row_id)
            .ok_or_else(|| self.not_found(row_id))?;
        item.set_tax_rate(rate)?;
        let item = item.clone();
        self.save(&contents)?;
        Ok(item)
    }

    /// Remove a row.
    pub fn remove(&self, row_id: &RowId) -> CartResult<()> {
        let mut contents = self.load()?;
        contents.remove(row_id).ok_or_else(|| self.not_found(row_id))?;
        self.save(&contents)?;
        debug!(instance = %self.instance, row_id = %row_id, "row removed");
        Ok(())
    }

    /// Get a row.
    pub fn get(&self, row_id: &RowId) -> CartResult<LineItem> {
        self.load()?
            .remove(row_id)
            .ok_or_else(|| self.not_found(row_id))
    }

    /// All rows of the current instance.
    pub fn content(&self) -> CartResult<CartContents> {
        self.load()
    }

    /// Delete the stored contents of the current instance.
    pub fn destroy(&self) -> CartResult<()> {
        self.cache.delete(&self.key)?;
        debug!(instance = %self.instance, "cart destroyed");
        Ok(())
    }

    /// Every aggregate in one pass.
    pub fn totals(&self) -> CartResult<CartTotals> {
        CartTotals::from_contents(&self.load()?)
    }

    /// Sum of `quantity * price_with_tax`.
    pub fn total(&self) -> CartResult<Decimal> {
        Ok(self.totals()?.total)
    }

    /// Sum of `quantity * unit_price`.
    pub fn subtotal(&self) -> CartResult<Decimal> {
        Ok(self.totals()?.subtotal)
    }

    /// Sum of line tax.
    pub fn tax(&self) -> CartResult<Decimal> {
        Ok(self.totals()?.tax)
    }

    pub fn total_formatted(&self, format: &NumberFormat) -> CartResult<String> {
        Ok(format.format(self.total()?))
    }

    pub fn subtotal_formatted(&self, format: &NumberFormat) -> CartResult<String> {
        Ok(format.format(self.subtotal()?))
    }

    pub fn tax_formatted(&self, format: &NumberFormat) -> CartResult<String> {
        Ok(format.format(self.tax()?))
    }

    /// Sum of quantities over all rows.
    pub fn total_quantity(&self) -> CartResult<Decimal> {
        Ok(self.totals()?.quantity)
    }

    /// Number of distinct rows.
    pub fn item_count(&self) -> CartResult<usize> {
        Ok(self.load()?.len())
    }

    fn load(&self) -> CartResult<CartContents> {
        Ok(self.cache.get::<CartContents>(&self.key)?.unwrap_or_default())
    }

    fn save(&self, contents: &CartContents) -> CartResult<()> {
        self.cache.set(&self.key, contents)?;
        Ok(())
    }

    fn not_found(&self, row_id: &RowId) -> CartError {
        debug!(instance = %self.instance, row_id = %row_id, "row not found");
        CartError::RowNotFound(row_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartkit_store::MemoryStore;
    use rust_decimal_macros::dec;

    fn cart() -> Cart<MemoryStore> {
        Cart::new(MemoryStore::new())
    }

    fn add_plain(cart: &Cart<MemoryStore>, product: &str, qty: i64, price: Decimal) -> LineItem {
        cart.add(product, product, qty, price, ItemOptions::new())
            .unwrap()
    }

    #[test]
    fn test_cart_creation() {
        let cart = cart();
        assert_eq!(cart.current_instance(), "shop");
        assert_eq!(cart.store_key(), "cart.shop");
        assert_eq!(cart.item_count().unwrap(), 0);
        assert!(cart.store().is_empty());
    }

    #[test]
    fn test_instance_selection() {
        let mut cart = cart();
        cart.instance("wishlist");
        assert_eq!(cart.current_instance(), "wishlist");
        assert_eq!(cart.store_key(), "cart.wishlist");

        cart.instance("");
        assert_eq!(cart.current_instance(), "shop");
    }

    #[test]
    fn test_add_item() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 2, dec!(10));

        assert_eq!(cart.item_count().unwrap(), 1);
        assert_eq!(cart.total_quantity().unwrap(), dec!(2));
        assert_eq!(cart.get(item.row_id()).unwrap(), item);
    }

    #[test]
    fn test_add_same_item_merges_quantity() {
        let cart = cart();
        let first = add_plain(&cart, "p1", 1, dec!(10));
        let second = add_plain(&cart, "p1", 2, dec!(10));

        assert_eq!(first.row_id(), second.row_id());
        assert_eq!(second.quantity(), dec!(3));
        assert_eq!(cart.item_count().unwrap(), 1);
        assert_eq!(cart.total_quantity().unwrap(), dec!(3));
    }

    #[test]
    fn test_add_merge_takes_new_metadata() {
        let cart = cart();
        cart.add("p1", "Old name", 1, dec!(10), ItemOptions::new())
            .unwrap();
        let merged = cart
            .add("p1", "New name", 1, dec!(12), ItemOptions::new())
            .unwrap();

        assert_eq!(merged.name(), "New name");
        assert_eq!(merged.unit_price(), dec!(12));
        assert_eq!(cart.subtotal().unwrap(), dec!(24));
    }

    #[test]
    fn test_add_different_options_are_distinct_rows() {
        let cart = cart();
        cart.add("p1", "Shirt", 1, dec!(10), ItemOptions::new().with("size", "L"))
            .unwrap();
        cart.add("p1", "Shirt", 1, dec!(10), ItemOptions::new().with("size", "M"))
            .unwrap();

        assert_eq!(cart.item_count().unwrap(), 2);
    }

    #[test]
    fn test_add_rejects_bad_price() {
        let cart = cart();
        let result = cart.add("p1", "Shirt", 1, "n/a", ItemOptions::new());
        assert!(matches!(result, Err(CartError::InvalidPrice(_))));
        assert_eq!(cart.item_count().unwrap(), 0);
    }

    #[test]
    fn test_add_many() {
        let cart = cart();
        let items = cart
            .add_many(vec![
                ItemDescriptor::new("a", "A", dec!(2), dec!(10)),
                ItemDescriptor::new("b", "B", dec!(1), dec!(5)),
                ItemDescriptor::new("a", "A", dec!(1), dec!(10)),
            ])
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[2].quantity(), dec!(3));
        assert_eq!(cart.item_count().unwrap(), 2);
        assert_eq!(cart.total_quantity().unwrap(), dec!(4));
    }

    #[test]
    fn test_add_many_stops_at_first_error() {
        let cart = cart();
        let result = cart.add_many(vec![
            ItemDescriptor::new("a", "A", dec!(1), dec!(10)),
            ItemDescriptor::new("b", "B", dec!(1), dec!(-5)),
            ItemDescriptor::new("c", "C", dec!(1), dec!(5)),
        ]);

        assert!(matches!(result, Err(CartError::InvalidPrice(_))));
        assert_eq!(cart.item_count().unwrap(), 1);
    }

    #[test]
    fn test_update_quantity() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 1, dec!(10));

        let updated = cart.update(item.row_id(), 5).unwrap().unwrap();
        assert_eq!(updated.quantity(), dec!(5));
        assert_eq!(cart.total_quantity().unwrap(), dec!(5));
    }

    #[test]
    fn test_update_to_zero_removes() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 1, dec!(10));
        add_plain(&cart, "p2", 1, dec!(10));

        assert!(cart.update(item.row_id(), 0).unwrap().is_none());
        assert_eq!(cart.item_count().unwrap(), 1);
        assert!(matches!(
            cart.get(item.row_id()),
            Err(CartError::RowNotFound(_))
        ));
    }

    #[test]
    fn test_update_to_negative_removes() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 4, dec!(10));

        assert!(cart.update(item.row_id(), -3).unwrap().is_none());
        assert_eq!(cart.item_count().unwrap(), 0);
    }

    #[test]
    fn test_update_non_numeric_quantity() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 1, dec!(10));

        let result = cart.update(item.row_id(), "many");
        assert!(matches!(result, Err(CartError::InvalidQuantity(_))));
        assert_eq!(cart.get(item.row_id()).unwrap().quantity(), dec!(1));
    }

    #[test]
    fn test_update_with_rekey_moves_row() {
        let cart = cart();
        let item = cart
            .add("p1", "Shirt", 2, dec!(10), ItemOptions::new().with("size", "L"))
            .unwrap();

        let moved = cart
            .update_with(
                item.row_id(),
                ItemUpdate::default().with_options(ItemOptions::new().with("size", "XL")),
            )
            .unwrap()
            .unwrap();

        assert_ne!(moved.row_id(), item.row_id());
        assert_eq!(moved.quantity(), dec!(2));
        assert_eq!(cart.item_count().unwrap(), 1);
        assert!(matches!(cart.get(item.row_id()), Err(CartError::RowNotFound(_))));
    }

    #[test]
    fn test_update_with_rekey_merges_into_existing_row() {
        let cart = cart();
        let large = cart
            .add("p1", "Shirt", 2, dec!(10), ItemOptions::new().with("size", "L"))
            .unwrap();
        let medium = cart
            .add("p1", "Shirt", 3, dec!(10), ItemOptions::new().with("size", "M"))
            .unwrap();

        let merged = cart
            .update_with(
                large.row_id(),
                ItemUpdate::default().with_options(ItemOptions::new().with("size", "M")),
            )
            .unwrap()
            .unwrap();

        assert_eq!(merged.row_id(), medium.row_id());
        assert_eq!(merged.quantity(), dec!(5));
        assert_eq!(cart.item_count().unwrap(), 1);
    }

    #[test]
    fn test_update_with_rekey_rejects_non_positive_merge() {
        let cart = cart();
        let large = cart
            .add("p1", "Shirt", 2, dec!(10), ItemOptions::new().with("size", "L"))
            .unwrap();
        cart.add("p1", "Shirt", 3, dec!(10), ItemOptions::new().with("size", "M"))
            .unwrap();

        let result = cart.update_with(
            large.row_id(),
            ItemUpdate::quantity(dec!(-5)).with_options(ItemOptions::new().with("size", "M")),
        );

        assert!(matches!(result, Err(CartError::InvalidQuantity(_))));
        assert_eq!(cart.item_count().unwrap(), 2);
    }

    #[test]
    fn test_update_with_metadata_only() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 1, dec!(10));

        let updated = cart
            .update_with(
                item.row_id(),
                ItemUpdate::default()
                    .with_name("Renamed")
                    .with_unit_price(dec!(15))
                    .with_tax_rate(dec!(10)),
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.row_id(), item.row_id());
        assert_eq!(updated.name(), "Renamed");
        assert_eq!(cart.total().unwrap(), dec!(16.5));
    }

    #[test]
    fn test_set_tax_rate() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 3, dec!(100));

        let taxed = cart.set_tax_rate(item.row_id(), 20).unwrap();
        assert_eq!(taxed.tax_rate(), dec!(20));
        assert_eq!(cart.tax().unwrap(), dec!(60));
        assert_eq!(cart.total().unwrap(), dec!(360));
    }

    #[test]
    fn test_remove_item() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 1, dec!(10));

        cart.remove(item.row_id()).unwrap();
        assert_eq!(cart.item_count().unwrap(), 0);
    }

    #[test]
    fn test_not_found_leaves_contents_unchanged() {
        let cart = cart();
        add_plain(&cart, "p1", 2, dec!(10));
        let before = cart.content().unwrap();
        let missing = RowId::new("missing");

        assert!(matches!(cart.get(&missing), Err(CartError::RowNotFound(_))));
        assert!(matches!(cart.update(&missing, 1), Err(CartError::RowNotFound(_))));
        assert!(matches!(cart.remove(&missing), Err(CartError::RowNotFound(_))));
        assert!(matches!(
            cart.set_tax_rate(&missing, 5),
            Err(CartError::RowNotFound(_))
        ));

        assert_eq!(cart.content().unwrap(), before);
    }

    #[test]
    fn test_removed_row_is_not_found() {
        let cart = cart();
        let item = add_plain(&cart, "p1", 1, dec!(10));
        cart.remove(item.row_id()).unwrap();

        assert!(matches!(cart.remove(item.row_id()), Err(CartError::RowNotFound(_))));
    }

    #[test]
    fn test_aggregates() {
        let cart = cart();
        add_plain(&cart, "a", 2, dec!(10));
        add_plain(&cart, "b", 1, dec!(5));

        assert_eq!(cart.subtotal().unwrap(), dec!(25));
        assert_eq!(cart.total().unwrap(), dec!(25));
        assert_eq!(cart.tax().unwrap(), dec!(0));
        assert_eq!(cart.item_count().unwrap(), 2);
        assert_eq!(cart.total_quantity().unwrap(), dec!(3));
    }

    #[test]
    fn test_formatted_aggregates() {
        let cart = cart();
        add_plain(&cart, "a", 1000, dec!(12.345));

        let fmt = NumberFormat::default();
        assert_eq!(cart.subtotal_formatted(&fmt).unwrap(), "12,345.00");
        assert_eq!(cart.total_formatted(&fmt).unwrap(), "12,345.00");
        assert_eq!(cart.tax_formatted(&fmt).unwrap(), "0.00");
        assert_eq!(
            cart.total_formatted(&NumberFormat::new(1, ",", ".")).unwrap(),
            "12.345,0"
        );
    }

    #[test]
    fn test_add_merge_overflow() {
        let cart = cart();
        let item = cart
            .add("p", "P", Decimal::MAX, 1, ItemOptions::new())
            .unwrap();

        let merged = cart.add("p", "P", Decimal::MAX, 1, ItemOptions::new());
        assert!(matches!(merged, Err(CartError::Overflow)));
        assert_eq!(cart.get(item.row_id()).unwrap().quantity(), Decimal::MAX);
    }

    #[test]
    fn test_aggregate_overflow() {
        let cart = cart();
        cart.add("p", "P", Decimal::MAX, 2, ItemOptions::new())
            .unwrap();

        assert!(matches!(cart.totals(), Err(CartError::Overflow)));
        assert!(matches!(cart.total(), Err(CartError::Overflow)));
        assert!(matches!(cart.subtotal(), Err(CartError::Overflow)));
        assert!(matches!(
            cart.total_formatted(&NumberFormat::default()),
            Err(CartError::Overflow)
        ));
        assert_eq!(cart.item_count().unwrap(), 1);
    }

    #[test]
    fn test_add_rejects_non_finite_option() {
        let cart = cart();
        add_plain(&cart, "a", 1, dec!(10));

        let bad = cart.add("q", "Q", 1, 10, ItemOptions::new().with("w", f64::NAN));
        assert!(matches!(bad, Err(CartError::InvalidOption(_))));
        assert_eq!(cart.item_count().unwrap(), 1);
        assert_eq!(cart.total().unwrap(), dec!(10));
    }

    #[test]
    fn test_destroy() {
        let cart = cart();
        add_plain(&cart, "a", 1, dec!(10));
        assert!(cart.store().exists("cart.shop").unwrap());

        cart.destroy().unwrap();
        assert!(!cart.store().exists("cart.shop").unwrap());
        assert_eq!(cart.item_count().unwrap(), 0);
    }

    #[test]
    fn test_instance_isolation() {
        let mut cart = cart();
        add_plain(&cart, "a", 1, dec!(10));

        cart.instance("wishlist");
        assert_eq!(cart.item_count().unwrap(), 0);
        add_plain(&cart, "b", 3, dec!(1));
        cart.destroy().unwrap();

        cart.instance("shop");
        assert_eq!(cart.item_count().unwrap(), 1);
        assert_eq!(cart.total_quantity().unwrap(), dec!(1));
    }

    #[test]
    fn test_custom_config_key_prefix() {
        let config = CartConfig {
            key_prefix: "basket".to_string(),
            default_instance: "main".to_string(),
            ..CartConfig::default()
        };
        let cart = Cart::with_config(MemoryStore::new(), config);
        add_plain(&cart, "a", 1, dec!(10));

        assert!(cart.store().exists("basket.main").unwrap());
    }
}
