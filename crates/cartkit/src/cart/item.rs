//! Line items, their options and row identity.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CartError, CartResult};
use crate::ids::{ProductId, RowId};
use crate::money::{NumberFormat, Numeric};

/// A scalar option value (size, colour, engraving text, gift wrap flag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl OptionValue {
    fn tag(&self) -> u8 {
        match self {
            OptionValue::Flag(_) => b'b',
            OptionValue::Integer(_) => b'i',
            OptionValue::Number(_) => b'f',
            OptionValue::Text(_) => b's',
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(v) => write!(f, "{}", v),
            OptionValue::Integer(v) => write!(f, "{}", v),
            OptionValue::Number(v) => write!(f, "{}", v),
            OptionValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Flag(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        OptionValue::Integer(i64::from(v))
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Integer(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Number(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Text(v)
    }
}

/// Selected options of a line item.
///
/// Kept sorted by key, so two option sets with the same entries are equal
/// and hash to the same row no matter the order they were given in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemOptions(BTreeMap<String, OptionValue>);

impl ItemOptions {
    /// An empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an option.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up an option by key.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no options are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject values that cannot be stored, i.e. NaN or infinite numbers.
    fn validate(&self) -> CartResult<()> {
        match self
            .iter()
            .find(|(_, value)| matches!(value, OptionValue::Number(n) if !n.is_finite()))
        {
            Some((key, value)) => Err(CartError::InvalidOption(format!("{}={}", key, value))),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for ItemOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl RowId {
    /// Derive the row identity of a product with a set of options.
    ///
    /// The product id and the key-sorted options are fed to SHA-256 with
    /// length prefixes and a type tag per value, and the first 16 bytes of
    /// the digest are hex encoded. Changing the product, any option key or
    /// any option value gives a different row.
    pub fn derive(product_id: &ProductId, options: &ItemOptions) -> RowId {
        fn field(hasher: &mut Sha256, bytes: &[u8]) {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }

        let mut hasher = Sha256::new();
        field(&mut hasher, product_id.as_str().as_bytes());
        hasher.update((options.len() as u64).to_le_bytes());
        for (key, value) in options.iter() {
            field(&mut hasher, key.as_bytes());
            hasher.update([value.tag()]);
            field(&mut hasher, value.to_string().as_bytes());
        }
        let digest = hasher.finalize();
        RowId::new(hex::encode(&digest[..16]))
    }
}

/// One product-with-options line in a cart.
///
/// The row id is fixed at construction. Quantity and tax rate may change;
/// every monetary figure is derived from the current values on each call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    row_id: RowId,
    product_id: ProductId,
    name: String,
    quantity: Decimal,
    unit_price: Decimal,
    #[serde(default)]
    options: ItemOptions,
    #[serde(default)]
    tax_rate: Decimal,
}

impl LineItem {
    /// Create a line item.
    ///
    /// The quantity is only checked for being numeric; a zero or negative
    /// quantity is allowed here and is caught by the cart or by
    /// [`LineItem::set_quantity`]. The unit price must be a finite,
    /// non-negative number, and numeric options must be finite.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        quantity: impl Numeric,
        unit_price: impl Numeric,
        options: ItemOptions,
    ) -> CartResult<Self> {
        let quantity = quantity
            .to_decimal()
            .ok_or_else(|| CartError::InvalidQuantity(format!("{:?}", quantity)))?;
        let unit_price = coerce_price(&unit_price)?;
        options.validate()?;
        let product_id = product_id.into();
        Ok(Self {
            row_id: RowId::derive(&product_id, &options),
            product_id,
            name: name.into(),
            quantity,
            unit_price,
            options,
            tax_rate: Decimal::ZERO,
        })
    }

    /// Builder-style tax rate, in percent.
    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn row_id(&self) -> &RowId {
        &self.row_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Unit price without tax.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn options(&self) -> &ItemOptions {
        &self.options
    }

    /// Tax rate in percent.
    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Set the quantity.
    ///
    /// Fails with [`CartError::InvalidQuantity`] unless `quantity` is a
    /// finite number greater than zero.
    pub fn set_quantity(&mut self, quantity: impl Numeric) -> CartResult<()> {
        match quantity.to_decimal() {
            Some(q) if q > Decimal::ZERO => {
                self.quantity = q;
                Ok(())
            }
            _ => Err(CartError::InvalidQuantity(format!("{:?}", quantity))),
        }
    }

    /// Set the tax rate in percent. Any number is accepted, including
    /// negative rates.
    pub fn set_tax_rate(&mut self, rate: impl Numeric) -> CartResult<()> {
        self.tax_rate = rate
            .to_decimal()
            .ok_or_else(|| CartError::InvalidTaxRate(format!("{:?}", rate)))?;
        Ok(())
    }

    /// Unvalidated quantity assignment used by cart updates, where a
    /// non-positive quantity means "remove this row".
    pub(crate) fn assign_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
    }

    /// Tax on one unit.
    ///
    /// # Panics
    ///
    /// Panics if the result is out of decimal range; see
    /// [`LineItem::checked_tax_amount`].
    pub fn tax_amount(&self) -> Decimal {
        self.unit_price * self.tax_rate / Decimal::ONE_HUNDRED
    }

    /// Unit price including tax.
    pub fn price_with_tax(&self) -> Decimal {
        self.unit_price + self.tax_amount()
    }

    /// Quantity times unit price, without tax.
    pub fn subtotal(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    /// Tax for the whole line.
    pub fn tax(&self) -> Decimal {
        self.tax_amount() * self.quantity
    }

    /// Quantity times price with tax.
    pub fn total(&self) -> Decimal {
        self.quantity * self.price_with_tax()
    }

    /// [`LineItem::tax_amount`], or `None` on overflow.
    pub fn checked_tax_amount(&self) -> Option<Decimal> {
        self.unit_price
            .checked_mul(self.tax_rate)?
            .checked_div(Decimal::ONE_HUNDRED)
    }

    pub fn checked_price_with_tax(&self) -> Option<Decimal> {
        self.unit_price.checked_add(self.checked_tax_amount()?)
    }

    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    pub fn checked_tax(&self) -> Option<Decimal> {
        self.checked_tax_amount()?.checked_mul(self.quantity)
    }

    pub fn checked_total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.checked_price_with_tax()?)
    }

    pub fn unit_price_formatted(&self, format: &NumberFormat) -> String {
        format.format(self.unit_price)
    }

    pub fn tax_amount_formatted(&self, format: &NumberFormat) -> String {
        format.format(self.tax_amount())
    }

    pub fn price_with_tax_formatted(&self, format: &NumberFormat) -> String {
        format.format(self.price_with_tax())
    }

    pub fn subtotal_formatted(&self, format: &NumberFormat) -> String {
        format.format(self.subtotal())
    }

    pub fn tax_formatted(&self, format: &NumberFormat) -> String {
        format.format(self.tax())
    }

    pub fn total_formatted(&self, format: &NumberFormat) -> String {
        format.format(self.total())
    }

    /// Apply a general update, producing the item as it should be stored.
    ///
    /// When the product or options change the result carries a new row id.
    pub(crate) fn updated(mut self, update: ItemUpdate) -> CartResult<Self> {
        if let Some(price) = update.unit_price {
            self.unit_price = coerce_price(&price)?;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(rate) = update.tax_rate {
            self.tax_rate = rate;
        }
        if let Some(quantity) = update.quantity {
            self.assign_quantity(quantity);
        }

        let rekey = update.product_id.is_some() || update.options.is_some();
        if let Some(product_id) = update.product_id {
            self.product_id = product_id;
        }
        if let Some(options) = update.options {
            options.validate()?;
            self.options = options;
        }
        if rekey {
            self.row_id = RowId::derive(&self.product_id, &self.options);
        }
        Ok(self)
    }
}

fn coerce_price(price: &impl Numeric) -> CartResult<Decimal> {
    match price.to_decimal() {
        Some(p) if p >= Decimal::ZERO => Ok(p),
        _ => Err(CartError::InvalidPrice(format!("{:?}", price))),
    }
}

/// A full description of an item to add, for batch adds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub options: ItemOptions,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
}

impl ItemDescriptor {
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            quantity,
            unit_price,
            options: ItemOptions::default(),
            tax_rate: None,
        }
    }

    pub fn with_options(mut self, options: ItemOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = Some(rate);
        self
    }

    /// Build the line item this descriptor names.
    pub fn into_line_item(self) -> CartResult<LineItem> {
        let item = LineItem::new(
            self.product_id,
            self.name,
            self.quantity,
            self.unit_price,
            self.options,
        )?;
        Ok(match self.tax_rate {
            Some(rate) => item.with_tax_rate(rate),
            None => item,
        })
    }
}

/// Changes to apply to a stored row. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub quantity: Option<Decimal>,
    pub product_id: Option<ProductId>,
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub options: Option<ItemOptions>,
    pub tax_rate: Option<Decimal>,
}

impl ItemUpdate {
    /// An update that only sets the quantity.
    pub fn quantity(quantity: Decimal) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_product_id(mut self, product_id: impl Into<ProductId>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_unit_price(mut self, price: Decimal) -> Self {
        self.unit_price = Some(price);
        self
    }

    pub fn with_options(mut self, options: ItemOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = Some(rate);
        self
    }
}
