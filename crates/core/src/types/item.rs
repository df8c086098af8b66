//! Shopping list and cart line items.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Deserializer, Serialize};

use super::price::Price;

/// Error returned for a quantity below one.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("quantity must be at least 1, got {0}")]
pub struct QuantityError(pub i64);

/// How many units of an item to buy. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit, used when a line omits `qty`.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError` for zero, negative or out-of-range values.
    pub fn new(qty: i64) -> Result<Self, QuantityError> {
        u32::try_from(qty)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(QuantityError(qty))
    }

    /// The raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// One line of a shopping list or cart.
///
/// The frontend builds these from search results, so `id` is the result's
/// opaque identifier and `store` may be empty when the source was unknown.
/// Payloads for export and email often omit `id`; a missing `qty` means one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Identifier of the search result this line came from.
    #[serde(default)]
    pub id: String,
    /// Product title.
    pub title: String,
    /// Store name or domain.
    #[serde(default)]
    pub store: String,
    /// Unit price.
    pub price: Price,
    /// Units to buy.
    #[serde(default)]
    pub qty: Quantity,
}

impl ListItem {
    /// `price * qty` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.line_total(self.qty)
    }

    /// Store label for display, `N/A` when unknown.
    #[must_use]
    pub fn store_label(&self) -> &str {
        if self.store.trim().is_empty() {
            "N/A"
        } else {
            &self.store
        }
    }

    /// Sum of line totals.
    #[must_use]
    pub fn grand_total(items: &[Self]) -> Price {
        Price::total(items.iter().map(|item| (item.price, item.qty)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
        assert_eq!(Quantity::new(0), Err(QuantityError(0)));
        assert_eq!(Quantity::new(-2), Err(QuantityError(-2)));
        assert!(Quantity::new(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_item_defaults_when_fields_missing() {
        let item: ListItem =
            serde_json::from_str(r#"{"title":"Eggs 12ct","price":7.19}"#).unwrap();
        assert_eq!(item.id, "");
        assert_eq!(item.store, "");
        assert_eq!(item.qty, Quantity::ONE);
        assert_eq!(item.store_label(), "N/A");
    }

    #[test]
    fn test_items_beyond_price_range_are_rejected() {
        let items = serde_json::from_str::<Vec<ListItem>>(
            r#"[{"title":"x","price":"79228162514264337593543950335","qty":2}]"#,
        );
        assert!(items.is_err());

        let items: Vec<ListItem> =
            serde_json::from_str(r#"[{"title":"x","price":"9999999999.99","qty":2}]"#).unwrap();
        assert_eq!(
            ListItem::grand_total(&items).amount(),
            "19999999999.98".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_item_rejects_zero_qty() {
        let err = serde_json::from_str::<ListItem>(r#"{"title":"Milk","price":4.5,"qty":0}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_grand_total() {
        let items: Vec<ListItem> = serde_json::from_str(
            r#"[
                {"id":"a","title":"Eggs","store":"walmart.com","price":7.19,"qty":2},
                {"id":"b","title":"Milk","store":"target.com","price":4.50}
            ]"#,
        )
        .unwrap();
        let expected: Decimal = "18.88".parse().unwrap();
        assert_eq!(ListItem::grand_total(&items).amount(), expected);
        assert_eq!(items[0].line_total().to_string(), "$14.38");
    }

    #[test]
    fn test_item_serializes_numbers() {
        let item = ListItem {
            id: "x".into(),
            title: "Bread".into(),
            store: "aldi.us".into(),
            price: Price::parse_text("$2.49").unwrap(),
            qty: Quantity::new(2).unwrap(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["qty"], 2);
        assert!(json["price"].is_number());
    }
}
