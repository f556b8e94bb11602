//! Cart line items as returned by `/fetch-cart`.

use serde::{Deserialize, Serialize};

/// One product in the server-side cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier, unique within the cart
    #[serde(rename = "productId")]
    pub product_id: String,
    /// Units of the product in the cart
    #[serde(rename = "quantity_present", default = "default_quantity")]
    pub quantity_present: u32,
    /// Stock currently available on the server
    #[serde(rename = "total_quantity", default)]
    pub total_quantity: u32,
    /// Unit selling price
    #[serde(default)]
    pub selling: f64,
    /// Unit list price, display only
    #[serde(default)]
    pub price: f64,
    /// Product display name
    #[serde(rename = "productName", default)]
    pub product_name: String,
    /// Product image URLs, first one is the thumbnail
    #[serde(
        rename = "productImage",
        default,
        deserialize_with = "super::deserialize_images"
    )]
    pub product_image: Vec<String>,
    /// Catalog category
    #[serde(default)]
    pub category: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Direction of a cart quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// One more unit
    Increase,
    /// One fewer unit
    Decrease,
}

impl CartItem {
    /// Whether the item still has stock and should be rendered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.total_quantity > 0
    }

    /// Selling price times quantity.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.selling * f64::from(self.quantity_present)
    }

    /// List price times quantity.
    #[must_use]
    pub fn list_total(&self) -> f64 {
        self.price * f64::from(self.quantity_present)
    }

    /// Thumbnail URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.product_image.first().map(String::as_str)
    }

    /// Quantity after applying `change`, or `None` when the result would leave
    /// `[1, total_quantity]`.
    #[must_use]
    pub fn next_quantity(&self, change: QuantityChange) -> Option<u32> {
        match change {
            QuantityChange::Increase if self.quantity_present < self.total_quantity => {
                Some(self.quantity_present + 1)
            }
            QuantityChange::Decrease if self.quantity_present > 1 => {
                Some(self.quantity_present - 1)
            }
            _ => None,
        }
    }
}

/// Price summary over the rendered cart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartTotals {
    /// Number of distinct rendered items
    pub item_count: usize,
    /// Total units across rendered items
    pub unit_count: u32,
    /// Sum of selling price times quantity
    pub selling_total: f64,
    /// Sum of list price times quantity
    pub list_total: f64,
}

impl CartTotals {
    /// Sums over items that are in stock.
    #[must_use]
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a CartItem>,
    {
        items
            .into_iter()
            .filter(|item| item.in_stock())
            .fold(Self::default(), |mut totals, item| {
                totals.item_count += 1;
                totals.unit_count += item.quantity_present;
                totals.selling_total += item.line_total();
                totals.list_total += item.list_total();
                totals
            })
    }

    /// List total minus selling total, never negative.
    #[must_use]
    pub fn savings(&self) -> f64 {
        (self.list_total - self.selling_total).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    fn item(quantity_present: u32, total_quantity: u32) -> CartItem {
        CartItem {
            product_id: "p1".to_string(),
            quantity_present,
            total_quantity,
            selling: 1200.0,
            price: 1500.0,
            product_name: "Kanjivaram Silk".to_string(),
            product_image: vec![],
            category: None,
        }
    }

    #[test]
    fn test_parse_fetch_cart_row() {
        let json = serde_json::json!({
            "productId": "64a1",
            "quantity_present": 2,
            "total_quantity": 5,
            "selling": 2499,
            "price": 3999,
            "productName": "Ikat Cotton Saree",
            "productImage": ["https://img/1.jpg", "https://img/2.jpg"],
            "category": "sarees"
        });
        let item: CartItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.product_id, "64a1");
        assert_eq!(item.quantity_present, 2);
        assert_eq!(item.total_quantity, 5);
        assert_eq!(item.selling, 2499.0);
        assert_eq!(item.primary_image(), Some("https://img/1.jpg"));
        assert_eq!(item.line_total(), 4998.0);
    }

    #[test]
    fn test_single_image_string_accepted() {
        let json = serde_json::json!({
            "productId": "64a2",
            "quantity_present": 1,
            "total_quantity": 1,
            "productImage": "https://img/only.jpg"
        });
        let item: CartItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.product_image, vec!["https://img/only.jpg".to_string()]);
    }

    #[test]
    fn test_next_quantity_bounds() {
        assert_eq!(item(1, 3).next_quantity(QuantityChange::Increase), Some(2));
        assert_eq!(item(3, 3).next_quantity(QuantityChange::Increase), None);
        assert_eq!(item(2, 3).next_quantity(QuantityChange::Decrease), Some(1));
        assert_eq!(item(1, 3).next_quantity(QuantityChange::Decrease), None);
        // Stock dropped below what is in the cart: no increase, decrease still allowed
        assert_eq!(item(4, 2).next_quantity(QuantityChange::Increase), None);
        assert_eq!(item(4, 2).next_quantity(QuantityChange::Decrease), Some(3));
    }

    #[test]
    fn test_totals_skip_out_of_stock() {
        let items = vec![item(2, 5), item(1, 0)];
        let totals = CartTotals::from_items(&items);
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.unit_count, 2);
        assert_eq!(totals.selling_total, 2400.0);
        assert_eq!(totals.list_total, 3000.0);
        assert_eq!(totals.savings(), 600.0);
    }
}
