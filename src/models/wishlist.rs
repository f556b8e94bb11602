//! Wishlist entries as returned by `/fetch-wishlist`, plus the browse filters
//! the wishlist page applies to them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One product on the wishlist. No quantity: membership only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Product identifier, unique within the wishlist
    #[serde(rename = "productId")]
    pub product_id: String,
    /// Product display name
    #[serde(rename = "productName", default)]
    pub product_name: String,
    /// Unit selling price
    #[serde(default)]
    pub selling: f64,
    /// Unit list price, when the backend denormalises it
    #[serde(default)]
    pub price: Option<f64>,
    /// Catalog category
    #[serde(default)]
    pub category: Option<String>,
    /// Fabric, when known
    #[serde(default)]
    pub fabric: Option<String>,
    /// Product image URLs
    #[serde(
        rename = "productImage",
        default,
        deserialize_with = "super::deserialize_images"
    )]
    pub product_image: Vec<String>,
}

/// Ordering applied when browsing the wishlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WishlistSort {
    /// Cheapest first
    #[default]
    PriceAsc,
    /// Most expensive first
    PriceDesc,
    /// Alphabetical by product name
    Name,
}

/// Filter and sort options for the wishlist page. `None` filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistQuery {
    /// Keep only this category
    pub category: Option<String>,
    /// Keep only this fabric
    pub fabric: Option<String>,
    /// Result ordering
    pub sort: WishlistSort,
}

impl WishlistQuery {
    /// Applies the filters and ordering to `items`.
    #[must_use]
    pub fn apply(&self, items: &[WishlistItem]) -> Vec<WishlistItem> {
        let mut selected: Vec<WishlistItem> = items
            .iter()
            .filter(|item| matches_filter(self.category.as_deref(), item.category.as_deref()))
            .filter(|item| matches_filter(self.fabric.as_deref(), item.fabric.as_deref()))
            .cloned()
            .collect();

        match self.sort {
            WishlistSort::PriceAsc => selected.sort_by(|a, b| compare_price(a.selling, b.selling)),
            WishlistSort::PriceDesc => {
                selected.sort_by(|a, b| compare_price(b.selling, a.selling));
            }
            WishlistSort::Name => selected.sort_by(|a, b| a.product_name.cmp(&b.product_name)),
        }
        selected
    }
}

fn matches_filter(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| actual == Some(wanted))
}

fn compare_price(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
