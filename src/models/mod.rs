//! Wire models exchanged with the storefront backend and kept in local storage.
//!
//! Field names follow the backend's JSON (`productId`, `quantity_present`, ...);
//! the Rust side uses snake case throughout.

pub mod address;
pub mod cart;
pub mod identity;
pub mod wishlist;

pub use address::Address;
pub use cart::{CartItem, CartTotals, QuantityChange};
pub use identity::{Identity, RemainingTime, Role};
pub use wishlist::{WishlistItem, WishlistQuery, WishlistSort};

use serde::{Deserialize, Deserializer};

/// Product images arrive either as a single URL or as a list of URLs.
pub(crate) fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Images {
        One(String),
        Many(Vec<String>),
        Missing(Option<()>),
    }

    Ok(match Images::deserialize(deserializer)? {
        Images::One(url) => vec![url],
        Images::Many(urls) => urls,
        Images::Missing(_) => Vec::new(),
    })
}
