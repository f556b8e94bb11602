//! Delivery address chosen at checkout, handed from the order preparation step
//! to the order confirmation step through the `selectedAddress` storage key.

use serde::{Deserialize, Serialize};

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Server-side identifier
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Label such as "Home"
    #[serde(default)]
    pub address_name: String,
    /// Recipient name
    #[serde(rename = "fullname", default)]
    pub full_name: String,
    /// Street address
    #[serde(default)]
    pub address_content: String,
    /// Nearby landmark
    #[serde(default)]
    pub landmark: String,
    /// Postal code
    #[serde(default)]
    pub pincode: String,
    /// State
    #[serde(default)]
    pub state: String,
    /// Contact number
    #[serde(default)]
    pub phone: String,
    /// Address type (home, work...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Address {
    /// Two addresses are the same selection if their ids match, or, when
    /// either has no id, if every field matches.
    #[must_use]
    pub fn same_selection(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}
