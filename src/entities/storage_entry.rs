//! Storage entry entity - the persisted key/value pairs of the storefront.
//!
//! Plays the role browser local storage plays for a web storefront: the
//! session anchor (`sessionStartTime`), the countdown display cache
//! (`remainingTime`) and the checkout address hand-off (`selectedAddress`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage entry database model - one row per storage key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_entries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Storage key (e.g., `"sessionStartTime"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Raw string value, JSON for structured entries
    pub value: String,
    /// When this entry was last written
    pub updated_at: DateTime,
}

/// `StorageEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
