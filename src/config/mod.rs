/// Remote storefront API location and HTTP transport settings
pub mod api;

/// Local persistent storage connection and table creation
pub mod database;

/// Session timing settings loaded from storefront.toml
pub mod settings;
