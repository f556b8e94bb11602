//! Local storage database configuration.
//!
//! The storefront persists a handful of string keys between runs (session anchor,
//! countdown cache, selected checkout address). They live in a single `SQLite` table
//! generated from the [`StorageEntry`] entity with `Schema::create_table_from_entity`.

use crate::entities::StorageEntry;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

const DEFAULT_STORAGE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Gets the storage URL from `STOREFRONT_STORAGE_URL` or returns the default `SQLite` path.
#[must_use]
pub fn get_storage_url() -> String {
    std::env::var("STOREFRONT_STORAGE_URL").unwrap_or_else(|_| DEFAULT_STORAGE_URL.to_string())
}

/// Creates the directory holding a file-backed `SQLite` URL, so `mode=rwc` can
/// create the file. In-memory URLs are left alone.
pub fn ensure_storage_dir(url: &str) -> Result<()> {
    let Some(path) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    match std::path::Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
        }
        _ => {}
    }
    Ok(())
}

/// Opens the local storage database at `url`.
pub async fn create_connection(url: &str) -> Result<DatabaseConnection> {
    Database::connect(url).await.map_err(Into::into)
}

/// Creates the storage table if it does not exist yet.
///
/// Safe to call on every start: the statement carries `IF NOT EXISTS`, so an
/// existing file-backed store keeps its entries across restarts.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut storage_table = schema.create_table_from_entity(StorageEntry);
    storage_table.if_not_exists();

    db.execute(builder.build(&storage_table)).await?;

    Ok(())
}
