//! Persistent key/value storage - the storefront's local storage.
//!
//! Raw string get/set/remove over the `storage_entries` table, plus typed accessors
//! for the three keys the storefront uses. Writes are last-writer-wins upserts.

use crate::{
    entities::{StorageEntry, storage_entry},
    errors::{Error, Result},
    models::{Address, RemainingTime},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::trace;

/// Session anchor, epoch milliseconds as a decimal string
pub const SESSION_START_KEY: &str = "sessionStartTime";
/// Countdown display cache, `{hours, minutes, seconds}` JSON
pub const REMAINING_TIME_KEY: &str = "remainingTime";
/// Checkout address hand-off, address JSON
pub const SELECTED_ADDRESS_KEY: &str = "selectedAddress";

/// Keys cleared when a session ends.
pub const SESSION_KEYS: [&str; 2] = [SESSION_START_KEY, REMAINING_TIME_KEY];

/// Reads the raw value stored under `key`.
pub async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let entry = StorageEntry::find()
        .filter(storage_entry::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(entry.map(|e| e.value))
}

/// Writes `value` under `key`, replacing any previous value.
pub async fn set_value<C>(db: &C, key: &str, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    trace!(key, %value, "storage write");

    let existing = StorageEntry::find()
        .filter(storage_entry::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(entry) = existing {
        let mut active_model: storage_entry::ActiveModel = entry.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_entry = storage_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_entry.insert(db).await?;
    }

    Ok(())
}

/// Deletes `key`. Returns whether anything was stored under it.
pub async fn remove_value<C>(db: &C, key: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = StorageEntry::delete_many()
        .filter(storage_entry::Column::Key.eq(key))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Deletes every stored key. Returns the number of entries removed.
pub async fn clear_all<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = StorageEntry::delete_many().exec(db).await?;
    Ok(result.rows_affected)
}

/// Deletes the session anchor and the countdown cache.
pub async fn clear_session_keys<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    for key in SESSION_KEYS {
        remove_value(db, key).await?;
    }
    Ok(())
}

/// The persisted session start, epoch milliseconds.
///
/// # Errors
/// [`Error::Storage`] when the stored value is not an integer.
pub async fn session_start<C>(db: &C) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let Some(raw) = get_value(db, SESSION_START_KEY).await? else {
        return Ok(None);
    };
    raw.trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| Error::Storage {
            key: SESSION_START_KEY.to_string(),
            message: format!("`{raw}` is not an epoch timestamp: {e}"),
        })
}

/// Persists the session start, epoch milliseconds.
pub async fn set_session_start<C>(db: &C, started_at_ms: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    set_value(db, SESSION_START_KEY, started_at_ms.to_string()).await
}

/// The cached countdown, if any.
pub async fn remaining_time<C>(db: &C) -> Result<Option<RemainingTime>>
where
    C: ConnectionTrait,
{
    get_json(db, REMAINING_TIME_KEY).await
}

/// Caches the countdown for display continuity.
pub async fn set_remaining_time<C>(db: &C, remaining: RemainingTime) -> Result<()>
where
    C: ConnectionTrait,
{
    set_value(db, REMAINING_TIME_KEY, serde_json::to_string(&remaining)?).await
}

/// The address picked at checkout, if any.
pub async fn selected_address<C>(db: &C) -> Result<Option<Address>>
where
    C: ConnectionTrait,
{
    get_json(db, SELECTED_ADDRESS_KEY).await
}

/// Stores the address picked at checkout.
pub async fn set_selected_address<C>(db: &C, address: &Address) -> Result<()>
where
    C: ConnectionTrait,
{
    set_value(db, SELECTED_ADDRESS_KEY, serde_json::to_string(address)?).await
}

async fn get_json<C, T>(db: &C, key: &str) -> Result<Option<T>>
where
    C: ConnectionTrait,
    T: serde::de::DeserializeOwned,
{
    let Some(raw) = get_value(db, key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| Error::Storage {
            key: key.to_string(),
            message: e.to_string(),
        })
}
