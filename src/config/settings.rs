//! Session timing settings loaded from storefront.toml
//!
//! Every field has a default, so the file is optional. An example:
//!
//! ```toml
//! [session]
//! budget_secs = 3600
//! tick_millis = 1000
//! resync_delay_millis = 4000
//! ```

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_SETTINGS_PATH: &str = "storefront.toml";

/// Configuration structure representing the entire storefront.toml file
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Settings {
    /// Session timer settings
    #[serde(default)]
    pub session: SessionSettings,
}

/// Client-side session budget and timer cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Session validity window enforced on the client, in seconds
    pub budget_secs: u64,
    /// Countdown polling interval, in milliseconds
    pub tick_millis: u64,
    /// Delay between the expiry notice and the full resync, in milliseconds
    pub resync_delay_millis: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            budget_secs: 60 * 60,
            tick_millis: 1000,
            resync_delay_millis: 4000,
        }
    }
}

impl SessionSettings {
    /// Session budget as a [`Duration`]
    #[must_use]
    pub const fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }

    /// Timer tick as a [`Duration`]
    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// Post-expiry resync delay as a [`Duration`]
    #[must_use]
    pub const fn resync_delay(&self) -> Duration {
        Duration::from_millis(self.resync_delay_millis)
    }

    fn validate(self) -> Result<Self> {
        if self.budget_secs == 0 || self.tick_millis == 0 {
            return Err(Error::Config {
                message: "session budget_secs and tick_millis must be greater than zero"
                    .to_string(),
            });
        }
        Ok(self)
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or the
/// session timings are zero.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse storefront.toml: {e}"),
    })?;
    settings.session.validate()?;
    Ok(settings)
}

/// Loads ./storefront.toml when present, otherwise the built-in defaults.
pub fn load_default_settings() -> Result<Settings> {
    if Path::new(DEFAULT_SETTINGS_PATH).exists() {
        load_settings(DEFAULT_SETTINGS_PATH)
    } else {
        tracing::info!("No {DEFAULT_SETTINGS_PATH} found, using default session settings");
        Ok(Settings::default())
    }
}
