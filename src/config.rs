//! Settings
//!
//! Layered in order of precedence (last wins):
//!
//! ```text
//! built-in defaults
//!   └─→ TOML file (optional)
//!        └─→ KEYSLOT__* environment variables   e.g. KEYSLOT__LIMITS__MAX_MESSAGE_BYTES=512
//! ```

use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size and value limits enforced by the registries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub max_username_len: usize,
    pub max_display_name_len: usize,
    pub max_message_bytes: usize,
    pub max_payload_bytes: usize,
    pub max_vault_balance: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_username_len: 32,
            max_display_name_len: 64,
            max_message_bytes: 1024,
            max_payload_bytes: 4096,
            max_vault_balance: 1_000_000_000_000,
        }
    }
}

/// Claim journal behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalSettings {
    /// fsync after every record
    pub sync_writes: bool,
    /// Compact once this many records were appended (0 disables)
    pub compact_after: usize,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            sync_writes: true,
            compact_after: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding namespace journals
    pub data_dir: PathBuf,
    pub limits: Limits,
    pub journal: JournalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/keyslot"),
            limits: Limits::default(),
            journal: JournalSettings::default(),
        }
    }
}

impl Settings {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Settings::default())
            .map_err(|e| Error::Config(format!("Failed to build defaults: {}", e)))?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            debug!(path = ?path, "Loading settings file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix("KEYSLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(format!("Failed to load settings: {}", e)))?
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Invalid settings: {}", e)))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::SerializationError(format!("Failed to render settings: {}", e)))
    }
}
