use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::reminder::DEFAULT_REMINDER_TITLE;
use crate::storage::StorageError;
use crate::store::DEFAULT_STORAGE_KEY;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_reminder_title")]
    pub reminder_title: String,
    #[serde(default = "default_dispatch_interval_secs")]
    pub dispatch_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            reminder_title: default_reminder_title(),
            dispatch_interval_secs: default_dispatch_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Reads `config.json` from `dir`; a missing or unreadable file yields the defaults.
    pub fn load(dir: &Path) -> Self {
        match Self::try_load(dir) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(err) => {
                log::warn!(
                    "config: falling back to defaults dir={} err={err}",
                    dir.display()
                );
                Self::default()
            }
        }
    }

    pub fn try_load(dir: &Path) -> Result<Option<Self>, StorageError> {
        let path = dir.join(CONFIG_FILE);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_slice(&raw)?;
        Ok(Some(config.normalized()))
    }

    fn normalized(mut self) -> Self {
        if self.storage_key.trim().is_empty() {
            self.storage_key = default_storage_key();
        }
        if self.reminder_title.trim().is_empty() {
            self.reminder_title = default_reminder_title();
        }
        self.dispatch_interval_secs = self.dispatch_interval_secs.max(1);
        self
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_reminder_title() -> String {
    DEFAULT_REMINDER_TITLE.to_string()
}

fn default_dispatch_interval_secs() -> u64 {
    1
}
