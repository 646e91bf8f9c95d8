//! Durable storage for the two state blobs.
//!
//! Layout under the storage root:
//!   salesData.json      the record collection, most recent first
//!   adminSettings.json  the admin settings singleton
//!
//! Loads never fail: a missing blob means "use defaults", and an unreadable
//! or malformed blob is logged and treated the same way. Saves overwrite the
//! whole blob atomically and report failures to the caller.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::settings::default_settings;
use crate::types::{AdminSettings, SalesRecord};
use crate::util::atomic_write_str;

pub const RECORDS_BLOB: &str = "salesData.json";
pub const SETTINGS_BLOB: &str = "adminSettings.json";

/// Handle to a storage root directory. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default storage root (~/.salesdesk/data)
    pub fn default_root() -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Could not find home directory")?;
        Ok(home.join(".salesdesk").join("data"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blob_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Raw text of blob `name`, or `None` when absent or unreadable.
    pub fn read_blob(&self, name: &str) -> Option<String> {
        let path = self.blob_path(name);
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                None
            }
        }
    }

    pub fn write_blob(&self, name: &str, content: &str) -> Result<(), StoreError> {
        let path = self.blob_path(name);
        atomic_write_str(&path, content).map_err(|e| {
            log::error!("Failed to write {}: {}", path.display(), e);
            StoreError::from(e)
        })
    }

    pub fn load_settings(&self) -> AdminSettings {
        match self.load_blob::<AdminSettings>(SETTINGS_BLOB) {
            Some(mut settings) => {
                settings.custom_fields.normalize();
                settings
            }
            None => default_settings(),
        }
    }

    /// Records are parsed one at a time so a single unreadable entry is
    /// skipped instead of discarding the collection.
    pub fn load_records(&self) -> Vec<SalesRecord> {
        let Some(entries) = self.load_blob::<Vec<serde_json::Value>>(RECORDS_BLOB) else {
            return Vec::new();
        };
        let total = entries.len();
        let records: Vec<SalesRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping unreadable record {} in {}: {}", index, RECORDS_BLOB, e);
                    None
                }
            })
            .collect();
        if records.len() < total {
            log::warn!("Loaded {} of {} records from {}", records.len(), total, self.root.display());
        }
        records
    }

    pub fn save_settings(&self, settings: &AdminSettings) -> Result<(), StoreError> {
        self.save_blob(SETTINGS_BLOB, settings)
    }

    pub fn save_records(&self, records: &[SalesRecord]) -> Result<(), StoreError> {
        self.save_blob(RECORDS_BLOB, &records)
    }

    fn load_blob<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let content = self.read_blob(name)?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!(
                    "Malformed {} in {}: {}. Treating as no data.",
                    name,
                    self.root.display(),
                    e
                );
                None
            }
        }
    }

    fn save_blob<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value)?;
        self.write_blob(name, &content)
    }
}
