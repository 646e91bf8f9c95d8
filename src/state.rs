use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::auth::AuthGate;
use crate::export::Delimiting;
use crate::persistence::Storage;
use crate::records::RecordStore;
use crate::settings::SettingsStore;
use crate::types::Config;

/// Application state shared with the host shell.
///
/// Lock order when more than one is needed: settings, then records, then auth.
pub struct AppState {
    pub config: Mutex<Config>,
    pub settings: Mutex<SettingsStore>,
    pub records: Mutex<RecordStore>,
    pub auth: Mutex<AuthGate>,
}

impl AppState {
    /// Open both stores under the storage root named by `config`.
    pub fn open(config: &Config) -> Result<Self, String> {
        let root = data_root(config)?;
        log::info!("Opening sales data at {}", root.display());
        Ok(Self::with_storage(Storage::new(root), config.clone()))
    }

    pub fn with_storage(storage: Storage, config: Config) -> Self {
        Self {
            settings: Mutex::new(SettingsStore::load(storage.clone())),
            records: Mutex::new(RecordStore::load(storage)),
            auth: Mutex::new(AuthGate::new()),
            config: Mutex::new(config),
        }
    }

    pub fn delimiting(&self) -> Delimiting {
        Delimiting::from_config(self.config.lock().quote_export)
    }

    /// Configured export directory, or the current directory.
    pub fn export_dir(&self) -> PathBuf {
        match &self.config.lock().export_dir {
            Some(dir) => expand_home(dir),
            None => PathBuf::from("."),
        }
    }
}

/// Get the canonical config file path (~/.salesdesk/config.json)
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".salesdesk").join("config.json"))
}

/// Load configuration from ~/.salesdesk/config.json
///
/// A missing file means defaults. A file that exists but does not parse is
/// an error so a typo is not silently ignored.
pub fn load_config() -> Result<Config, String> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}

/// Storage root for the durable blobs.
pub fn data_root(config: &Config) -> Result<PathBuf, String> {
    match &config.data_dir {
        Some(dir) if !dir.trim().is_empty() => Ok(expand_home(dir)),
        _ => Storage::default_root(),
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
