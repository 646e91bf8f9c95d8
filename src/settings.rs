//! Settings Store: the single live `AdminSettings` plus its durable copy.
//!
//! `replace` and `reset_to_default` swap the whole value and write it through
//! to storage. The draft helpers on `AdminSettings` below are what the admin
//! panel uses on its own clone before committing it with `replace`.

use crate::error::StoreError;
use crate::fields::FieldRegistry;
use crate::persistence::Storage;
use crate::types::{AdminSettings, CatalogItem, Credentials, FieldVisibility, StandardField};

const DEFAULT_REGIONS: &[&str] = &["East", "Central", "West"];
const DEFAULT_MANAGERS: &[&str] = &["Martha", "Hermann", "Timothy", "Pat"];
const DEFAULT_SALESPEOPLE: &[&str] = &["Alexander", "Shelli", "Bruce", "David", "Nancy", "Daniel"];
const DEFAULT_ITEMS: &[(&str, f64)] = &[
    ("Television", 1198.0),
    ("Home Theater", 499.0),
    ("Smartphone", 899.0),
    ("Laptop", 1299.0),
    ("Tablet", 599.0),
    ("Headphones", 249.0),
    ("Speaker", 179.0),
    ("Camera", 799.0),
];
const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "1234admin";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// The hard-coded first-run configuration.
pub fn default_settings() -> AdminSettings {
    AdminSettings {
        regions: strings(DEFAULT_REGIONS),
        items: DEFAULT_ITEMS
            .iter()
            .map(|(name, price)| CatalogItem {
                name: name.to_string(),
                default_price: *price,
            })
            .collect(),
        managers: strings(DEFAULT_MANAGERS),
        salespeople: strings(DEFAULT_SALESPEOPLE),
        field_visibility: FieldVisibility::default(),
        custom_fields: FieldRegistry::default(),
        auth: Credentials {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        },
    }
}

/// Sole writer of `AdminSettings`.
pub struct SettingsStore {
    current: AdminSettings,
    storage: Storage,
}

impl SettingsStore {
    /// Open the store from durable state, falling back to the defaults.
    pub fn load(storage: Storage) -> Self {
        let current = storage.load_settings();
        log::info!(
            "Loaded settings: {} regions, {} items, {} custom fields",
            current.regions.len(),
            current.items.len(),
            current.custom_fields.len()
        );
        Self { current, storage }
    }

    pub fn get(&self) -> &AdminSettings {
        &self.current
    }

    pub fn snapshot(&self) -> AdminSettings {
        self.current.clone()
    }

    /// Swap in `settings` wholesale and persist.
    ///
    /// No consistency checks: a region list that no longer contains a stored
    /// record's region only matters the next time that record is validated.
    /// The in-memory value is current even when the write fails.
    pub fn replace(&mut self, settings: AdminSettings) -> Result<(), StoreError> {
        self.current = settings;
        self.storage.save_settings(&self.current)
    }

    pub fn reset_to_default(&mut self) -> Result<(), StoreError> {
        log::info!("Resetting settings to defaults");
        self.replace(default_settings())
    }
}

fn required_value(value: &str, what: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidSetting(format!("{} cannot be empty", what)));
    }
    Ok(trimmed.to_string())
}

fn remove_at<T>(list: &mut Vec<T>, index: usize) -> Option<T> {
    (index < list.len()).then(|| list.remove(index))
}

// Draft editing, applied to a caller-owned copy before `replace`.
impl AdminSettings {
    /// Default price of the catalog item named `name`.
    pub fn item_price(&self, name: &str) -> Option<f64> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.default_price)
    }

    pub fn item_names(&self) -> Vec<String> {
        self.items.iter().map(|item| item.name.clone()).collect()
    }

    pub fn add_item(&mut self, name: &str, default_price: f64) -> Result<(), StoreError> {
        let name = required_value(name, "Item name")?;
        if !default_price.is_finite() || default_price <= 0.0 {
            return Err(StoreError::InvalidSetting(
                "Item price must be greater than 0".to_string(),
            ));
        }
        self.items.push(CatalogItem {
            name,
            default_price,
        });
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Option<CatalogItem> {
        remove_at(&mut self.items, index)
    }

    pub fn add_region(&mut self, region: &str) -> Result<(), StoreError> {
        self.regions.push(required_value(region, "Region")?);
        Ok(())
    }

    pub fn remove_region(&mut self, index: usize) -> Option<String> {
        remove_at(&mut self.regions, index)
    }

    pub fn add_manager(&mut self, manager: &str) -> Result<(), StoreError> {
        self.managers.push(required_value(manager, "Manager")?);
        Ok(())
    }

    pub fn remove_manager(&mut self, index: usize) -> Option<String> {
        remove_at(&mut self.managers, index)
    }

    pub fn add_salesperson(&mut self, name: &str) -> Result<(), StoreError> {
        self.salespeople.push(required_value(name, "Salesperson")?);
        Ok(())
    }

    pub fn remove_salesperson(&mut self, index: usize) -> Option<String> {
        remove_at(&mut self.salespeople, index)
    }

    /// Flip one standard field's visibility. Returns the new state.
    pub fn toggle_visibility(&mut self, field: StandardField) -> bool {
        let visible = !self.field_visibility.is_visible(field);
        self.field_visibility.set(field, visible);
        visible
    }

    pub fn set_visibility(&mut self, field: StandardField, visible: bool) {
        self.field_visibility.set(field, visible);
    }

    pub fn set_credentials(
        &mut self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), StoreError> {
        if username.trim().is_empty() {
            return Err(StoreError::InvalidSetting("Username cannot be empty".to_string()));
        }
        if password.is_empty() {
            return Err(StoreError::InvalidSetting("Password cannot be empty".to_string()));
        }
        if password != confirm {
            return Err(StoreError::InvalidSetting("Passwords do not match".to_string()));
        }
        self.auth = Credentials {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        Ok(())
    }
}
