//! Intent-in, snapshot-out boundary for the presentation layer.
//!
//! Reads return owned snapshots. Settings mutations require an administrator
//! session; record intents do not. Errors cross the boundary as `String`,
//! except submissions, which return a `CommandError` carrying per-field
//! failures for the form to display.

use std::path::{Path, PathBuf};

use crate::error::{CommandError, StoreError};
use crate::export::export_to_dir;
use crate::session::EditSession;
use crate::state::AppState;
use crate::types::{AdminSettings, SalesRecord};
use crate::view::{record_view, DisplayField};

fn require_admin(state: &AppState) -> Result<(), StoreError> {
    if state.auth.lock().is_logged_in() {
        Ok(())
    } else {
        log::warn!("Settings change rejected: not logged in");
        Err(StoreError::AdminRequired)
    }
}

/// Get the current settings
pub fn get_settings(state: &AppState) -> AdminSettings {
    state.settings.lock().snapshot()
}

/// Get all records, most recent first
pub fn get_records(state: &AppState) -> Vec<SalesRecord> {
    state.records.lock().all().to_vec()
}

/// Display rows for every record under the current settings
pub fn record_views(state: &AppState) -> Vec<Vec<DisplayField>> {
    let settings = state.settings.lock();
    let records = state.records.lock();
    records
        .all()
        .iter()
        .map(|record| record_view(record, settings.get()))
        .collect()
}

/// Open an editing session for a new record, or for an existing one by id.
pub fn begin_session(state: &AppState, record_id: Option<&str>) -> Result<EditSession, String> {
    let settings = state.settings.lock();
    match record_id {
        None => Ok(EditSession::new(settings.get(), None)),
        Some(id) => {
            let records = state.records.lock();
            let record = records
                .get(id)
                .ok_or_else(|| format!("Record not found: {}", id))?;
            Ok(EditSession::new(settings.get(), Some(record)))
        }
    }
}

/// Validate a session and store it as a new record.
pub fn submit(state: &AppState, session: &EditSession) -> Result<SalesRecord, CommandError> {
    let draft = session.submit()?;
    let record = state.records.lock().add(draft)?;
    Ok(record)
}

/// Validate a session and replace record `id` with it.
///
/// `Ok(None)` when the record no longer exists.
pub fn edit(
    state: &AppState,
    id: &str,
    session: &EditSession,
) -> Result<Option<SalesRecord>, CommandError> {
    let draft = session.submit()?;
    let updated = state.records.lock().update(id, draft)?;
    Ok(updated)
}

/// Delete a record. Returns false when it was already gone.
pub fn delete_record(state: &AppState, id: &str) -> Result<bool, String> {
    state.records.lock().delete(id).map_err(|e| e.to_string())
}

/// Replace the settings wholesale (admin panel "Save")
pub fn save_settings(state: &AppState, mut settings: AdminSettings) -> Result<AdminSettings, String> {
    require_admin(state).map_err(|e| e.to_string())?;
    settings.custom_fields.normalize();

    let mut store = state.settings.lock();
    store.replace(settings).map_err(|e| e.to_string())?;
    log::info!("Settings saved");
    Ok(store.snapshot())
}

/// Restore the first-run settings
pub fn reset_settings(state: &AppState) -> Result<AdminSettings, String> {
    require_admin(state).map_err(|e| e.to_string())?;

    let mut store = state.settings.lock();
    store.reset_to_default().map_err(|e| e.to_string())?;
    Ok(store.snapshot())
}

/// Set one value inside the settings document and save the result.
///
/// `path` is either dotted (`fieldVisibility.units`, `items.0.defaultPrice`)
/// or a JSON pointer (`/auth/password`). The target must already exist and the
/// edited document must still be valid settings.
pub fn change_setting(
    state: &AppState,
    path: &str,
    value: serde_json::Value,
) -> Result<AdminSettings, String> {
    require_admin(state).map_err(|e| e.to_string())?;

    let mut store = state.settings.lock();
    let updated = apply_setting(store.get(), path, value).map_err(|e| e.to_string())?;
    store.replace(updated).map_err(|e| e.to_string())?;
    log::info!("Setting {} changed", path);
    Ok(store.snapshot())
}

fn apply_setting(
    current: &AdminSettings,
    path: &str,
    value: serde_json::Value,
) -> Result<AdminSettings, StoreError> {
    let pointer = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path.replace('.', "/"))
    };
    if path.trim().is_empty() || pointer == "/" {
        return Err(StoreError::InvalidSetting("Setting path is empty".to_string()));
    }

    let mut document = serde_json::to_value(current)?;
    let target = document
        .pointer_mut(&pointer)
        .ok_or_else(|| StoreError::InvalidSetting(format!("Unknown setting: {}", path)))?;
    *target = value;

    let mut settings: AdminSettings = serde_json::from_value(document)
        .map_err(|e| StoreError::InvalidSetting(format!("{}: {}", path, e)))?;
    settings.custom_fields.normalize();
    Ok(settings)
}

/// Check credentials and open an admin session
pub fn login(state: &AppState, username: &str, password: &str) -> bool {
    let settings = state.settings.lock();
    let mut auth = state.auth.lock();
    auth.login(&settings.get().auth, username, password)
}

pub fn logout(state: &AppState) {
    state.auth.lock().logout();
}

pub fn is_authenticated(state: &AppState) -> bool {
    state.auth.lock().is_logged_in()
}

/// Export all records as CSV into `dir` (or the configured export directory).
///
/// `Ok(None)` when there is nothing to export.
pub fn export_csv(state: &AppState, dir: Option<&Path>) -> Result<Option<PathBuf>, String> {
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| state.export_dir());
    let delimiting = state.delimiting();
    let today = chrono::Local::now().date_naive();

    let settings = state.settings.lock();
    let records = state.records.lock();
    export_to_dir(
        &dir,
        records.all(),
        &settings.get().custom_fields,
        delimiting,
        today,
    )
    .map_err(|e| e.to_string())
}
