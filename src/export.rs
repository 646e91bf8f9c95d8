//! CSV export of the record collection.
//!
//! Columns are the eight standard fields in fixed order, then one column per
//! registered custom field (headed by its display name). Lines are joined
//! with `\n` and there is no trailing newline.
//!
//! `Delimiting::Legacy` joins raw values with commas and does no escaping, so
//! a value containing a comma or newline shifts the row. It stays the default
//! so existing consumers see byte-identical files. `Delimiting::Quoted` applies
//! standard CSV quoting.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::fields::FieldRegistry;
use crate::schema::DATE_FORMAT;
use crate::types::{SalesRecord, STANDARD_FIELDS};
use crate::util::atomic_write_str;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delimiting {
    /// Bare comma join, no escaping.
    #[default]
    Legacy,
    /// Quote values containing a comma, quote, or line break.
    Quoted,
}

impl Delimiting {
    pub fn from_config(quote_export: bool) -> Self {
        if quote_export {
            Delimiting::Quoted
        } else {
            Delimiting::Legacy
        }
    }

    fn cell(self, value: &str) -> String {
        match self {
            Delimiting::Legacy => value.to_string(),
            Delimiting::Quoted => csv_escape(value),
        }
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn join_row(delimiting: Delimiting, cells: impl Iterator<Item = String>) -> String {
    cells
        .map(|cell| delimiting.cell(&cell))
        .collect::<Vec<_>>()
        .join(",")
}

/// Export with the legacy unescaped join.
pub fn export_delimited(records: &[SalesRecord], registry: &FieldRegistry) -> String {
    export_delimited_with(records, registry, Delimiting::Legacy)
}

pub fn export_delimited_with(
    records: &[SalesRecord],
    registry: &FieldRegistry,
    delimiting: Delimiting,
) -> String {
    let header = STANDARD_FIELDS
        .iter()
        .map(|f| f.export_header().to_string())
        .chain(registry.iter().map(|field| field.name.clone()));

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(join_row(delimiting, header));

    for record in records {
        let standard = STANDARD_FIELDS.iter().map(|f| record.standard_value(*f));
        let custom = registry.iter().map(|field| {
            record
                .custom_value(&field.id)
                .map(|v| v.to_string())
                .unwrap_or_default()
        });
        lines.push(join_row(delimiting, standard.chain(custom)));
    }

    lines.join("\n")
}

/// `sales_data_<yyyy-MM-dd>.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("sales_data_{}.csv", date.format(DATE_FORMAT))
}

/// Write the export into `dir`, named for `date`.
///
/// Returns `Ok(None)` without touching the filesystem when there are no
/// records.
pub fn export_to_dir(
    dir: &Path,
    records: &[SalesRecord],
    registry: &FieldRegistry,
    delimiting: Delimiting,
    date: NaiveDate,
) -> Result<Option<PathBuf>, StoreError> {
    if records.is_empty() {
        log::info!("No sales records to export");
        return Ok(None);
    }

    let path = dir.join(export_filename(date));
    let content = export_delimited_with(records, registry, delimiting);
    atomic_write_str(&path, &content)?;
    log::info!("Exported {} records to {}", records.len(), path.display());
    Ok(Some(path))
}
