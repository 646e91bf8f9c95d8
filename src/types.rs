use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::FieldRegistry;
use crate::util::format_number;

/// Configuration stored in ~/.salesdesk/config.json
///
/// Every field is optional; a missing file means "all defaults".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Storage root for the durable blobs. Defaults to `~/.salesdesk/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Where `salesdesk-export` writes CSV files when no directory is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    /// Quote export values instead of the legacy bare comma join.
    #[serde(default)]
    pub quote_export: bool,
}

// =============================================================================
// Standard fields
// =============================================================================

/// The eight built-in sales form fields, in their fixed column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StandardField {
    OrderDate,
    Region,
    Manager,
    SalesMan,
    Item,
    Units,
    UnitPrice,
    SaleAmount,
}

/// Fixed order used by the form, the display projection and the export.
pub const STANDARD_FIELDS: [StandardField; 8] = [
    StandardField::OrderDate,
    StandardField::Region,
    StandardField::Manager,
    StandardField::SalesMan,
    StandardField::Item,
    StandardField::Units,
    StandardField::UnitPrice,
    StandardField::SaleAmount,
];

impl StandardField {
    /// JSON key used in records and in `fieldVisibility`.
    pub fn key(self) -> &'static str {
        match self {
            StandardField::OrderDate => "orderDate",
            StandardField::Region => "region",
            StandardField::Manager => "manager",
            StandardField::SalesMan => "salesMan",
            StandardField::Item => "item",
            StandardField::Units => "units",
            StandardField::UnitPrice => "unitPrice",
            StandardField::SaleAmount => "saleAmount",
        }
    }

    /// Column header in the CSV export.
    pub fn export_header(self) -> &'static str {
        match self {
            StandardField::OrderDate => "OrderDate",
            StandardField::Region => "Region",
            StandardField::Manager => "Manager",
            StandardField::SalesMan => "SalesMan",
            StandardField::Item => "Item",
            StandardField::Units => "Units",
            StandardField::UnitPrice => "Unit_price",
            StandardField::SaleAmount => "Sale_amt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StandardField::OrderDate => "Order Date",
            StandardField::Region => "Region",
            StandardField::Manager => "Manager",
            StandardField::SalesMan => "Salesman",
            StandardField::Item => "Item",
            StandardField::Units => "Units",
            StandardField::UnitPrice => "Unit Price",
            StandardField::SaleAmount => "Sale Amount",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        STANDARD_FIELDS.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for StandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Visibility flags for the eight standard fields.
///
/// A struct rather than a map so every key is always present. Keys missing
/// from a stored blob deserialize as visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldVisibility {
    #[serde(default = "visible")]
    pub order_date: bool,
    #[serde(default = "visible")]
    pub region: bool,
    #[serde(default = "visible")]
    pub manager: bool,
    #[serde(default = "visible")]
    pub sales_man: bool,
    #[serde(default = "visible")]
    pub item: bool,
    #[serde(default = "visible")]
    pub units: bool,
    #[serde(default = "visible")]
    pub unit_price: bool,
    #[serde(default = "visible")]
    pub sale_amount: bool,
}

fn visible() -> bool {
    true
}

impl Default for FieldVisibility {
    fn default() -> Self {
        Self {
            order_date: true,
            region: true,
            manager: true,
            sales_man: true,
            item: true,
            units: true,
            unit_price: true,
            sale_amount: true,
        }
    }
}

impl FieldVisibility {
    pub fn is_visible(&self, field: StandardField) -> bool {
        match field {
            StandardField::OrderDate => self.order_date,
            StandardField::Region => self.region,
            StandardField::Manager => self.manager,
            StandardField::SalesMan => self.sales_man,
            StandardField::Item => self.item,
            StandardField::Units => self.units,
            StandardField::UnitPrice => self.unit_price,
            StandardField::SaleAmount => self.sale_amount,
        }
    }

    pub fn set(&mut self, field: StandardField, visible: bool) {
        let slot = match field {
            StandardField::OrderDate => &mut self.order_date,
            StandardField::Region => &mut self.region,
            StandardField::Manager => &mut self.manager,
            StandardField::SalesMan => &mut self.sales_man,
            StandardField::Item => &mut self.item,
            StandardField::Units => &mut self.units,
            StandardField::UnitPrice => &mut self.unit_price,
            StandardField::SaleAmount => &mut self.sale_amount,
        };
        *slot = visible;
    }
}

// =============================================================================
// Custom fields
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    Text,
    Number,
    Select,
}

impl fmt::Display for CustomFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CustomFieldType::Text => "text",
            CustomFieldType::Number => "number",
            CustomFieldType::Select => "select",
        };
        f.write_str(name)
    }
}

/// An administrator-defined form field.
///
/// `options` is only ever `Some` for `select` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
}

/// A stored custom-field value: either a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomValue {
    Number(f64),
    Text(String),
}

impl CustomValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CustomValue::Text(text) if text.is_empty())
    }
}

impl fmt::Display for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomValue::Number(number) => f.write_str(&format_number(*number)),
            CustomValue::Text(text) => f.write_str(text),
        }
    }
}

// =============================================================================
// Admin settings
// =============================================================================

/// A catalog entry: item name plus the price pre-filled when it is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,
    pub default_price: f64,
}

/// Administrator credential pair, compared and stored as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The singleton form configuration.
///
/// `fieldVisibility` and `customFields` default when missing so blobs written
/// before either existed still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub regions: Vec<String>,
    pub items: Vec<CatalogItem>,
    pub managers: Vec<String>,
    pub salespeople: Vec<String>,
    #[serde(default)]
    pub field_visibility: FieldVisibility,
    #[serde(default)]
    pub custom_fields: FieldRegistry,
    pub auth: Credentials,
}

// =============================================================================
// Sales records
// =============================================================================

/// A committed sales transaction.
///
/// Reading is lenient: fields that were hidden when the record was saved may
/// be missing, units may be stored fractional, and an amount computed from
/// missing inputs is stored as `null`. Such records still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub id: String,
    /// `yyyy-MM-dd`
    #[serde(default)]
    pub order_date: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub sales_man: String,
    #[serde(default)]
    pub item: String,
    #[serde(default, deserialize_with = "lenient_units")]
    pub units: u32,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub unit_price: f64,
    /// `units * unit_price` as of the last save. Never re-derived on read.
    #[serde(default = "not_a_number", deserialize_with = "number_or_nan")]
    pub sale_amount: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_field_values: BTreeMap<String, CustomValue>,
}

fn not_a_number() -> f64 {
    f64::NAN
}

fn number_or_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

// Fractional counts round to the nearest whole unit; null or negative is 0.
fn lenient_units<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let units = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if units.is_finite() && units > 0.0 {
        Ok(units.round().min(f64::from(u32::MAX)) as u32)
    } else {
        Ok(0)
    }
}

impl SalesRecord {
    /// Render one standard column the way the export and display show it.
    pub fn standard_value(&self, field: StandardField) -> String {
        match field {
            StandardField::OrderDate => self.order_date.clone(),
            StandardField::Region => self.region.clone(),
            StandardField::Manager => self.manager.clone(),
            StandardField::SalesMan => self.sales_man.clone(),
            StandardField::Item => self.item.clone(),
            StandardField::Units => self.units.to_string(),
            StandardField::UnitPrice => format_number(self.unit_price),
            StandardField::SaleAmount => format_number(self.sale_amount),
        }
    }

    pub fn custom_value(&self, field_id: &str) -> Option<&CustomValue> {
        self.custom_field_values.get(field_id)
    }
}

/// Everything a submission supplies for a record: all fields except `id`
/// and the computed `saleAmount`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    pub order_date: String,
    pub region: String,
    pub manager: String,
    pub sales_man: String,
    pub item: String,
    pub units: u32,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_field_values: BTreeMap<String, CustomValue>,
}
