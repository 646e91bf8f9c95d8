//! Schema Compiler: derives validation rules and form defaults from the live
//! field configuration.
//!
//! Both entry points are pure. `compile` turns visibility flags plus the custom
//! field registry into a `CompiledSchema`; `initial_values` seeds an editing
//! session from an optional existing record. A field with no compiled rule is
//! never validated, whatever value the form carries for it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FieldError;
use crate::types::{
    AdminSettings, CustomField, CustomFieldType, CustomValue, SalesRecord, StandardField,
    STANDARD_FIELDS,
};
use crate::util::format_number;

/// Storage format for `orderDate`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Form keys and values
// =============================================================================

/// A form slot: one of the standard fields, or a custom field id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Standard(StandardField),
    Custom(String),
}

impl FieldKey {
    /// Standard keys win; anything else is taken as a custom field id.
    pub fn parse(key: &str) -> Self {
        match StandardField::from_key(key) {
            Some(field) => FieldKey::Standard(field),
            None => FieldKey::Custom(key.to_string()),
        }
    }
}

impl From<StandardField> for FieldKey {
    fn from(field: StandardField) -> Self {
        FieldKey::Standard(field)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Standard(field) => f.write_str(field.key()),
            FieldKey::Custom(id) => f.write_str(id),
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(FieldKey::parse(&key))
    }
}

/// A raw form input. Numbers may also arrive as text and are coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Empty or whitespace-only text counts as "no value".
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.trim().is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(text) => text.trim().parse::<f64>().ok()?,
            FieldValue::Date(_) => return None,
        };
        number.is_finite().then_some(number)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(date) => Some(*date),
            FieldValue::Text(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok(),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Date(date) => date.format(DATE_FORMAT).to_string(),
        }
    }

    /// Stored form of this value for a custom field of type `field_type`.
    ///
    /// Blank input yields `None`, so the record carries no entry at all.
    pub fn to_custom_value(&self, field_type: CustomFieldType) -> Option<CustomValue> {
        if self.is_blank() {
            return None;
        }
        match field_type {
            CustomFieldType::Number => match self.as_number() {
                Some(n) => Some(CustomValue::Number(n)),
                None => Some(CustomValue::Text(self.as_text())),
            },
            CustomFieldType::Text | CustomFieldType::Select => {
                Some(CustomValue::Text(self.as_text()))
            }
        }
    }
}

impl From<&CustomValue> for FieldValue {
    fn from(value: &CustomValue) -> Self {
        match value {
            CustomValue::Number(n) => FieldValue::Number(*n),
            CustomValue::Text(text) => FieldValue::Text(text.clone()),
        }
    }
}

pub type FormValues = BTreeMap<FieldKey, FieldValue>;

// =============================================================================
// Rules
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "arg", rename_all = "camelCase")]
pub enum RuleKind {
    /// A calendar date (`yyyy-MM-dd` text is accepted).
    Date,
    /// One of a fixed lookup list (regions, catalog item names).
    Enum(Vec<String>),
    /// Text with at least this many characters after trimming.
    MinLength(usize),
    /// A number greater than zero, optionally restricted to whole numbers.
    PositiveNumber { integer: bool },
    /// Any number.
    Numeric,
    /// Any text.
    Text,
    /// One of a custom select field's options.
    Membership(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub key: FieldKey,
    pub label: String,
    pub requirement: Requirement,
    pub kind: RuleKind,
    /// Reported when the value is missing or fails the rule.
    pub message: String,
}

impl Rule {
    fn new(
        key: impl Into<FieldKey>,
        label: impl Into<String>,
        requirement: Requirement,
        kind: RuleKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            requirement,
            kind,
            message: message.into(),
        }
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }

    /// Check one value. `None` and blank text both mean "not supplied".
    pub fn check(&self, value: Option<&FieldValue>) -> Result<(), String> {
        let Some(value) = value.filter(|v| !v.is_blank()) else {
            return match self.requirement {
                Requirement::Required => Err(self.message.clone()),
                Requirement::Optional => Ok(()),
            };
        };

        let ok = match &self.kind {
            RuleKind::Date => value.as_date().is_some(),
            RuleKind::Enum(allowed) | RuleKind::Membership(allowed) => {
                let text = value.as_text();
                allowed.iter().any(|candidate| *candidate == text)
            }
            RuleKind::MinLength(min) => value.as_text().trim().chars().count() >= *min,
            RuleKind::PositiveNumber { integer } => match value.as_number() {
                Some(n) if n > 0.0 => !integer || (n.fract() == 0.0 && n <= f64::from(u32::MAX)),
                _ => false,
            },
            RuleKind::Numeric => {
                if value.as_number().is_none() {
                    return Err(format!("{} must be a number", self.label));
                }
                true
            }
            RuleKind::Text => true,
        };

        if ok {
            Ok(())
        } else {
            Err(self.message.clone())
        }
    }
}

/// The ruleset for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledSchema {
    rules: Vec<Rule>,
}

impl CompiledSchema {
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_for(&self, key: &FieldKey) -> Option<&Rule> {
        self.rules.iter().find(|rule| &rule.key == key)
    }

    pub fn has_rule(&self, key: &FieldKey) -> bool {
        self.rule_for(key).is_some()
    }

    /// Validate every rule against `values`, reporting all failures.
    ///
    /// Values without a rule are ignored.
    pub fn validate(&self, values: &FormValues) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.check(values.get(&rule.key))
                    .err()
                    .map(|message| FieldError::new(rule.key.to_string(), message))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn standard_rule(field: StandardField, settings: &AdminSettings) -> Option<Rule> {
    use Requirement::Required;

    let label = field.label();
    let rule = match field {
        StandardField::OrderDate => {
            Rule::new(field, label, Required, RuleKind::Date, "Order date is required")
        }
        StandardField::Region => Rule::new(
            field,
            label,
            Required,
            RuleKind::Enum(settings.regions.clone()),
            "Please select a region",
        ),
        StandardField::Manager => Rule::new(
            field,
            label,
            Required,
            RuleKind::MinLength(2),
            "Manager name must be at least 2 characters",
        ),
        StandardField::SalesMan => Rule::new(
            field,
            label,
            Required,
            RuleKind::MinLength(2),
            "Salesman name must be at least 2 characters",
        ),
        StandardField::Item => Rule::new(
            field,
            label,
            Required,
            RuleKind::Enum(settings.item_names()),
            "Please select an item",
        ),
        StandardField::Units => Rule::new(
            field,
            label,
            Required,
            RuleKind::PositiveNumber { integer: true },
            "Must sell at least 1 unit",
        ),
        StandardField::UnitPrice => Rule::new(
            field,
            label,
            Required,
            RuleKind::PositiveNumber { integer: false },
            "Unit price must be greater than 0",
        ),
        // Computed from units and unit price, never entered.
        StandardField::SaleAmount => return None,
    };
    Some(rule)
}

fn custom_rule(field: &CustomField) -> Rule {
    let requirement = if field.required {
        Requirement::Required
    } else {
        Requirement::Optional
    };
    let key = FieldKey::Custom(field.id.clone());

    match field.field_type {
        CustomFieldType::Text => Rule::new(
            key,
            &field.name,
            requirement,
            RuleKind::Text,
            format!("{} is required", field.name),
        ),
        CustomFieldType::Number => Rule::new(
            key,
            &field.name,
            requirement,
            RuleKind::Numeric,
            format!("{} is required", field.name),
        ),
        CustomFieldType::Select => Rule::new(
            key,
            &field.name,
            requirement,
            RuleKind::Membership(field.options.clone().unwrap_or_default()),
            format!("Please select a {}", field.name.to_lowercase()),
        ),
    }
}

/// Build the ruleset for the current configuration.
pub fn compile(settings: &AdminSettings) -> CompiledSchema {
    let mut rules: Vec<Rule> = STANDARD_FIELDS
        .iter()
        .copied()
        .filter(|field| settings.field_visibility.is_visible(*field))
        .filter_map(|field| standard_rule(field, settings))
        .collect();
    rules.extend(settings.custom_fields.iter().map(custom_rule));

    log::debug!("Compiled form schema with {} rules", rules.len());
    CompiledSchema { rules }
}

/// Starting values for an editing session.
///
/// Standard fields are always seeded, visible or not. Custom fields are seeded
/// only from values the record actually stores for a field still registered.
pub fn initial_values(
    settings: &AdminSettings,
    record: Option<&SalesRecord>,
    today: NaiveDate,
) -> FormValues {
    let mut values = FormValues::new();

    let order_date = record
        .and_then(|r| NaiveDate::parse_from_str(&r.order_date, DATE_FORMAT).ok())
        .unwrap_or(today);
    values.insert(StandardField::OrderDate.into(), FieldValue::Date(order_date));

    let text_of = |value: Option<&String>| FieldValue::text(value.cloned().unwrap_or_default());
    values.insert(StandardField::Region.into(), text_of(record.map(|r| &r.region)));
    values.insert(StandardField::Manager.into(), text_of(record.map(|r| &r.manager)));
    values.insert(StandardField::SalesMan.into(), text_of(record.map(|r| &r.sales_man)));
    values.insert(StandardField::Item.into(), text_of(record.map(|r| &r.item)));

    let units = record.map(|r| r.units).filter(|u| *u != 0).unwrap_or(1);
    values.insert(StandardField::Units.into(), FieldValue::Number(f64::from(units)));

    let unit_price = record
        .map(|r| r.unit_price)
        .filter(|p| *p != 0.0 && p.is_finite())
        .unwrap_or(0.0);
    values.insert(StandardField::UnitPrice.into(), FieldValue::Number(unit_price));

    if let Some(record) = record {
        for field in &settings.custom_fields {
            if let Some(stored) = record.custom_value(&field.id) {
                values.insert(FieldKey::Custom(field.id.clone()), FieldValue::from(stored));
            }
        }
    }

    values
}
