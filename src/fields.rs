//! Field registry: the fixed catalog of standard fields plus the
//! administrator-defined custom fields.
//!
//! The registry is the only place custom fields are created, edited or
//! removed. It lives inside `AdminSettings`, so changes reach durable storage
//! when the settings draft is committed through the settings store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{CustomField, CustomFieldType, StandardField, STANDARD_FIELDS};

/// Input for creating or replacing a custom field.
///
/// Doubles as the draft of a field that has not been added yet, so options
/// can be collected before the field exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: CustomFieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            options: Vec::new(),
            required: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Start an edit from an existing field.
    pub fn from_field(field: &CustomField) -> Self {
        Self {
            name: field.name.clone(),
            field_type: field.field_type,
            options: field.options.clone().unwrap_or_default(),
            required: field.required,
        }
    }

    /// Append an option. Blank and duplicate options are ignored.
    pub fn add_option(&mut self, option: &str) -> bool {
        push_option(&mut self.options, option)
    }

    pub fn remove_option(&mut self, option: &str) -> bool {
        drop_option(&mut self.options, option)
    }

    fn validated_name(&self) -> Result<String, StoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidField("Field name is required".into()));
        }
        Ok(name.to_string())
    }
}

fn push_option(options: &mut Vec<String>, option: &str) -> bool {
    let option = option.trim();
    if option.is_empty() || options.iter().any(|o| o == option) {
        return false;
    }
    options.push(option.to_string());
    true
}

fn drop_option(options: &mut Vec<String>, option: &str) -> bool {
    let option = option.trim();
    let before = options.len();
    options.retain(|o| o != option);
    options.len() != before
}

/// Options survive only on select fields, cleaned the same way `add_option` does.
fn normalize_options(field_type: CustomFieldType, options: &[String]) -> Option<Vec<String>> {
    if field_type != CustomFieldType::Select {
        return None;
    }
    let mut out = Vec::with_capacity(options.len());
    for option in options {
        push_option(&mut out, option);
    }
    Some(out)
}

/// Ordered list of custom fields. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRegistry {
    fields: Vec<CustomField>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<CustomField>) -> Self {
        let mut registry = Self { fields };
        registry.normalize();
        registry
    }

    /// The eight built-in fields, in column order.
    pub fn standard_fields() -> &'static [StandardField] {
        &STANDARD_FIELDS
    }

    pub fn fields(&self) -> &[CustomField] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CustomField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CustomField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Create a field from `spec` and append it.
    ///
    /// Rejects a blank name without touching the registry.
    pub fn add_field(&mut self, spec: FieldSpec) -> Result<CustomField, StoreError> {
        let name = spec.validated_name()?;
        let field = CustomField {
            id: self.mint_id(),
            name,
            field_type: spec.field_type,
            options: normalize_options(spec.field_type, &spec.options),
            required: spec.required,
        };
        log::debug!("Added custom field '{}' ({})", field.name, field.id);
        self.fields.push(field.clone());
        Ok(field)
    }

    /// Replace every attribute of field `id` except the id itself.
    ///
    /// Returns `Ok(None)` when no such field exists.
    pub fn update_field(
        &mut self,
        id: &str,
        spec: FieldSpec,
    ) -> Result<Option<CustomField>, StoreError> {
        let name = spec.validated_name()?;
        let Some(field) = self.fields.iter_mut().find(|f| f.id == id) else {
            log::debug!("update_field: no custom field {}", id);
            return Ok(None);
        };
        field.name = name;
        field.field_type = spec.field_type;
        field.options = normalize_options(spec.field_type, &spec.options);
        field.required = spec.required;
        Ok(Some(field.clone()))
    }

    /// Remove field `id`. Values already stored on records are left alone.
    pub fn remove_field(&mut self, id: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.id != id);
        before != self.fields.len()
    }

    /// Append an option to an existing select field.
    pub fn add_option(&mut self, id: &str, option: &str) -> bool {
        match self.select_options_mut(id) {
            Some(options) => push_option(options, option),
            None => false,
        }
    }

    pub fn remove_option(&mut self, id: &str, option: &str) -> bool {
        match self.select_options_mut(id) {
            Some(options) => drop_option(options, option),
            None => false,
        }
    }

    /// Re-establish the options invariant on data that did not come through
    /// the registry (durable blobs, wholesale replacement).
    pub fn normalize(&mut self) {
        for field in &mut self.fields {
            let options = field.options.take().unwrap_or_default();
            field.options = normalize_options(field.field_type, &options);
        }
    }

    fn select_options_mut(&mut self, id: &str) -> Option<&mut Vec<String>> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == id && f.field_type == CustomFieldType::Select)?;
        Some(field.options.get_or_insert_with(Vec::new))
    }

    fn mint_id(&self) -> String {
        loop {
            let id = format!("custom_{}", Uuid::new_v4().simple());
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

impl<'a> IntoIterator for &'a FieldRegistry {
    type Item = &'a CustomField;
    type IntoIter = std::slice::Iter<'a, CustomField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_field_rejects_blank_name() {
        let mut registry = FieldRegistry::default();
        let result = registry.add_field(FieldSpec::new("   ", CustomFieldType::Text));
        assert!(matches!(result, Err(StoreError::InvalidField(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_field_mints_unique_ids() {
        let mut registry = FieldRegistry::default();
        let a = registry
            .add_field(FieldSpec::new("Customer", CustomFieldType::Text))
            .unwrap();
        let b = registry
            .add_field(FieldSpec::new("Customer", CustomFieldType::Text))
            .unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("custom_"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_non_select_field_has_no_options() {
        let mut registry = FieldRegistry::default();
        let mut spec = FieldSpec::new("Discount", CustomFieldType::Number);
        spec.add_option("10%");
        let field = registry.add_field(spec).unwrap();
        assert_eq!(field.options, None);
    }

    #[test]
    fn test_select_draft_options_collected_before_add() {
        let mut spec = FieldSpec::new("Channel", CustomFieldType::Select).required(true);
        assert!(spec.add_option("Web"));
        assert!(spec.add_option(" Store "));
        assert!(!spec.add_option("Web"), "duplicates ignored");
        assert!(!spec.add_option("  "), "blank ignored");
        assert!(spec.remove_option("Web"));

        let mut registry = FieldRegistry::default();
        let field = registry.add_field(spec).unwrap();
        assert_eq!(field.options, Some(vec!["Store".to_string()]));
        assert!(field.required);
    }

    #[test]
    fn test_draft_and_edit_paths_converge() {
        let mut registry = FieldRegistry::default();

        let mut draft = FieldSpec::new("Channel", CustomFieldType::Select);
        draft.add_option("Web");
        draft.add_option("Phone");
        let via_draft = registry.add_field(draft).unwrap();

        let via_edit = registry
            .add_field(FieldSpec::new("Channel", CustomFieldType::Select))
            .unwrap();
        assert_eq!(via_edit.options, Some(vec![]));
        assert!(registry.add_option(&via_edit.id, "Web"));
        assert!(registry.add_option(&via_edit.id, "Phone"));
        assert!(!registry.add_option(&via_edit.id, "Phone"));

        assert_eq!(registry.get(&via_edit.id).unwrap().options, via_draft.options);
    }

    #[test]
    fn test_options_rejected_on_text_field() {
        let mut registry = FieldRegistry::default();
        let field = registry
            .add_field(FieldSpec::new("Notes", CustomFieldType::Text))
            .unwrap();
        assert!(!registry.add_option(&field.id, "x"));
        assert_eq!(registry.get(&field.id).unwrap().options, None);
    }

    #[test]
    fn test_update_away_from_select_clears_options() {
        let mut registry = FieldRegistry::default();
        let mut spec = FieldSpec::new("Channel", CustomFieldType::Select);
        spec.add_option("Web");
        let field = registry.add_field(spec).unwrap();

        let mut edit = FieldSpec::from_field(&field);
        edit.field_type = CustomFieldType::Text;
        edit.name = "Channel note".into();
        let updated = registry.update_field(&field.id, edit).unwrap().unwrap();

        assert_eq!(updated.id, field.id);
        assert_eq!(updated.name, "Channel note");
        assert_eq!(updated.options, None);
    }

    #[test]
    fn test_update_rejects_blank_name_and_ignores_unknown_id() {
        let mut registry = FieldRegistry::default();
        let field = registry
            .add_field(FieldSpec::new("Customer", CustomFieldType::Text))
            .unwrap();

        let blank = registry.update_field(&field.id, FieldSpec::new("", CustomFieldType::Text));
        assert!(blank.is_err());
        assert_eq!(registry.get(&field.id).unwrap().name, "Customer");

        let missing = registry
            .update_field("custom_missing", FieldSpec::new("X", CustomFieldType::Text))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_remove_field_idempotent() {
        let mut registry = FieldRegistry::default();
        let field = registry
            .add_field(FieldSpec::new("Customer", CustomFieldType::Text))
            .unwrap();
        assert!(registry.remove_field(&field.id));
        assert!(!registry.remove_field(&field.id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_normalize_restores_invariant() {
        let raw = r#"[
            {"id":"custom_1","name":"Notes","type":"text","options":["stray"],"required":false},
            {"id":"custom_2","name":"Channel","type":"select","required":true}
        ]"#;
        let parsed: Vec<CustomField> = serde_json::from_str(raw).unwrap();
        let registry = FieldRegistry::new(parsed);
        assert_eq!(registry.get("custom_1").unwrap().options, None);
        assert_eq!(registry.get("custom_2").unwrap().options, Some(vec![]));
    }

    #[test]
    fn test_registry_serializes_as_array() {
        let mut registry = FieldRegistry::default();
        registry
            .add_field(FieldSpec::new("Customer", CustomFieldType::Text))
            .unwrap();
        let json = serde_json::to_value(&registry).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["type"], "text");
        assert!(json[0].get("options").is_none());
    }

    #[test]
    fn test_standard_catalog() {
        assert_eq!(FieldRegistry::standard_fields().len(), 8);
        assert_eq!(FieldRegistry::standard_fields()[0], StandardField::OrderDate);
    }
}
