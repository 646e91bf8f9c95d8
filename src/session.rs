//! Editing session: one form's working copy, its compiled ruleset, and the
//! live sale-amount preview.
//!
//! A session is opened against a snapshot of the settings and is never
//! visible to anyone else. Nothing reaches the record store until `submit`
//! succeeds and the caller commits the returned draft.

use chrono::NaiveDate;

use crate::error::{FieldError, StoreError};
use crate::fields::FieldRegistry;
use crate::schema::{self, CompiledSchema, FieldKey, FieldValue, FormValues, DATE_FORMAT};
use crate::types::{AdminSettings, CatalogItem, RecordDraft, SalesRecord, StandardField};

/// `units * unit_price`. The preview and the stored record both use this, so
/// they agree to the bit.
pub fn sale_amount(units: f64, unit_price: f64) -> f64 {
    units * unit_price
}

pub struct EditSession {
    schema: CompiledSchema,
    registry: FieldRegistry,
    catalog: Vec<CatalogItem>,
    values: FormValues,
    record_id: Option<String>,
    preview: f64,
    today: NaiveDate,
}

impl EditSession {
    /// Open a session for a new record (`None`) or an edit.
    pub fn new(settings: &AdminSettings, record: Option<&SalesRecord>) -> Self {
        Self::new_at(settings, record, chrono::Local::now().date_naive())
    }

    /// Same as `new`, with an explicit "today" for the date default.
    pub fn new_at(settings: &AdminSettings, record: Option<&SalesRecord>, today: NaiveDate) -> Self {
        let mut session = Self {
            schema: schema::compile(settings),
            registry: settings.custom_fields.clone(),
            catalog: settings.items.clone(),
            values: schema::initial_values(settings, record, today),
            record_id: record.map(|r| r.id.clone()),
            preview: record.map(|r| r.sale_amount).unwrap_or(0.0),
            today,
        };
        session.recompute();
        session
    }

    /// Id of the record being edited, `None` for a new record.
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Set one form value, then run whatever derivations depend on it.
    pub fn set_value(&mut self, key: FieldKey, value: FieldValue) {
        let derived = match &key {
            FieldKey::Standard(StandardField::Item) => Some(value.as_text()),
            _ => None,
        };
        self.values.insert(key, value);

        if let Some(item) = derived {
            self.autofill_price(&item);
        }
        self.recompute();
    }

    /// Choose a catalog item. A known item overwrites the unit price.
    pub fn select_item(&mut self, name: &str) {
        self.set_value(StandardField::Item.into(), FieldValue::text(name));
    }

    /// Live `units * unitPrice` for display.
    pub fn sale_amount_preview(&self) -> f64 {
        self.preview
    }

    /// Validate the form and produce the draft to commit.
    ///
    /// On failure every failing field is reported and the session is left as
    /// it was, so the caller can correct and resubmit.
    pub fn submit(&self) -> Result<RecordDraft, StoreError> {
        self.schema
            .validate(&self.values)
            .map_err(StoreError::Validation)?;
        let draft = self.to_draft();
        if !sale_amount(f64::from(draft.units), draft.unit_price).is_finite() {
            return Err(StoreError::Validation(vec![FieldError::new(
                StandardField::UnitPrice.key(),
                "Sale amount is too large",
            )]));
        }
        Ok(draft)
    }

    fn autofill_price(&mut self, item: &str) {
        if let Some(catalog_item) = self.catalog.iter().find(|c| c.name == item) {
            log::debug!(
                "Item {} selected, unit price set to {}",
                catalog_item.name,
                catalog_item.default_price
            );
            self.values.insert(
                StandardField::UnitPrice.into(),
                FieldValue::Number(catalog_item.default_price),
            );
        }
    }

    fn number(&self, field: StandardField) -> Option<f64> {
        self.values.get(&FieldKey::Standard(field)).and_then(FieldValue::as_number)
    }

    fn text(&self, field: StandardField) -> String {
        self.values
            .get(&FieldKey::Standard(field))
            .map(|v| v.as_text().trim().to_string())
            .unwrap_or_default()
    }

    // Zero or unparseable inputs keep the previous preview.
    fn recompute(&mut self) {
        if let (Some(units), Some(unit_price)) = (
            self.number(StandardField::Units),
            self.number(StandardField::UnitPrice),
        ) {
            if units != 0.0 && unit_price != 0.0 {
                self.preview = sale_amount(units, unit_price);
            }
        }
    }

    fn to_draft(&self) -> RecordDraft {
        let order_date = self
            .values
            .get(&FieldKey::Standard(StandardField::OrderDate))
            .and_then(FieldValue::as_date)
            .unwrap_or(self.today);

        let custom_field_values = self
            .registry
            .iter()
            .filter_map(|field| {
                let value = self.values.get(&FieldKey::Custom(field.id.clone()))?;
                let stored = value.to_custom_value(field.field_type)?;
                Some((field.id.clone(), stored))
            })
            .collect();

        RecordDraft {
            order_date: order_date.format(DATE_FORMAT).to_string(),
            region: self.text(StandardField::Region),
            manager: self.text(StandardField::Manager),
            sales_man: self.text(StandardField::SalesMan),
            item: self.text(StandardField::Item),
            // Saturating cast; fractional units never pass a visible units rule.
            units: self.number(StandardField::Units).unwrap_or(0.0) as u32,
            unit_price: self.number(StandardField::UnitPrice).unwrap_or(0.0),
            custom_field_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::fields::FieldSpec;
    use crate::settings::default_settings;
    use crate::types::{CustomFieldType, CustomValue};
    use crate::util::format_amount;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn units() -> FieldKey {
        StandardField::Units.into()
    }

    fn unit_price() -> FieldKey {
        StandardField::UnitPrice.into()
    }

    fn fill_valid(session: &mut EditSession) {
        session.set_value(StandardField::Region.into(), FieldValue::text("East"));
        session.set_value(StandardField::Manager.into(), FieldValue::text("Martha"));
        session.set_value(StandardField::SalesMan.into(), FieldValue::text("Alexander"));
        session.select_item("Television");
        session.set_value(units(), FieldValue::Number(95.0));
    }

    fn stored_record() -> SalesRecord {
        SalesRecord {
            id: "rec-1".into(),
            order_date: "2018-01-06".into(),
            region: "East".into(),
            manager: "Martha".into(),
            sales_man: "Alexander".into(),
            item: "Laptop".into(),
            units: 2,
            unit_price: 10.0,
            sale_amount: 20.0,
            custom_field_values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_selecting_television_fills_price_and_preview() {
        let mut session = EditSession::new_at(&default_settings(), None, today());
        session.select_item("Television");
        assert_eq!(session.value(&unit_price()), Some(&FieldValue::Number(1198.0)));

        session.set_value(units(), FieldValue::Number(95.0));
        assert_eq!(session.sale_amount_preview(), 113810.0);
        assert_eq!(format_amount(session.sale_amount_preview()), "113810.00");
    }

    #[test]
    fn test_unknown_item_leaves_price_untouched() {
        let mut session = EditSession::new_at(&default_settings(), None, today());
        session.set_value(unit_price(), FieldValue::Number(42.0));
        session.select_item("Toaster");
        assert_eq!(session.value(&unit_price()), Some(&FieldValue::Number(42.0)));
    }

    #[test]
    fn test_editing_price_does_not_change_item() {
        let mut session = EditSession::new_at(&default_settings(), None, today());
        session.select_item("Camera");
        session.set_value(unit_price(), FieldValue::text("750"));
        assert_eq!(
            session.value(&StandardField::Item.into()),
            Some(&FieldValue::text("Camera"))
        );
        assert_eq!(session.sale_amount_preview(), 750.0);
    }

    #[test]
    fn test_preview_holds_when_input_is_zero_or_blank() {
        let mut session = EditSession::new_at(&default_settings(), None, today());
        assert_eq!(session.sale_amount_preview(), 0.0);

        session.set_value(unit_price(), FieldValue::Number(5.0));
        session.set_value(units(), FieldValue::Number(3.0));
        assert_eq!(session.sale_amount_preview(), 15.0);

        session.set_value(units(), FieldValue::text(""));
        assert_eq!(session.sale_amount_preview(), 15.0);
        session.set_value(unit_price(), FieldValue::Number(0.0));
        assert_eq!(session.sale_amount_preview(), 15.0);
    }

    #[test]
    fn test_edit_session_starts_from_record() {
        let record = stored_record();
        let session = EditSession::new_at(&default_settings(), Some(&record), today());
        assert_eq!(session.record_id(), Some("rec-1"));
        assert_eq!(session.sale_amount_preview(), 20.0);
        assert_eq!(
            session.value(&StandardField::Item.into()),
            Some(&FieldValue::text("Laptop"))
        );
    }

    #[test]
    fn test_submit_reports_failures_without_consuming_session() {
        let mut session = EditSession::new_at(&default_settings(), None, today());
        let err = session.submit().unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["region", "manager", "salesMan", "item", "unitPrice"]);

        fill_valid(&mut session);
        assert!(session.submit().is_ok());
    }

    #[test]
    fn test_submit_builds_draft() {
        let mut settings = default_settings();
        let customer = settings
            .custom_fields
            .add_field(FieldSpec::new("Customer", CustomFieldType::Text))
            .unwrap();
        let score = settings
            .custom_fields
            .add_field(FieldSpec::new("Score", CustomFieldType::Number))
            .unwrap();

        let mut session = EditSession::new_at(&settings, None, today());
        fill_valid(&mut session);
        session.set_value(FieldKey::Custom(customer.id.clone()), FieldValue::text("Acme"));
        session.set_value(FieldKey::Custom(score.id.clone()), FieldValue::text(""));

        let draft = session.submit().expect("valid");
        assert_eq!(draft.order_date, "2024-03-15");
        assert_eq!(draft.item, "Television");
        assert_eq!(draft.units, 95);
        assert_eq!(draft.unit_price, 1198.0);
        assert_eq!(
            draft.custom_field_values.get(&customer.id),
            Some(&CustomValue::Text("Acme".into()))
        );
        assert!(!draft.custom_field_values.contains_key(&score.id));
    }

    #[test]
    fn test_submit_rejects_price_that_overflows_amount() {
        let mut session = EditSession::new_at(&default_settings(), None, today());
        fill_valid(&mut session);
        session.set_value(unit_price(), FieldValue::text("1e308"));

        let err = session.submit().unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["unitPrice"]);

        session.set_value(unit_price(), FieldValue::Number(1198.0));
        assert!(session.submit().is_ok());
    }

    #[test]
    fn test_hidden_units_still_submits_default() {
        let mut settings = default_settings();
        settings.field_visibility.units = false;
        let mut session = EditSession::new_at(&settings, None, today());
        fill_valid(&mut session);
        session.set_value(units(), FieldValue::text(""));

        let draft = session.submit().expect("units has no rule");
        assert_eq!(draft.units, 0);
    }

    #[test]
    fn test_preview_matches_stored_amount_exactly() {
        let mut session = EditSession::new_at(&default_settings(), None, today());
        fill_valid(&mut session);
        session.set_value(units(), FieldValue::Number(3.0));
        session.set_value(unit_price(), FieldValue::text("0.1"));

        let draft = session.submit().expect("valid");
        let stored = sale_amount(f64::from(draft.units), draft.unit_price);
        assert_eq!(session.sale_amount_preview().to_bits(), stored.to_bits());
    }
}
