//! Read-only display projection of a record under the current settings.

use serde::Serialize;

use crate::types::{AdminSettings, SalesRecord, StandardField, STANDARD_FIELDS};
use crate::util::format_amount;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayField {
    pub label: String,
    pub value: String,
}

/// Visible standard fields in fixed order, then custom fields (registry
/// order) that have a non-empty stored value.
pub fn record_view(record: &SalesRecord, settings: &AdminSettings) -> Vec<DisplayField> {
    let standard = STANDARD_FIELDS
        .iter()
        .copied()
        .filter(|field| settings.field_visibility.is_visible(*field))
        .map(|field| {
            let value = match field {
                StandardField::UnitPrice => format_amount(record.unit_price),
                StandardField::SaleAmount => format_amount(record.sale_amount),
                other => record.standard_value(other),
            };
            DisplayField {
                label: field.label().to_string(),
                value,
            }
        });

    let custom = settings.custom_fields.iter().filter_map(|field| {
        let value = record.custom_value(&field.id)?;
        if value.is_empty() {
            return None;
        }
        Some(DisplayField {
            label: field.name.clone(),
            value: value.to_string(),
        })
    });

    standard.chain(custom).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::fields::FieldSpec;
    use crate::settings::default_settings;
    use crate::types::{CustomFieldType, CustomValue};

    fn record() -> SalesRecord {
        SalesRecord {
            id: "r1".into(),
            order_date: "2018-01-06".into(),
            region: "East".into(),
            manager: "Martha".into(),
            sales_man: "Alexander".into(),
            item: "Television".into(),
            units: 95,
            unit_price: 1198.0,
            sale_amount: 113810.0,
            custom_field_values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_all_visible_shows_eight_fields_with_amounts() {
        let view = record_view(&record(), &default_settings());
        assert_eq!(view.len(), 8);
        assert_eq!(view[0].label, "Order Date");
        assert_eq!(view[6].value, "1198.00");
        assert_eq!(view[7].value, "113810.00");
    }

    #[test]
    fn test_hidden_fields_and_empty_custom_values_skipped() {
        let mut settings = default_settings();
        settings.field_visibility.manager = false;
        settings.field_visibility.sale_amount = false;
        let customer = settings
            .custom_fields
            .add_field(FieldSpec::new("Customer", CustomFieldType::Text))
            .unwrap();
        let notes = settings
            .custom_fields
            .add_field(FieldSpec::new("Notes", CustomFieldType::Text))
            .unwrap();

        let mut rec = record();
        rec.custom_field_values
            .insert(customer.id, CustomValue::Text("Acme".into()));
        rec.custom_field_values
            .insert(notes.id, CustomValue::Text(String::new()));

        let view = record_view(&rec, &settings);
        let labels: Vec<&str> = view.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Order Date", "Region", "Salesman", "Item", "Units", "Unit Price", "Customer"]
        );
        assert_eq!(view.last().unwrap().value, "Acme");
    }
}
