//! Record Store: the sales record collection, most recent first.
//!
//! Sole writer of the collection. Every mutation that changes something
//! writes the whole collection through to storage; the in-memory collection
//! is updated first and stays current even if that write fails.

use uuid::Uuid;

use crate::error::{FieldError, StoreError};
use crate::persistence::Storage;
use crate::session::sale_amount;
use crate::types::{RecordDraft, SalesRecord};

pub struct RecordStore {
    records: Vec<SalesRecord>,
    storage: Storage,
}

/// Fails when the sale amount overflows; a non-finite amount would be
/// stored as `null`.
fn build_record(id: String, draft: RecordDraft) -> Result<SalesRecord, StoreError> {
    let amount = sale_amount(f64::from(draft.units), draft.unit_price);
    if !amount.is_finite() {
        return Err(StoreError::Validation(vec![FieldError::new(
            "saleAmount",
            "Sale amount is too large",
        )]));
    }
    Ok(SalesRecord {
        id,
        sale_amount: amount,
        order_date: draft.order_date,
        region: draft.region,
        manager: draft.manager,
        sales_man: draft.sales_man,
        item: draft.item,
        units: draft.units,
        unit_price: draft.unit_price,
        custom_field_values: draft.custom_field_values,
    })
}

impl RecordStore {
    pub fn load(storage: Storage) -> Self {
        let records = storage.load_records();
        log::info!("Loaded {} sales records", records.len());
        Self { records, storage }
    }

    pub fn all(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&SalesRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mint an id, compute the sale amount, and put the record first.
    pub fn add(&mut self, draft: RecordDraft) -> Result<SalesRecord, StoreError> {
        let id = self.mint_id();
        let record = build_record(id, draft)?;
        self.records.insert(0, record.clone());
        log::info!("Added sales record {}", record.id);
        self.persist()?;
        Ok(record)
    }

    /// Replace everything but the id. `None` when no record has `id`.
    pub fn update(
        &mut self,
        id: &str,
        draft: RecordDraft,
    ) -> Result<Option<SalesRecord>, StoreError> {
        let Some(slot) = self.records.iter_mut().find(|r| r.id == id) else {
            log::debug!("Update skipped, no record {}", id);
            return Ok(None);
        };
        *slot = build_record(id.to_string(), draft)?;
        let updated = slot.clone();
        log::info!("Updated sales record {}", id);
        self.persist()?;
        Ok(Some(updated))
    }

    /// Remove the record with `id`. Deleting a missing id is a no-op.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            log::debug!("Delete skipped, no record {}", id);
            return Ok(false);
        }
        log::info!("Deleted sales record {}", id);
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.storage.save_records(&self.records)
    }

    fn mint_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}
