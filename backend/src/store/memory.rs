//! In-memory record store.

use super::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::models::ProductRecord;
use crate::validation::RecordValidator;

/// Keeps saved records in a `Vec`
#[derive(Debug, Default)]
pub struct MemoryStore {
    validator: Option<RecordValidator>,
    records: Vec<ProductRecord>,
    in_batch: bool,
    batches_started: usize,
    batches_ended: usize,
}

impl MemoryStore {
    /// A store accepting every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store validating records with `validator`.
    pub fn with_validator(validator: RecordValidator) -> Self {
        Self {
            validator: Some(validator),
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn batches_started(&self) -> usize {
        self.batches_started
    }

    pub fn batches_ended(&self) -> usize {
        self.batches_ended
    }
}

impl RecordStore for MemoryStore {
    fn validate(&self, record: &ProductRecord) -> Result<(), Vec<String>> {
        match &self.validator {
            Some(validator) => validator.validate(record),
            None => Ok(()),
        }
    }

    fn save(&mut self, record: &ProductRecord) -> StoreResult<()> {
        if !self.in_batch {
            return Err(StoreError::NoBatch);
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn begin_batch(&mut self) -> StoreResult<()> {
        self.in_batch = true;
        self.batches_started += 1;
        Ok(())
    }

    fn end_batch(&mut self) -> StoreResult<()> {
        self.in_batch = false;
        self.batches_ended += 1;
        Ok(())
    }
}
