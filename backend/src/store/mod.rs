//! Record stores that imported products are saved to.
//!
//! The reader drives a store through [`RecordStore`]: one `begin_batch`
//! before the first save, `validate` then `save` per record, and one
//! `end_batch` once the export is exhausted.
//!
//! - [`MemoryStore`] - keeps records in memory
//! - [`JsonLinesStore`] - appends records to a JSON-lines file

pub mod jsonl;
pub mod memory;

pub use jsonl::{JsonLinesStore, StoredProduct};
pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::models::ProductRecord;

/// Persistence target for product records
pub trait RecordStore {
    /// Check a record before saving it. `Err` carries one message per problem.
    fn validate(&self, record: &ProductRecord) -> Result<(), Vec<String>>;

    /// Save a validated record.
    fn save(&mut self, record: &ProductRecord) -> StoreResult<()>;

    /// Called once before the first save.
    fn begin_batch(&mut self) -> StoreResult<()>;

    /// Called once after the last save.
    fn end_batch(&mut self) -> StoreResult<()>;
}
