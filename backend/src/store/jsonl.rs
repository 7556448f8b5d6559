//! JSON-lines file store.
//!
//! Each saved record becomes one line, stamped with a fresh `_id` and the
//! import time. The file is opened for appending when a batch begins and
//! flushed when it ends.

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::models::ProductRecord;
use crate::validation::RecordValidator;

/// A stored record with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProduct {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: uuid::Uuid,
    /// Import timestamp (RFC 3339)
    pub imported_at: String,
    /// The product
    #[serde(flatten)]
    pub record: ProductRecord,
}

/// Appends records to a JSON-lines file
pub struct JsonLinesStore {
    path: PathBuf,
    validator: RecordValidator,
    writer: Option<BufWriter<File>>,
    written: usize,
}

impl JsonLinesStore {
    pub fn new(path: impl AsRef<Path>, validator: RecordValidator) -> Self {
        Self {
            path: PathBuf::from(path.as_ref()),
            validator,
            writer: None,
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written by this store instance.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Read back every record in a JSON-lines file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Vec<StoredProduct>> {
        let content = fs::read_to_string(path.as_ref())?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }
}

impl RecordStore for JsonLinesStore {
    fn validate(&self, record: &ProductRecord) -> Result<(), Vec<String>> {
        self.validator.validate(record)
    }

    fn save(&mut self, record: &ProductRecord) -> StoreResult<()> {
        let writer = self.writer.as_mut().ok_or(StoreError::NoBatch)?;
        let stored = StoredProduct {
            id: uuid::Uuid::new_v4(),
            imported_at: chrono::Utc::now().to_rfc3339(),
            record: record.clone(),
        };
        serde_json::to_writer(&mut *writer, &stored)?;
        writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn begin_batch(&mut self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn end_batch(&mut self) -> StoreResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ProductList;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn record(sku: &str) -> ProductRecord {
        let mut fields = BTreeMap::new();
        fields.insert("sku".to_string(), sku.to_string());
        let mut record = ProductRecord::new(fields);
        record.group_id = "g-1".to_string();
        record
    }

    fn validator() -> RecordValidator {
        RecordValidator::new(&ProductList::default()).unwrap()
    }

    #[test]
    fn test_batch_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("products.jsonl");
        let mut store = JsonLinesStore::new(&path, validator());

        store.begin_batch().unwrap();
        store.save(&record("A1")).unwrap();
        store.save(&record("A2")).unwrap();
        store.end_batch().unwrap();

        let stored = JsonLinesStore::load(&path).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].record.get("sku"), Some("A2"));
        assert_ne!(stored[0].id, stored[1].id);
        assert_eq!(store.written(), 2);
    }

    #[test]
    fn test_lines_are_flat_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.jsonl");
        let mut store = JsonLinesStore::new(&path, validator());

        store.begin_batch().unwrap();
        store.save(&record("A1")).unwrap();
        store.end_batch().unwrap();

        let line = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert!(json["_id"].is_string());
        assert!(json["importedAt"].is_string());
        assert_eq!(json["groupId"], "g-1");
        assert_eq!(json["fields"]["sku"], "A1");
    }

    #[test]
    fn test_save_outside_batch() {
        let dir = tempdir().unwrap();
        let mut store = JsonLinesStore::new(dir.path().join("p.jsonl"), validator());
        assert!(matches!(store.save(&record("A1")), Err(StoreError::NoBatch)));
    }
}
