//! Product reader: the three ways of consuming an export.
//!
//! - [`ProductReader::collect_products`] - read everything into a `Vec`
//! - [`ProductReader::next_record`] - pull one record at a time
//! - [`ProductReader::save_products`] - pull and persist into a [`RecordStore`]
//!
//! All three share one pass over the file: bytes are read in chunks, turned
//! into parse events, assembled into records and tagged with group ids.
//!
//! # Example
//!
//! ```rust,ignore
//! use myshop_feed::{ProductList, ProductReader};
//!
//! let list = ProductList::from_file("products.json")?;
//! let mut reader = ProductReader::open("export.xml", &list)?;
//! while let Some(record) = reader.next_record()? {
//!     println!("{} ({})", record.group_id, record.is_variant);
//! }
//! ```

use serde::Serialize;
use std::path::Path;

use super::assembler::RecordAssembler;
use super::cursor::{CursorState, StreamCursor};
use super::grouper::VariantTagger;
use crate::config::FeedConfig;
use crate::descriptor::ProductList;
use crate::error::{FeedError, FeedResult, InputError};
use crate::logs::{log_debug, log_debug_indent, log_error, log_info, log_success, log_warning};
use crate::models::{ColumnSchema, ProductRecord};
use crate::normalize::{normalize_file, NormalizeOutcome};
use crate::parser::{ParserState, ReadFailure};
use crate::store::RecordStore;

/// Log progress every this many saved products
const PROGRESS_EVERY: usize = 1000;

/// Counts from a pull-and-persist run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    /// Records read from the export
    pub processed: usize,
    /// Records saved
    pub persisted: usize,
    /// Records rejected by validation
    pub invalid: usize,
    /// Valid records the store failed to save
    pub failed: usize,
}

/// Outcome of advancing the parse by one record
enum Step {
    Record(ProductRecord),
    End,
    Malformed { message: String, offset: usize },
    Fatal(FeedError),
}

/// Streams product records out of one export file
#[derive(Debug)]
pub struct ProductReader {
    cursor: StreamCursor,
    state: ParserState,
    assembler: RecordAssembler,
    tagger: VariantTagger,
    product_id_field: Option<String>,
    shop_id: Option<u64>,
}

impl ProductReader {
    /// Open an export with the default configuration.
    pub fn open(path: impl AsRef<Path>, list: &ProductList) -> FeedResult<Self> {
        Self::with_config(path, list, &FeedConfig::default())
    }

    /// Open an export.
    ///
    /// Fails fast if the path is empty or not an existing file. The file
    /// itself is opened by the first pull.
    pub fn with_config(
        path: impl AsRef<Path>,
        list: &ProductList,
        config: &FeedConfig,
    ) -> FeedResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(InputError::MissingFileName.into());
        }
        if !path.is_file() {
            return Err(InputError::NotFound(path.display().to_string()).into());
        }

        let tagger = VariantTagger::new(list.grouping_field());
        log_debug(format!(
            "Grouping field: {}",
            tagger.grouping_field().unwrap_or("(none)")
        ));
        log_debug("Found domain fields: ");
        for field in list.domain_fields() {
            log_debug_indent(format!("- {}", field), 1);
        }

        Ok(Self {
            cursor: StreamCursor::new(path, config.chunk_size),
            state: ParserState::new(),
            assembler: RecordAssembler::new(list),
            tagger,
            product_id_field: list.product_id_field.clone(),
            shop_id: list.shop_id,
        })
    }

    /// Convert the export to UTF-8 (when under the size limit), then open it.
    pub fn open_normalized(
        path: impl AsRef<Path>,
        list: &ProductList,
        config: &FeedConfig,
    ) -> FeedResult<(Self, NormalizeOutcome)> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(InputError::NotFound(path.display().to_string()).into());
        }
        let outcome = normalize_file(path, config.normalize_limit)?;
        Ok((Self::with_config(path, list, config)?, outcome))
    }

    /// Lifecycle state of the underlying file.
    pub fn state(&self) -> CursorState {
        self.cursor.state()
    }

    /// How many times the export file was opened.
    pub fn open_count(&self) -> usize {
        self.cursor.open_count()
    }

    /// Column names read so far.
    pub fn schema(&self) -> &ColumnSchema {
        self.state.schema()
    }

    /// Pull the next record. `Ok(None)` is end of sequence.
    ///
    /// Malformed XML is logged and ends the sequence. Once the sequence has
    /// ended, further pulls return `Ok(None)` without touching the file.
    pub fn next_record(&mut self) -> FeedResult<Option<ProductRecord>> {
        let step = {
            let Some(source) = self.cursor.acquire()? else {
                return Ok(None);
            };

            loop {
                match source.next_event() {
                    Ok(Some(event)) => {
                        if let Some(row) = self.state.handle(event) {
                            let offset = source.offset();
                            break match self.assembler.assemble(row, self.state.schema(), offset) {
                                Ok(record) => Step::Record(self.tagger.tag(record)),
                                Err(e) => Step::Fatal(e.into()),
                            };
                        }
                    }
                    Ok(None) => break Step::End,
                    Err(ReadFailure::Malformed { message, offset }) => {
                        break Step::Malformed { message, offset }
                    }
                    Err(ReadFailure::Schema(e)) => break Step::Fatal(e.into()),
                }
            }
        };

        match step {
            Step::Record(record) => Ok(Some(record)),
            Step::End => {
                self.cursor.release();
                Ok(None)
            }
            Step::Malformed { message, offset } => {
                log_error(format!("XML ERROR: {} at byte {}", message, offset));
                self.cursor.release();
                Ok(None)
            }
            Step::Fatal(e) => {
                self.cursor.release();
                Err(e)
            }
        }
    }

    /// Read every remaining record, in source order.
    pub fn collect_products(&mut self) -> FeedResult<Vec<ProductRecord>> {
        let mut products = Vec::new();
        while let Some(record) = self.next_record()? {
            products.push(record);
        }
        Ok(products)
    }

    /// Pull every remaining record into `store`. Returns the number saved.
    pub fn save_products<S: RecordStore>(&mut self, store: &mut S) -> FeedResult<usize> {
        Ok(self.import(store)?.persisted)
    }

    /// Pull every remaining record into `store`, returning all counts.
    ///
    /// Invalid records and failed saves are logged and skipped. The store
    /// sees `begin_batch` before the first save and `end_batch` at the end,
    /// both only if at least one record was read.
    pub fn import<S: RecordStore>(&mut self, store: &mut S) -> FeedResult<ImportStats> {
        let mut stats = ImportStats::default();

        let result = self.import_into(store, &mut stats);
        if stats.processed > 0 {
            let ended = store.end_batch();
            // The pull error wins over a failure to close the batch
            result?;
            ended?;
        } else {
            result?;
            log_warning("No products found in export, nothing saved");
        }

        log_success(format!(
            "Saved {} products ({} invalid, {} failed)",
            stats.persisted, stats.invalid, stats.failed
        ));
        Ok(stats)
    }

    fn import_into<S: RecordStore>(
        &mut self,
        store: &mut S,
        stats: &mut ImportStats,
    ) -> FeedResult<()> {
        while let Some(record) = self.next_record()? {
            if stats.processed == 0 {
                store.begin_batch()?;
            }
            stats.processed += 1;

            if let Err(errors) = store.validate(&record) {
                stats.invalid += 1;
                log_warning(format!(
                    "Could not save product {}: {}",
                    self.describe(&record),
                    errors.join(", ")
                ));
                continue;
            }

            match store.save(&record) {
                Ok(()) => {
                    stats.persisted += 1;
                    if stats.persisted % PROGRESS_EVERY == 0 {
                        log_info(format!("{} products saved", stats.persisted));
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    log_warning(format!(
                        "Failed to save product {}: {}",
                        self.describe(&record),
                        e
                    ));
                }
            }
        }
        Ok(())
    }

    /// `shop::product` label for log messages
    fn describe(&self, record: &ProductRecord) -> String {
        let shop = self
            .shop_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let product = self
            .product_id_field
            .as_deref()
            .and_then(|field| record.get(field))
            .unwrap_or("?");
        format!("{}::{}", shop, product)
    }

    /// Release the file early, for callers that stop pulling before the end.
    ///
    /// Safe to call any number of times; pulls afterwards return `Ok(None)`.
    pub fn dispose(&mut self) {
        if self.cursor.release() {
            log_debug(format!("Released {}", self.cursor.path().display()));
        }
    }
}

impl Iterator for ProductReader {
    type Item = FeedResult<ProductRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use crate::error::{SchemaError, StoreError, StoreResult};
    use crate::store::MemoryStore;
    use crate::validation::RecordValidator;
    use std::fs;
    use tempfile::NamedTempFile;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ROWSET>
  <ROW TYPE="column_set">
    <COL NUMBER="0"><NAME>sku</NAME><PROP>string</PROP></COL>
    <COL NUMBER="1"><NAME>name</NAME><PROP>string</PROP></COL>
    <COL NUMBER="2"><NAME>group</NAME><PROP>string</PROP></COL>
  </ROW>
  <ROW TYPE="data">
    <COL NUMBER="0">A1</COL><COL NUMBER="1">Widget</COL><COL NUMBER="2">G1</COL>
  </ROW>
  <ROW TYPE="data">
    <COL NUMBER="0">A2</COL><COL NUMBER="1">Widget-Red</COL><COL NUMBER="2">G1</COL>
  </ROW>
  <ROW TYPE="data">
    <COL NUMBER="0">A3</COL><COL NUMBER="1">Gadget</COL><COL NUMBER="2">G2</COL>
  </ROW>
</ROWSET>"#;

    fn write_export(content: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), content).unwrap();
        file
    }

    fn list() -> ProductList {
        ProductList {
            shop_id: Some(1234),
            catalog_id: None,
            product_id_field: Some("sku".into()),
            fields: vec![
                FieldDescriptor {
                    required: true,
                    ..FieldDescriptor::new("sku")
                },
                FieldDescriptor {
                    is_list_search_column: true,
                    ..FieldDescriptor::new("name")
                },
                FieldDescriptor {
                    is_variations_group_column: true,
                    ..FieldDescriptor::new("group")
                },
            ],
        }
    }

    /// Many data rows, enough to span several 4096-byte reads.
    fn large_export(rows: usize) -> String {
        let mut xml = String::from(
            r#"<ROWSET><ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL><COL NUMBER="1"><NAME>group</NAME></COL></ROW>"#,
        );
        for i in 0..rows {
            xml.push_str(&format!(
                "<ROW TYPE=\"data\"><COL NUMBER=\"0\">  SKU-{:05}  </COL><COL NUMBER=\"1\">G{}</COL></ROW>\n",
                i,
                i / 3
            ));
        }
        xml.push_str("</ROWSET>");
        xml
    }

    #[test]
    fn test_collect_groups_variants() {
        let file = write_export(EXPORT);
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();
        let products = reader.collect_products().unwrap();

        assert_eq!(products.len(), 3);
        assert_eq!(products[0].get("sku"), Some("A1"));
        assert!(!products[0].is_variant);
        assert_eq!(products[0].group_id, "g-1");
        assert!(products[1].is_variant);
        assert_eq!(products[1].group_id, "g-1");
        assert!(!products[2].is_variant);
        assert_eq!(products[2].group_id, "g-2");

        assert_eq!(products[1].domain_values["name"], "Widget-Red");
        assert_eq!(products[2].shop_id, Some(1234));
        assert_eq!(reader.schema().names(), vec!["sku", "name", "group"]);
    }

    #[test]
    fn test_pull_matches_collect() {
        let xml = large_export(500);
        let file = write_export(&xml);

        let collected = ProductReader::open(file.path(), &list())
            .unwrap()
            .collect_products()
            .unwrap();

        let mut reader = ProductReader::open(file.path(), &list()).unwrap();
        let mut pulled = Vec::new();
        while let Some(record) = reader.next_record().unwrap() {
            pulled.push(record);
        }

        assert_eq!(collected.len(), 500);
        assert_eq!(pulled, collected);
        assert_eq!(pulled[499].get("sku"), Some("SKU-00499"));
        // Runs of three share a group
        assert_eq!(pulled[3].group_id, pulled[5].group_id);
        assert!(pulled[4].is_variant);
        assert!(!pulled[6].is_variant);
    }

    #[test]
    fn test_iterator_adapter() {
        let file = write_export(EXPORT);
        let reader = ProductReader::open(file.path(), &list()).unwrap();
        let skus: Vec<String> = reader
            .map(|r| r.unwrap().get("sku").unwrap_or_default().to_string())
            .collect();
        assert_eq!(skus, vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn test_pull_after_exhaustion() {
        let file = write_export(EXPORT);
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();
        assert_eq!(reader.state(), CursorState::NotStarted);

        reader.collect_products().unwrap();
        assert_eq!(reader.state(), CursorState::Exhausted);

        // Removing the file proves no I/O happens anymore
        drop(file);
        for _ in 0..3 {
            assert!(reader.next_record().unwrap().is_none());
        }
        assert_eq!(reader.open_count(), 1);
    }

    #[test]
    fn test_dispose_before_exhaustion() {
        let file = write_export(EXPORT);
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();

        assert!(reader.next_record().unwrap().is_some());
        assert_eq!(reader.state(), CursorState::Streaming);

        reader.dispose();
        reader.dispose();
        assert_eq!(reader.state(), CursorState::Exhausted);
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.open_count(), 1);
    }

    #[test]
    fn test_missing_file_fails_fast() {
        let err = ProductReader::open("/no/such/export.xml", &list()).unwrap_err();
        assert!(matches!(err, FeedError::Input(InputError::NotFound(_))));

        let err = ProductReader::open("", &list()).unwrap_err();
        assert!(matches!(err, FeedError::Input(InputError::MissingFileName)));
    }

    #[test]
    fn test_malformed_xml_keeps_earlier_records() {
        let xml = r#"<ROWSET>
<ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A1</COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A2</COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A3</NAME></ROW>
<ROW TYPE="data"><COL NUMBER="0">A4</COL></ROW>
</ROWSET>"#;
        let file = write_export(xml);
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();

        let products = reader.collect_products().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].get("sku"), Some("A2"));
        assert_eq!(reader.state(), CursorState::Exhausted);
    }

    #[test]
    fn test_truncated_export_is_logged() {
        let xml = r#"<ROWSET>
<ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A1</COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A2</COL>"#;
        let file = write_export(xml);
        let mut logs = crate::logs::LOG_BROADCASTER.subscribe();
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();

        let products = reader.collect_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].get("sku"), Some("A1"));
        assert_eq!(reader.state(), CursorState::Exhausted);

        let mut logged = Vec::new();
        loop {
            match logs.try_recv() {
                Ok(entry) => logged.push(entry),
                Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        let expected = format!("unexpected end of input inside <ROW> at byte {}", xml.len());
        assert!(logged.iter().any(|entry| entry.level == crate::logs::LogLevel::Error
            && entry.message.starts_with("XML ERROR: ")
            && entry.message.ends_with(&expected)));
    }

    #[test]
    fn test_unmapped_column_is_fatal() {
        let xml = r#"<ROWSET>
<ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A1</COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A2</COL><COL NUMBER="3">x</COL></ROW>
</ROWSET>"#;
        let file = write_export(xml);
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();

        assert!(reader.next_record().unwrap().is_some());
        let err = reader.next_record().unwrap_err();
        assert!(matches!(
            err,
            FeedError::Schema(SchemaError::UnmappedColumn { position: 3, .. })
        ));
        assert_eq!(reader.state(), CursorState::Exhausted);
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_data_before_column_set_is_fatal() {
        let xml = r#"<ROWSET><ROW TYPE="data"><COL NUMBER="0">A1</COL></ROW></ROWSET>"#;
        let file = write_export(xml);
        let result = ProductReader::open(file.path(), &list())
            .unwrap()
            .collect_products();
        assert!(matches!(result, Err(FeedError::Schema(_))));
    }

    #[test]
    fn test_no_data_rows() {
        let xml = r#"<ROWSET><ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL></ROW></ROWSET>"#;
        let file = write_export(xml);
        let products = ProductReader::open(file.path(), &list())
            .unwrap()
            .collect_products()
            .unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn test_save_products_counts_valid_only() {
        let xml = r#"<ROWSET>
<ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL><COL NUMBER="1"><NAME>group</NAME></COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A1</COL><COL NUMBER="1">G1</COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">   </COL><COL NUMBER="1">G1</COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A3</COL><COL NUMBER="1">G1</COL></ROW>
</ROWSET>"#;
        let file = write_export(xml);
        let list = list();
        let mut store = MemoryStore::with_validator(RecordValidator::new(&list).unwrap());
        let mut reader = ProductReader::open(file.path(), &list).unwrap();

        let saved = reader.save_products(&mut store).unwrap();

        assert_eq!(saved, 2);
        assert_eq!(store.records().len(), 2);
        assert_eq!(store.batches_started(), 1);
        assert_eq!(store.batches_ended(), 1);
        // The rejected record still took part in grouping
        assert!(store.records()[1].is_variant);
        assert_eq!(store.records()[1].group_id, store.records()[0].group_id);
    }

    #[test]
    fn test_empty_export_skips_batch() {
        let xml = r#"<ROWSET><ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL></ROW></ROWSET>"#;
        let file = write_export(xml);
        let mut store = MemoryStore::new();
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();

        assert_eq!(reader.save_products(&mut store).unwrap(), 0);
        assert_eq!(store.batches_started(), 0);
        assert_eq!(store.batches_ended(), 0);
    }

    /// Store that refuses to save one specific sku
    struct FlakyStore {
        inner: MemoryStore,
        refuse: &'static str,
    }

    impl RecordStore for FlakyStore {
        fn validate(&self, record: &ProductRecord) -> Result<(), Vec<String>> {
            self.inner.validate(record)
        }

        fn save(&mut self, record: &ProductRecord) -> StoreResult<()> {
            if record.get("sku") == Some(self.refuse) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save(record)
        }

        fn begin_batch(&mut self) -> StoreResult<()> {
            self.inner.begin_batch()
        }

        fn end_batch(&mut self) -> StoreResult<()> {
            self.inner.end_batch()
        }
    }

    #[test]
    fn test_store_failures_are_counted() {
        let file = write_export(EXPORT);
        let mut store = FlakyStore {
            inner: MemoryStore::new(),
            refuse: "A2",
        };
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();

        let stats = reader.import(&mut store).unwrap();
        assert_eq!(
            stats,
            ImportStats {
                processed: 3,
                persisted: 2,
                invalid: 0,
                failed: 1,
            }
        );
        assert_eq!(store.inner.batches_ended(), 1);
    }

    #[test]
    fn test_fatal_error_still_ends_batch() {
        let xml = r#"<ROWSET>
<ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL></ROW>
<ROW TYPE="data"><COL NUMBER="0">A1</COL></ROW>
<ROW TYPE="data"><COL NUMBER="1">A2</COL></ROW>
</ROWSET>"#;
        let file = write_export(xml);
        let mut store = MemoryStore::new();
        let mut reader = ProductReader::open(file.path(), &list()).unwrap();

        assert!(reader.save_products(&mut store).is_err());
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.batches_ended(), 1);
    }

    #[test]
    fn test_open_normalized_converts_latin1() {
        let mut bytes = br#"<ROWSET><ROW TYPE="column_set"><COL NUMBER="0"><NAME>sku</NAME></COL><COL NUMBER="1"><NAME>name</NAME></COL></ROW><ROW TYPE="data"><COL NUMBER="0">A1</COL><COL NUMBER="1">Caf"#.to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b" cr\xE8me</COL></ROW></ROWSET>");
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), &bytes).unwrap();

        let (mut reader, outcome) =
            ProductReader::open_normalized(file.path(), &list(), &FeedConfig::default()).unwrap();
        assert!(matches!(outcome, NormalizeOutcome::Converted { .. }));

        let products = reader.collect_products().unwrap();
        assert_eq!(products.len(), 1);
        assert!(products[0].get("name").unwrap().starts_with("Caf"));
    }

    #[test]
    fn test_small_chunks() {
        let file = write_export(EXPORT);
        let config = FeedConfig {
            chunk_size: 7,
            ..FeedConfig::default()
        };
        let products = ProductReader::with_config(file.path(), &list(), &config)
            .unwrap()
            .collect_products()
            .unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[2].get("name"), Some("Gadget"));
    }
}
