//! Tag product records as variants of one another.
//!
//! Consecutive records sharing a non-empty value in the grouping field form
//! one group. The first record of a run starts a new group; the rest are
//! variants reusing its group id.
//!
//! ```text
//! sku  group          is_variant  group_id
//! A1   G1        →    false       g-1
//! A2   G1        →    true        g-1
//! A3   G2        →    false       g-2
//! A4   G1        →    false       g-3   (runs, not partitions)
//! ```

use crate::models::ProductRecord;

/// Run-length variant detector.
///
/// Group ids are unique for the lifetime of one tagger.
#[derive(Debug, Clone, Default)]
pub struct VariantTagger {
    grouping_field: Option<String>,
    last_value: String,
    current_group_id: String,
    issued: u64,
}

impl VariantTagger {
    pub fn new(grouping_field: Option<&str>) -> Self {
        Self {
            grouping_field: grouping_field
                .filter(|f| !f.is_empty())
                .map(String::from),
            ..Self::default()
        }
    }

    pub fn grouping_field(&self) -> Option<&str> {
        self.grouping_field.as_deref()
    }

    /// Set `is_variant` and `group_id` on the next record in source order.
    pub fn tag(&mut self, mut record: ProductRecord) -> ProductRecord {
        let value = self
            .grouping_field
            .as_deref()
            .and_then(|field| record.get(field))
            .unwrap_or("")
            .to_string();

        if self.grouping_field.is_some() && !value.is_empty() && value == self.last_value {
            record.is_variant = true;
            record.group_id = self.current_group_id.clone();
        } else {
            record.is_variant = false;
            record.group_id = self.fresh_id();
            self.current_group_id = record.group_id.clone();
        }
        self.last_value = value;
        record
    }

    fn fresh_id(&mut self) -> String {
        self.issued += 1;
        format!("g-{}", self.issued)
    }
}

/// Tag a whole sequence of records, in order.
pub fn tag_variants(records: Vec<ProductRecord>, grouping_field: Option<&str>) -> Vec<ProductRecord> {
    let mut tagger = VariantTagger::new(grouping_field);
    records.into_iter().map(|r| tagger.tag(r)).collect()
}
