//! Domain models for the feed reader.
//!
//! - [`RowType`] - the `TYPE` attribute of a `ROW` element
//! - [`ColumnSchema`] - column position to column name mapping
//! - [`RawRow`] - cell values of one data row, keyed by position
//! - [`ProductRecord`] - an assembled, grouped product

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name to extracted value, for the descriptor's domain fields.
pub type DomainValues = BTreeMap<String, String>;

// =============================================================================
// Row Type
// =============================================================================

/// Kind of a `ROW` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowType {
    /// Schema row naming the columns.
    ColumnSet,
    /// Row carrying one product's values.
    Data,
    /// Any other value. Accepted and ignored.
    Other(String),
}

impl RowType {
    /// Parse the `TYPE` attribute value. Matching is exact.
    pub fn from_attr(value: &str) -> Self {
        match value {
            "column_set" => Self::ColumnSet,
            "data" => Self::Data,
            other => Self::Other(other.to_string()),
        }
    }
}

// =============================================================================
// Column Schema
// =============================================================================

/// Column position to column name mapping, built from `column_set` rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSchema {
    columns: BTreeMap<usize, String>,
}

impl ColumnSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name a column. A later `column_set` row overwrites earlier names.
    pub fn insert(&mut self, position: usize, name: impl Into<String>) {
        self.columns.insert(position, name.into());
    }

    /// Name of the column at `position`.
    pub fn name(&self, position: usize) -> Option<&str> {
        self.columns.get(&position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in position order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.values().map(String::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSchema {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (position, name) in iter.into_iter().enumerate() {
            schema.insert(position, name);
        }
        schema
    }
}

// =============================================================================
// Raw Row
// =============================================================================

/// Trimmed cell values of one data row, keyed by column position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub cells: BTreeMap<usize, String>,
}

impl RawRow {
    pub fn insert(&mut self, position: usize, value: impl Into<String>) {
        self.cells.insert(position, value.into());
    }
}

// =============================================================================
// Product Record
// =============================================================================

/// One product read from the export.
///
/// Field values are the source cells with surrounding whitespace trimmed.
/// `is_variant` and `group_id` are set once by the variant tagger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Field name to value.
    pub fields: BTreeMap<String, String>,
    /// Whether this record continues the previous record's group.
    #[serde(default)]
    pub is_variant: bool,
    /// Group identifier, shared by a run of variants.
    #[serde(default)]
    pub group_id: String,
    /// Extracted values of the descriptor's domain fields.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub domain_values: DomainValues,
    /// Shop the product belongs to.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shop_id: Option<u64>,
    /// Catalog the product belongs to.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub catalog_id: Option<u64>,
}

impl ProductRecord {
    /// Create an ungrouped record from its fields.
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self {
            fields,
            is_variant: false,
            group_id: String::new(),
            domain_values: DomainValues::new(),
            shop_id: None,
            catalog_id: None,
        }
    }

    /// Value of a field, if the record has it.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Fields as a JSON object, for schema validation.
    pub fn fields_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
