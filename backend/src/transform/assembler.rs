//! Turn raw data rows into named product records.

use std::collections::BTreeMap;

use crate::descriptor::ProductList;
use crate::error::{SchemaError, SchemaResult};
use crate::models::{ColumnSchema, DomainValues, ProductRecord, RawRow};

/// Resolves cell positions to field names and extracts domain values.
#[derive(Debug, Clone, Default)]
pub struct RecordAssembler {
    domain_fields: Vec<String>,
    shop_id: Option<u64>,
    catalog_id: Option<u64>,
}

impl RecordAssembler {
    pub fn new(list: &ProductList) -> Self {
        Self {
            domain_fields: list.domain_fields().into_iter().map(String::from).collect(),
            shop_id: list.shop_id,
            catalog_id: list.catalog_id,
        }
    }

    /// Build a record from one data row.
    ///
    /// Fails if the row has a cell at a position the schema does not name.
    /// `offset` is reported in the error.
    pub fn assemble(
        &self,
        row: RawRow,
        schema: &ColumnSchema,
        offset: usize,
    ) -> SchemaResult<ProductRecord> {
        let mut fields = BTreeMap::new();
        for (position, value) in row.cells {
            let name = schema
                .name(position)
                .ok_or(SchemaError::UnmappedColumn { position, offset })?;
            fields.insert(name.to_string(), value);
        }

        let mut record = ProductRecord::new(fields);
        record.domain_values = self.domain_values(&record);
        record.shop_id = self.shop_id;
        record.catalog_id = self.catalog_id;
        Ok(record)
    }

    /// Fresh side table of domain field values. Fields the record lacks are left out.
    fn domain_values(&self, record: &ProductRecord) -> DomainValues {
        self.domain_fields
            .iter()
            .filter_map(|field| {
                record
                    .get(field)
                    .map(|value| (field.clone(), value.to_string()))
            })
            .collect()
    }
}
