//! JSON Schema validation of product records before they are saved.
//!
//! The schema is derived from the product list descriptor: every required
//! field must be present and non-empty.
//!
//! ```rust,ignore
//! use myshop_feed::{ProductList, RecordValidator};
//!
//! let list = ProductList::from_file("products.json")?;
//! let validator = RecordValidator::new(&list)?;
//! if let Err(errors) = validator.validate(&record) {
//!     eprintln!("{}", errors.join(", "));
//! }
//! ```

use serde_json::{json, Map, Value};

use crate::descriptor::ProductList;
use crate::error::{StoreError, StoreResult};
use crate::models::ProductRecord;

/// Build the draft 7 schema a record's fields must satisfy.
pub fn required_fields_schema(list: &ProductList) -> Value {
    let required = list.required_fields();
    let properties: Map<String, Value> = required
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "string", "minLength": 1 })))
        .collect();

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": required,
        "properties": properties,
        "additionalProperties": { "type": "string" }
    })
}

/// Compiled validator for one product list
pub struct RecordValidator {
    validator: jsonschema::Validator,
}

impl RecordValidator {
    pub fn new(list: &ProductList) -> StoreResult<Self> {
        Self::from_schema(&required_fields_schema(list))
    }

    pub fn from_schema(schema: &Value) -> StoreResult<Self> {
        let validator = jsonschema::draft7::new(schema)
            .map_err(|e| StoreError::InvalidSchema(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Validate a record's fields.
    ///
    /// # Returns
    /// * `Ok(())` if valid
    /// * `Err(Vec<String>)` with one message per violation
    pub fn validate(&self, record: &ProductRecord) -> Result<(), Vec<String>> {
        let data = record.fields_json();
        let errors: Vec<String> = self
            .validator
            .iter_errors(&data)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Quick check, without messages.
    pub fn is_valid(&self, record: &ProductRecord) -> bool {
        self.validator.is_valid(&record.fields_json())
    }
}

impl std::fmt::Debug for RecordValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordValidator").finish_non_exhaustive()
    }
}
