//! Product list descriptor.
//!
//! Describes the fields of a shop's product list: which column links
//! variants together, which columns feed menus and list search, and which
//! columns a product must fill in.
//!
//! ```json
//! {
//!   "shopId": 1234,
//!   "catalogId": 1,
//!   "productIdField": "sku",
//!   "fields": [
//!     { "name": "sku", "required": true },
//!     { "name": "group", "isVariationsGroupColumn": true },
//!     { "name": "brand", "isMenuColumn": true }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::DescriptorResult;

/// A single product list field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDescriptor {
    /// Column name in the export
    pub name: String,
    /// Links consecutive rows into variants of one product
    pub is_variations_group_column: bool,
    /// Shown in the shop menu
    pub is_menu_column: bool,
    /// Searchable from list pages
    pub is_list_search_column: bool,
    /// Must be filled in for a product to be saved
    pub required: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Menu and list-search columns are domain fields.
    pub fn is_domain(&self) -> bool {
        self.is_menu_column || self.is_list_search_column
    }
}

/// Product list descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductList {
    pub shop_id: Option<u64>,
    pub catalog_id: Option<u64>,
    /// Field identifying a product in log messages
    pub product_id_field: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl ProductList {
    /// Load a descriptor from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> DescriptorResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> DescriptorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Name of the first variations group column, if any.
    pub fn grouping_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.is_variations_group_column)
            .map(|f| f.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Names of menu and list-search columns, in descriptor order.
    pub fn domain_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_domain())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Names of required columns, in descriptor order.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }
}
