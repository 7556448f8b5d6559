//! # Myshop Feed - product records from Myshop XML exports
//!
//! Myshop Feed reads the tabular XML product export of a Myshop shop and
//! turns it into product records, grouping consecutive rows that are
//! variants of one product.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  XML Export │────▶│   Parser    │────▶│  Assembler  │────▶│   Grouper   │────▶│   Reader    │
//! │  (chunked)  │     │  (events)   │     │  (fields)   │     │  (variants) │     │ (3 modes)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use myshop_feed::{ProductList, ProductReader};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let list = ProductList::from_file("products.json")?;
//!     let products = ProductReader::open("export.xml", &list)?.collect_products()?;
//!     println!("Read {} products", products.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration
//! - [`logs`] - Log broadcasting
//! - [`models`] - Domain models (ProductRecord, ColumnSchema, RawRow)
//! - [`descriptor`] - Product list descriptor
//! - [`normalize`] - UTF-8 normalization of exports
//! - [`parser`] - Event parser and state machine
//! - [`transform`] - Assembly, grouping and the product reader
//! - [`validation`] - Record validation
//! - [`store`] - Record stores

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Input
pub mod descriptor;
pub mod normalize;
pub mod parser;

// Transformation
pub mod transform;

// Persistence
pub mod store;
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    DescriptorError,
    FeedError,
    FeedResult,
    InputError,
    NormalizeError,
    SchemaError,
    StoreError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ColumnSchema,
    DomainValues,
    ProductRecord,
    RawRow,
    RowType,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::FeedConfig;
pub use descriptor::{FieldDescriptor, ProductList};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use normalize::{normalize_file, NormalizeOutcome};
pub use parser::{EventSource, ParseEvent, ParserState};

// =============================================================================
// Re-exports - Reader
// =============================================================================

pub use transform::{
    tag_variants,
    CursorState,
    ImportStats,
    ProductReader,
    RecordAssembler,
    VariantTagger,
};

// =============================================================================
// Re-exports - Stores
// =============================================================================

pub use store::{JsonLinesStore, MemoryStore, RecordStore, StoredProduct};
pub use validation::{required_fields_schema, RecordValidator};
