//! Error types for the Myshop feed reader.
//!
//! Only the fatal classes are surfaced as values:
//!
//! - [`InputError`] - the export file cannot be opened or read
//! - [`SchemaError`] - a data row does not resolve against the column schema
//! - [`DescriptorError`] - the product list descriptor cannot be loaded
//! - [`NormalizeError`] - UTF-8 normalization failed to rewrite the file
//! - [`StoreError`] - the record store failed
//! - [`FeedError`] - top-level error wrapping all of the above
//!
//! Malformed XML is not in this list: it is logged and ends the current
//! parse pass without an error value.

use thiserror::Error;

// =============================================================================
// Input Errors
// =============================================================================

/// Errors opening or reading the export file.
#[derive(Debug, Error)]
pub enum InputError {
    /// No file name was given.
    #[error("Reader needs a file name to process")]
    MissingFileName,

    /// The given path is not an existing file.
    #[error("Reader called with a non-existing file: {0}")]
    NotFound(String),

    /// Failed to open or read the file.
    #[error("Failed to read export: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors resolving column positions.
///
/// The column schema is a precondition for data rows, so these abort the
/// parse instead of skipping the offending record.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// A data row references a column position no `column_set` row named.
    #[error("Column {position} has no name in the column set (byte {offset})")]
    UnmappedColumn { position: usize, offset: usize },

    /// The `NUMBER` attribute of a column is missing or not a number.
    #[error("Invalid column number '{value}' (byte {offset})")]
    InvalidColumnNumber { value: String, offset: usize },
}

// =============================================================================
// Descriptor Errors
// =============================================================================

/// Errors loading the product list descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// IO error.
    #[error("Descriptor IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Descriptor JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Normalization Errors
// =============================================================================

/// Errors while converting an export to UTF-8.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Failed to read or rewrite the file.
    #[error("Normalization IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `save` was called before `begin_batch`.
    #[error("No insert batch has been started")]
    NoBatch,

    /// The validation schema could not be compiled.
    #[error("Invalid validation schema: {0}")]
    InvalidSchema(String),
}

// =============================================================================
// Feed Errors (top-level)
// =============================================================================

/// Top-level error returned by the product reader.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Input file error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Column schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Descriptor error.
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Normalization error.
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema resolution.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for descriptor loading.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for reader operations.
pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SchemaError -> FeedError
        let schema_err = SchemaError::UnmappedColumn { position: 7, offset: 120 };
        let feed_err: FeedError = schema_err.into();
        assert!(feed_err.to_string().contains("Column 7"));

        // InputError -> FeedError
        let input_err = InputError::NotFound("missing.xml".into());
        let feed_err: FeedError = input_err.into();
        assert!(feed_err.to_string().contains("missing.xml"));
    }

    #[test]
    fn test_invalid_column_number_format() {
        let err = SchemaError::InvalidColumnNumber {
            value: "abc".into(),
            offset: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("'abc'"));
        assert!(msg.contains("byte 42"));
    }
}
