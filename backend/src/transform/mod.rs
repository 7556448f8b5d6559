//! Transformation module.
//!
//! This module turns parsed rows into product records:
//! - Assembler: raw rows to named records with domain values
//! - Grouper: variant tagging of consecutive records
//! - Cursor: export file lifecycle across pulls
//! - Pipeline: the product reader and its three consumption modes

pub mod assembler;
pub mod cursor;
pub mod grouper;
pub mod pipeline;

pub use assembler::RecordAssembler;
pub use cursor::{CursorState, StreamCursor};
pub use grouper::{tag_variants, VariantTagger};
pub use pipeline::*;
