//! Event-driven parser for the Myshop tabular XML export.
//!
//! The export is flat: `ROW` elements of type `column_set` name the columns,
//! `ROW` elements of type `data` carry one product each.
//!
//! ```text
//! <ROWSET>
//!   <ROW TYPE="column_set">
//!     <COL NUMBER="0"><NAME>sku</NAME><PROP>...</PROP></COL>
//!   </ROW>
//!   <ROW TYPE="data">
//!     <COL NUMBER="0">A1</COL>
//!   </ROW>
//! </ROWSET>
//! ```
//!
//! - [`events`] - translates `quick-xml` events into [`ParseEvent`]s
//! - [`state`] - the state machine turning events into rows

pub mod events;
pub mod state;

pub use events::{Element, EventSource, ParseEvent, ReadFailure};
pub use state::ParserState;
