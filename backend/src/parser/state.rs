//! Parser state machine.
//!
//! [`ParserState::handle`] consumes one [`ParseEvent`] at a time. Column
//! names from `column_set` rows go straight into the [`ColumnSchema`]; cell
//! values from `data` rows are buffered and handed back as a [`RawRow`]
//! when the row closes.

use std::mem;

use super::events::{Element, ParseEvent};
use crate::models::{ColumnSchema, RawRow, RowType};

/// Transient parser state for one parse pass
#[derive(Debug, Default)]
pub struct ParserState {
    /// Last opened element. Not reset on close.
    current_element: Option<Element>,
    row_type: Option<RowType>,
    position: Option<usize>,
    name: String,
    data: String,
    row: RawRow,
    schema: ColumnSchema,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column names seen so far.
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Apply one event. Returns the completed row when a data row closes.
    pub fn handle(&mut self, event: ParseEvent) -> Option<RawRow> {
        match event {
            ParseEvent::RowOpen { row_type } => {
                self.current_element = Some(Element::Row);
                self.row_type = Some(row_type);
            }
            ParseEvent::ColumnOpen { position } => {
                self.current_element = Some(Element::Col);
                self.position = Some(position);
                self.data.clear();
            }
            ParseEvent::NameOpen => {
                self.current_element = Some(Element::Name);
                self.name.clear();
            }
            ParseEvent::PropOpen => self.current_element = Some(Element::Prop),
            ParseEvent::OtherOpen => self.current_element = Some(Element::Other),
            ParseEvent::CharacterData(text) => {
                // PROP content is dropped
                if matches!(self.current_element, Some(Element::Name | Element::Col)) {
                    self.data.push_str(&text);
                }
            }
            ParseEvent::NameClose => {
                self.name = mem::take(&mut self.data);
            }
            ParseEvent::ColumnClose => self.close_column(),
            ParseEvent::RowClose => {
                if self.row_type == Some(RowType::Data) {
                    return Some(mem::take(&mut self.row));
                }
            }
            ParseEvent::PropClose | ParseEvent::OtherClose => {}
        }
        None
    }

    fn close_column(&mut self) {
        let Some(position) = self.position.take() else {
            return;
        };
        match self.row_type {
            Some(RowType::ColumnSet) => {
                self.schema.insert(position, self.name.trim());
                self.name.clear();
            }
            Some(RowType::Data) => {
                self.row.insert(position, self.data.trim());
            }
            _ => {}
        }
        self.data.clear();
    }
}
