//! Tagged parse events read from the XML byte stream.
//!
//! [`EventSource`] pulls raw events from `quick-xml` and translates the ones
//! the export format cares about into [`ParseEvent`]s. Element and attribute
//! names are matched case-insensitively.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::error::SchemaError;
use crate::models::RowType;

/// Elements of the export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Row,
    Col,
    Name,
    Prop,
    Other,
}

impl Element {
    fn from_name(name: &[u8]) -> Self {
        if name.eq_ignore_ascii_case(b"ROW") {
            Self::Row
        } else if name.eq_ignore_ascii_case(b"COL") {
            Self::Col
        } else if name.eq_ignore_ascii_case(b"NAME") {
            Self::Name
        } else if name.eq_ignore_ascii_case(b"PROP") {
            Self::Prop
        } else {
            Self::Other
        }
    }
}

/// A single event driving the parser state
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    RowOpen { row_type: RowType },
    RowClose,
    ColumnOpen { position: usize },
    ColumnClose,
    NameOpen,
    NameClose,
    PropOpen,
    PropClose,
    /// Any element outside the format (the document root, for one).
    OtherOpen,
    OtherClose,
    CharacterData(String),
}

/// Why reading the next event failed
#[derive(Debug)]
pub enum ReadFailure {
    /// The input is not well-formed XML. Ends the parse pass.
    Malformed { message: String, offset: usize },
    /// A column carries an unusable position. Fatal.
    Schema(SchemaError),
}

/// Translates a `quick-xml` reader into [`ParseEvent`]s
pub struct EventSource<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Names of the elements opened and not yet closed
    open: Vec<String>,
}

impl<R: BufRead> EventSource<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(false);
        reader.expand_empty_elements(true);
        Self {
            reader,
            buf: Vec::with_capacity(4096),
            open: Vec::new(),
        }
    }

    /// Byte offset of the reader in the input.
    pub fn offset(&self) -> usize {
        self.reader.buffer_position()
    }

    /// Read the next relevant event. `Ok(None)` is end of input.
    ///
    /// Input ending while an element is still open is malformed.
    pub fn next_event(&mut self) -> Result<Option<ParseEvent>, ReadFailure> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(ReadFailure::Malformed {
                        message: e.to_string(),
                        offset: self.reader.buffer_position(),
                    })
                }
            };
            let offset = self.reader.buffer_position();

            let translated = match event {
                Event::Start(e) => {
                    self.open
                        .push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    Some(open_event(&e, offset)?)
                }
                Event::End(e) => {
                    self.open.pop();
                    Some(match Element::from_name(e.name().as_ref()) {
                        Element::Row => ParseEvent::RowClose,
                        Element::Col => ParseEvent::ColumnClose,
                        Element::Name => ParseEvent::NameClose,
                        Element::Prop => ParseEvent::PropClose,
                        Element::Other => ParseEvent::OtherClose,
                    })
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|e| malformed(e, offset))?;
                    Some(ParseEvent::CharacterData(text.into_owned()))
                }
                Event::CData(e) => {
                    let bytes = e.into_inner();
                    let text = std::str::from_utf8(&bytes).map_err(|e| malformed(e, offset))?;
                    Some(ParseEvent::CharacterData(text.to_string()))
                }
                Event::Eof => {
                    return match self.open.last() {
                        Some(name) => Err(ReadFailure::Malformed {
                            message: format!("unexpected end of input inside <{}>", name),
                            offset,
                        }),
                        None => Ok(None),
                    }
                }
                // Declarations, comments, processing instructions, doctype
                _ => None,
            };

            if let Some(event) = translated {
                return Ok(Some(event));
            }
        }
    }
}

fn malformed(err: impl std::fmt::Display, offset: usize) -> ReadFailure {
    ReadFailure::Malformed {
        message: err.to_string(),
        offset,
    }
}

fn open_event(elem: &BytesStart, offset: usize) -> Result<ParseEvent, ReadFailure> {
    Ok(match Element::from_name(elem.name().as_ref()) {
        Element::Row => {
            let row_type = attribute(elem, b"TYPE", offset)?.unwrap_or_default();
            ParseEvent::RowOpen {
                row_type: RowType::from_attr(&row_type),
            }
        }
        Element::Col => {
            let number = attribute(elem, b"NUMBER", offset)?.unwrap_or_default();
            let position = number.trim().parse::<usize>().map_err(|_| {
                ReadFailure::Schema(SchemaError::InvalidColumnNumber {
                    value: number.clone(),
                    offset,
                })
            })?;
            ParseEvent::ColumnOpen { position }
        }
        Element::Name => ParseEvent::NameOpen,
        Element::Prop => ParseEvent::PropOpen,
        Element::Other => ParseEvent::OtherOpen,
    })
}

fn attribute(elem: &BytesStart, key: &[u8], offset: usize) -> Result<Option<String>, ReadFailure> {
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| malformed(e, offset))?;
        if attr.key.as_ref().eq_ignore_ascii_case(key) {
            let value = attr.unescape_value().map_err(|e| malformed(e, offset))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
