//! Lifetime of the export file handle across pulls.
//!
//! The handle is opened lazily by the first pull and released exactly once,
//! either at end of input, on a fatal error, or when the caller disposes of
//! the reader early. `Exhausted` is terminal.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::InputError;
use crate::parser::EventSource;

/// Where the cursor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    NotStarted,
    Streaming,
    Exhausted,
}

/// Owned handle on the export being streamed
pub struct StreamCursor {
    path: PathBuf,
    chunk_size: usize,
    state: CursorState,
    source: Option<EventSource<BufReader<File>>>,
    opens: usize,
}

impl StreamCursor {
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size: chunk_size.max(1),
            state: CursorState::NotStarted,
            source: None,
            opens: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// How many times the file has been opened. Never more than one.
    pub fn open_count(&self) -> usize {
        self.opens
    }

    /// Event source to read from, opening the file on first use.
    ///
    /// `Ok(None)` once the cursor is exhausted; no I/O happens then. A
    /// failure to open exhausts the cursor too.
    pub fn acquire(&mut self) -> Result<Option<&mut EventSource<BufReader<File>>>, InputError> {
        if self.state == CursorState::NotStarted {
            let file = match File::open(&self.path) {
                Ok(file) => file,
                Err(e) => {
                    self.state = CursorState::Exhausted;
                    return Err(e.into());
                }
            };
            self.opens += 1;
            self.source = Some(EventSource::new(BufReader::with_capacity(
                self.chunk_size,
                file,
            )));
            self.state = CursorState::Streaming;
        }
        Ok(self.source.as_mut())
    }

    /// Close the file and parser. Returns `false` if already released.
    pub fn release(&mut self) -> bool {
        if self.state == CursorState::Exhausted {
            return false;
        }
        self.source = None;
        self.state = CursorState::Exhausted;
        true
    }
}

impl std::fmt::Debug for StreamCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCursor")
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size)
            .field("state", &self.state)
            .field("opens", &self.opens)
            .finish()
    }
}
