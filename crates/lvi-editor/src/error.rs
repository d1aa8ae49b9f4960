//! Fatal editor errors.
//!
//! Anything the user can recover from (a motion at an edge, an unknown
//! key, a failed save) becomes a status message and never reaches this
//! type. An [`EditorError`] always ends the session: the event loop
//! stops, the terminal is restored, and the binary exits non-zero.

use std::io;

use thiserror::Error;

use crate::line_store::StoreError;

#[derive(Debug, Error)]
pub enum EditorError {
    /// The line store failed, most likely out of memory.
    #[error("line store: {0}")]
    Store(#[from] StoreError),

    /// Writing to the terminal failed.
    #[error("terminal output: {0}")]
    Io(#[from] io::Error),

    /// Cursor, viewport and document disagree.
    #[error("internal state corrupted: {0}")]
    Invariant(&'static str),
}
