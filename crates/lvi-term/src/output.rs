// SPDX-License-Identifier: MIT
//
// Per-byte screen update staging.
//
// An input byte can produce several drawing steps: move, text, erase,
// status row, cursor park. They are appended here in order and handed to
// the terminal together once the byte is fully handled, so a partial
// update is never visible between two keystrokes.

use std::io::{self, Write};

/// Room for a full redraw of a large terminal without reallocating.
const INITIAL_CAPACITY: usize = 4096;

/// Staged bytes for the update in progress.
#[derive(Default)]
pub struct OutputBuffer {
    pending: Vec<u8>,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// What has been staged so far.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pending
    }

    /// Send the staged update to stdout.
    ///
    /// # Errors
    ///
    /// Propagates the stdout write error; nothing is discarded on failure.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        self.flush_to(&mut io::stdout().lock())
    }

    /// Send the staged update to `sink` in one `write_all`, then start a
    /// new one.
    ///
    /// # Errors
    ///
    /// Propagates the sink's write error; nothing is discarded on failure.
    pub fn flush_to(&mut self, sink: &mut impl Write) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        sink.write_all(&self.pending)?;
        sink.flush()?;
        self.pending.clear();
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    // Staging only. The event loop decides when bytes leave.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
