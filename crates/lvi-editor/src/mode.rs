//! Editing modes.
//!
//! | Mode      | Status label      | Cursor limit        | Bytes mean          |
//! |-----------|-------------------|---------------------|---------------------|
//! | Command   | (none)            | on a byte           | verbs, counts, `:`  |
//! | Insert    | `--- INSERT ---`  | one past the end    | text                |
//! | Replace   | `--- REPLACE ---` | on a byte           | nothing (unapplied) |
//!
//! The `:` prompt is not a mode of its own; it is a sub-state of Command
//! held by the editor while a line command is being typed.

use std::fmt;

/// The current editing mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Command,
    Insert,
    /// Entered and left like Insert, but typed bytes are not applied.
    Replace,
}

impl Mode {
    /// Label shown at the start of the status row.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Command => "",
            Self::Insert => "--- INSERT ---",
            Self::Replace => "--- REPLACE ---",
        }
    }

    /// True if the cursor may sit one past the last byte.
    #[inline]
    #[must_use]
    pub const fn cursor_past_end(self) -> bool {
        matches!(self, Self::Insert)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
