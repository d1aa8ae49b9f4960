//! Line commands: the `:` prompt on the status row.
//!
//! | Command       | Action                                  |
//! |---------------|-----------------------------------------|
//! | `:w`          | Save to the current file name           |
//! | `:w <name>`   | Save to `<name>` and adopt it           |
//! | `:q`          | Quit, discarding unsaved changes        |
//! | `:q!`         | Quit, discarding unsaved changes        |
//! | `:wq [name]`  | Save, then quit if the save worked      |
//!
//! Anything else parses to [`Command::Unknown`] and changes nothing.

use std::path::PathBuf;

/// Longest line command accepted; the prompt submits itself on reaching it.
pub const MAX_COMMAND_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A parsed line command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write,
    WriteAs(PathBuf),
    Quit,
    ForceQuit,
    WriteQuit(Option<PathBuf>),
    /// Unrecognised input, kept for the status message.
    Unknown(String),
}

// ---------------------------------------------------------------------------
// CommandLine
// ---------------------------------------------------------------------------

/// What a byte did to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// The byte was appended.
    Pushed,
    /// The last byte was erased.
    Erased,
    /// The byte was not accepted.
    Ignored,
    /// The prompt is full and should be submitted.
    Full,
}

/// The text typed after `:`, without the colon.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    input: String,
}

impl CommandLine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: String::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Append a printable byte.
    pub fn push(&mut self, byte: u8) -> Edit {
        if !(0x20..0x7f).contains(&byte) {
            return Edit::Ignored;
        }
        self.input.push(char::from(byte));
        if self.input.len() >= MAX_COMMAND_LEN {
            Edit::Full
        } else {
            Edit::Pushed
        }
    }

    /// Erase the last byte. [`Edit::Ignored`] on an empty prompt.
    pub fn backspace(&mut self) -> Edit {
        if self.input.pop().is_some() {
            Edit::Erased
        } else {
            Edit::Ignored
        }
    }

    #[must_use]
    pub fn parse(&self) -> Command {
        parse_command(&self.input)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a command (without the leading `:`).
#[must_use]
pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    let (cmd, arg) = trimmed
        .find(char::is_whitespace)
        .map_or((trimmed, ""), |pos| {
            (&trimmed[..pos], trimmed[pos..].trim_start())
        });
    let name = (!arg.is_empty()).then(|| PathBuf::from(arg));

    match (cmd, name) {
        ("w", None) => Command::Write,
        ("w", Some(path)) => Command::WriteAs(path),
        ("q", None) => Command::Quit,
        ("q!", None) => Command::ForceQuit,
        ("wq", name) => Command::WriteQuit(name),
        _ => Command::Unknown(trimmed.to_string()),
    }
}
