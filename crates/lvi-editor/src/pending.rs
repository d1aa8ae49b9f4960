//! Command-mode input parsing: an optional count, then a verb.
//!
//! Bytes are fed in one at a time. Digits accumulate a repeat count, a
//! verb byte completes the command, and `d` waits for a second byte
//! (`dd` deletes lines). The buffer empties after every completed
//! command, on Escape, and when the count grows too long.

/// Escape.
pub const ESC: u8 = 0x1b;

/// Most digits a count may have.
pub const MAX_COUNT_DIGITS: usize = 16;

/// A command-mode action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `h`
    Left,
    /// `j`
    Down,
    /// `k`
    Up,
    /// `l`
    Right,
    /// `i`
    Insert,
    /// `a`
    Append,
    /// `o`
    OpenBelow,
    /// `x`
    DeleteChar,
    /// `X`
    DeleteBefore,
    /// `dd`
    DeleteLine,
    /// `R`
    Replace,
    /// `:`
    LineCommand,
    /// Any other byte, or `d` followed by something other than `d`.
    Unknown(u8),
}

impl Verb {
    const fn from_byte(byte: u8) -> Self {
        match byte {
            b'h' => Self::Left,
            b'j' => Self::Down,
            b'k' => Self::Up,
            b'l' => Self::Right,
            b'i' => Self::Insert,
            b'a' => Self::Append,
            b'o' => Self::OpenBelow,
            b'x' => Self::DeleteChar,
            b'X' => Self::DeleteBefore,
            b'R' => Self::Replace,
            b':' => Self::LineCommand,
            other => Self::Unknown(other),
        }
    }
}

/// What the latest byte produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    /// More bytes needed.
    Incomplete,
    /// Run `verb` `count` times (`count >= 1`).
    Ready { verb: Verb, count: usize },
    /// Escape threw the pending input away.
    Aborted,
    /// The count had too many digits and was thrown away.
    CountTooLong,
}

/// The partially typed command.
#[derive(Debug, Clone, Default)]
pub struct Pending {
    digits: usize,
    count: usize,
    awaiting_second_d: bool,
}

impl Pending {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            digits: 0,
            count: 0,
            awaiting_second_d: false,
        }
    }

    /// True if nothing has been typed since the last command.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.digits == 0 && !self.awaiting_second_d
    }

    /// Feed one byte.
    pub fn feed(&mut self, byte: u8) -> Parsed {
        if byte == ESC {
            self.clear();
            return Parsed::Aborted;
        }

        if self.awaiting_second_d {
            let verb = if byte == b'd' {
                Verb::DeleteLine
            } else {
                Verb::Unknown(byte)
            };
            return self.ready(verb);
        }

        if byte.is_ascii_digit() {
            if self.digits == MAX_COUNT_DIGITS {
                self.clear();
                return Parsed::CountTooLong;
            }
            self.digits += 1;
            self.count = self
                .count
                .saturating_mul(10)
                .saturating_add(usize::from(byte - b'0'));
            return Parsed::Incomplete;
        }

        if byte == b'd' {
            self.awaiting_second_d = true;
            return Parsed::Incomplete;
        }

        self.ready(Verb::from_byte(byte))
    }

    fn ready(&mut self, verb: Verb) -> Parsed {
        let count = self.count.max(1);
        self.clear();
        Parsed::Ready { verb, count }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}
