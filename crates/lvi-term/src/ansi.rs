// SPDX-License-Identifier: MIT
//
// ANSI control sequences used by the editor.
//
// Pure functions that encode one terminal command each into any
// `impl Write`. Nothing here decides when a sequence is needed; the
// renderer in lvi-editor owns that. This module only knows the bytes.
//
// Coordinates are 1-based, row first, exactly as the terminal expects
// them. The editor's cursor model is 1-based too, so no conversion
// happens between the two layers.
//
// Every function propagates the writer's `io::Result`. Writing into an
// `OutputBuffer` or a `Vec<u8>` cannot fail.

use std::io::{self, Write};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `row`, `col` (CUP). Both are 1-based.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: usize, col: usize) -> io::Result<()> {
    write!(w, "\x1b[{row};{col}H")
}

/// Move the cursor up `n` rows (CUU).
#[inline]
pub fn cursor_up(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}A")
}

/// Move the cursor down `n` rows (CUD).
#[inline]
pub fn cursor_down(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}B")
}

/// Move the cursor right `n` columns (CUF).
#[inline]
pub fn cursor_right(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}C")
}

/// Move the cursor left `n` columns (CUB).
#[inline]
pub fn cursor_left(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}D")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Erasing ─────────────────────────────────────────────────────────────────

/// Home the cursor and erase everything below it.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H\x1b[J")
}

/// Erase the whole line the cursor is on (EL 2). The cursor stays put.
#[inline]
pub fn erase_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2K")
}

/// Erase from the cursor to the end of its line (EL 0).
#[inline]
pub fn erase_to_eol(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

/// Reset all SGR attributes (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Line Wrap ───────────────────────────────────────────────────────────────

/// Disable auto-wrap (DECAWM reset).
///
/// With wrap off, writing into the last column leaves the cursor there
/// instead of spilling onto the next row. Line rendering relies on this
/// when a line exactly fills the viewport width.
#[inline]
pub fn disable_line_wrap(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?7l")
}

/// Re-enable auto-wrap (DECAWM set).
#[inline]
pub fn enable_line_wrap(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?7h")
}

// ─── Scrolling ───────────────────────────────────────────────────────────────

/// Restrict scrolling to rows `top..=bottom` (DECSTBM), 1-based.
///
/// Terminals home the cursor after this sequence, so callers always
/// reposition afterwards.
#[inline]
pub fn set_scroll_region(w: &mut impl Write, top: usize, bottom: usize) -> io::Result<()> {
    write!(w, "\x1b[{top};{bottom}r")
}

/// Make the whole screen the scroll region again.
#[inline]
pub fn reset_scroll_region(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[r")
}

/// Scroll the region contents up by `n` rows (SU). New rows appear at
/// the bottom.
#[inline]
pub fn scroll_up(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}S")
}

/// Scroll the region contents down by `n` rows (SD). New rows appear at
/// the top.
#[inline]
pub fn scroll_down(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}T")
}

// ─── Alternate Screen ───────────────────────────────────────────────────────

/// Switch to the alternate screen buffer (DEC mode 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Return to the main screen buffer.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn emit<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── Cursor ──────────────────────────────────────────────────────────

    #[test]
    fn cursor_to_is_one_based_row_first() {
        assert_eq!(emit(|w| cursor_to(w, 1, 1)), "\x1b[1;1H");
        assert_eq!(emit(|w| cursor_to(w, 24, 80)), "\x1b[24;80H");
    }

    #[test]
    fn relative_moves() {
        assert_eq!(emit(|w| cursor_up(w, 1)), "\x1b[1A");
        assert_eq!(emit(|w| cursor_down(w, 1)), "\x1b[1B");
        assert_eq!(emit(|w| cursor_right(w, 3)), "\x1b[3C");
        assert_eq!(emit(|w| cursor_left(w, 2)), "\x1b[2D");
    }

    #[test]
    fn cursor_visibility() {
        assert_eq!(emit(|w| cursor_hide(w)), "\x1b[?25l");
        assert_eq!(emit(|w| cursor_show(w)), "\x1b[?25h");
    }

    // ── Erasing ─────────────────────────────────────────────────────────

    #[test]
    fn clear_screen_homes_then_erases() {
        assert_eq!(emit(|w| clear_screen(w)), "\x1b[H\x1b[J");
    }

    #[test]
    fn erase_sequences() {
        assert_eq!(emit(|w| erase_line(w)), "\x1b[2K");
        assert_eq!(emit(|w| erase_to_eol(w)), "\x1b[K");
        assert_eq!(emit(|w| reset(w)), "\x1b[0m");
    }

    // ── Line wrap ───────────────────────────────────────────────────────

    #[test]
    fn line_wrap_toggle() {
        assert_eq!(emit(|w| disable_line_wrap(w)), "\x1b[?7l");
        assert_eq!(emit(|w| enable_line_wrap(w)), "\x1b[?7h");
    }

    // ── Scrolling ───────────────────────────────────────────────────────

    #[test]
    fn scroll_region() {
        assert_eq!(emit(|w| set_scroll_region(w, 1, 23)), "\x1b[1;23r");
        assert_eq!(emit(|w| reset_scroll_region(w)), "\x1b[r");
    }

    #[test]
    fn scroll_by_one() {
        assert_eq!(emit(|w| scroll_up(w, 1)), "\x1b[1S");
        assert_eq!(emit(|w| scroll_down(w, 1)), "\x1b[1T");
    }

    // ── Composition ─────────────────────────────────────────────────────

    #[test]
    fn sequences_compose_in_call_order() {
        let s = emit(|w| {
            cursor_to(w, 3, 1)?;
            w.write_all(b"abc")?;
            erase_to_eol(w)
        });
        assert_eq!(s, "\x1b[3;1Habc\x1b[K");
    }

    #[test]
    fn alt_screen_pair() {
        assert_eq!(emit(|w| enter_alt_screen(w)), "\x1b[?1049h");
        assert_eq!(emit(|w| exit_alt_screen(w)), "\x1b[?1049l");
    }
}
