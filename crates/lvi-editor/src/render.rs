//! Drawing primitives.
//!
//! Nothing here keeps a picture of the screen. Each function writes the
//! control sequences and text for one part of it (a line, a run of rows,
//! the status row) straight into the output sink. Callers decide which
//! parts changed and finish by putting the cursor back with
//! [`restore_cursor`].
//!
//! A document byte always occupies exactly one cell: bytes outside the
//! printable ASCII range are drawn as `?`.

use std::io::{self, Write};
use std::ops::RangeInclusive;

use lvi_term::ansi;

use crate::cursor::{Cursor, Scroll, Viewport};
use crate::error::EditorError;
use crate::line_store::{LineId, LineStore};

/// Column where the position (`line,col`) starts, counted from the right.
const POSITION_FROM_RIGHT: usize = 20;
/// Column where the scroll indicator starts, counted from the right.
const INDICATOR_FROM_RIGHT: usize = 5;

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// Draw `text` on `row`, skipping its first `shift` bytes and clipping
/// to `cols`, then erase whatever was left on the row.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn draw_line(
    out: &mut impl Write,
    text: &[u8],
    row: usize,
    shift: usize,
    cols: usize,
) -> io::Result<()> {
    ansi::cursor_to(out, row, 1)?;
    let visible = text.get(shift..).unwrap_or_default();
    let visible = &visible[..visible.len().min(cols)];
    let cells: Vec<u8> = visible
        .iter()
        .map(|&b| if (0x20..0x7f).contains(&b) { b } else { b'?' })
        .collect();
    out.write_all(&cells)?;
    ansi::erase_to_eol(out)
}

/// Draw the end-of-document marker on `row`.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn draw_placeholder(out: &mut impl Write, row: usize, placeholder: u8) -> io::Result<()> {
    ansi::cursor_to(out, row, 1)?;
    out.write_all(&[placeholder])?;
    ansi::erase_to_eol(out)
}

/// The line shown on `row`, found by stepping from the cursor's line.
fn line_on_row(doc: &LineStore, cursor: &Cursor, row: usize) -> Option<LineId> {
    let delta = isize::try_from(row).ok()? - isize::try_from(cursor.row()).ok()?;
    doc.step(cursor.line_id(), delta)
}

/// Redraw screen rows `rows` of the text area. Rows past the end of the
/// document get the placeholder. The cursor's line is drawn with the
/// cursor's shift, every other line from its first byte.
///
/// # Errors
///
/// [`EditorError::Invariant`] if a row above the cursor has no line
/// (the cursor sits lower than its line number allows), or a write error.
pub fn draw_range(
    out: &mut impl Write,
    doc: &LineStore,
    cursor: &Cursor,
    view: Viewport,
    rows: RangeInclusive<usize>,
    placeholder: u8,
) -> Result<(), EditorError> {
    let first = (*rows.start()).max(1);
    let last = (*rows.end()).min(view.rows());
    for row in first..=last {
        match line_on_row(doc, cursor, row).and_then(|id| Some((id, doc.line(id)?))) {
            Some((id, line)) => {
                let shift = if id == cursor.line_id() { cursor.shift() } else { 0 };
                draw_line(out, line.as_bytes(), row, shift, view.cols())?;
            }
            None if row < cursor.row() => {
                return Err(EditorError::Invariant("no line above the cursor for a visible row"));
            }
            None => draw_placeholder(out, row, placeholder)?,
        }
    }
    Ok(())
}

/// Move the text area one row in `dir`, leaving the status row alone.
/// The row that scrolls in is blank; the caller draws it.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn scroll_text(out: &mut impl Write, dir: Scroll, view: Viewport) -> io::Result<()> {
    ansi::set_scroll_region(out, 1, view.rows())?;
    match dir {
        Scroll::Up => {
            ansi::cursor_to(out, view.rows(), 1)?;
            ansi::scroll_up(out, 1)?;
        }
        Scroll::Down => {
            ansi::cursor_to(out, 1, 1)?;
            ansi::scroll_down(out, 1)?;
        }
    }
    ansi::reset_scroll_region(out)
}

/// Put the terminal cursor where the editing cursor is.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn restore_cursor(out: &mut impl Write, cursor: &Cursor) -> io::Result<()> {
    ansi::cursor_to(out, cursor.row(), cursor.col())
}

// ---------------------------------------------------------------------------
// Status row
// ---------------------------------------------------------------------------

/// Where the text area sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Top,
    Bot,
    Percent(usize),
}

impl Indicator {
    /// Indicator for a document of `count` lines, shown from line `top`
    /// in a viewport of `rows` rows with the cursor on line `line`.
    #[must_use]
    pub const fn new(top: usize, line: usize, rows: usize, count: usize) -> Self {
        if top <= 1 {
            Self::Top
        } else if line + rows >= count {
            Self::Bot
        } else {
            Self::Percent(100 * count / top)
        }
    }
}

/// Everything the status row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine<'a> {
    /// Transient message, or the mode label.
    pub label: &'a str,
    pub line: usize,
    /// 1-based text column (`col + shift`).
    pub column: usize,
    pub indicator: Indicator,
}

/// Draw the status row below the text area.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn draw_status(out: &mut impl Write, view: Viewport, status: &StatusLine<'_>) -> io::Result<()> {
    let row = view.status_row();
    let cols = view.cols();
    ansi::cursor_to(out, row, 1)?;
    ansi::erase_line(out)?;
    let label = status.label.as_bytes();
    out.write_all(&label[..label.len().min(cols)])?;

    ansi::cursor_to(out, row, cols.saturating_sub(POSITION_FROM_RIGHT).max(1))?;
    write!(out, "{},{}", status.line, status.column)?;

    ansi::cursor_to(out, row, cols.saturating_sub(INDICATOR_FROM_RIGHT).max(1))?;
    match status.indicator {
        Indicator::Top => out.write_all(b" Top"),
        Indicator::Bot => out.write_all(b" Bot"),
        Indicator::Percent(p) => write!(out, "{p}%"),
    }
}

/// Replace the status row with the `:` prompt and the text typed so far.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn draw_prompt(out: &mut impl Write, view: Viewport, input: &str) -> io::Result<()> {
    ansi::cursor_to(out, view.status_row(), 1)?;
    ansi::erase_line(out)?;
    out.write_all(b":")?;
    out.write_all(input.as_bytes())
}

/// Remove the last character of the prompt on screen.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn erase_prompt_char(out: &mut impl Write) -> io::Result<()> {
    ansi::cursor_left(out, 1)?;
    ansi::erase_to_eol(out)
}
