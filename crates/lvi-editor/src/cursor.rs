//! Cursor position and the viewport it moves in.
//!
//! Everything here is 1-based. The cursor knows four things about where
//! it is:
//!
//! - `line`: absolute line number in the document
//! - `row`: the screen row that line is drawn on (`1..=viewport.rows`)
//! - `col`: the screen column (`1..=viewport.cols`)
//! - `shift`: how many leading bytes of the current line are scrolled
//!   off the left edge
//!
//! so the byte under the cursor is at offset `col + shift - 1`, and the
//! line drawn on row 1 is `line - row + 1`.
//!
//! The shift belongs to the current line only. Other rows are always
//! drawn from their first byte; when the cursor leaves a shifted line
//! that line has to be redrawn unshifted. Motions report what changed
//! as a [`Motion`] and leave the drawing to the caller.
//!
//! As with the mode layer, the cursor does not know about modes: callers
//! pass `past_end` to say whether the cursor may sit one byte past the
//! end of the line (insert) or must sit on a byte (command).

use crate::line_store::{LineId, LineStore};

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The text area: every terminal row but the last, which holds status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    rows: usize,
    cols: usize,
}

impl Viewport {
    /// A text area of `rows` by `cols`, each at least 1.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    /// The text area for a terminal of the given size.
    #[must_use]
    pub fn for_terminal(term_rows: usize, term_cols: usize) -> Self {
        Self::new(term_rows.saturating_sub(1), term_cols)
    }

    #[inline]
    #[must_use]
    pub const fn rows(self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub const fn cols(self) -> usize {
        self.cols
    }

    /// Row of the status line, just below the text area.
    #[inline]
    #[must_use]
    pub const fn status_row(self) -> usize {
        self.rows + 1
    }
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// Which way the text area has to scroll to keep the cursor visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Contents move up one row; a new line appears at the bottom.
    Up,
    /// Contents move down one row; a new line appears at the top.
    Down,
}

/// What a vertical motion changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    /// The line the cursor left.
    pub from: LineId,
    /// Where that line is drawn now, if still visible.
    pub from_row: Option<usize>,
    /// The line left behind was drawn shifted and needs a plain redraw.
    pub from_shifted: bool,
    /// The text area scrolled by one row.
    pub scroll: Option<Scroll>,
    /// The new line has a nonzero shift and needs a shifted redraw.
    pub to_shifted: bool,
}

/// Result of a cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// The cursor is at an edge; nothing changed.
    Blocked,
    /// Only the screen column changed.
    Moved,
    /// The shift of the current line changed; the screen column did not.
    Shifted,
    /// The cursor moved to another line.
    Line(LineChange),
}

/// Highest 1-based column the cursor may occupy on a line of `len` bytes.
#[inline]
#[must_use]
pub const fn max_column(len: usize, past_end: bool) -> usize {
    if past_end {
        len + 1
    } else if len == 0 {
        1
    } else {
        len
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// The cursor, together with the line it is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    line: usize,
    id: LineId,
    row: usize,
    col: usize,
    shift: usize,
}

impl Cursor {
    /// Top-left of the document, on line `first`.
    #[must_use]
    pub const fn new(first: LineId) -> Self {
        Self {
            line: 1,
            id: first,
            row: 1,
            col: 1,
            shift: 0,
        }
    }

    /// Absolute line number.
    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Handle of the current line.
    #[inline]
    #[must_use]
    pub const fn line_id(&self) -> LineId {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.col
    }

    #[inline]
    #[must_use]
    pub const fn shift(&self) -> usize {
        self.shift
    }

    /// 1-based column in the line's text (`col + shift`).
    #[inline]
    #[must_use]
    pub const fn column(&self) -> usize {
        self.col + self.shift
    }

    /// 0-based byte offset of the cursor in the current line.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.col + self.shift - 1
    }

    /// Line number drawn on row 1, or `None` if the cursor state is
    /// inconsistent (row below its own line number).
    #[inline]
    #[must_use]
    pub const fn top_line(&self) -> Option<usize> {
        if self.row == 0 || self.line < self.row {
            None
        } else {
            Some(self.line - self.row + 1)
        }
    }

    // -- Horizontal -------------------------------------------------------

    /// One column left. At column 1 a shifted line shifts back instead.
    pub const fn move_left(&mut self) -> Motion {
        if self.col > 1 {
            self.col -= 1;
            Motion::Moved
        } else if self.shift > 0 {
            self.shift -= 1;
            Motion::Shifted
        } else {
            Motion::Blocked
        }
    }

    /// One column right on a line of `len` bytes. At the right edge of
    /// the viewport the line shifts instead, but only if there is more
    /// of it to show.
    pub const fn move_right(&mut self, len: usize, view: Viewport, past_end: bool) -> Motion {
        if self.column() >= max_column(len, past_end) {
            Motion::Blocked
        } else if self.col < view.cols {
            self.col += 1;
            Motion::Moved
        } else {
            self.shift += 1;
            Motion::Shifted
        }
    }

    /// Pull the cursor back inside a line of `len` bytes after it shrank
    /// or the mode changed. Reports [`Motion::Shifted`] if the shift had
    /// to change, [`Motion::Moved`] otherwise.
    pub fn clamp(&mut self, len: usize, view: Viewport, past_end: bool) -> Motion {
        let before = self.shift;
        self.settle(len, view, past_end);
        if self.shift == before {
            Motion::Moved
        } else {
            Motion::Shifted
        }
    }

    // -- Vertical ---------------------------------------------------------

    /// One line down, scrolling at the bottom row.
    pub fn move_down(&mut self, store: &LineStore, view: Viewport, past_end: bool) -> Motion {
        let Some(next) = store.next(self.id) else {
            return Motion::Blocked;
        };
        let from = self.id;
        let from_shifted = self.shift > 0;
        let scroll = if self.row < view.rows {
            self.row += 1;
            None
        } else {
            Some(Scroll::Up)
        };
        let from_row = match scroll {
            None => Some(self.row - 1),
            Some(_) => self.row.checked_sub(1).filter(|&r| r >= 1),
        };
        self.line += 1;
        self.id = next;
        let len = store.line(next).map_or(0, |l| l.len());
        self.settle(len, view, past_end);

        Motion::Line(LineChange {
            from,
            from_row,
            from_shifted,
            scroll,
            to_shifted: self.shift > 0,
        })
    }

    /// One line up, scrolling at the top row.
    pub fn move_up(&mut self, store: &LineStore, view: Viewport, past_end: bool) -> Motion {
        let Some(prev) = store.prev(self.id) else {
            return Motion::Blocked;
        };
        let from = self.id;
        let from_shifted = self.shift > 0;
        let scroll = if self.row > 1 {
            self.row -= 1;
            None
        } else {
            Some(Scroll::Down)
        };
        let from_row = match scroll {
            None => Some(self.row + 1),
            Some(_) => Some(self.row + 1).filter(|&r| r <= view.rows),
        };
        self.line -= 1;
        self.id = prev;
        let len = store.line(prev).map_or(0, |l| l.len());
        self.settle(len, view, past_end);

        Motion::Line(LineChange {
            from,
            from_row,
            from_shifted,
            scroll,
            to_shifted: self.shift > 0,
        })
    }

    /// Step onto `next`, a line just inserted after the current one, at
    /// column 1. Returns the scroll needed if the cursor was on the
    /// bottom row.
    pub const fn enter_next_line(&mut self, next: LineId, view: Viewport) -> Option<Scroll> {
        self.line += 1;
        self.id = next;
        self.col = 1;
        self.shift = 0;
        if self.row < view.rows {
            self.row += 1;
            None
        } else {
            Some(Scroll::Up)
        }
    }

    /// Put the cursor at column 1 of `id`, which is line `line` drawn on
    /// `row`.
    pub const fn place(&mut self, line: usize, id: LineId, row: usize) {
        self.line = line;
        self.id = id;
        self.row = row;
        self.col = 1;
        self.shift = 0;
    }

    /// Adapt to a new viewport: keep the cursor row inside it and the
    /// cursor column visible. The text column does not change.
    pub const fn fit(&mut self, view: Viewport) {
        if self.row > view.rows {
            self.row = view.rows;
        }
        if self.col > view.cols {
            self.shift += self.col - view.cols;
            self.col = view.cols;
        }
    }

    /// Check every cursor invariant against the document and viewport.
    ///
    /// # Errors
    ///
    /// A short description of the first invariant that does not hold.
    pub fn check(&self, store: &LineStore, view: Viewport, past_end: bool) -> Result<(), &'static str> {
        if !(1..=view.rows).contains(&self.row) {
            return Err("cursor row outside the viewport");
        }
        if !(1..=view.cols).contains(&self.col) {
            return Err("cursor column outside the viewport");
        }
        if self.line < self.row {
            return Err("cursor row below the top of the document");
        }
        if store.walk(self.line) != Some(self.id) {
            return Err("cursor line handle out of sync with its line number");
        }
        let len = store.line(self.id).map_or(0, |l| l.len());
        if self.column() > max_column(len, past_end) {
            return Err("cursor past the end of its line");
        }
        Ok(())
    }

    /// Keep the text column if the line allows it, otherwise move to the
    /// last allowed column. The shift survives while the target column
    /// still lies beyond it; otherwise it drops to the least that keeps
    /// the cursor on screen.
    fn settle(&mut self, len: usize, view: Viewport, past_end: bool) {
        let target = self.column().min(max_column(len, past_end));
        if target > self.shift && target - self.shift <= view.cols {
            self.col = target - self.shift;
        } else if target <= view.cols {
            self.shift = 0;
            self.col = target;
        } else {
            self.shift = target - view.cols;
            self.col = view.cols;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn doc(lines: &[&str]) -> LineStore {
        LineStore::from_lines(lines.iter().map(|s| s.as_bytes())).unwrap()
    }

    fn at_start(store: &LineStore) -> Cursor {
        Cursor::new(store.head().unwrap())
    }

    // -- Viewport --

    #[test]
    fn viewport_reserves_status_row() {
        let v = Viewport::for_terminal(24, 80);
        assert_eq!((v.rows(), v.cols(), v.status_row()), (23, 80, 24));
    }

    #[test]
    fn viewport_dimensions_never_drop_below_one() {
        let v = Viewport::for_terminal(1, 0);
        assert_eq!((v.rows(), v.cols()), (1, 1));
        let v = Viewport::for_terminal(0, 0);
        assert_eq!((v.rows(), v.cols()), (1, 1));
    }

    #[test]
    fn max_column_by_mode() {
        assert_eq!(max_column(0, false), 1);
        assert_eq!(max_column(5, false), 5);
        assert_eq!(max_column(0, true), 1);
        assert_eq!(max_column(5, true), 6);
    }

    // -- Horizontal --

    #[test]
    fn right_then_left() {
        let s = doc(&["abc"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        assert_eq!(c.move_right(3, v, false), Motion::Moved);
        assert_eq!(c.col(), 2);
        assert_eq!(c.move_left(), Motion::Moved);
        assert_eq!(c.col(), 1);
        assert_eq!(c.move_left(), Motion::Blocked);
    }

    #[test]
    fn right_stops_on_last_byte_in_command_mode() {
        let s = doc(&["ab"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        c.move_right(2, v, false);
        assert_eq!(c.move_right(2, v, false), Motion::Blocked);
        assert_eq!(c.column(), 2);
    }

    #[test]
    fn right_may_pass_last_byte_when_inserting() {
        let s = doc(&["ab"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        c.move_right(2, v, true);
        assert_eq!(c.move_right(2, v, true), Motion::Moved);
        assert_eq!(c.column(), 3);
        assert_eq!(c.move_right(2, v, true), Motion::Blocked);
    }

    #[test]
    fn right_edge_shifts_only_when_line_continues() {
        let s = doc(&["abcdef"]);
        let v = Viewport::new(5, 3);
        let mut c = at_start(&s);
        c.move_right(6, v, false);
        c.move_right(6, v, false);
        assert_eq!(c.col(), 3);
        assert_eq!(c.move_right(6, v, false), Motion::Shifted);
        assert_eq!((c.col(), c.shift()), (3, 1));
        c.move_right(6, v, false);
        c.move_right(6, v, false);
        assert_eq!(c.move_right(6, v, false), Motion::Blocked);
        assert_eq!((c.col(), c.shift(), c.offset()), (3, 3, 5));
    }

    #[test]
    fn left_at_column_one_unshifts() {
        let s = doc(&["abcdef"]);
        let v = Viewport::new(5, 3);
        let mut c = at_start(&s);
        for _ in 0..4 {
            c.move_right(6, v, false);
        }
        assert_eq!(c.shift(), 2);
        c.move_left();
        c.move_left();
        assert_eq!((c.col(), c.shift()), (1, 2));
        assert_eq!(c.move_left(), Motion::Shifted);
        assert_eq!((c.col(), c.shift()), (1, 1));
    }

    #[test]
    fn clamp_after_line_shrinks() {
        let s = doc(&["abcdef"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        for _ in 0..5 {
            c.move_right(6, v, false);
        }
        assert_eq!(c.clamp(3, v, false), Motion::Moved);
        assert_eq!(c.column(), 3);
    }

    #[test]
    fn clamp_reduces_shift_when_needed() {
        let s = doc(&["abcdef"]);
        let v = Viewport::new(5, 3);
        let mut c = at_start(&s);
        for _ in 0..5 {
            c.move_right(6, v, true);
        }
        assert_eq!((c.col(), c.shift()), (3, 3));
        assert_eq!(c.clamp(2, v, false), Motion::Shifted);
        assert_eq!((c.col(), c.shift()), (2, 0));
    }

    // -- Vertical --

    #[test]
    fn down_and_up_within_viewport() {
        let s = doc(&["a", "b", "c"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        let Motion::Line(change) = c.move_down(&s, v, false) else {
            panic!("expected a line change");
        };
        assert_eq!(change.scroll, None);
        assert_eq!(change.from_row, Some(1));
        assert_eq!((c.line(), c.row()), (2, 2));
        c.move_up(&s, v, false);
        assert_eq!((c.line(), c.row()), (1, 1));
        assert_eq!(c.move_up(&s, v, false), Motion::Blocked);
    }

    #[test]
    fn down_past_last_line_is_blocked() {
        let s = doc(&["only"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        assert_eq!(c.move_down(&s, v, false), Motion::Blocked);
        assert_eq!(c.line(), 1);
    }

    #[test]
    fn down_on_bottom_row_scrolls() {
        let s = doc(&["a", "b", "c"]);
        let v = Viewport::new(2, 10);
        let mut c = at_start(&s);
        c.move_down(&s, v, false);
        let Motion::Line(change) = c.move_down(&s, v, false) else {
            panic!("expected a line change");
        };
        assert_eq!(change.scroll, Some(Scroll::Up));
        assert_eq!(change.from_row, Some(1));
        assert_eq!((c.line(), c.row(), c.top_line()), (3, 2, Some(2)));
    }

    #[test]
    fn up_on_top_row_scrolls() {
        let s = doc(&["a", "b", "c"]);
        let v = Viewport::new(2, 10);
        let mut c = at_start(&s);
        c.move_down(&s, v, false);
        c.move_down(&s, v, false);
        c.move_up(&s, v, false);
        let Motion::Line(change) = c.move_up(&s, v, false) else {
            panic!("expected a line change");
        };
        assert_eq!(change.scroll, Some(Scroll::Down));
        assert_eq!(change.from_row, Some(2));
        assert_eq!((c.line(), c.row(), c.top_line()), (1, 1, Some(1)));
    }

    #[test]
    fn single_row_viewport_scroll_leaves_old_line_offscreen() {
        let s = doc(&["a", "b"]);
        let v = Viewport::new(1, 10);
        let mut c = at_start(&s);
        let Motion::Line(change) = c.move_down(&s, v, false) else {
            panic!("expected a line change");
        };
        assert_eq!(change.from_row, None);
    }

    #[test]
    fn vertical_move_clamps_column_to_shorter_line() {
        let s = doc(&["abcdef", "xy"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        for _ in 0..4 {
            c.move_right(6, v, false);
        }
        c.move_down(&s, v, false);
        assert_eq!(c.column(), 2);
    }

    #[test]
    fn vertical_move_keeps_shift_when_possible() {
        let s = doc(&["abcdefgh", "ABCDEFGH"]);
        let v = Viewport::new(5, 4);
        let mut c = at_start(&s);
        for _ in 0..5 {
            c.move_right(8, v, false);
        }
        assert_eq!((c.col(), c.shift()), (4, 2));
        let Motion::Line(change) = c.move_down(&s, v, false) else {
            panic!("expected a line change");
        };
        assert!(change.from_shifted);
        assert!(change.to_shifted);
        assert_eq!((c.col(), c.shift()), (4, 2));
    }

    #[test]
    fn vertical_move_reduces_shift_on_short_line() {
        let s = doc(&["abcdefgh", "ab"]);
        let v = Viewport::new(5, 4);
        let mut c = at_start(&s);
        for _ in 0..6 {
            c.move_right(8, v, false);
        }
        let Motion::Line(change) = c.move_down(&s, v, false) else {
            panic!("expected a line change");
        };
        assert!(!change.to_shifted);
        assert_eq!((c.col(), c.shift()), (2, 0));
    }

    // -- Line entry, placement, resize --

    #[test]
    fn enter_next_line_resets_column() {
        let mut s = doc(&["abc"]);
        let v = Viewport::new(2, 10);
        let mut c = at_start(&s);
        c.move_right(3, v, true);
        let next = s.split(c.line_id(), c.offset()).unwrap();
        assert_eq!(c.enter_next_line(next, v), None);
        assert_eq!((c.line(), c.row(), c.col(), c.shift()), (2, 2, 1, 0));
        let third = s.insert_after_id(next, b"").unwrap();
        assert_eq!(c.enter_next_line(third, v), Some(Scroll::Up));
        assert_eq!(c.row(), 2);
    }

    #[test]
    fn fit_keeps_text_column() {
        let s = doc(&["abcdefghij", "b", "c", "d"]);
        let mut v = Viewport::new(4, 10);
        let mut c = at_start(&s);
        for _ in 0..3 {
            c.move_down(&s, v, false);
        }
        c.move_up(&s, v, false);
        c.move_up(&s, v, false);
        c.move_up(&s, v, false);
        for _ in 0..7 {
            c.move_right(10, v, false);
        }
        v = Viewport::new(2, 5);
        c.fit(v);
        assert_eq!((c.col(), c.shift(), c.column()), (5, 3, 8));
        assert!(c.check(&s, v, false).is_ok());
    }

    #[test]
    fn check_flags_stale_line_number() {
        let s = doc(&["a", "b"]);
        let v = Viewport::new(5, 10);
        let mut c = at_start(&s);
        c.place(2, s.head().unwrap(), 1);
        assert!(c.check(&s, v, false).is_err());
    }

    #[test]
    fn top_line_detects_inconsistent_row() {
        let s = doc(&["a"]);
        let mut c = at_start(&s);
        c.place(1, s.head().unwrap(), 2);
        assert_eq!(c.top_line(), None);
    }

    // -- Properties --

    proptest! {
        #[test]
        fn random_motions_keep_invariants(
            lens in proptest::collection::vec(0usize..30, 1..12),
            rows in 1usize..6,
            cols in 1usize..12,
            moves in proptest::collection::vec(0u8..4, 0..80),
        ) {
            let lines: Vec<Vec<u8>> = lens.iter().map(|&n| vec![b'x'; n]).collect();
            let s = LineStore::from_lines(&lines).unwrap();
            let v = Viewport::new(rows, cols);
            let mut c = Cursor::new(s.head().unwrap());
            for m in moves {
                let len = s.line(c.line_id()).unwrap().len();
                match m {
                    0 => { c.move_left(); }
                    1 => { c.move_right(len, v, false); }
                    2 => { c.move_down(&s, v, false); }
                    _ => { c.move_up(&s, v, false); }
                }
                prop_assert_eq!(c.check(&s, v, false), Ok(()));
            }
        }
    }
}
