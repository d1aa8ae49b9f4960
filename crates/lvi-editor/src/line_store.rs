//! Ordered storage of text lines.
//!
//! A document is a doubly linked chain of [`Line`]s kept in a slot arena.
//! [`LineId`]s are generation-checked keys into that arena: a handle to a
//! deleted line never silently resolves to whatever reused its slot, it
//! resolves to nothing. Positions in the public API are 1-based line
//! numbers, matching what the user sees on the status row.
//!
//! Each line owns a byte buffer whose capacity grows in whole chunks of
//! [`CHUNK`] bytes and doubles when an insertion finds it full. All
//! growth goes through `try_reserve_exact`, so running out of memory is
//! reported as [`StoreError::OutOfMemory`] instead of aborting.
//!
//! The document store is never empty: deleting its only line clears the
//! text instead ([`Outcome::NothingToDelete`]). A secondary store used as
//! a yank buffer starts empty and may be emptied again with
//! [`LineStore::destroy`].

use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

/// Allocation granularity of a line buffer, in bytes.
pub const CHUNK: usize = 32;

new_key_type! {
    /// Stable handle to a line inside one [`LineStore`].
    pub struct LineId;
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Failures of line-store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("position {position} is out of range (length {len})")]
    OutOfRange { position: usize, len: usize },
    #[error("out of memory")]
    OutOfMemory,
    #[error("line handle no longer refers to a line")]
    StaleHandle,
}

/// Result of a deletion that may legitimately have nothing to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    NothingToDelete,
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One line of text, without its terminating newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: Vec<u8>,
}

impl Line {
    /// An empty line holding one chunk.
    ///
    /// # Errors
    ///
    /// [`StoreError::OutOfMemory`] if the chunk cannot be allocated.
    pub fn new() -> Result<Self, StoreError> {
        Self::from_bytes(&[])
    }

    /// A line holding a copy of `text`, capacity rounded up to the chunk
    /// boundary that contains it.
    ///
    /// # Errors
    ///
    /// [`StoreError::OutOfMemory`] if the buffer cannot be allocated.
    pub fn from_bytes(text: &[u8]) -> Result<Self, StoreError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(chunked(text.len()))
            .map_err(|_| StoreError::OutOfMemory)?;
        buf.extend_from_slice(text);
        Ok(Self { text: buf })
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }

    /// Insert `byte` before `offset` (0-based); `offset == len` appends.
    ///
    /// A full buffer doubles its capacity first.
    ///
    /// # Errors
    ///
    /// [`StoreError::OutOfRange`] if `offset > len`,
    /// [`StoreError::OutOfMemory`] if growing fails.
    pub fn insert_char(&mut self, offset: usize, byte: u8) -> Result<(), StoreError> {
        if offset > self.text.len() {
            return Err(StoreError::OutOfRange {
                position: offset,
                len: self.text.len(),
            });
        }
        if self.text.len() == self.text.capacity() {
            let grow = self.text.capacity().max(CHUNK);
            self.text
                .try_reserve_exact(grow)
                .map_err(|_| StoreError::OutOfMemory)?;
        }
        self.text.insert(offset, byte);
        Ok(())
    }

    /// Remove the byte at `offset` (0-based), shifting the tail left.
    /// Offsets at or past the end delete nothing.
    pub fn delete_char(&mut self, offset: usize) -> Outcome {
        if offset >= self.text.len() {
            return Outcome::NothingToDelete;
        }
        self.text.remove(offset);
        Outcome::Done
    }

    fn clear(&mut self) {
        self.text.clear();
    }
}

/// Smallest multiple of [`CHUNK`] that holds `len` bytes, at least one chunk.
const fn chunked(len: usize) -> usize {
    let chunks = len.div_ceil(CHUNK);
    if chunks == 0 { CHUNK } else { chunks * CHUNK }
}

// ---------------------------------------------------------------------------
// LineStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Node {
    line: Line,
    prev: Option<LineId>,
    next: Option<LineId>,
}

/// A doubly linked chain of lines in a slot arena.
#[derive(Debug, Default)]
pub struct LineStore {
    nodes: SlotMap<LineId, Node>,
    head: Option<LineId>,
    tail: Option<LineId>,
}

impl LineStore {
    /// An empty store, as used for the yank buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with a single empty line.
    ///
    /// # Errors
    ///
    /// [`StoreError::OutOfMemory`] if the line cannot be allocated.
    pub fn with_blank_line() -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.push_back(Line::new()?);
        Ok(store)
    }

    /// A document holding `lines` in order, or one empty line if there
    /// are none.
    ///
    /// # Errors
    ///
    /// [`StoreError::OutOfMemory`] if a line cannot be allocated.
    pub fn from_lines<I, T>(lines: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut store = Self::new();
        for text in lines {
            store.push_back(Line::from_bytes(text.as_ref())?);
        }
        if store.is_empty() {
            store.push_back(Line::new()?);
        }
        Ok(store)
    }

    /// Number of lines.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn head(&self) -> Option<LineId> {
        self.head
    }

    #[inline]
    #[must_use]
    pub const fn tail(&self) -> Option<LineId> {
        self.tail
    }

    #[inline]
    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.nodes.get(id).map(|n| &n.line)
    }

    #[inline]
    pub fn line_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.nodes.get_mut(id).map(|n| &mut n.line)
    }

    #[inline]
    #[must_use]
    pub fn next(&self, id: LineId) -> Option<LineId> {
        self.nodes.get(id).and_then(|n| n.next)
    }

    #[inline]
    #[must_use]
    pub fn prev(&self, id: LineId) -> Option<LineId> {
        self.nodes.get(id).and_then(|n| n.prev)
    }

    /// The line at 1-based `position`, walking from the head. `None` for
    /// 0 or past the end.
    #[must_use]
    pub fn walk(&self, position: usize) -> Option<LineId> {
        if position == 0 {
            return None;
        }
        let mut id = self.head?;
        for _ in 1..position {
            id = self.next(id)?;
        }
        Some(id)
    }

    /// The line `delta` links away from `id` (negative walks backwards).
    #[must_use]
    pub fn step(&self, id: LineId, delta: isize) -> Option<LineId> {
        let mut at = self.nodes.contains_key(id).then_some(id)?;
        for _ in 0..delta.unsigned_abs() {
            at = if delta < 0 { self.prev(at)? } else { self.next(at)? };
        }
        Some(at)
    }

    /// Lines from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Line> + '_ {
        std::iter::successors(self.head, |&id| self.next(id)).filter_map(|id| self.line(id))
    }

    /// Insert a new line after 1-based `position`; 0 makes it the head.
    /// `text` of `None` inserts an empty line.
    ///
    /// # Errors
    ///
    /// [`StoreError::OutOfRange`] if `position > count`,
    /// [`StoreError::OutOfMemory`] if the line cannot be allocated.
    pub fn insert_after(
        &mut self,
        position: usize,
        text: Option<&[u8]>,
    ) -> Result<LineId, StoreError> {
        if position > self.count() {
            return Err(StoreError::OutOfRange {
                position,
                len: self.count(),
            });
        }
        let line = Line::from_bytes(text.unwrap_or_default())?;
        let anchor = if position == 0 {
            None
        } else {
            self.walk(position)
        };
        Ok(self.link_after(anchor, line))
    }

    /// Insert `text` as a new line directly after `id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::StaleHandle`] if `id` is gone,
    /// [`StoreError::OutOfMemory`] if the line cannot be allocated.
    pub fn insert_after_id(&mut self, id: LineId, text: &[u8]) -> Result<LineId, StoreError> {
        if !self.nodes.contains_key(id) {
            return Err(StoreError::StaleHandle);
        }
        let line = Line::from_bytes(text)?;
        Ok(self.link_after(Some(id), line))
    }

    /// Remove line `id`. The last remaining line is cleared instead and
    /// the result is [`Outcome::NothingToDelete`].
    ///
    /// # Errors
    ///
    /// [`StoreError::StaleHandle`] if `id` is gone.
    pub fn delete(&mut self, id: LineId) -> Result<Outcome, StoreError> {
        if self.count() == 1 {
            let node = self.nodes.get_mut(id).ok_or(StoreError::StaleHandle)?;
            node.line.clear();
            return Ok(Outcome::NothingToDelete);
        }
        let node = self.nodes.remove(id).ok_or(StoreError::StaleHandle)?;
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Ok(Outcome::Done)
    }

    /// Cut line `id` at byte `offset`. The bytes from `offset` on move to
    /// a new line inserted right after it, which is returned.
    ///
    /// # Errors
    ///
    /// [`StoreError::StaleHandle`] if `id` is gone,
    /// [`StoreError::OutOfRange`] if `offset` is past the end,
    /// [`StoreError::OutOfMemory`] if the new line cannot be allocated.
    pub fn split(&mut self, id: LineId, offset: usize) -> Result<LineId, StoreError> {
        let line = self.line(id).ok_or(StoreError::StaleHandle)?;
        if offset > line.len() {
            return Err(StoreError::OutOfRange {
                position: offset,
                len: line.len(),
            });
        }
        let tail = Line::from_bytes(&line.as_bytes()[offset..])?;
        self.nodes[id].line.text.truncate(offset);
        Ok(self.link_after(Some(id), tail))
    }

    /// Drop every line. The store is empty afterwards.
    pub fn destroy(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Append `line` at the tail.
    fn push_back(&mut self, line: Line) -> LineId {
        self.link_after(self.tail, line)
    }

    /// Link `line` after `anchor`, or at the head when `anchor` is `None`.
    fn link_after(&mut self, anchor: Option<LineId>, line: Line) -> LineId {
        let next = match anchor {
            Some(a) => self.nodes[a].next,
            None => self.head,
        };
        let id = self.nodes.insert(Node {
            line,
            prev: anchor,
            next,
        });
        match anchor {
            Some(a) => self.nodes[a].next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(n) => self.nodes[n].prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn texts(store: &LineStore) -> Vec<String> {
        store
            .iter()
            .map(|l| String::from_utf8_lossy(l.as_bytes()).into_owned())
            .collect()
    }

    fn store(lines: &[&str]) -> LineStore {
        LineStore::from_lines(lines.iter().map(|s| s.as_bytes())).unwrap()
    }

    /// Forward and backward links agree with each other and with `count`.
    fn assert_chain_consistent(store: &LineStore) {
        let forward: Vec<LineId> = std::iter::successors(store.head(), |&id| store.next(id)).collect();
        let mut backward: Vec<LineId> =
            std::iter::successors(store.tail(), |&id| store.prev(id)).collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), store.count());
    }

    // -- Line --

    #[test]
    fn new_line_has_one_chunk() {
        let line = Line::new().unwrap();
        assert!(line.is_empty());
        assert!(line.capacity() >= CHUNK);
    }

    #[test]
    fn capacity_rounds_to_containing_chunk() {
        assert_eq!(chunked(0), CHUNK);
        assert_eq!(chunked(1), CHUNK);
        assert_eq!(chunked(CHUNK), CHUNK);
        assert_eq!(chunked(CHUNK + 1), 2 * CHUNK);
    }

    #[test]
    fn insert_char_into_full_line_grows() {
        let text = vec![b'a'; CHUNK];
        let mut line = Line::from_bytes(&text).unwrap();
        let before = line.capacity();
        line.insert_char(CHUNK, b'b').unwrap();
        assert_eq!(line.len(), CHUNK + 1);
        assert!(line.capacity() >= before * 2);
    }

    #[test]
    fn insert_char_middle_and_end() {
        let mut line = Line::from_bytes(b"ac").unwrap();
        line.insert_char(1, b'b').unwrap();
        line.insert_char(3, b'd').unwrap();
        assert_eq!(line.as_bytes(), b"abcd");
    }

    #[test]
    fn insert_char_past_end_is_out_of_range() {
        let mut line = Line::from_bytes(b"ab").unwrap();
        assert_eq!(
            line.insert_char(3, b'x'),
            Err(StoreError::OutOfRange { position: 3, len: 2 })
        );
    }

    #[test]
    fn delete_char_shifts_tail() {
        let mut line = Line::from_bytes(b"abc").unwrap();
        assert_eq!(line.delete_char(0), Outcome::Done);
        assert_eq!(line.as_bytes(), b"bc");
    }

    #[test]
    fn delete_char_on_empty_line_does_nothing() {
        let mut line = Line::new().unwrap();
        assert_eq!(line.delete_char(0), Outcome::NothingToDelete);
        assert!(line.is_empty());
    }

    // -- Construction --

    #[test]
    fn blank_document_has_one_line() {
        let s = LineStore::with_blank_line().unwrap();
        assert_eq!(s.count(), 1);
        assert_eq!(texts(&s), [""]);
    }

    #[test]
    fn from_no_lines_gives_one_blank_line() {
        let s = LineStore::from_lines(Vec::<Vec<u8>>::new()).unwrap();
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn yank_store_starts_empty() {
        let s = LineStore::new();
        assert!(s.is_empty());
        assert_eq!(s.head(), None);
        assert_eq!(s.iter().count(), 0);
    }

    // -- insert_after --

    #[test]
    fn insert_after_position_zero_becomes_head() {
        let mut s = store(&["b"]);
        let id = s.insert_after(0, Some(b"a")).unwrap();
        assert_eq!(s.head(), Some(id));
        assert_eq!(texts(&s), ["a", "b"]);
        assert_chain_consistent(&s);
    }

    #[test]
    fn insert_after_middle_and_tail() {
        let mut s = store(&["a", "c"]);
        s.insert_after(1, Some(b"b")).unwrap();
        let d = s.insert_after(3, None).unwrap();
        assert_eq!(texts(&s), ["a", "b", "c", ""]);
        assert_eq!(s.tail(), Some(d));
        assert_chain_consistent(&s);
    }

    #[test]
    fn insert_after_past_count_is_out_of_range() {
        let mut s = store(&["a"]);
        assert_eq!(
            s.insert_after(2, None),
            Err(StoreError::OutOfRange { position: 2, len: 1 })
        );
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn insert_after_id_links_in_place() {
        let mut s = store(&["a", "c"]);
        let a = s.walk(1).unwrap();
        s.insert_after_id(a, b"b").unwrap();
        assert_eq!(texts(&s), ["a", "b", "c"]);
    }

    // -- walk / step --

    #[test]
    fn walk_is_one_based() {
        let s = store(&["a", "b", "c"]);
        assert_eq!(s.walk(0), None);
        assert_eq!(s.line(s.walk(1).unwrap()).unwrap().as_bytes(), b"a");
        assert_eq!(s.line(s.walk(3).unwrap()).unwrap().as_bytes(), b"c");
        assert_eq!(s.walk(4), None);
    }

    #[test]
    fn step_both_directions() {
        let s = store(&["a", "b", "c"]);
        let b = s.walk(2).unwrap();
        assert_eq!(s.step(b, 1), s.walk(3));
        assert_eq!(s.step(b, -1), s.walk(1));
        assert_eq!(s.step(b, 0), Some(b));
        assert_eq!(s.step(b, 2), None);
        assert_eq!(s.step(b, -2), None);
    }

    // -- delete --

    #[test]
    fn delete_relinks_neighbours() {
        let mut s = store(&["a", "b", "c"]);
        let b = s.walk(2).unwrap();
        assert_eq!(s.delete(b), Ok(Outcome::Done));
        assert_eq!(texts(&s), ["a", "c"]);
        assert_chain_consistent(&s);
    }

    #[test]
    fn delete_head_and_tail() {
        let mut s = store(&["a", "b", "c"]);
        s.delete(s.head().unwrap()).unwrap();
        s.delete(s.tail().unwrap()).unwrap();
        assert_eq!(texts(&s), ["b"]);
        assert_eq!(s.head(), s.tail());
        assert_chain_consistent(&s);
    }

    #[test]
    fn delete_only_line_clears_it() {
        let mut s = store(&["abc"]);
        let id = s.head().unwrap();
        assert_eq!(s.delete(id), Ok(Outcome::NothingToDelete));
        assert_eq!(s.count(), 1);
        assert_eq!(texts(&s), [""]);
        assert_eq!(s.head(), Some(id));
    }

    #[test]
    fn deleted_handle_goes_stale_even_after_slot_reuse() {
        let mut s = store(&["a", "b"]);
        let b = s.walk(2).unwrap();
        s.delete(b).unwrap();
        s.insert_after(1, Some(b"new")).unwrap();
        assert_eq!(s.line(b), None);
        assert_eq!(s.delete(b), Err(StoreError::StaleHandle));
    }

    // -- split --

    #[test]
    fn split_moves_tail_to_next_line() {
        let mut s = store(&["hello world", "z"]);
        let first = s.head().unwrap();
        let second = s.split(first, 5).unwrap();
        assert_eq!(texts(&s), ["hello", " world", "z"]);
        assert_eq!(s.next(first), Some(second));
        assert_chain_consistent(&s);
    }

    #[test]
    fn split_at_ends() {
        let mut s = store(&["ab"]);
        let id = s.head().unwrap();
        s.split(id, 2).unwrap();
        s.split(id, 0).unwrap();
        assert_eq!(texts(&s), ["", "ab", ""]);
    }

    #[test]
    fn split_past_end_is_out_of_range() {
        let mut s = store(&["ab"]);
        let id = s.head().unwrap();
        assert_eq!(
            s.split(id, 3),
            Err(StoreError::OutOfRange { position: 3, len: 2 })
        );
        assert_eq!(s.count(), 1);
    }

    // -- destroy --

    #[test]
    fn destroy_empties_store() {
        let mut s = store(&["a", "b"]);
        s.destroy();
        assert!(s.is_empty());
        assert_eq!(s.head(), None);
        assert_eq!(s.tail(), None);
        s.insert_after(0, Some(b"again")).unwrap();
        assert_eq!(texts(&s), ["again"]);
    }

    // -- Properties --

    proptest! {
        #[test]
        fn insert_then_delete_restores_text(
            text in proptest::collection::vec(32u8..127, 0..100),
            offset in 0usize..100,
            byte in 32u8..127,
        ) {
            let offset = offset.min(text.len());
            let mut line = Line::from_bytes(&text).unwrap();
            line.insert_char(offset, byte).unwrap();
            prop_assert_eq!(line.len(), text.len() + 1);
            prop_assert_eq!(line.delete_char(offset), Outcome::Done);
            prop_assert_eq!(line.as_bytes(), text.as_slice());
        }

        #[test]
        fn split_keeps_bytes_and_adds_one_line(
            text in proptest::collection::vec(32u8..127, 0..100),
            offset in 0usize..100,
        ) {
            let offset = offset.min(text.len());
            let mut s = LineStore::from_lines([text.clone()]).unwrap();
            let first = s.head().unwrap();
            let second = s.split(first, offset).unwrap();
            prop_assert_eq!(s.count(), 2);
            prop_assert_eq!(s.line(first).unwrap().len(), offset);
            let mut joined = s.line(first).unwrap().as_bytes().to_vec();
            joined.extend_from_slice(s.line(second).unwrap().as_bytes());
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn count_tracks_chain_after_random_edits(
            ops in proptest::collection::vec((any::<bool>(), 0usize..8), 0..40),
        ) {
            let mut s = LineStore::with_blank_line().unwrap();
            for (insert, pos) in ops {
                if insert {
                    let _ = s.insert_after(pos.min(s.count()), None);
                } else if let Some(id) = s.walk(pos.max(1).min(s.count())) {
                    s.delete(id).unwrap();
                }
                prop_assert!(s.count() >= 1);
            }
            assert_chain_consistent(&s);
        }
    }
}
