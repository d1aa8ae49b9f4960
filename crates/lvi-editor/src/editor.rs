//! The editor: document, cursor, mode and the byte-at-a-time dispatcher.
//!
//! [`Editor::handle_byte`] is the whole input path. It interprets one
//! byte in the current mode, applies the change to the document and
//! cursor, and draws only the rows that changed. It then redraws the
//! status row and puts the terminal cursor back. When it returns, the
//! screen matches the state.
//!
//! Recoverable trouble (an unknown key, a blocked motion, a failed save)
//! becomes a status message. Only [`EditorError`] ends the session.

use std::io::Write;
use std::path::{Path, PathBuf};

use lvi_term::ansi;
use lvi_term::event_loop::{Action, App};
use lvi_term::output::OutputBuffer;
use lvi_term::terminal::Size;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandLine, Edit};
use crate::config::Config;
use crate::cursor::{Cursor, Motion, Scroll, Viewport};
use crate::error::EditorError;
use crate::line_store::{LineId, LineStore, Outcome, StoreError};
use crate::mode::Mode;
use crate::pending::{ESC, Parsed, Pending, Verb};
use crate::persist;
use crate::render::{self, Indicator, StatusLine};

/// Backspace as sent by most terminals (DEL) and by Ctrl-H.
const BACKSPACE: [u8; 2] = [0x7f, 0x08];

/// Outcome of a line command.
enum CommandResult {
    Done(Option<String>),
    Failed(String),
    Quit,
}

/// What a byte typed at the `:` prompt asks for.
enum PromptStep {
    Stay,
    Cancel,
    Submit,
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// All editor state. One value per session, owned by the event loop's
/// caller.
#[derive(Debug)]
pub struct Editor {
    doc: LineStore,
    yank: LineStore,
    cursor: Cursor,
    view: Viewport,
    mode: Mode,
    pending: Pending,
    prompt: Option<CommandLine>,
    message: Option<String>,
    path: Option<PathBuf>,
    config: Config,
}

impl Editor {
    /// An unnamed document with one empty line.
    ///
    /// # Errors
    ///
    /// [`EditorError::Store`] if the first line cannot be allocated.
    pub fn new(config: Config) -> Result<Self, EditorError> {
        Self::with_document(LineStore::with_blank_line()?, None, config)
    }

    /// A document for `path`. `lines` is what was loaded from it, or
    /// `None` if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// [`EditorError::Store`] if the lines cannot be allocated.
    pub fn open(
        path: PathBuf,
        lines: Option<Vec<Vec<u8>>>,
        config: Config,
    ) -> Result<Self, EditorError> {
        let message = match &lines {
            Some(lines) => format!("\"{}\" {} lines", path.display(), lines.len()),
            None => format!("\"{}\" [New File]", path.display()),
        };
        let doc = LineStore::from_lines(lines.unwrap_or_default())?;
        info!(path = %path.display(), lines = doc.count(), "document opened");
        let mut editor = Self::with_document(doc, Some(path), config)?;
        editor.message = Some(message);
        Ok(editor)
    }

    fn with_document(
        doc: LineStore,
        path: Option<PathBuf>,
        config: Config,
    ) -> Result<Self, EditorError> {
        let head = doc
            .head()
            .ok_or(EditorError::Invariant("document has no lines"))?;
        Ok(Self {
            doc,
            yank: LineStore::new(),
            cursor: Cursor::new(head),
            view: Viewport::new(1, 1),
            mode: Mode::default(),
            pending: Pending::new(),
            prompt: None,
            message: None,
            path,
            config,
        })
    }

    #[inline]
    #[must_use]
    pub const fn document(&self) -> &LineStore {
        &self.doc
    }

    /// Lines removed by the last `dd`.
    #[inline]
    #[must_use]
    pub const fn yanked(&self) -> &LineStore {
        &self.yank
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.view
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Status message waiting for the next status redraw.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // -- Screen size ---------------------------------------------------------

    /// Adopt a terminal of `term_rows` by `term_cols` and redraw
    /// everything. Also used for the first draw.
    ///
    /// # Errors
    ///
    /// Fatal state or output errors.
    pub fn resize(
        &mut self,
        term_rows: usize,
        term_cols: usize,
        out: &mut impl Write,
    ) -> Result<(), EditorError> {
        self.view = Viewport::for_terminal(term_rows, term_cols);
        self.cursor.fit(self.view);
        debug!(rows = self.view.rows(), cols = self.view.cols(), "viewport");

        ansi::cursor_hide(out)?;
        ansi::clear_screen(out)?;
        self.draw_from(1, out)?;
        if let Some(prompt) = &self.prompt {
            render::draw_prompt(out, self.view, prompt.input())?;
        } else {
            self.finish_update(out)?;
        }
        ansi::cursor_show(out)?;
        Ok(())
    }

    /// Clear the status row before the terminal is handed back.
    ///
    /// # Errors
    ///
    /// Output errors.
    pub fn finish(&self, out: &mut impl Write) -> Result<(), EditorError> {
        ansi::cursor_to(out, self.view.status_row(), 1)?;
        ansi::erase_line(out)?;
        Ok(())
    }

    // -- Input ---------------------------------------------------------------

    /// Interpret one input byte.
    ///
    /// # Errors
    ///
    /// Allocation failure, corrupted state, or output errors. All are
    /// fatal to the session.
    pub fn handle_byte(&mut self, byte: u8, out: &mut impl Write) -> Result<Action, EditorError> {
        if self.prompt.is_some() {
            return self.prompt_byte(byte, out);
        }
        match self.mode {
            Mode::Command => self.command_byte(byte, out)?,
            Mode::Insert => self.insert_byte(byte, out)?,
            Mode::Replace => self.replace_byte(byte, out)?,
        }
        if self.prompt.is_none() {
            self.finish_update(out)?;
        }
        Ok(Action::Continue)
    }

    // -- Command mode --------------------------------------------------------

    fn command_byte(&mut self, byte: u8, out: &mut impl Write) -> Result<(), EditorError> {
        match self.pending.feed(byte) {
            Parsed::Incomplete | Parsed::Aborted => Ok(()),
            Parsed::CountTooLong => {
                self.set_message("Count too long");
                Ok(())
            }
            Parsed::Ready { verb, count } => self.run_verb(verb, count, out),
        }
    }

    fn run_verb(&mut self, verb: Verb, count: usize, out: &mut impl Write) -> Result<(), EditorError> {
        debug!(?verb, count, "command");
        match verb {
            Verb::Left | Verb::Down | Verb::Up | Verb::Right => self.run_motion(verb, count, out),
            Verb::Insert => {
                self.set_mode(Mode::Insert);
                Ok(())
            }
            Verb::Append => {
                self.set_mode(Mode::Insert);
                let len = self.current_len()?;
                let motion = self.cursor.move_right(len, self.view, true);
                self.show_motion(motion, out)
            }
            Verb::OpenBelow => {
                let id = self.doc.insert_after_id(self.cursor.line_id(), b"")?;
                self.set_mode(Mode::Insert);
                self.enter_new_line(id, out)
            }
            Verb::DeleteChar => self.delete_under(count, out),
            Verb::DeleteBefore => self.delete_before(count, out),
            Verb::DeleteLine => self.delete_lines(count, out),
            Verb::Replace => {
                self.set_mode(Mode::Replace);
                Ok(())
            }
            Verb::LineCommand => {
                let prompt = CommandLine::new();
                render::draw_prompt(out, self.view, prompt.input())?;
                self.prompt = Some(prompt);
                Ok(())
            }
            Verb::Unknown(byte) => {
                debug!(byte, "unknown key");
                self.set_message("Unknown key");
                Ok(())
            }
        }
    }

    fn run_motion(&mut self, verb: Verb, count: usize, out: &mut impl Write) -> Result<(), EditorError> {
        let past_end = self.mode.cursor_past_end();
        for step in 0..count {
            let motion = match verb {
                Verb::Left => self.cursor.move_left(),
                Verb::Right => {
                    let len = self.current_len()?;
                    self.cursor.move_right(len, self.view, past_end)
                }
                Verb::Down => self.cursor.move_down(&self.doc, self.view, past_end),
                Verb::Up => self.cursor.move_up(&self.doc, self.view, past_end),
                _ => return Ok(()),
            };
            if motion == Motion::Blocked {
                debug!(?verb, step, "motion blocked");
                if step == 0 {
                    self.set_message(blocked_message(verb));
                }
                break;
            }
            self.show_motion(motion, out)?;
        }
        Ok(())
    }

    /// `x`: delete the byte under the cursor, `count` times.
    fn delete_under(&mut self, count: usize, out: &mut impl Write) -> Result<(), EditorError> {
        let id = self.cursor.line_id();
        for _ in 0..count {
            let line = self.doc.line_mut(id).ok_or(StoreError::StaleHandle)?;
            if line.delete_char(self.cursor.offset()) == Outcome::NothingToDelete {
                break;
            }
            self.cursor.clamp(line.len(), self.view, false);
        }
        self.draw_current(out)
    }

    /// `X`: delete the byte left of the cursor, `count` times.
    fn delete_before(&mut self, count: usize, out: &mut impl Write) -> Result<(), EditorError> {
        let id = self.cursor.line_id();
        for _ in 0..count {
            if self.cursor.column() == 1 {
                break;
            }
            self.cursor.move_left();
            let line = self.doc.line_mut(id).ok_or(StoreError::StaleHandle)?;
            line.delete_char(self.cursor.offset());
        }
        self.draw_current(out)
    }

    /// `dd`: delete `count` lines starting at the cursor, stopping after
    /// the last line of the document. The deleted lines replace whatever
    /// the yank store held.
    fn delete_lines(&mut self, count: usize, out: &mut impl Write) -> Result<(), EditorError> {
        self.yank.destroy();
        let first_row = self.cursor.row();

        for _ in 0..count {
            let id = self.cursor.line_id();
            let line = self.doc.line(id).ok_or(StoreError::StaleHandle)?;
            self.yank.insert_after(self.yank.count(), Some(line.as_bytes()))?;

            let (next, prev) = (self.doc.next(id), self.doc.prev(id));
            let (line_no, row) = (self.cursor.line(), self.cursor.row());
            if self.doc.delete(id)? == Outcome::NothingToDelete {
                self.cursor.place(line_no, id, row);
                break;
            }
            match (next, prev) {
                (Some(next), _) => self.cursor.place(line_no, next, row),
                (None, Some(prev)) => {
                    self.cursor.place(line_no - 1, prev, row.saturating_sub(1).max(1));
                    break;
                }
                (None, None) => return Err(EditorError::Invariant("deleted line had no neighbours")),
            }
        }

        debug!(lines = self.yank.count(), "lines deleted");
        let from = first_row.min(self.cursor.row());
        self.draw_from(from, out)
    }

    // -- Insert mode ---------------------------------------------------------

    fn insert_byte(&mut self, byte: u8, out: &mut impl Write) -> Result<(), EditorError> {
        match byte {
            ESC => self.leave_insert(out),
            b'\r' | b'\n' => {
                let id = self.doc.split(self.cursor.line_id(), self.cursor.offset())?;
                self.enter_new_line(id, out)
            }
            b if BACKSPACE.contains(&b) => {
                if self.cursor.column() == 1 {
                    return Ok(());
                }
                self.cursor.move_left();
                let line = self
                    .doc
                    .line_mut(self.cursor.line_id())
                    .ok_or(StoreError::StaleHandle)?;
                line.delete_char(self.cursor.offset());
                self.draw_current(out)
            }
            0x20..=0x7e => {
                let line = self
                    .doc
                    .line_mut(self.cursor.line_id())
                    .ok_or(StoreError::StaleHandle)?;
                line.insert_char(self.cursor.offset(), byte)?;
                let len = line.len();
                self.cursor.move_right(len, self.view, true);
                self.draw_current(out)
            }
            other => {
                self.set_message(format!("Invalid char entered: {other}"));
                Ok(())
            }
        }
    }

    /// Escape from Insert: step back onto the last inserted byte and pull
    /// the cursor off the end of the line.
    fn leave_insert(&mut self, out: &mut impl Write) -> Result<(), EditorError> {
        self.set_mode(Mode::Command);
        if self.cursor.col() > 1 {
            self.cursor.move_left();
        }
        let len = self.current_len()?;
        if self.cursor.clamp(len, self.view, false) == Motion::Shifted {
            self.draw_current(out)?;
        }
        Ok(())
    }

    /// Move onto `id`, just inserted below the cursor line, and redraw
    /// everything from the old cursor row down.
    fn enter_new_line(&mut self, id: LineId, out: &mut impl Write) -> Result<(), EditorError> {
        let old_row = self.cursor.row();
        let from = match self.cursor.enter_next_line(id, self.view) {
            Some(dir) => {
                self.scroll(dir, out)?;
                old_row.saturating_sub(1).max(1)
            }
            None => old_row,
        };
        self.draw_from(from, out)
    }

    // -- Replace mode --------------------------------------------------------

    fn replace_byte(&mut self, byte: u8, out: &mut impl Write) -> Result<(), EditorError> {
        if byte == ESC {
            self.set_mode(Mode::Command);
            let len = self.current_len()?;
            if self.cursor.clamp(len, self.view, false) == Motion::Shifted {
                self.draw_current(out)?;
            }
        } else {
            self.set_message("Replace mode is not supported");
        }
        Ok(())
    }

    // -- Line commands -------------------------------------------------------

    fn prompt_byte(&mut self, byte: u8, out: &mut impl Write) -> Result<Action, EditorError> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(Action::Continue);
        };
        let step = match byte {
            ESC => PromptStep::Cancel,
            b'\r' | b'\n' => PromptStep::Submit,
            b if BACKSPACE.contains(&b) => match prompt.backspace() {
                Edit::Erased => {
                    render::erase_prompt_char(out)?;
                    PromptStep::Stay
                }
                _ => PromptStep::Cancel,
            },
            _ => match prompt.push(byte) {
                Edit::Pushed => {
                    out.write_all(&[byte])?;
                    PromptStep::Stay
                }
                Edit::Full => {
                    out.write_all(&[byte])?;
                    PromptStep::Submit
                }
                Edit::Erased | Edit::Ignored => PromptStep::Stay,
            },
        };

        match step {
            PromptStep::Stay => return Ok(Action::Continue),
            PromptStep::Cancel => self.prompt = None,
            PromptStep::Submit => {
                if let Some(prompt) = self.prompt.take() {
                    if self.execute_command(prompt.parse()) == Action::Quit {
                        return Ok(Action::Quit);
                    }
                }
            }
        }
        self.finish_update(out)?;
        Ok(Action::Continue)
    }

    fn execute_command(&mut self, command: Command) -> Action {
        debug!(?command, "line command");
        match self.run_command(command) {
            CommandResult::Done(Some(msg)) | CommandResult::Failed(msg) => {
                self.set_message(msg);
                Action::Continue
            }
            CommandResult::Done(None) => Action::Continue,
            CommandResult::Quit => Action::Quit,
        }
    }

    fn run_command(&mut self, command: Command) -> CommandResult {
        match command {
            Command::Write => self.cmd_write(None),
            Command::WriteAs(path) => self.cmd_write(Some(path)),
            Command::Quit | Command::ForceQuit => CommandResult::Quit,
            Command::WriteQuit(path) => match self.cmd_write(path) {
                CommandResult::Done(_) => CommandResult::Quit,
                other => other,
            },
            Command::Unknown(input) => {
                if input.is_empty() {
                    CommandResult::Done(None)
                } else {
                    CommandResult::Failed(format!("Not an editor command: {input}"))
                }
            }
        }
    }

    /// Save to `target`, or to the current file name. A named target
    /// becomes the current file name once written.
    fn cmd_write(&mut self, target: Option<PathBuf>) -> CommandResult {
        let Some(path) = target.or_else(|| self.path.clone()) else {
            return CommandResult::Failed("No file name".to_string());
        };
        match persist::save(&path, &self.doc) {
            Ok(bytes) => {
                let lines = self.doc.count();
                info!(path = %path.display(), lines, bytes, "document written");
                let msg = format!("\"{}\" {lines} lines written", path.display());
                self.path = Some(path);
                CommandResult::Done(Some(msg))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "write failed");
                CommandResult::Failed(format!("Can't write \"{}\": {e}", path.display()))
            }
        }
    }

    // -- Drawing -------------------------------------------------------------

    fn show_motion(&self, motion: Motion, out: &mut impl Write) -> Result<(), EditorError> {
        match motion {
            Motion::Blocked | Motion::Moved => Ok(()),
            Motion::Shifted => self.draw_current(out),
            Motion::Line(change) => {
                if let Some(dir) = change.scroll {
                    self.scroll(dir, out)?;
                }
                if let (true, Some(row)) = (change.from_shifted, change.from_row) {
                    let line = self.doc.line(change.from).ok_or(StoreError::StaleHandle)?;
                    render::draw_line(out, line.as_bytes(), row, 0, self.view.cols())?;
                }
                if change.scroll.is_some() || change.to_shifted {
                    self.draw_current(out)?;
                }
                Ok(())
            }
        }
    }

    /// Scroll the text area one row. Without a scroll region the whole
    /// text area is redrawn instead. Either way the caller still draws
    /// the row that came into view.
    fn scroll(&self, dir: Scroll, out: &mut impl Write) -> Result<(), EditorError> {
        if self.config.scroll_region {
            render::scroll_text(out, dir, self.view)?;
            Ok(())
        } else {
            self.draw_from(1, out)
        }
    }

    fn draw_current(&self, out: &mut impl Write) -> Result<(), EditorError> {
        let line = self
            .doc
            .line(self.cursor.line_id())
            .ok_or(StoreError::StaleHandle)?;
        render::draw_line(
            out,
            line.as_bytes(),
            self.cursor.row(),
            self.cursor.shift(),
            self.view.cols(),
        )?;
        Ok(())
    }

    /// Redraw the text area from `first` to the bottom row.
    fn draw_from(&self, first: usize, out: &mut impl Write) -> Result<(), EditorError> {
        render::draw_range(
            out,
            &self.doc,
            &self.cursor,
            self.view,
            first..=self.view.rows(),
            self.config.placeholder,
        )
    }

    /// Redraw the status row (consuming any message) and put the cursor back.
    fn finish_update(&mut self, out: &mut impl Write) -> Result<(), EditorError> {
        if cfg!(debug_assertions) {
            self.cursor
                .check(&self.doc, self.view, self.mode.cursor_past_end())
                .map_err(EditorError::Invariant)?;
        }

        let top = self
            .cursor
            .top_line()
            .ok_or(EditorError::Invariant("cursor row below the top of the document"))?;
        let message = self.message.take();
        let status = StatusLine {
            label: message.as_deref().unwrap_or(self.mode.display_name()),
            line: self.cursor.line(),
            column: self.cursor.column(),
            indicator: Indicator::new(top, self.cursor.line(), self.view.rows(), self.doc.count()),
        };
        render::draw_status(out, self.view, &status)?;
        render::restore_cursor(out, &self.cursor)?;
        Ok(())
    }

    // -- Helpers -------------------------------------------------------------

    fn current_len(&self) -> Result<usize, EditorError> {
        let line = self
            .doc
            .line(self.cursor.line_id())
            .ok_or(StoreError::StaleHandle)?;
        Ok(line.len())
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "mode change");
            self.mode = mode;
        }
    }

    fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }
}

const fn blocked_message(verb: Verb) -> &'static str {
    match verb {
        Verb::Left => "Start of line",
        Verb::Right => "End of line",
        Verb::Up => "Top of file",
        _ => "Bottom of file",
    }
}

// ---------------------------------------------------------------------------
// Event loop glue
// ---------------------------------------------------------------------------

impl App for Editor {
    type Error = EditorError;

    fn on_start(&mut self, size: Size, out: &mut OutputBuffer) -> Result<(), EditorError> {
        info!(rows = size.rows, cols = size.cols, "editor started");
        self.resize(usize::from(size.rows), usize::from(size.cols), out)
    }

    fn on_byte(&mut self, byte: u8, out: &mut OutputBuffer) -> Result<Action, EditorError> {
        self.handle_byte(byte, out)
    }

    fn on_resize(&mut self, size: Size, out: &mut OutputBuffer) -> Result<(), EditorError> {
        info!(rows = size.rows, cols = size.cols, "terminal resized");
        self.resize(usize::from(size.rows), usize::from(size.cols), out)
    }

    fn on_exit(&mut self, out: &mut OutputBuffer) -> Result<(), EditorError> {
        self.finish(out)
    }
}
