// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop: one input byte in, one flushed screen update out.
//
// Bytes arrive from the background reader in chunks. The loop hands them
// to the application strictly one at a time and flushes the output
// buffer after each, so the terminal has seen every consequence of a
// byte before the next byte is interpreted.
//
// # Resize queue
//
// SIGWINCH does nothing but set an `AtomicBool`. That flag is the queue:
// the loop drains it before every byte and whenever the channel wait
// times out, re-queries the size, and calls `App::on_resize` from normal
// code. No editor state is ever touched from signal context, and a
// resize can never land between a byte and its screen update.
//
// # End of input
//
// When stdin closes, the reader drops its sender. The loop treats the
// disconnect exactly like the application returning `Action::Quit`.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::output::OutputBuffer;
use crate::reader::StdinReader;
use crate::terminal::{Features, Size, Terminal};

/// How long the loop sleeps on an idle channel before checking the
/// resize queue again.
const IDLE_WAIT: Duration = Duration::from_millis(50);

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// Queue a resize notification. Async-signal-safe.
#[inline]
pub fn post_resize() {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

/// Drain the resize queue. Any number of posts collapse into one `true`.
#[inline]
pub fn take_resize() -> bool {
    RESIZE_PENDING.swap(false, Ordering::Relaxed)
}

#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    post_resize();
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application wants after handling a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// A byte-driven terminal application.
///
/// Every method writes its screen updates into `out`; the loop flushes
/// after each call. Any `Err` ends the loop, restores the terminal, and
/// is returned from [`EventLoop::run`].
pub trait App {
    /// Error type of the application. I/O failures of the loop itself
    /// are converted into it.
    type Error: From<io::Error>;

    /// Draw the first screen for the given terminal size.
    ///
    /// # Errors
    ///
    /// Application-defined; ends the loop.
    fn on_start(&mut self, size: Size, out: &mut OutputBuffer) -> Result<(), Self::Error>;

    /// Interpret one input byte.
    ///
    /// # Errors
    ///
    /// Application-defined; ends the loop.
    fn on_byte(&mut self, byte: u8, out: &mut OutputBuffer) -> Result<Action, Self::Error>;

    /// The terminal changed size.
    ///
    /// # Errors
    ///
    /// Application-defined; ends the loop.
    fn on_resize(&mut self, size: Size, out: &mut OutputBuffer) -> Result<(), Self::Error>;

    /// Last output before the terminal is handed back. Runs on quit and
    /// on end of input.
    ///
    /// # Errors
    ///
    /// Application-defined.
    fn on_exit(&mut self, _out: &mut OutputBuffer) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Deliver `chunk` one byte at a time, draining the resize queue before
/// each byte and flushing `out` into `sink` after every call.
///
/// Stops at the first byte that asks to quit; the rest of the chunk is
/// dropped.
fn deliver<A: App>(
    app: &mut A,
    chunk: &[u8],
    out: &mut OutputBuffer,
    sink: &mut impl Write,
    mut pending_resize: impl FnMut() -> Option<Size>,
) -> Result<Action, A::Error> {
    for &byte in chunk {
        if let Some(size) = pending_resize() {
            app.on_resize(size, out)?;
            out.flush_to(sink)?;
        }
        let action = app.on_byte(byte, out)?;
        out.flush_to(sink)?;
        if action == Action::Quit {
            return Ok(Action::Quit);
        }
    }
    Ok(Action::Continue)
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// Owns the terminal for the lifetime of one [`run`](Self::run).
pub struct EventLoop {
    terminal: Terminal,
    features: Features,
}

impl EventLoop {
    #[must_use]
    pub fn new(features: Features) -> Self {
        Self {
            terminal: Terminal::new(),
            features,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Run `app` until it quits, input ends, or it fails.
    ///
    /// The terminal is restored on every path out of this function.
    ///
    /// # Errors
    ///
    /// Returns the first error from the application, or an I/O error
    /// from entering, drawing to, or leaving the terminal.
    pub fn run<A: App>(&mut self, app: &mut A) -> Result<(), A::Error> {
        self.terminal.enter(self.features)?;
        install_sigwinch_handler();

        let (mut reader, rx) = StdinReader::spawn();
        let mut out = OutputBuffer::new();

        let result = self.run_inner(app, &rx, &mut out);
        let exit = app
            .on_exit(&mut out)
            .and_then(|()| out.flush_stdout().map_err(A::Error::from));

        reader.stop();
        self.terminal.leave()?;

        result.and(exit)
    }

    fn run_inner<A: App>(
        &mut self,
        app: &mut A,
        rx: &Receiver<Vec<u8>>,
        out: &mut OutputBuffer,
    ) -> Result<(), A::Error> {
        let size = self.terminal.refresh_size();
        app.on_start(size, out)?;
        out.flush_stdout()?;

        loop {
            match rx.recv_timeout(IDLE_WAIT) {
                Ok(chunk) => {
                    let terminal = &mut self.terminal;
                    let mut stdout = io::stdout().lock();
                    let action = deliver(app, &chunk, out, &mut stdout, || {
                        take_resize().then(|| terminal.refresh_size())
                    })?;
                    if action == Action::Quit {
                        return Ok(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if take_resize() {
                        let size = self.terminal.refresh_size();
                        app.on_resize(size, out)?;
                        out.flush_stdout()?;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
