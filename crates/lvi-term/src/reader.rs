// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Stdin pump.
//
// A dedicated thread waits on stdin with a short poll, reads what is
// there and sends it to the event loop as one `Vec<u8>` per read. The
// loop consumes those chunks one byte at a time. Since the main thread
// only ever blocks on the channel with a timeout, resize notifications
// get handled while the keyboard is idle.
//
// End of input is not a message. The thread simply exits, its `Sender`
// is dropped, and the loop observes `Disconnected`.

#[cfg(unix)]
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Largest single read. A longer paste is split over several chunks.
const CHUNK_SIZE: usize = 1024;

/// Poll interval, which also bounds how long `stop` blocks.
const POLL_TIMEOUT_MS: i32 = 50;

/// Handle to the stdin reader thread. Dropping it stops the thread.
pub struct StdinReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl StdinReader {
    /// Start reading. Each message on the returned channel is a non-empty
    /// chunk of raw input.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn a thread.
    #[must_use]
    pub fn spawn() -> (Self, Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("lvi-stdin".into())
            .spawn(move || pump(&tx, &thread_stop))
            .expect("failed to spawn stdin reader thread");

        (
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        )
    }

    /// Ask the thread to finish and join it. Safe to call twice.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// What one trip through the poll/read cycle produced.
#[cfg(unix)]
enum Step {
    Idle,
    Bytes(usize),
    Closed,
}

#[cfg(unix)]
fn step(fd: libc::c_int, chunk: &mut [u8]) -> Step {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    if unsafe { libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS) } <= 0 {
        return Step::Idle;
    }
    let got = unsafe { libc::read(fd, chunk.as_mut_ptr().cast(), chunk.len()) };
    match usize::try_from(got) {
        Ok(0) => {
            tracing::debug!("stdin closed");
            Step::Closed
        }
        Ok(n) => Step::Bytes(n),
        Err(_) => {
            tracing::debug!(error = %io::Error::last_os_error(), "stdin read failed");
            Step::Closed
        }
    }
}

/// Thread body. Returns (dropping `tx`) on stop, end of input, or when
/// the loop has gone away.
#[cfg(unix)]
fn pump(tx: &Sender<Vec<u8>>, stop: &AtomicBool) {
    let mut chunk = [0u8; CHUNK_SIZE];
    while !stop.load(Ordering::Relaxed) {
        match step(libc::STDIN_FILENO, &mut chunk) {
            Step::Idle => {}
            Step::Closed => return,
            Step::Bytes(n) => {
                if tx.send(chunk[..n].to_vec()).is_err() {
                    return;
                }
            }
        }
    }
}

/// Blocking fallback without poll; `stop` only takes effect after the
/// next read returns.
#[cfg(not(unix))]
fn pump(tx: &Sender<Vec<u8>>, stop: &AtomicBool) {
    use std::io::Read;

    let mut stdin = std::io::stdin();
    let mut chunk = [0u8; CHUNK_SIZE];

    while !stop.load(Ordering::Relaxed) {
        match stdin.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(chunk[..n].to_vec()).is_err() {
                    break;
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
