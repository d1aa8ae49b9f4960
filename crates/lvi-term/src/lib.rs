// SPDX-License-Identifier: MIT
//
// lvi-term: the terminal side of lvi.
//
// Direct ANSI output and raw termios, no TUI framework. The editor core
// decides what to draw; this crate knows how to say it to a VT100-style
// terminal, how to get raw keyboard bytes back, and how to leave the
// terminal the way it was found.

pub mod ansi;
pub mod event_loop;
pub mod output;
pub mod reader;
pub mod terminal;
