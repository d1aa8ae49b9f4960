//! # lvi-editor: editor core for lvi
//!
//! - **[`line_store`]**: `LineStore`, the document as a chain of lines in a slot arena
//! - **[`cursor`]**: `Cursor` and `Viewport`, 1-based, with per-line horizontal shift
//! - **[`render`]**: incremental drawing of lines, row ranges and the status row
//! - **[`mode`]**, **[`pending`]**, **[`command`]**: modes, count/verb parsing, `:` commands
//! - **[`editor`]**: the byte-at-a-time state machine tying it all together
//! - **[`persist`]**: loading and saving files
//!
//! The terminal itself (raw mode, input, resize delivery) lives in `lvi-term`.

pub mod command;
pub mod config;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod line_store;
pub mod mode;
pub mod pending;
pub mod persist;
pub mod render;

pub use config::Config;
pub use editor::Editor;
pub use error::EditorError;
