//! Loading and saving documents.
//!
//! A file is a sequence of lines separated by `\n`. Loading strips the
//! separators (a final newline does not start an extra line); saving
//! writes every line followed by `\n`. Bytes are kept as they are, so a
//! file that ends in a newline survives a load/save round trip unchanged.

use std::fs;
use std::io;
use std::path::Path;

use crate::line_store::LineStore;

/// Read `path` into lines. `Ok(None)` means the file does not exist yet,
/// which the editor treats as a new, empty document.
///
/// # Errors
///
/// Any I/O error other than not-found.
pub fn load(path: &Path) -> io::Result<Option<Vec<Vec<u8>>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(split_lines(&bytes))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Split file contents into lines without their `\n` separators.
#[must_use]
pub fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    body.split(|&b| b == b'\n').map(<[u8]>::to_vec).collect()
}

/// File contents for `store`: every line followed by `\n`.
#[must_use]
pub fn encode(store: &LineStore) -> Vec<u8> {
    let size: usize = store.iter().map(|l| l.len() + 1).sum();
    let mut out = Vec::with_capacity(size);
    for line in store.iter() {
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
    }
    out
}

/// Write `store` to `path`, replacing its contents. Returns the number
/// of bytes written.
///
/// # Errors
///
/// Any I/O error from creating or writing the file.
pub fn save(path: &Path, store: &LineStore) -> io::Result<usize> {
    let bytes = encode(store);
    fs::write(path, &bytes)?;
    Ok(bytes.len())
}
