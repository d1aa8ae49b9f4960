//! Editor settings.
//!
//! Built once at startup from the command line and never changed while
//! the editor runs.

/// Settings the renderer and state machine consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Drawn at column 1 of rows below the last line of the document.
    pub placeholder: u8,
    /// Use the terminal's scroll region to scroll by one row. When off,
    /// scrolling redraws the text area instead.
    pub scroll_region: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder: b'~',
            scroll_region: true,
        }
    }
}

/// Parse a placeholder given on the command line: exactly one printable
/// ASCII character.
///
/// # Errors
///
/// A message suitable for the argument parser.
pub fn parse_placeholder(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if (0x21..0x7f).contains(b) => Ok(*b),
        _ => Err(format!("expected one visible ASCII character, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.placeholder, b'~');
        assert!(c.scroll_region);
    }

    #[test]
    fn placeholder_accepts_one_visible_char() {
        assert_eq!(parse_placeholder("~"), Ok(b'~'));
        assert_eq!(parse_placeholder("."), Ok(b'.'));
    }

    #[test]
    fn placeholder_rejects_everything_else() {
        assert!(parse_placeholder("").is_err());
        assert!(parse_placeholder("ab").is_err());
        assert!(parse_placeholder(" ").is_err());
        assert!(parse_placeholder("\t").is_err());
        assert!(parse_placeholder("é").is_err());
    }
}
