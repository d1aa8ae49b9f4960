// SPDX-License-Identifier: MIT
//
// lvi: a small screen-oriented vi-like editor.
//
// This binary wires the two crates together:
//
//   lvi-term   → raw terminal, stdin reader, resize queue, event loop
//   lvi-editor → line store, cursor, renderer, modal state machine
//
// `Editor` implements lvi-term's `App` trait. Each input byte flows
// through:
//
//   stdin → reader thread → event loop → Editor::handle_byte
//         → LineStore / Cursor mutation → render → flushed output
//
// Screen layout:
//
//   ┌──────────────────────────────┐
//   │ text area                    │  ← rows - 1 (Viewport)
//   ├──────────────────────────────┤
//   │ status / `:` prompt          │  ← last row
//   └──────────────────────────────┘
//
// A missing file opens as a new document; any other load error stops
// the program before the terminal is touched. Fatal editor errors are
// reported after the terminal has been restored.

use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lvi_editor::config::parse_placeholder;
use lvi_editor::{Config, Editor, persist};
use lvi_term::event_loop::EventLoop;
use lvi_term::terminal::Features;

/// A small screen-oriented vi-like editor
#[derive(Parser, Debug)]
#[command(name = "lvi", version, about, long_about = None)]
struct Cli {
    /// File to edit; created on the first write if it does not exist
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Write diagnostic logs to this file (filter with LVI_LOG)
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Draw on the main screen instead of the alternate screen
    #[arg(long)]
    no_alt_screen: bool,

    /// Redraw the text area instead of using the terminal scroll region
    #[arg(long)]
    no_scroll_region: bool,

    /// Marker drawn on rows past the end of the document
    #[arg(long, value_name = "CHAR", default_value = "~", value_parser = parse_placeholder)]
    placeholder: u8,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            placeholder: self.placeholder,
            scroll_region: !self.no_scroll_region,
        }
    }

    fn features(&self) -> Features {
        let mut features = Features::default();
        features.set(Features::ALT_SCREEN, !self.no_alt_screen);
        features
    }
}

/// Log to `path` if given. The terminal belongs to the editor, so logs
/// never go to stdout or stderr.
fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LVI_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    init_logging(cli.log.as_ref())?;

    let mut editor = match &cli.file {
        Some(path) => {
            let lines = persist::load(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            Editor::open(path.clone(), lines, cli.config())?
        }
        None => Editor::new(cli.config())?,
    };

    EventLoop::new(cli.features()).run(&mut editor)?;
    info!("editor exited");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{e:#}");
        eprintln!("lvi: {e:#}");
        process::exit(1);
    }
}
