//! Demo host: drives the widget from the command line.
//!
//! Reads `attribute value` lines from stdin, forwards them through the
//! widget's attribute channel, and prints every outbound notification as a
//! JSON line on stdout. With `--watch`, the backing file is re-pushed
//! through the `text` attribute whenever it changes on disk.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use editsync::prelude::*;
use editsync::watcher::FileWatcher;

/// Poll interval for stdin commands and file-watch events.
const TICK: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(
    name = "editsync",
    about = "Attribute-driven editor widget, driven from stdin",
    version
)]
struct Cli {
    /// File whose contents seed the document via the `text` attribute
    file: Option<PathBuf>,

    /// Re-push `text` whenever the file changes on disk
    #[arg(long)]
    watch: bool,

    /// Adjustment added to incoming `linenumber` values
    #[arg(long, default_value_t = 2)]
    line_adjust: i64,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = WidgetOptions::new().with_line_adjust(cli.line_adjust);

    let mut widget = EditorWidget::with_rope_surface(options);
    widget.subscribe(|notification| match serde_json::to_string(notification) {
        Ok(line) => println!("{line}"),
        Err(err) => eprintln!("[warn] failed to serialize notification: {err}"),
    });
    widget.connect();

    let mut watcher = None;
    if let Some(path) = &cli.file {
        push_file(&mut widget, path)?;
        if cli.watch {
            watcher = Some(
                FileWatcher::new(path, Duration::from_millis(200))
                    .with_context(|| format!("Failed to watch {}", path.display()))?,
            );
        }
    }

    // Stdin is pumped from a side thread; the widget itself only ever runs
    // on this thread.
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdin_open = true;
    loop {
        if let (Some(w), Some(path)) = (watcher.as_mut(), cli.file.as_ref()) {
            if w.take_change_ready() {
                push_file(&mut widget, path)?;
            }
        }

        if stdin_open {
            match rx.recv_timeout(TICK) {
                Ok(line) => {
                    if !handle_line(&mut widget, line.trim()) {
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    stdin_open = false;
                }
            }
        } else if watcher.is_some() {
            std::thread::sleep(TICK);
        } else {
            break;
        }
    }

    Ok(())
}

/// Push the file's current contents through the `text` attribute.
fn push_file(widget: &mut EditorWidget, path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    widget.set_attribute("text", &contents);
    Ok(())
}

/// Handle one stdin command. Returns `false` when the host should exit.
fn handle_line(widget: &mut EditorWidget, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    if line == "quit" {
        return false;
    }
    if let Some(coords) = line.strip_prefix("click ") {
        match parse_click(coords) {
            Some((x, y)) => widget.pointer_click(x, y),
            None => eprintln!("[warn] usage: click <x> <y>"),
        }
        return true;
    }

    let (name, value) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    // Stdin is line-oriented; let hosts express multi-line documents.
    let value = unescape_newlines(value);
    widget.set_attribute(name, &value);
    true
}

fn parse_click(coords: &str) -> Option<(u16, u16)> {
    let mut parts = coords.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((x, y))
}

/// Replace literal `\n` sequences with newlines (and `\\` with a backslash).
fn unescape_newlines(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
