//! Logging init: file under XDG state dir, or graceful fallback to stderr.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,muxcurl_core=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file under the XDG state dir: `~/.local/state/muxcurl/muxcurl.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("muxcurl")?;
    Ok(xdg_dirs.get_state_home().join("muxcurl").join("muxcurl.log"))
}

/// Opens `path` for appending, creating parent directories as needed.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Plain-text subscriber writing every event to `file`.
fn file_subscriber(file: File) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish()
}

/// Initialize structured logging to the file from `log_file_path`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = open_log_file(&path)?;
    tracing::subscriber::set_global_default(file_subscriber(file))
        .context("install subscriber")?;

    tracing::info!("muxcurl logging initialized at {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails.
/// Does nothing if a global subscriber is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Initialize file logging, falling back to stderr when the file cannot be opened.
pub fn init() {
    if let Err(e) = init_logging() {
        init_logging_stderr();
        tracing::warn!("file logging unavailable ({:#}); logging to stderr", e);
    }
}
