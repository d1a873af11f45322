//! Debug tracing infrastructure for development diagnostics
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=trellis::store=trace` - module-level filtering
//! - `RUST_LOG=caret=debug` - state diffs emitted by `update`
//!
//! # Log Files
//!
//! Logs are written to `~/.config/trellis/logs/trellis.log` with daily
//! rotation, at debug level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::model::EditorModel;
use crate::navigation::NavPosition;

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG and defaults to `warn`. File logging
/// writes to the config logs directory with daily rotation.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender =
                tracing_appender::rolling::daily(logs_dir, crate::config_paths::LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

/// Lightweight snapshot of program shape, caret and selection for diffing
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub frame_count: usize,
    pub caret: NavPosition,
    pub selection: Vec<String>,
    pub error_count: usize,
}

impl StoreSnapshot {
    pub fn from_model(model: &EditorModel) -> Self {
        Self {
            frame_count: model.store.user_frame_count(),
            caret: model.caret.clone(),
            selection: model.selection.frames.iter().map(|id| id.to_string()).collect(),
            error_count: model.store.frames().filter(|f| f.has_errors()).count(),
        }
    }

    /// Generate a diff description between two snapshots
    pub fn diff(&self, other: &StoreSnapshot) -> Option<String> {
        let mut changes = Vec::new();
        if self.frame_count != other.frame_count {
            changes.push(format!("frames: {} → {}", self.frame_count, other.frame_count));
        }
        if self.caret != other.caret {
            changes.push(format!("caret: {} → {}", self.caret, other.caret));
        }
        if self.selection != other.selection {
            changes.push(format!(
                "selection: [{}] → [{}]",
                self.selection.join(","),
                other.selection.join(",")
            ));
        }
        if self.error_count != other.error_count {
            changes.push(format!(
                "frames with errors: {} → {}",
                self.error_count, other.error_count
            ));
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}
