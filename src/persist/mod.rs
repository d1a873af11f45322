//! `.spy` structural encoding
//!
//! A line-oriented text file: a version header, free-form `#(=> key:value`
//! headers, a checksum over everything that follows it, then the three
//! sections with one line per frame and four spaces of indentation per
//! level. Directive lines carry per-frame state that has no Python spelling.
//!
//! Loading is all-or-nothing and saving a freshly loaded document
//! reproduces its bytes exactly.

pub mod load;
pub mod save;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::store::FrameStore;
use crate::validation::LineFrameMap;

pub use load::{load, load_into};
pub use save::{save, SaveOutput};

pub const DIRECTIVE_PREFIX: &str = "#(=> ";
pub const APP_NAME: &str = "Strype";
pub const FORMAT_VERSION: u32 = 1;
pub const DEFAULT_PLATFORM: &str = "std";
pub const INDENT: &str = "    ";

pub const CHECKSUM_KEY: &str = "Checksum";
pub const SECTION_KEY: &str = "Section";
pub const FRAME_STATE_KEY: &str = "FrameState";
pub const DISABLED_KEY: &str = "Disabled";

pub const IMPORTS_SECTION: &str = "Imports";
pub const DEFS_SECTION: &str = "Definitions";
pub const MAIN_SECTION: &str = "Main";

/// Header key holding the editor/commands divider positions
pub const EDITOR_DIVIDER_KEY: &str = "editorCommandsSplitterPane2Size";

/// `#(=> key:value` for a directive
pub fn directive(key: &str, value: &str) -> String {
    format!("{}{}:{}", DIRECTIVE_PREFIX, key, value)
}

/// Split a directive line into key and value
pub fn parse_directive(line: &str) -> Option<(&str, &str)> {
    line.strip_prefix(DIRECTIVE_PREFIX)?.split_once(':')
}

/// Lowercase hex SHA-256 of `body`
pub fn checksum(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Divider positions per layout mode, as percentages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DividerSettings(pub BTreeMap<String, f64>);

impl DividerSettings {
    /// JSON object with every value rounded to two decimals
    pub fn to_json(&self) -> String {
        let rounded: BTreeMap<&str, f64> = self
            .0
            .iter()
            .map(|(mode, value)| (mode.as_str(), (value * 100.0).round() / 100.0))
            .collect();
        serde_json::to_string(&rounded).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok().map(DividerSettings)
    }
}

/// Everything in a document besides the frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeaders {
    pub platform: String,
    /// Headers between the version line and the checksum, in file order.
    /// Unknown keys are kept verbatim.
    pub entries: Vec<(String, String)>,
}

impl Default for DocumentHeaders {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            entries: Vec::new(),
        }
    }
}

impl DocumentHeaders {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the value of `key`, appending it when absent
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn dividers(&self, key: &str) -> Option<DividerSettings> {
        DividerSettings::from_json(self.get(key)?)
    }

    pub fn set_dividers(&mut self, key: &str, settings: &DividerSettings) {
        self.set(key, settings.to_json());
    }
}

/// A loaded program with its headers
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub store: FrameStore,
    pub headers: DocumentHeaders,
    /// 0-based file line of every frame
    pub line_map: LineFrameMap,
}

/// Why an encoding could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    MissingHeader,
    UnsupportedVersion { found: u32 },
    MissingChecksum,
    ChecksumMismatch { expected: String, actual: String },
    Malformed { line: usize, reason: String },
    Structure { line: usize, reason: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MissingHeader => write!(f, "missing {} version header", APP_NAME),
            LoadError::UnsupportedVersion { found } => write!(
                f,
                "format version {} is newer than supported version {}",
                found, FORMAT_VERSION
            ),
            LoadError::MissingChecksum => write!(f, "missing checksum header"),
            LoadError::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: file says {}, content hashes to {}", expected, actual)
            }
            LoadError::Malformed { line, reason } => {
                write!(f, "line {}: {}", line + 1, reason)
            }
            LoadError::Structure { line, reason } => {
                write!(f, "line {}: {}", line + 1, reason)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Load a `.spy` file from disk
pub fn read_file(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document = load(&text).with_context(|| format!("Failed to load {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        frames = document.store.user_frame_count(),
        "loaded document"
    );
    Ok(document)
}

/// Save a program to disk; returns the line map of what was written
pub fn write_file(path: &Path, store: &FrameStore, headers: &DocumentHeaders) -> Result<LineFrameMap> {
    let output = save(store, headers);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, &output.text).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), lines = output.text.lines().count(), "saved document");
    Ok(output.line_map)
}
