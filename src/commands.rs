//! Command types for the Elm-style architecture
//!
//! Commands represent side effects that should be performed after an update.

use std::path::PathBuf;

use crate::validation::LineFrameMap;

/// Side effects requested by `update`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cmd {
    /// No command - do nothing
    #[default]
    None,
    /// The program or caret changed and should be redrawn
    Redraw,
    /// Write encoded text to disk
    SaveFile { path: PathBuf, content: String },
    /// Read a file from disk
    LoadFile { path: PathBuf },
    /// Ask the user before deleting this many frames
    ConfirmDelete { count: usize },
    /// Hand the encoded program to an external analyser. Errors come back
    /// as `AnalysisMsg::LineErrors` against `line_map`.
    Analyze { source: String, line_map: LineFrameMap },
    /// Execute multiple commands
    Batch(Vec<Cmd>),
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        Cmd::Batch(cmds)
    }

    /// Check if this command requires a redraw
    pub fn needs_redraw(&self) -> bool {
        match self {
            Cmd::None => false,
            Cmd::Redraw => true,
            Cmd::SaveFile { .. } => true,
            Cmd::LoadFile { .. } => true,
            // The prompt is drawn by the front-end itself
            Cmd::ConfirmDelete { .. } => false,
            // Results arrive later as a message
            Cmd::Analyze { .. } => false,
            Cmd::Batch(cmds) => cmds.iter().any(|c| c.needs_redraw()),
        }
    }
}
