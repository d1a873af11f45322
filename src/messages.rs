//! Message types for the Elm-style architecture
//!
//! All state changes flow through these message types.

use std::path::PathBuf;

use crate::frame::{FrameId, FrameType};
use crate::navigation::{Direction, NavPosition};
use crate::slot::{SlotId, UnitClass};

/// Caret and selection messages
#[derive(Debug, Clone, PartialEq)]
pub enum CaretMsg {
    /// Move the caret one position (arrow keys)
    Move(Direction),
    /// Put the caret at a position (pointer click)
    SetPosition(NavPosition),
    /// Extend or shrink the frame selection (Shift+Up/Down)
    ExtendSelection(Direction),
    /// Drop the selection, keeping the caret
    ClearSelection,
}

/// Structural edits on frames
#[derive(Debug, Clone, PartialEq)]
pub enum FrameMsg {
    /// Add a frame of this type at the caret
    Add(FrameType),
    /// Delete the selected frames. Large deletions come back as a
    /// confirmation request unless `confirmed`.
    DeleteSelection { confirmed: bool },
    /// Delete the frame just above a frame-level caret (Backspace)
    DeleteBefore,
    Copy,
    Cut,
    /// Paste the clipboard at the caret
    Paste,
    /// Move the selection to the caret position
    MoveSelectionToCaret,
    /// Wrap the selection in a new block frame
    WrapSelection(FrameType),
    ToggleCollapsed(FrameId),
    ToggleFrozen(FrameId),
    ToggleDisabled(FrameId),
    Undo,
    Redo,
}

/// Slot content edits
#[derive(Debug, Clone, PartialEq)]
pub enum SlotMsg {
    /// Replace a whole label from text
    SetText {
        frame: FrameId,
        label: usize,
        text: String,
    },
    /// Replace the text of one slot unit
    SetUnitText {
        frame: FrameId,
        label: usize,
        slot: SlotId,
        class: UnitClass,
        text: String,
    },
}

/// Results coming back from an external analyser
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisMsg {
    /// Errors keyed by 0-based line of the last encoding
    LineErrors(Vec<(usize, String)>),
    SetFrameError { frame: FrameId, message: String },
    ClearFrameError(FrameId),
}

/// File and settings messages
#[derive(Debug, Clone, PartialEq)]
pub enum AppMsg {
    /// Save to the current path
    SaveFile,
    /// Save under a new path
    SaveFileAs(PathBuf),
    /// File save completed (async result)
    SaveCompleted(Result<(), String>),
    /// Start loading a file
    LoadFile(PathBuf),
    /// File read completed (async result)
    FileLoaded {
        path: PathBuf,
        result: Result<String, String>,
    },
    /// Start over with an empty program
    NewFile,
    /// Switch empty-slot checking on or off
    SetEmptySlotChecks(bool),
}

/// Top-level message type
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Caret(CaretMsg),
    Frame(FrameMsg),
    Slot(SlotMsg),
    Analysis(AnalysisMsg),
    App(AppMsg),
}

// Convenience constructors for common messages
impl Msg {
    pub fn move_caret(direction: Direction) -> Self {
        Msg::Caret(CaretMsg::Move(direction))
    }

    pub fn add_frame(ty: FrameType) -> Self {
        Msg::Frame(FrameMsg::Add(ty))
    }

    pub fn set_text(frame: FrameId, label: usize, text: impl Into<String>) -> Self {
        Msg::Slot(SlotMsg::SetText {
            frame,
            label,
            text: text.into(),
        })
    }
}
