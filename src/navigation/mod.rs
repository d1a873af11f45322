//! Caret & Selection Navigator
//!
//! Stateless functions over a [`FrameStore`](crate::store::FrameStore): every
//! transition is a pure function of the current position, the tree and the
//! requested direction. Requests with nowhere to go return `None`.

pub mod caret;
pub mod selection;

use std::fmt;

use serde::Serialize;

use crate::frame::{CaretPosition, FrameId};
use crate::slot::SlotId;

pub use caret::{adjacent_position, all_positions, caret_positions, is_valid_position};
pub use selection::{extend_selection, flat_children, flat_siblings, FrameSelection, SelectionStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Where the caret is: at a frame boundary or inside an editable slot unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum NavPosition {
    Frame {
        id: FrameId,
        caret: CaretPosition,
    },
    Slot {
        frame: FrameId,
        label: usize,
        slot: SlotId,
    },
}

impl NavPosition {
    pub fn body(id: FrameId) -> Self {
        NavPosition::Frame {
            id,
            caret: CaretPosition::Body,
        }
    }

    pub fn below(id: FrameId) -> Self {
        NavPosition::Frame {
            id,
            caret: CaretPosition::Below,
        }
    }

    /// Frame the position belongs to
    pub fn frame_id(&self) -> FrameId {
        match self {
            NavPosition::Frame { id, .. } => *id,
            NavPosition::Slot { frame, .. } => *frame,
        }
    }

    pub fn is_frame_level(&self) -> bool {
        matches!(self, NavPosition::Frame { .. })
    }
}

impl Default for NavPosition {
    fn default() -> Self {
        NavPosition::body(FrameId::IMPORTS)
    }
}

impl fmt::Display for NavPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavPosition::Frame {
                id,
                caret: CaretPosition::Body,
            } => write!(f, "body of {}", id),
            NavPosition::Frame {
                id,
                caret: CaretPosition::Below,
            } => write!(f, "below {}", id),
            NavPosition::Slot { frame, label, slot } => {
                write!(f, "slot {} of label {} in {}", slot, label, frame)
            }
        }
    }
}
