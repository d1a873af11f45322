//! Frames: the typed nodes of the program tree
//!
//! Frames never own each other. Parent, child and joint relations are plain
//! [`FrameId`] references into the arena held by
//! [`FrameStore`](crate::store::FrameStore); a removed id simply stops
//! resolving.

pub mod definition;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::slot::{SlotId, SlotStructure};

pub use definition::{
    allowed_joint_successors, joint_may_follow, FrameType, FrameTypeDef, LabelDef,
};

/// Strongly typed frame identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub i64);

impl FrameId {
    /// Absolute root; parent of the three sections
    pub const ROOT: FrameId = FrameId(0);
    pub const IMPORTS: FrameId = FrameId(-1);
    pub const DEFS: FrameId = FrameId(-2);
    pub const MAIN: FrameId = FrameId(-3);

    pub const SECTIONS: [FrameId; 3] = [FrameId::IMPORTS, FrameId::DEFS, FrameId::MAIN];

    /// Root or one of the sections
    pub fn is_synthetic(self) -> bool {
        self.0 <= 0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing source of fresh frame identities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCounter {
    next: i64,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdCounter {
    pub fn starting_at(next: i64) -> Self {
        Self { next: next.max(1) }
    }

    pub fn next_id(&mut self) -> FrameId {
        let id = FrameId(self.next);
        self.next += 1;
        id
    }

    /// The id the next call to [`IdCounter::next_id`] will hand out
    pub fn peek(&self) -> FrameId {
        FrameId(self.next)
    }

    /// Never hand out `id` or anything below it
    pub fn reserve(&mut self, id: FrameId) {
        self.next = self.next.max(id.0 + 1);
    }
}

/// Where a frame-level caret sits relative to a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaretPosition {
    /// Inside the frame's body, before its first child
    Body,
    /// After the frame (and after its whole joint chain for heads)
    Below,
}

/// Which caret marker of a frame is currently shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaretVisibility {
    #[default]
    None,
    Body,
    Below,
}

impl From<CaretPosition> for CaretVisibility {
    fn from(pos: CaretPosition) -> Self {
        match pos {
            CaretPosition::Body => CaretVisibility::Body,
            CaretPosition::Below => CaretVisibility::Below,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapsedState {
    #[default]
    Visible,
    Collapsed,
}

impl CollapsedState {
    pub fn as_str(self) -> &'static str {
        match self {
            CollapsedState::Visible => "visible",
            CollapsedState::Collapsed => "collapsed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "visible" => Some(CollapsedState::Visible),
            "collapsed" => Some(CollapsedState::Collapsed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrozenState {
    #[default]
    Unfrozen,
    Frozen,
}

impl FrozenState {
    pub fn as_str(self) -> &'static str {
        match self {
            FrozenState::Unfrozen => "unfrozen",
            FrozenState::Frozen => "frozen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unfrozen" => Some(FrozenState::Unfrozen),
            "frozen" => Some(FrozenState::Frozen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotErrorKind {
    /// Required slot left empty (set and cleared by validation)
    EmptySlot,
    /// Reported by an external analyser
    External,
}

/// Error attached to one slot unit of a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotError {
    pub label: usize,
    pub slot: SlotId,
    pub kind: SlotErrorKind,
    pub message: String,
}

/// One node of the program tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub id: FrameId,
    pub frame_type: FrameType,
    /// Structural parent; `None` for joint frames and the root
    pub parent: Option<FrameId>,
    /// Head of the joint chain this frame belongs to
    pub joint_parent: Option<FrameId>,
    pub children: Vec<FrameId>,
    pub joint_children: Vec<FrameId>,
    /// Slot content per label index (only labels with a slot)
    pub labels: BTreeMap<usize, SlotStructure>,
    pub caret: CaretVisibility,
    pub selected: bool,
    pub disabled: bool,
    pub collapsed: CollapsedState,
    pub frozen: FrozenState,
    pub error: Option<String>,
    pub slot_errors: Vec<SlotError>,
}

impl Frame {
    /// A detached frame of `frame_type` with an empty structure per slot label
    pub fn new(id: FrameId, frame_type: FrameType) -> Self {
        let labels = frame_type
            .definition()
            .slot_labels()
            .map(|(index, _)| (index, SlotStructure::empty()))
            .collect();
        Self {
            id,
            frame_type,
            parent: None,
            joint_parent: None,
            children: Vec::new(),
            joint_children: Vec::new(),
            labels,
            caret: CaretVisibility::None,
            selected: false,
            disabled: false,
            collapsed: CollapsedState::Visible,
            frozen: FrozenState::Unfrozen,
            error: None,
            slot_errors: Vec::new(),
        }
    }

    pub fn definition(&self) -> &'static FrameTypeDef {
        self.frame_type.definition()
    }

    pub fn is_joint(&self) -> bool {
        self.joint_parent.is_some()
    }

    pub fn allows_children(&self) -> bool {
        self.frame_type.allows_children()
    }

    pub fn is_section(&self) -> bool {
        self.frame_type.is_section()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed == CollapsedState::Collapsed
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen == FrozenState::Frozen
    }

    /// Slots are reachable by the caret unless the frame is frozen or disabled
    pub fn slots_editable(&self) -> bool {
        !self.disabled && !self.is_frozen()
    }

    pub fn label(&self, index: usize) -> Option<&SlotStructure> {
        self.labels.get(&index)
    }

    pub fn has_slot_error(&self, label: usize, slot: &SlotId, kind: SlotErrorKind) -> bool {
        self.slot_errors
            .iter()
            .any(|e| e.label == label && &e.slot == slot && e.kind == kind)
    }

    /// True when the frame or any of its slots carries an error
    pub fn has_errors(&self) -> bool {
        self.error.is_some() || !self.slot_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_gets_one_structure_per_slot_label() {
        let frame = Frame::new(FrameId(5), FrameType::FuncDef);
        assert_eq!(frame.labels.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        let frame = Frame::new(FrameId(6), FrameType::Else);
        assert!(frame.labels.is_empty());
    }

    #[test]
    fn test_id_counter_is_monotonic() {
        let mut counter = IdCounter::default();
        assert_eq!(counter.next_id(), FrameId(1));
        assert_eq!(counter.next_id(), FrameId(2));
        assert_eq!(counter.peek(), FrameId(3));
        assert_eq!(IdCounter::starting_at(-4).peek(), FrameId(1));
    }

    #[test]
    fn test_synthetic_ids() {
        assert!(FrameId::ROOT.is_synthetic());
        assert!(FrameId::MAIN.is_synthetic());
        assert!(!FrameId(1).is_synthetic());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(CollapsedState::from_name("collapsed"), Some(CollapsedState::Collapsed));
        assert_eq!(FrozenState::from_name("frozen"), Some(FrozenState::Frozen));
        assert_eq!(FrozenState::from_name("melted"), None);
    }
}
