//! Undo/redo history of whole-program snapshots
//!
//! Structural edits touch many frames at once, so each entry is a full copy
//! of the store together with the caret that went with it. The depth is
//! small and configurable.

use crate::navigation::NavPosition;
use crate::store::FrameStore;

pub const DEFAULT_UNDO_LIMIT: usize = 10;

/// One restorable program state
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub store: FrameStore,
    pub caret: NavPosition,
}

/// Undo/redo stacks of [`Snapshot`]s
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_UNDO_LIMIT)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Record the state before an edit (clears the redo stack)
    pub fn push(&mut self, snapshot: Snapshot) {
        self.redo_stack.clear();
        self.undo_stack.push(snapshot);
        self.trim();
    }

    /// Step back: `current` goes onto the redo stack and the previous state
    /// is returned
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        self.trim();
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.trim();
    }

    fn trim(&mut self) {
        if self.undo_stack.len() > self.max_size {
            let excess = self.undo_stack.len() - self.max_size;
            self.undo_stack.drain(..excess);
        }
    }
}
