//! Frame selection
//!
//! Selection works on one *level* at a time: the structural children of a
//! parent with every joint chain spliced in right after its head (see
//! [`flat_children`]). A frame-level caret maps to a boundary in such a
//! level list, and extending the selection moves that boundary one unit up
//! or down while the other end stays anchored.
//!
//! Two shapes of selection exist:
//! - whole units: plain frames and chain heads together with their entire
//!   joint chain, so an `if` is never separated from its `elif`/`else`
//! - joint runs: consecutive joint frames of a single chain, without the head
//!
//! A step that would mix the two shapes is refused.

use serde::Serialize;

use super::{Direction, NavPosition};
use crate::frame::{CaretPosition, FrameId};
use crate::store::FrameStore;

/// Selected frames, in level order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameSelection {
    pub frames: Vec<FrameId>,
}

impl FrameSelection {
    pub fn new(frames: Vec<FrameId>) -> Self {
        Self { frames }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains(&id)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frames whose removal removes the whole selection: selected frames
    /// whose owner is not itself selected
    pub fn roots(&self, store: &FrameStore) -> Vec<FrameId> {
        self.frames
            .iter()
            .copied()
            .filter(|&id| {
                store
                    .get(id)
                    .and_then(|f| f.joint_parent)
                    .map_or(true, |head| !self.contains(head))
            })
            .collect()
    }
}

/// Result of a selection step: the new selection and where the caret went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStep {
    pub caret: NavPosition,
    pub selection: FrameSelection,
}

/// Children of `parent` with each joint chain spliced in after its head
pub fn flat_children(store: &FrameStore, parent: FrameId) -> Vec<FrameId> {
    let mut out = Vec::new();
    for &child in store.children_of(parent) {
        out.push(child);
        out.extend_from_slice(store.joints_of(child));
    }
    out
}

/// The level list `id` is part of
pub fn flat_siblings(store: &FrameStore, id: FrameId) -> Vec<FrameId> {
    store
        .level_parent(id)
        .map(|parent| flat_children(store, parent))
        .unwrap_or_default()
}

/// True when the selection is a run of joint frames without their head
pub fn is_joint_selection(store: &FrameStore, selection: &FrameSelection) -> bool {
    selection.frames.iter().any(|&id| {
        store
            .get(id)
            .and_then(|f| f.joint_parent)
            .is_some_and(|head| !selection.contains(head))
    })
}

/// Check that a selection has one of the two allowed shapes
pub fn is_valid_selection(store: &FrameStore, selection: &FrameSelection) -> bool {
    let Some(&first) = selection.frames.first() else {
        return true;
    };
    let Some(level) = Level::of(store, first) else {
        return false;
    };
    let Some(lo) = level.index_of(first) else {
        return false;
    };
    let hi = lo + selection.len();
    if level.list.get(lo..hi) != Some(selection.frames.as_slice()) {
        return false;
    }
    if is_joint_selection(store, selection) {
        let head = store.chain_head(first);
        selection.frames.iter().all(|&id| {
            store.get(id).and_then(|f| f.joint_parent) == Some(head)
        })
    } else {
        level.unit_start(lo) == lo && level.unit_end(hi - 1) == hi
    }
}

/// One level list and the parent it belongs to
struct Level<'s> {
    store: &'s FrameStore,
    parent: FrameId,
    list: Vec<FrameId>,
}

impl<'s> Level<'s> {
    fn new(store: &'s FrameStore, parent: FrameId) -> Self {
        Self {
            store,
            parent,
            list: flat_children(store, parent),
        }
    }

    fn of(store: &'s FrameStore, id: FrameId) -> Option<Self> {
        Some(Self::new(store, store.level_parent(id)?))
    }

    fn index_of(&self, id: FrameId) -> Option<usize> {
        self.list.iter().position(|&f| f == id)
    }

    fn is_joint(&self, index: usize) -> bool {
        self.list
            .get(index)
            .and_then(|&id| self.store.get(id))
            .is_some_and(|f| f.is_joint())
    }

    fn head_of(&self, index: usize) -> FrameId {
        self.store.chain_head(self.list[index])
    }

    /// Index of the head of the unit containing `index`
    fn unit_start(&self, index: usize) -> usize {
        let head = self.head_of(index);
        self.index_of(head).unwrap_or(index)
    }

    /// One past the last member of the unit containing `index`
    fn unit_end(&self, index: usize) -> usize {
        let head = self.head_of(index);
        let start = self.index_of(head).unwrap_or(index);
        start + 1 + self.store.joints_of(head).len()
    }

    /// Map a frame-level caret to a boundary in this level, if it lies here
    fn boundary_of(&self, caret: &NavPosition) -> Option<usize> {
        let NavPosition::Frame { id, caret: pos } = *caret else {
            return None;
        };
        match pos {
            CaretPosition::Body if id == self.parent => Some(0),
            CaretPosition::Body => {
                let index = self.index_of(id)?;
                self.is_joint(index).then_some(index)
            }
            CaretPosition::Below => {
                let index = self.index_of(id)?;
                if self.is_joint(index) {
                    Some(index + 1)
                } else {
                    Some(self.unit_end(index))
                }
            }
        }
    }

    /// Caret position standing for boundary `b` of this level
    fn caret_at(&self, b: usize) -> NavPosition {
        if b == 0 {
            return NavPosition::body(self.parent);
        }
        let before = self.list[b - 1];
        if self.is_joint(b) {
            // Inside a chain: above the next joint frame
            return if self.is_joint(b - 1) {
                NavPosition::below(before)
            } else {
                NavPosition::body(self.list[b])
            };
        }
        NavPosition::below(self.store.chain_head(before))
    }

    fn same_chain(&self, a: usize, b: usize) -> bool {
        self.is_joint(a) && self.is_joint(b) && self.head_of(a) == self.head_of(b)
    }
}

/// Level and boundary for a caret when nothing is selected yet
fn start_boundary<'s>(
    store: &'s FrameStore,
    caret: &NavPosition,
    direction: Direction,
) -> Option<(Level<'s>, usize)> {
    let NavPosition::Frame { id, caret: pos } = *caret else {
        return None;
    };
    let frame = store.get(id)?;
    match pos {
        CaretPosition::Body if direction == Direction::Up && frame.is_joint() => {
            let level = Level::of(store, id)?;
            let b = level.index_of(id)?;
            Some((level, b))
        }
        CaretPosition::Body => {
            if !frame.allows_children() {
                return None;
            }
            Some((Level::new(store, id), 0))
        }
        CaretPosition::Below => {
            if id.is_synthetic() {
                return None;
            }
            let level = Level::of(store, id)?;
            let b = level.boundary_of(caret)?;
            Some((level, b))
        }
    }
}

/// Extend (or shrink) the selection by one unit in `direction`. Returns the
/// new selection and caret, or `None` when the step is impossible: the
/// boundary is at the edge of its level, the caret is not at a frame-level
/// position, or the step would mix a joint run with whole units.
pub fn extend_selection(
    store: &FrameStore,
    caret: &NavPosition,
    selection: &FrameSelection,
    direction: Direction,
) -> Option<SelectionStep> {
    if !matches!(direction, Direction::Up | Direction::Down) {
        return None;
    }

    let (level, lo, hi, b) = if selection.is_empty() {
        let (level, b) = start_boundary(store, caret, direction)?;
        (level, b, b, b)
    } else {
        if !is_valid_selection(store, selection) {
            return None;
        }
        let level = Level::of(store, selection.frames[0])?;
        let lo = level.index_of(selection.frames[0])?;
        let hi = lo + selection.len();
        let b = level.boundary_of(caret)?;
        if b != lo && b != hi {
            return None;
        }
        (level, lo, hi, b)
    };
    let joint_run = !selection.is_empty() && is_joint_selection(store, selection);

    let (lo, hi, b) = if selection.is_empty() {
        match direction {
            Direction::Down => {
                if b >= level.list.len() {
                    return None;
                }
                let end = if level.is_joint(b) {
                    b + 1
                } else {
                    level.unit_end(b)
                };
                (b, end, end)
            }
            _ => {
                let y = b.checked_sub(1)?;
                if level.is_joint(y) && level.unit_end(y) != b {
                    (y, b, y)
                } else {
                    let start = level.unit_start(y);
                    (start, level.unit_end(y).max(b), start)
                }
            }
        }
    } else {
        match (direction, b == hi) {
            // Grow downwards
            (Direction::Down, true) => {
                if hi >= level.list.len() {
                    return None;
                }
                let end = if joint_run {
                    if !level.same_chain(hi, lo) {
                        return None;
                    }
                    hi + 1
                } else {
                    if level.is_joint(hi) {
                        return None;
                    }
                    level.unit_end(hi)
                };
                (lo, end, end)
            }
            // Shrink from the top
            (Direction::Down, false) => {
                let start = if joint_run { lo + 1 } else { level.unit_end(lo) };
                (start, hi, start)
            }
            // Grow upwards
            (_, false) => {
                let y = lo.checked_sub(1)?;
                let start = if joint_run {
                    if !level.same_chain(y, lo) {
                        return None;
                    }
                    y
                } else {
                    level.unit_start(y)
                };
                (start, hi, start)
            }
            // Shrink from the bottom
            (_, true) => {
                let end = if joint_run { hi - 1 } else { level.unit_start(hi - 1) };
                (lo, end, end)
            }
        }
    };

    let frames = if lo < hi {
        level.list[lo..hi].to_vec()
    } else {
        Vec::new()
    };
    Some(SelectionStep {
        caret: level.caret_at(b),
        selection: FrameSelection::new(frames),
    })
}

/// Mirror a selection into the frames' `selected` flags
pub fn apply_selection(store: &mut FrameStore, selection: &FrameSelection) {
    for frame in store.frames_mut() {
        frame.selected = selection.contains(frame.id);
    }
}
