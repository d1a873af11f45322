//! Per-slot error annotation
//!
//! Local, per-frame checks for required slots left empty, plus the entry
//! points an external analyser uses to attach its own errors to frames.

use std::collections::BTreeMap;

use crate::frame::{FrameId, SlotError, SlotErrorKind};
use crate::slot::{for_each_unit, FlatUnitKind, SlotId};
use crate::store::FrameStore;

pub const EMPTY_SLOT_MESSAGE: &str = "Empty slot";

/// Empty-slot errors a frame should carry, computed from its labels
fn empty_slot_errors(store: &FrameStore, id: FrameId) -> Vec<SlotError> {
    let Some(frame) = store.get(id) else {
        return Vec::new();
    };
    let mut errors = Vec::new();
    for (label, def) in frame.definition().slot_labels() {
        if def.optional || def.raw_text {
            continue;
        }
        let Some(structure) = frame.label(label) else {
            continue;
        };
        // A populated sibling field makes the remaining empty atoms acceptable
        if structure.fields.iter().any(|f| f.is_populated()) {
            continue;
        }
        for_each_unit(structure, &SlotId::root(), |unit| {
            if unit.id.depth() == 1 && unit.kind == FlatUnitKind::Code && unit.text.trim().is_empty()
            {
                errors.push(SlotError {
                    label,
                    slot: unit.id,
                    kind: SlotErrorKind::EmptySlot,
                    message: EMPTY_SLOT_MESSAGE.to_string(),
                });
            }
        });
    }
    errors
}

/// Recompute the empty-slot errors of one frame. Errors of other kinds are
/// left alone. Returns true when the frame's errors changed.
pub fn validate_frame(store: &mut FrameStore, id: FrameId) -> bool {
    let fresh = empty_slot_errors(store, id);
    let Some(frame) = store.get_mut(id) else {
        return false;
    };
    let stale: Vec<&SlotError> = frame
        .slot_errors
        .iter()
        .filter(|e| e.kind == SlotErrorKind::EmptySlot)
        .collect();
    if stale.len() == fresh.len() && stale.iter().zip(&fresh).all(|(a, b)| *a == b) {
        return false;
    }
    frame
        .slot_errors
        .retain(|e| e.kind != SlotErrorKind::EmptySlot);
    frame.slot_errors.extend(fresh);
    tracing::trace!(frame_id = %id, errors = frame.slot_errors.len(), "slot errors updated");
    true
}

/// Validate every frame; returns how many frames changed
pub fn validate_all(store: &mut FrameStore) -> usize {
    let ids: Vec<FrameId> = store.frames().map(|f| f.id).collect();
    ids.into_iter()
        .filter(|&id| validate_frame(store, id))
        .count()
}

/// Drop every empty-slot error, used when the check is switched off
pub fn clear_empty_slot_errors(store: &mut FrameStore) {
    for frame in store.frames_mut() {
        frame
            .slot_errors
            .retain(|e| e.kind != SlotErrorKind::EmptySlot);
    }
}

/// Ordered mapping from a 0-based source line to the frame that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFrameMap(BTreeMap<usize, FrameId>);

impl LineFrameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, line: usize, frame: FrameId) {
        self.0.insert(line, frame);
    }

    pub fn frame_at(&self, line: usize) -> Option<FrameId> {
        self.0.get(&line).copied()
    }

    /// First line a frame was written to
    pub fn line_of(&self, frame: FrameId) -> Option<usize> {
        self.0
            .iter()
            .find_map(|(&line, &f)| (f == frame).then_some(line))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, FrameId)> + '_ {
        self.0.iter().map(|(&line, &frame)| (line, frame))
    }
}

/// Set the error text of a frame; `false` when the frame no longer exists
pub fn set_frame_error(store: &mut FrameStore, id: FrameId, message: impl Into<String>) -> bool {
    match store.get_mut(id) {
        Some(frame) => {
            frame.error = Some(message.into());
            true
        }
        None => false,
    }
}

pub fn clear_frame_error(store: &mut FrameStore, id: FrameId) -> bool {
    match store.get_mut(id) {
        Some(frame) => {
            frame.error = None;
            true
        }
        None => false,
    }
}

/// Attach an analyser error to one slot unit of a frame
pub fn set_slot_error(
    store: &mut FrameStore,
    id: FrameId,
    label: usize,
    slot: SlotId,
    message: impl Into<String>,
) -> bool {
    let Some(frame) = store.get_mut(id) else {
        return false;
    };
    if !frame.labels.contains_key(&label) {
        return false;
    }
    frame.slot_errors.push(SlotError {
        label,
        slot,
        kind: SlotErrorKind::External,
        message: message.into(),
    });
    true
}

/// Replace analyser errors using a line map. Previous frame errors are
/// cleared first; several errors on one frame are joined by newlines. Lines
/// without a frame and frames that no longer exist are skipped. Returns the
/// number of errors attached.
pub fn apply_line_errors(
    store: &mut FrameStore,
    map: &LineFrameMap,
    errors: &[(usize, String)],
) -> usize {
    for frame in store.frames_mut() {
        frame.error = None;
        frame.slot_errors.retain(|e| e.kind != SlotErrorKind::External);
    }

    let mut applied = 0;
    for (line, message) in errors {
        let Some(id) = map.frame_at(*line) else {
            tracing::debug!(line, "error on unmapped line ignored");
            continue;
        };
        let Some(frame) = store.get_mut(id) else {
            continue;
        };
        frame.error = Some(match frame.error.take() {
            Some(existing) => format!("{}\n{}", existing, message),
            None => message.clone(),
        });
        applied += 1;
    }
    applied
}
