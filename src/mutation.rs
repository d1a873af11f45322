//! Structural mutation operations
//!
//! Subtree removal, cloning, counting, moving, wrapping and pasting. Walks use
//! an explicit stack so arbitrarily deep trees cannot exhaust the call stack.
//! Multi-step operations run against a scratch copy of the store that is
//! swapped in only when every step succeeded.

use std::collections::{HashMap, HashSet};

use crate::frame::{
    joint_may_follow, CaretVisibility, Frame, FrameId, FrameType, IdCounter, SlotErrorKind,
};
use crate::store::{FrameStore, InsertTarget};

/// Post-order list of a subtree: children, then joint frames, then the frame
fn post_order(store: &FrameStore, root: FrameId) -> Vec<FrameId> {
    let mut out = Vec::new();
    let mut stack = vec![(root, false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            out.push(id);
            continue;
        }
        stack.push((id, true));
        if let Some(frame) = store.get(id) {
            // Reversed so children are emitted before joint frames, in order
            for &joint in frame.joint_children.iter().rev() {
                stack.push((joint, false));
            }
            for &child in frame.children.iter().rev() {
                stack.push((child, false));
            }
        }
    }
    out
}

/// Whether `id` can leave its joint chain without the frames on either side
/// breaking the successor rules. Frames outside a chain can always leave.
fn chain_survives_removal(store: &FrameStore, id: FrameId) -> bool {
    let Some(head) = store.get(id).and_then(|f| f.joint_parent) else {
        return true;
    };
    let Some(head_type) = store.frame_type(head) else {
        return false;
    };
    let chain = store.joints_of(head);
    let Some(pos) = chain.iter().position(|&j| j == id) else {
        return false;
    };
    let prev = pos.checked_sub(1).and_then(|i| store.frame_type(chain[i]));
    match chain.get(pos + 1).and_then(|&j| store.frame_type(j)) {
        Some(next) => joint_may_follow(head_type, prev, next),
        None => true,
    }
}

/// Drop a linked subtree without any checks
fn detach_subtree(store: &mut FrameStore, id: FrameId) -> usize {
    let doomed = post_order(store, id);
    store.unlink(id);
    for &frame_id in &doomed {
        store.take(frame_id);
    }
    doomed.len()
}

/// Remove a frame and everything it owns. Returns the number of frames
/// removed, or `None` for unknown or synthetic ids and for joint frames whose
/// chain would be left out of order (an `except` between `try` and `else`).
pub fn remove_subtree(store: &mut FrameStore, id: FrameId) -> Option<usize> {
    if id.is_synthetic() || !store.contains(id) {
        return None;
    }
    if !chain_survives_removal(store, id) {
        tracing::trace!(frame_id = %id, "removal would break its joint chain");
        return None;
    }
    let removed = detach_subtree(store, id);
    tracing::debug!(frame_id = %id, removed, "removed subtree");
    Some(removed)
}

/// Remove several frames as one edit; ids already gone (for example because
/// an earlier id owned them) are skipped. Joint frames are retried until the
/// remaining chains allow them to go, so `[except, else]` out of
/// `try/except/else/finally` succeeds. Returns the total number of frames
/// removed, or 0 with the store untouched when some frame cannot go.
pub fn remove_frames(store: &mut FrameStore, ids: &[FrameId]) -> usize {
    let mut scratch = store.clone();
    let mut pending: Vec<FrameId> = ids.to_vec();
    let mut removed = 0;
    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|&id| {
            if !scratch.contains(id) {
                return false;
            }
            match remove_subtree(&mut scratch, id) {
                Some(n) => {
                    removed += n;
                    false
                }
                None => true,
            }
        });
        if pending.len() == before {
            return 0;
        }
    }
    *store = scratch;
    removed
}

/// Count transitive children and joint frames of `id` (excluding `id`).
/// With a threshold the walk stops as soon as the count reaches it, so the
/// result is only exact when it stays below the threshold.
pub fn count_descendants(store: &FrameStore, id: FrameId, threshold: Option<usize>) -> usize {
    let mut count = 0;
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        let Some(frame) = store.get(current) else {
            continue;
        };
        for &next in frame.children.iter().chain(&frame.joint_children) {
            count += 1;
            if threshold.is_some_and(|t| count >= t) {
                return count;
            }
            stack.push(next);
        }
    }
    count
}

/// A detached deep copy of a subtree with fresh identities
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedSubtree {
    pub root: FrameId,
    /// Pre-order: the root first
    pub frames: Vec<Frame>,
}

impl ClonedSubtree {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn root_frame(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Clone again with identities from `counter`
    pub fn reclone(&self, counter: &mut IdCounter) -> Option<ClonedSubtree> {
        let by_id: HashMap<FrameId, &Frame> = self.frames.iter().map(|f| (f.id, f)).collect();
        clone_with(|id| by_id.get(&id).copied(), self.root, counter)
    }
}

/// Deep-copy the subtree at `id`, drawing fresh ids from `counter`. Child and
/// joint references are remapped, caret and selection state are reset, and
/// stale externally reported errors are dropped.
pub fn clone_subtree(
    store: &FrameStore,
    id: FrameId,
    counter: &mut IdCounter,
) -> Option<ClonedSubtree> {
    if id.is_synthetic() {
        return None;
    }
    clone_with(|i| store.get(i), id, counter)
}

fn clone_with<'a>(
    lookup: impl Fn(FrameId) -> Option<&'a Frame>,
    root: FrameId,
    counter: &mut IdCounter,
) -> Option<ClonedSubtree> {
    lookup(root)?;

    // Pre-order walk assigning new ids
    let mut order = Vec::new();
    let mut remap = HashMap::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let frame = lookup(id)?;
        remap.insert(id, counter.next_id());
        order.push(frame);
        for &joint in frame.joint_children.iter().rev() {
            stack.push(joint);
        }
        for &child in frame.children.iter().rev() {
            stack.push(child);
        }
    }

    let map = |id: &FrameId| remap.get(id).copied();
    let frames = order
        .into_iter()
        .map(|original| {
            let mut copy = original.clone();
            copy.id = remap[&original.id];
            copy.children = copy.children.iter().filter_map(map).collect();
            copy.joint_children = copy.joint_children.iter().filter_map(map).collect();
            if original.id == root {
                copy.parent = None;
                copy.joint_parent = None;
            } else {
                copy.parent = copy.parent.as_ref().and_then(map);
                copy.joint_parent = copy.joint_parent.as_ref().and_then(map);
            }
            copy.caret = CaretVisibility::None;
            copy.selected = false;
            copy.error = None;
            copy.slot_errors.retain(|e| e.kind == SlotErrorKind::EmptySlot);
            copy
        })
        .collect::<Vec<_>>();

    Some(ClonedSubtree {
        root: remap[&root],
        frames,
    })
}

/// Link a cloned subtree into the store at `target`
pub fn attach_subtree(
    store: &mut FrameStore,
    subtree: ClonedSubtree,
    target: InsertTarget,
) -> Option<FrameId> {
    let root_type = subtree.root_frame()?.frame_type;
    if !store.accepts(target, root_type) {
        tracing::trace!(?target, frame_type = root_type.name(), "attach rejected");
        return None;
    }
    if subtree.frames.iter().any(|f| store.contains(f.id)) {
        return None;
    }

    let root = subtree.root;
    let max_id = subtree.frames.iter().map(|f| f.id).max();
    let mut frames = subtree.frames.into_iter();
    let root_frame = frames.next()?;
    for frame in frames {
        store.insert_unlinked(frame);
    }
    store.link(root_frame, target);
    if !store.placement_holds(root) {
        tracing::trace!(frame_id = %root, ?target, "attached frames not allowed here");
        detach_subtree(store, root);
        return None;
    }
    if let Some(max) = max_id {
        store.counter_mut().reserve(max);
    }
    Some(root)
}

/// Frames copied for a later paste, detached from any store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    subtrees: Vec<ClonedSubtree>,
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }

    /// Number of copied top-level frames
    pub fn len(&self) -> usize {
        self.subtrees.len()
    }

    pub fn frame_count(&self) -> usize {
        self.subtrees.iter().map(ClonedSubtree::len).sum()
    }

    /// Type of the first copied frame, which decides where a paste can go
    pub fn first_type(&self) -> Option<FrameType> {
        self.subtrees
            .first()
            .and_then(ClonedSubtree::root_frame)
            .map(|f| f.frame_type)
    }
}

/// Snapshot the subtrees at `ids` into a clipboard
pub fn copy_subtrees(store: &FrameStore, ids: &[FrameId]) -> Option<Clipboard> {
    if ids.is_empty() {
        return None;
    }
    let mut scratch_ids = IdCounter::default();
    let subtrees = ids
        .iter()
        .map(|&id| clone_subtree(store, id, &mut scratch_ids))
        .collect::<Option<Vec<_>>>()?;
    Some(Clipboard { subtrees })
}

fn offset(target: InsertTarget, by: usize) -> InsertTarget {
    match target {
        InsertTarget::Child { parent, index } => InsertTarget::Child {
            parent,
            index: index + by,
        },
        InsertTarget::Joint { head, index } => InsertTarget::Joint {
            head,
            index: index + by,
        },
    }
}

/// Paste fresh copies of the clipboard at `target`, in order. Either every
/// subtree is pasted or the store is left unchanged.
pub fn paste_subtrees(
    store: &mut FrameStore,
    clipboard: &Clipboard,
    target: InsertTarget,
) -> Option<Vec<FrameId>> {
    if clipboard.is_empty() {
        return None;
    }
    let mut scratch = store.clone();
    let mut pasted = Vec::with_capacity(clipboard.len());
    for (i, subtree) in clipboard.subtrees.iter().enumerate() {
        let fresh = subtree.reclone(scratch.counter_mut())?;
        pasted.push(attach_subtree(&mut scratch, fresh, offset(target, i))?);
    }
    *store = scratch;
    tracing::debug!(frames = pasted.len(), ?target, "pasted subtrees");
    Some(pasted)
}

/// Container whose list `target` points into
fn target_container(target: InsertTarget) -> FrameId {
    match target {
        InsertTarget::Child { parent, .. } => parent,
        InsertTarget::Joint { head, .. } => head,
    }
}

/// Move frames (with their subtrees) to `target`, keeping their identities.
/// `target` indexes the destination list as it is before the move. Rejected
/// as a whole when a frame is not accepted there or the destination lies
/// inside one of the moved subtrees.
pub fn move_frames(store: &mut FrameStore, ids: &[FrameId], target: InsertTarget) -> bool {
    if ids.is_empty() || ids.iter().any(|id| id.is_synthetic() || !store.contains(*id)) {
        return false;
    }
    let moving: HashSet<FrameId> = ids.iter().copied().collect();
    if moving.len() != ids.len() {
        return false;
    }
    let container = target_container(target);
    if ids.iter().any(|&id| store.is_ancestor_or_self(id, container)) {
        return false;
    }

    let (list, index) = match target {
        InsertTarget::Child { parent, index } => (store.children_of(parent), index),
        InsertTarget::Joint { head, index } => (store.joints_of(head), index),
    };
    if index > list.len() {
        return false;
    }
    let anchor = list[..index].iter().filter(|id| !moving.contains(id)).count();

    let source_heads: Vec<FrameId> = ids
        .iter()
        .filter_map(|&id| store.get(id).and_then(|f| f.joint_parent))
        .collect();

    let mut scratch = store.clone();
    let mut detached = Vec::with_capacity(ids.len());
    for &id in ids {
        scratch.unlink(id);
        let Some(frame) = scratch.take(id) else {
            return false;
        };
        detached.push(frame);
    }
    for (i, frame) in detached.into_iter().enumerate() {
        let at = offset(target_at(target, anchor), i);
        if !scratch.accepts(at, frame.frame_type) {
            tracing::trace!(frame_id = %frame.id, ?at, "move rejected");
            return false;
        }
        scratch.link(frame, at);
    }
    let chains_hold = source_heads
        .iter()
        .all(|&head| !scratch.contains(head) || scratch.chain_holds(head));
    if !chains_hold || !ids.iter().all(|&id| scratch.placement_holds(id)) {
        tracing::trace!(?target, "move would leave frames out of place");
        return false;
    }
    *store = scratch;
    tracing::debug!(frames = ids.len(), ?target, "moved frames");
    true
}

fn target_at(target: InsertTarget, index: usize) -> InsertTarget {
    match target {
        InsertTarget::Child { parent, .. } => InsertTarget::Child { parent, index },
        InsertTarget::Joint { head, .. } => InsertTarget::Joint { head, index },
    }
}

/// Wrap a contiguous run of sibling frames in a new block frame of type
/// `ty`, placed where the first frame was. Returns the new frame.
pub fn wrap_frames(
    store: &mut FrameStore,
    ids: &[FrameId],
    ty: FrameType,
) -> Option<FrameId> {
    let first = *ids.first()?;
    if !ty.allows_children() || ty.is_joint() {
        return None;
    }
    let InsertTarget::Child { parent, index } = store.location(first)? else {
        return None;
    };
    let siblings = store.children_of(parent);
    if siblings.get(index..index + ids.len())? != ids {
        return None;
    }

    let mut scratch = store.clone();
    let wrapper = scratch.add_frame(InsertTarget::Child { parent, index }, ty)?;
    if !move_frames(
        &mut scratch,
        ids,
        InsertTarget::Child {
            parent: wrapper,
            index: 0,
        },
    ) {
        return None;
    }
    *store = scratch;
    tracing::debug!(frame_id = %wrapper, wrapped = ids.len(), "wrapped frames");
    Some(wrapper)
}
