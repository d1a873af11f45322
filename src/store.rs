//! Frame Tree Store: the arena owning every frame of one program
//!
//! All structural requests are checked before anything changes. A request the
//! tree cannot honour (unknown id, forbidden placement, broken joint chain)
//! is absorbed and reported as `None`/`false`.

use std::collections::{HashMap, HashSet};

use crate::frame::{
    joint_may_follow, CaretPosition, CollapsedState, Frame, FrameId, FrameType, FrozenState,
    IdCounter,
};
use crate::slot::{text, FieldSlot, ResolvedSlot, SlotId, SlotStructure, UnitClass};
use crate::validation;

/// A position in one of the two ordered lists a frame can live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertTarget {
    /// Index into `parent.children`
    Child { parent: FrameId, index: usize },
    /// Index into `head.joint_children`
    Joint { head: FrameId, index: usize },
}

/// One step of a drag-and-drop reorder, in terms of children lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrderOp {
    /// An existing frame (detached earlier in the same batch) lands here
    Added {
        parent: FrameId,
        new_index: usize,
        frame: FrameId,
    },
    Removed {
        parent: FrameId,
        old_index: usize,
    },
    Moved {
        parent: FrameId,
        old_index: usize,
        new_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameStore {
    frames: HashMap<FrameId, Frame>,
    counter: IdCounter,
    empty_slot_checks: bool,
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStore {
    /// An empty program: the root and its three sections
    pub fn new() -> Self {
        let mut frames = HashMap::new();

        let mut root = Frame::new(FrameId::ROOT, FrameType::Root);
        root.children = FrameId::SECTIONS.to_vec();
        frames.insert(FrameId::ROOT, root);

        for (id, ty) in [
            (FrameId::IMPORTS, FrameType::ImportsSection),
            (FrameId::DEFS, FrameType::DefsSection),
            (FrameId::MAIN, FrameType::MainSection),
        ] {
            let mut section = Frame::new(id, ty);
            section.parent = Some(FrameId::ROOT);
            frames.insert(id, section);
        }

        Self {
            frames,
            counter: IdCounter::default(),
            empty_slot_checks: true,
        }
    }

    // ==================== Lookup ====================

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(&id)
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains_key(&id)
    }

    /// Number of frames including the root and sections
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_frame_count() == 0
    }

    /// Number of frames a user created
    pub fn user_frame_count(&self) -> usize {
        self.frames.len() - 1 - FrameId::SECTIONS.len()
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    pub(crate) fn frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.values_mut()
    }

    pub fn children_of(&self, id: FrameId) -> &[FrameId] {
        self.get(id).map_or(&[], |f| f.children.as_slice())
    }

    pub fn joints_of(&self, id: FrameId) -> &[FrameId] {
        self.get(id).map_or(&[], |f| f.joint_children.as_slice())
    }

    pub fn frame_type(&self, id: FrameId) -> Option<FrameType> {
        self.get(id).map(|f| f.frame_type)
    }

    pub fn counter(&self) -> IdCounter {
        self.counter
    }

    pub(crate) fn counter_mut(&mut self) -> &mut IdCounter {
        &mut self.counter
    }

    /// Whether [`FrameStore::set_slot`] re-runs empty-slot validation
    pub fn set_empty_slot_checks(&mut self, enabled: bool) {
        self.empty_slot_checks = enabled;
    }

    pub fn empty_slot_checks(&self) -> bool {
        self.empty_slot_checks
    }

    // ==================== Relations ====================

    /// Head of the chain `id` belongs to; `id` itself for non-joint frames
    pub fn chain_head(&self, id: FrameId) -> FrameId {
        self.get(id).and_then(|f| f.joint_parent).unwrap_or(id)
    }

    /// Parent of the level `id` is displayed at: the structural parent, or
    /// the head's parent for joint frames
    pub fn level_parent(&self, id: FrameId) -> Option<FrameId> {
        let frame = self.get(id)?;
        match frame.joint_parent {
            Some(head) => self.get(head)?.parent,
            None => frame.parent,
        }
    }

    /// Current location of a frame in its owning list
    pub fn location(&self, id: FrameId) -> Option<InsertTarget> {
        let frame = self.get(id)?;
        if let Some(head) = frame.joint_parent {
            let index = self.joints_of(head).iter().position(|&j| j == id)?;
            Some(InsertTarget::Joint { head, index })
        } else {
            let parent = frame.parent?;
            let index = self.children_of(parent).iter().position(|&c| c == id)?;
            Some(InsertTarget::Child { parent, index })
        }
    }

    /// Structural or joint owner of a frame
    pub fn owner(&self, id: FrameId) -> Option<FrameId> {
        let frame = self.get(id)?;
        frame.joint_parent.or(frame.parent)
    }

    /// True when `ancestor` is `id` or owns it through any chain of
    /// child/joint links
    pub fn is_ancestor_or_self(&self, ancestor: FrameId, id: FrameId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.owner(c);
        }
        false
    }

    /// Frame types of the containers enclosing a body, innermost first.
    /// Chain heads are skipped when climbing out of a joint frame's body.
    fn enclosing_types(&self, container: FrameId) -> impl Iterator<Item = FrameType> + '_ {
        let mut current = Some(container);
        std::iter::from_fn(move || {
            let frame = self.get(current?)?;
            current = match frame.joint_parent {
                Some(head) => self.get(head).and_then(|h| h.parent),
                None => frame.parent,
            };
            Some(frame.frame_type)
        })
    }

    // ==================== Placement rules ====================

    /// Whether a frame of type `ty` may become a structural child of `container`
    pub fn accepts_child(&self, container: FrameId, ty: FrameType) -> bool {
        let Some(frame) = self.get(container) else {
            return false;
        };
        if !frame.allows_children() || !ty.placeable_in(frame.frame_type) {
            return false;
        }
        match ty {
            FrameType::Break | FrameType::Continue => self
                .enclosing_types(container)
                .find(|t| matches!(t, FrameType::For | FrameType::While | FrameType::FuncDef))
                .is_some_and(|t| t != FrameType::FuncDef),
            FrameType::Return => self
                .enclosing_types(container)
                .any(|t| t == FrameType::FuncDef),
            _ => true,
        }
    }

    /// Whether a joint frame of type `ty` may be inserted at `index` of
    /// `head`'s chain, given both its predecessor and its successor
    pub fn accepts_joint(&self, head: FrameId, index: usize, ty: FrameType) -> bool {
        let Some(head_frame) = self.get(head) else {
            return false;
        };
        if head_frame.is_joint() || !ty.is_joint() {
            return false;
        }
        let chain = &head_frame.joint_children;
        if index > chain.len() {
            return false;
        }
        let prev = index
            .checked_sub(1)
            .and_then(|i| self.frame_type(chain[i]));
        let next = chain.get(index).and_then(|&j| self.frame_type(j));
        joint_may_follow(head_frame.frame_type, prev, ty)
            && next.map_or(true, |n| joint_may_follow(head_frame.frame_type, Some(ty), n))
    }

    /// Whether every frame of the subtree at `root` sits where its type is
    /// allowed. A `return` moved out of its function fails here even though
    /// its own parent never changed.
    pub fn placement_holds(&self, root: FrameId) -> bool {
        let Some(frame) = self.get(root) else {
            return false;
        };
        if let Some(parent) = frame.parent {
            if !self.accepts_child(parent, frame.frame_type) {
                return false;
            }
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(frame) = self.get(id) else {
                return false;
            };
            for &child in &frame.children {
                match self.frame_type(child) {
                    Some(ty) if self.accepts_child(id, ty) => stack.push(child),
                    _ => return false,
                }
            }
            stack.extend(&frame.joint_children);
        }
        true
    }

    /// Whether `head`'s joint chain follows the successor rules
    pub fn chain_holds(&self, head: FrameId) -> bool {
        let Some(frame) = self.get(head) else {
            return false;
        };
        let mut prev = None;
        for &joint in &frame.joint_children {
            let Some(ty) = self.frame_type(joint) else {
                return false;
            };
            if !joint_may_follow(frame.frame_type, prev, ty) {
                return false;
            }
            prev = Some(ty);
        }
        true
    }

    /// Whether a frame of type `ty` fits at `target`
    pub fn accepts(&self, target: InsertTarget, ty: FrameType) -> bool {
        match target {
            InsertTarget::Child { parent, index } => {
                index <= self.children_of(parent).len() && self.accepts_child(parent, ty)
            }
            InsertTarget::Joint { head, index } => self.accepts_joint(head, index, ty),
        }
    }

    // ==================== Adding ====================

    /// Create a new frame of type `ty` at `target`
    pub fn add_frame(&mut self, target: InsertTarget, ty: FrameType) -> Option<FrameId> {
        if !self.accepts(target, ty) {
            tracing::trace!(?target, frame_type = ty.name(), "add rejected");
            return None;
        }
        let id = self.counter.next_id();
        self.link(Frame::new(id, ty), target);
        if self.empty_slot_checks {
            validation::validate_frame(self, id);
        }
        tracing::debug!(frame_id = %id, frame_type = ty.name(), ?target, "added frame");
        Some(id)
    }

    /// Where a new frame of type `ty` goes for a caret at `pos` of `anchor`
    pub fn target_for_caret(
        &self,
        anchor: FrameId,
        pos: CaretPosition,
        ty: FrameType,
    ) -> Option<InsertTarget> {
        let frame = self.get(anchor)?;

        if ty.is_joint() {
            if frame.is_section() {
                return None;
            }
            let target = match frame.joint_parent {
                Some(head) => {
                    let index = self.joints_of(head).iter().position(|&j| j == anchor)?;
                    InsertTarget::Joint {
                        head,
                        index: index + 1,
                    }
                }
                None if pos == CaretPosition::Body => InsertTarget::Joint {
                    head: anchor,
                    index: 0,
                },
                None => InsertTarget::Joint {
                    head: anchor,
                    index: frame.joint_children.len(),
                },
            };
            return self.accepts(target, ty).then_some(target);
        }

        let target = match pos {
            CaretPosition::Body => InsertTarget::Child {
                parent: anchor,
                index: 0,
            },
            CaretPosition::Below => {
                if anchor.is_synthetic() {
                    return None;
                }
                let head = self.chain_head(anchor);
                match self.location(head)? {
                    InsertTarget::Child { parent, index } => InsertTarget::Child {
                        parent,
                        index: index + 1,
                    },
                    InsertTarget::Joint { .. } => return None,
                }
            }
        };
        self.accepts(target, ty).then_some(target)
    }

    /// Add a frame relative to a frame-level caret. Body inserts as the first
    /// child (or first joint frame when `ty` is a joint type); Below inserts
    /// after the anchor's chain (or right after the anchor inside a chain).
    pub fn add_frame_at_caret(
        &mut self,
        anchor: FrameId,
        pos: CaretPosition,
        ty: FrameType,
    ) -> Option<FrameId> {
        let target = self.target_for_caret(anchor, pos, ty)?;
        self.add_frame(target, ty)
    }

    /// Insert an already-populated frame map entry and link it at `target`.
    /// Callers have validated the placement.
    pub(crate) fn link(&mut self, mut frame: Frame, target: InsertTarget) {
        let id = frame.id;
        match target {
            InsertTarget::Child { parent, index } => {
                frame.parent = Some(parent);
                frame.joint_parent = None;
                self.frames.insert(id, frame);
                if let Some(p) = self.frames.get_mut(&parent) {
                    let index = index.min(p.children.len());
                    p.children.insert(index, id);
                }
            }
            InsertTarget::Joint { head, index } => {
                frame.parent = None;
                frame.joint_parent = Some(head);
                self.frames.insert(id, frame);
                if let Some(h) = self.frames.get_mut(&head) {
                    let index = index.min(h.joint_children.len());
                    h.joint_children.insert(index, id);
                }
            }
        }
    }

    /// Put a frame into the map without linking it anywhere
    pub(crate) fn insert_unlinked(&mut self, frame: Frame) {
        self.frames.insert(frame.id, frame);
    }

    /// Detach a frame from its owning list, keeping it in the map
    pub(crate) fn unlink(&mut self, id: FrameId) -> Option<InsertTarget> {
        let location = self.location(id)?;
        match location {
            InsertTarget::Child { parent, index } => {
                if let Some(p) = self.frames.get_mut(&parent) {
                    p.children.remove(index);
                }
            }
            InsertTarget::Joint { head, index } => {
                if let Some(h) = self.frames.get_mut(&head) {
                    h.joint_children.remove(index);
                }
            }
        }
        if let Some(frame) = self.frames.get_mut(&id) {
            frame.parent = None;
            frame.joint_parent = None;
        }
        Some(location)
    }

    pub(crate) fn take(&mut self, id: FrameId) -> Option<Frame> {
        self.frames.remove(&id)
    }

    // ==================== Removing and reordering ====================

    /// Remove a frame with all of its descendants and joint frames.
    /// Returns the number of frames removed; unknown ids return `None`.
    pub fn remove_frame(&mut self, id: FrameId) -> Option<usize> {
        crate::mutation::remove_subtree(self, id)
    }

    /// Apply a batch of drag-and-drop list operations atomically. The batch
    /// is simulated first; it is committed only if every touched frame ends
    /// up in exactly one children list at an acceptable place.
    pub fn apply_order_ops(&mut self, ops: &[FrameOrderOp]) -> bool {
        let mut scratch: HashMap<FrameId, Vec<FrameId>> = HashMap::new();
        let mut touched: Vec<FrameId> = Vec::new();

        for op in ops {
            let parent = match *op {
                FrameOrderOp::Added { parent, .. }
                | FrameOrderOp::Removed { parent, .. }
                | FrameOrderOp::Moved { parent, .. } => parent,
            };
            if !self.contains(parent) {
                return false;
            }
            let list = scratch
                .entry(parent)
                .or_insert_with(|| self.children_of(parent).to_vec());

            match *op {
                FrameOrderOp::Removed { old_index, .. } => {
                    if old_index >= list.len() {
                        return false;
                    }
                    touched.push(list.remove(old_index));
                }
                FrameOrderOp::Added {
                    new_index, frame, ..
                } => {
                    if new_index > list.len() {
                        return false;
                    }
                    list.insert(new_index, frame);
                    touched.push(frame);
                }
                FrameOrderOp::Moved {
                    old_index,
                    new_index,
                    ..
                } => {
                    if old_index >= list.len() {
                        return false;
                    }
                    let frame = list.remove(old_index);
                    if new_index > list.len() {
                        return false;
                    }
                    list.insert(new_index, frame);
                    touched.push(frame);
                }
            }
        }

        let mut reparented = Vec::new();
        for &frame_id in &touched {
            let Some(frame) = self.get(frame_id) else {
                return false;
            };
            if frame.is_joint() || frame_id.is_synthetic() {
                return false;
            }

            let mut homes = scratch
                .iter()
                .filter(|(_, list)| list.contains(&frame_id))
                .map(|(&parent, list)| (parent, list.iter().filter(|&&c| c == frame_id).count()));
            let Some((new_parent, occurrences)) = homes.next() else {
                // Detached and never re-added, or still owned by an untouched list
                let stays_home = frame.parent.is_some_and(|p| !scratch.contains_key(&p));
                if stays_home {
                    continue;
                }
                return false;
            };
            if occurrences != 1 || homes.next().is_some() {
                return false;
            }
            if let Some(old_parent) = frame.parent {
                if old_parent != new_parent
                    && !scratch.contains_key(&old_parent)
                    && self.children_of(old_parent).contains(&frame_id)
                {
                    return false;
                }
            }
            if frame.parent != Some(new_parent) {
                reparented.push(frame_id);
            }
        }

        // Ancestry and placement are judged on the tree after the batch
        let mut next = self.clone();
        for (parent, list) in scratch {
            for &child in &list {
                if let Some(frame) = next.frames.get_mut(&child) {
                    frame.parent = Some(parent);
                    frame.joint_parent = None;
                }
            }
            if let Some(p) = next.frames.get_mut(&parent) {
                p.children = list;
            }
        }
        if next.reachable_count() != next.frames.len() {
            tracing::trace!(ops = ops.len(), "order ops would detach frames from the root");
            return false;
        }
        if !reparented.iter().all(|&id| next.placement_holds(id)) {
            tracing::trace!(ops = ops.len(), "order ops would misplace frames");
            return false;
        }
        *self = next;
        tracing::debug!(ops = ops.len(), "applied order ops");
        true
    }

    /// Number of frames reachable from the root through child and joint links
    fn reachable_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![FrameId::ROOT];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(frame) = self.get(id) {
                stack.extend(frame.children.iter().chain(&frame.joint_children));
            }
        }
        seen.len()
    }

    // ==================== Slots ====================

    /// Replace the content of a label. The structure is normalised to its
    /// canonical text form; raw-text labels keep their text verbatim.
    /// Empty-slot validation re-runs for the frame afterwards.
    pub fn set_slot(&mut self, id: FrameId, label: usize, structure: SlotStructure) -> bool {
        let Some(frame) = self.get(id) else {
            return false;
        };
        let Some(label_def) = frame.definition().labels.get(label) else {
            return false;
        };
        if !label_def.has_slot {
            return false;
        }

        // Every frame is exactly one line of the saved file
        let rendered = if label_def.raw_text {
            text::render_raw(&structure)
        } else {
            text::render(&structure)
        };
        if rendered.contains(['\n', '\r']) {
            tracing::debug!(frame_id = %id, label, "slot content spans lines");
            return false;
        }

        let structure = if label_def.raw_text {
            text::parse_raw(&rendered)
        } else {
            match text::canonicalize(&structure.normalized()) {
                Ok(s) => s,
                Err(err) => {
                    tracing::debug!(frame_id = %id, label, %err, "slot content rejected");
                    return false;
                }
            }
        };

        if let Some(frame) = self.frames.get_mut(&id) {
            frame.labels.insert(label, structure);
        }
        if self.empty_slot_checks {
            validation::validate_frame(self, id);
        }
        true
    }

    /// Parse `source` as slot text and store it in a label
    pub fn set_slot_text(&mut self, id: FrameId, label: usize, source: &str) -> bool {
        let raw = self
            .get(id)
            .and_then(|f| f.definition().labels.get(label))
            .is_some_and(|l| l.raw_text);
        let structure = if raw {
            text::parse_raw(source)
        } else {
            match text::parse(source) {
                Ok(s) => s,
                Err(_) => return false,
            }
        };
        self.set_slot(id, label, structure)
    }

    /// Replace the text of one code field, string field or operator
    pub fn set_unit_text(
        &mut self,
        id: FrameId,
        label: usize,
        slot: &SlotId,
        class: UnitClass,
        new_text: &str,
    ) -> bool {
        let Some(mut structure) = self.get(id).and_then(|f| f.label(label)).cloned() else {
            return false;
        };
        let changed = match class {
            UnitClass::Field => match structure.field_mut(slot) {
                Some(FieldSlot::Code { code }) => {
                    *code = new_text.to_string();
                    true
                }
                Some(FieldSlot::Str { content, .. }) => {
                    *content = new_text.to_string();
                    true
                }
                _ => false,
            },
            UnitClass::Operator => match structure.operator_mut(slot) {
                Some(op) => {
                    op.code = new_text.to_string();
                    true
                }
                None => false,
            },
        };
        changed && self.set_slot(id, label, structure)
    }

    pub fn resolve_slot(
        &self,
        id: FrameId,
        label: usize,
        slot: &SlotId,
        class: UnitClass,
    ) -> Option<ResolvedSlot<'_>> {
        self.get(id)?.label(label)?.resolve(slot, class)
    }

    // ==================== Flags ====================

    pub fn set_collapsed(&mut self, id: FrameId, state: CollapsedState) -> bool {
        match self.frames.get_mut(&id) {
            Some(frame) if frame.allows_children() && !id.is_synthetic() => {
                frame.collapsed = state;
                true
            }
            _ => false,
        }
    }

    pub fn set_frozen(&mut self, id: FrameId, state: FrozenState) -> bool {
        match self.frames.get_mut(&id) {
            Some(frame) if !id.is_synthetic() => {
                frame.frozen = state;
                true
            }
            _ => false,
        }
    }

    pub fn set_disabled(&mut self, id: FrameId, disabled: bool) -> bool {
        match self.frames.get_mut(&id) {
            Some(frame) if !id.is_synthetic() => {
                frame.disabled = disabled;
                true
            }
            _ => false,
        }
    }

    // ==================== Invariants ====================

    /// Verify every structural invariant of the tree. Used by tests and
    /// after loading; the error names the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let root = self.get(FrameId::ROOT).ok_or("root frame missing")?;
        if root.parent.is_some() || root.joint_parent.is_some() {
            return Err("root has an owner".into());
        }
        if root.children != FrameId::SECTIONS {
            return Err("root children are not the three sections".into());
        }

        let mut seen: HashSet<FrameId> = HashSet::new();
        for (&key, frame) in &self.frames {
            if key != frame.id {
                return Err(format!("frame {} stored under {}", frame.id, key));
            }

            for &child in &frame.children {
                let c = self
                    .get(child)
                    .ok_or_else(|| format!("frame {} lists missing child {}", frame.id, child))?;
                if c.parent != Some(frame.id) || c.joint_parent.is_some() {
                    return Err(format!("child {} does not point back to {}", child, frame.id));
                }
                if c.frame_type.is_joint() {
                    return Err(format!("joint frame {} used as a child", child));
                }
                if !seen.insert(child) {
                    return Err(format!("frame {} is listed more than once", child));
                }
            }

            let mut prev = None;
            for &joint in &frame.joint_children {
                let j = self
                    .get(joint)
                    .ok_or_else(|| format!("frame {} lists missing joint {}", frame.id, joint))?;
                if j.joint_parent != Some(frame.id) || j.parent.is_some() {
                    return Err(format!("joint {} does not point back to {}", joint, frame.id));
                }
                if !joint_may_follow(frame.frame_type, prev, j.frame_type) {
                    return Err(format!("joint {} breaks the chain of {}", joint, frame.id));
                }
                if !seen.insert(joint) {
                    return Err(format!("frame {} is listed more than once", joint));
                }
                prev = Some(j.frame_type);
            }
            if frame.is_joint() && !frame.joint_children.is_empty() {
                return Err(format!("joint frame {} heads a chain", frame.id));
            }
        }

        for frame in self.frames.values() {
            if frame.id == FrameId::ROOT {
                continue;
            }
            if frame.parent.is_some() == frame.joint_parent.is_some() {
                return Err(format!("frame {} must have exactly one owner", frame.id));
            }
            if !seen.contains(&frame.id) {
                return Err(format!("frame {} is not listed by its owner", frame.id));
            }
            if frame.id.0 >= self.counter.peek().0 {
                return Err(format!("frame {} is ahead of the id counter", frame.id));
            }
        }

        let reachable = self.reachable_count();
        if reachable != self.frames.len() {
            return Err(format!(
                "{} frames are unreachable from the root",
                self.frames.len() - reachable
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_child(store: &mut FrameStore, ty: FrameType) -> FrameId {
        let index = store.children_of(FrameId::MAIN).len();
        store
            .add_frame(
                InsertTarget::Child {
                    parent: FrameId::MAIN,
                    index,
                },
                ty,
            )
            .unwrap()
    }

    #[test]
    fn test_new_store_has_sections() {
        let store = FrameStore::new();
        assert_eq!(store.len(), 4);
        assert!(store.is_empty());
        assert_eq!(store.level_parent(FrameId::MAIN), Some(FrameId::ROOT));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_add_frame_assigns_increasing_ids() {
        let mut store = FrameStore::new();
        let a = main_child(&mut store, FrameType::FuncCall);
        let b = main_child(&mut store, FrameType::If);
        assert_eq!(a, FrameId(1));
        assert_eq!(b, FrameId(2));
        assert_eq!(store.children_of(FrameId::MAIN), &[a, b]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_rejected_add_does_not_consume_id() {
        let mut store = FrameStore::new();
        let target = InsertTarget::Child {
            parent: FrameId::MAIN,
            index: 0,
        };
        assert_eq!(store.add_frame(target, FrameType::Import), None);
        assert_eq!(store.add_frame(target, FrameType::Break), None);
        assert_eq!(store.add_frame(target, FrameType::Else), None);
        assert_eq!(store.counter().peek(), FrameId(1));
    }

    #[test]
    fn test_break_needs_enclosing_loop_without_function_between() {
        let mut store = FrameStore::new();
        let w = main_child(&mut store, FrameType::While);
        let body_if = store
            .add_frame_at_caret(w, CaretPosition::Body, FrameType::If)
            .unwrap();
        assert!(store.accepts_child(body_if, FrameType::Break));
        assert!(!store.accepts_child(FrameId::MAIN, FrameType::Continue));

        let class = store
            .add_frame(
                InsertTarget::Child {
                    parent: FrameId::DEFS,
                    index: 0,
                },
                FrameType::ClassDef,
            )
            .unwrap();
        let method = store
            .add_frame_at_caret(class, CaretPosition::Body, FrameType::FuncDef)
            .unwrap();
        assert!(store.accepts_child(method, FrameType::Return));
        assert!(!store.accepts_child(class, FrameType::Return));
        assert!(!store.accepts_child(method, FrameType::Break));
    }

    #[test]
    fn test_joint_chain_order_is_enforced() {
        let mut store = FrameStore::new();
        let if_id = main_child(&mut store, FrameType::If);
        let else_id = store
            .add_frame_at_caret(if_id, CaretPosition::Below, FrameType::Else)
            .unwrap();
        assert!(store
            .add_frame_at_caret(else_id, CaretPosition::Below, FrameType::Elif)
            .is_none());
        let elif = store
            .add_frame_at_caret(if_id, CaretPosition::Body, FrameType::Elif)
            .unwrap();
        assert_eq!(store.joints_of(if_id), &[elif, else_id]);
        assert_eq!(store.chain_head(else_id), if_id);
        assert_eq!(store.level_parent(elif), Some(FrameId::MAIN));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_below_joint_adds_after_whole_chain() {
        let mut store = FrameStore::new();
        let if_id = main_child(&mut store, FrameType::If);
        let else_id = store
            .add_frame_at_caret(if_id, CaretPosition::Below, FrameType::Else)
            .unwrap();
        let after = store
            .add_frame_at_caret(else_id, CaretPosition::Below, FrameType::FuncCall)
            .unwrap();
        assert_eq!(store.children_of(FrameId::MAIN), &[if_id, after]);
    }

    #[test]
    fn test_invariants_catch_frames_cut_off_from_the_root() {
        let mut store = FrameStore::new();
        let a = main_child(&mut store, FrameType::While);
        let b = main_child(&mut store, FrameType::While);
        // Hand-build a cycle: a inside b inside a, neither listed by main
        store.frames.get_mut(&FrameId::MAIN).unwrap().children.clear();
        store.frames.get_mut(&a).unwrap().parent = Some(b);
        store.frames.get_mut(&a).unwrap().children = vec![b];
        store.frames.get_mut(&b).unwrap().parent = Some(a);
        store.frames.get_mut(&b).unwrap().children = vec![a];
        let err = store.check_invariants().unwrap_err();
        assert!(err.contains("unreachable"), "{}", err);
    }

    #[test]
    fn test_placement_and_chain_checks() {
        let mut store = FrameStore::new();
        let w = main_child(&mut store, FrameType::While);
        let brk = store
            .add_frame(InsertTarget::Child { parent: w, index: 0 }, FrameType::Break)
            .unwrap();
        assert!(store.placement_holds(w));
        assert!(store.placement_holds(brk));
        assert!(store.chain_holds(w));

        let t = main_child(&mut store, FrameType::Try);
        let fin = store
            .add_frame(InsertTarget::Joint { head: t, index: 0 }, FrameType::Finally)
            .unwrap();
        assert!(store.chain_holds(t));
        // An else straight after try breaks the chain
        let stray = Frame::new(FrameId(99), FrameType::Else);
        store.counter.reserve(FrameId(99));
        store.link(stray, InsertTarget::Joint { head: t, index: 0 });
        assert!(!store.chain_holds(t));
        assert_eq!(store.joints_of(t), &[FrameId(99), fin]);
    }

    #[test]
    fn test_order_ops_move_between_parents() {
        let mut store = FrameStore::new();
        let a = main_child(&mut store, FrameType::FuncCall);
        let w = main_child(&mut store, FrameType::While);
        let ok = store.apply_order_ops(&[
            FrameOrderOp::Removed {
                parent: FrameId::MAIN,
                old_index: 0,
            },
            FrameOrderOp::Added {
                parent: w,
                new_index: 0,
                frame: a,
            },
        ]);
        assert!(ok);
        assert_eq!(store.children_of(w), &[a]);
        assert_eq!(store.get(a).unwrap().parent, Some(w));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_order_ops_reject_duplicate_or_lost_frames() {
        let mut store = FrameStore::new();
        let a = main_child(&mut store, FrameType::FuncCall);
        let w = main_child(&mut store, FrameType::While);
        let before = store.clone();

        // Added without removal: frame would live in two lists
        assert!(!store.apply_order_ops(&[FrameOrderOp::Added {
            parent: w,
            new_index: 0,
            frame: a,
        }]));
        // Removed without re-adding: frame would be orphaned
        assert!(!store.apply_order_ops(&[FrameOrderOp::Removed {
            parent: FrameId::MAIN,
            old_index: 0,
        }]));
        // Out of range
        assert!(!store.apply_order_ops(&[FrameOrderOp::Moved {
            parent: FrameId::MAIN,
            old_index: 5,
            new_index: 0,
        }]));
        assert_eq!(store, before);
    }

    #[test]
    fn test_order_ops_reject_forbidden_destination() {
        let mut store = FrameStore::new();
        let a = main_child(&mut store, FrameType::FuncCall);
        assert!(!store.apply_order_ops(&[
            FrameOrderOp::Removed {
                parent: FrameId::MAIN,
                old_index: 0,
            },
            FrameOrderOp::Added {
                parent: FrameId::IMPORTS,
                new_index: 0,
                frame: a,
            },
        ]));
        assert_eq!(store.children_of(FrameId::MAIN), &[a]);
    }

    #[test]
    fn test_set_slot_canonicalizes_and_rejects_broken_text() {
        let mut store = FrameStore::new();
        let call = main_child(&mut store, FrameType::FuncCall);
        assert!(store.set_slot(call, 0, SlotStructure::code("a+b")));
        assert_eq!(store.get(call).unwrap().label(0).unwrap().fields.len(), 2);
        assert!(!store.set_slot(call, 0, SlotStructure::code("f(")));
        assert!(!store.set_slot(call, 3, SlotStructure::empty()));
        assert!(!store.set_slot(FrameId(99), 0, SlotStructure::empty()));
    }

    #[test]
    fn test_set_unit_text_edits_one_field() {
        let mut store = FrameStore::new();
        let call = main_child(&mut store, FrameType::FuncCall);
        assert!(store.set_slot_text(call, 0, "print(x)"));
        let inner = SlotId::from_indices([1, 0]);
        assert!(store.set_unit_text(call, 0, &inner, UnitClass::Field, "y"));
        assert_eq!(store.get(call).unwrap().label(0).unwrap().to_code(), "print(y)");
    }

    #[test]
    fn test_flags_reject_synthetic_frames() {
        let mut store = FrameStore::new();
        assert!(!store.set_collapsed(FrameId::MAIN, CollapsedState::Collapsed));
        let call = main_child(&mut store, FrameType::FuncCall);
        assert!(!store.set_collapsed(call, CollapsedState::Collapsed));
        assert!(store.set_frozen(call, FrozenState::Frozen));
        assert!(store.set_disabled(call, true));
    }
}
