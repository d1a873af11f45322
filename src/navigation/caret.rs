//! Caret movement
//!
//! All caret positions of a program form one document-order sequence:
//! a section's body, then for every frame its editable slot units, its body
//! and children, its joint frames, and finally the position below it.
//! Left/Right step through the whole sequence; Up/Down only through the
//! frame-level positions.
//!
//! Joint frames have no position below them of their own (the caret below a
//! chain is below its head), but `Below(joint)` is still accepted as a start
//! position and located just after the joint frame's content.

use super::{Direction, NavPosition};
use crate::frame::FrameId;
use crate::slot::{for_each_unit, SlotId};
use crate::store::FrameStore;

/// A position in document order; virtual entries are locatable but never
/// returned as a destination
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    position: NavPosition,
    navigable: bool,
}

enum Step {
    Enter(FrameId),
    Emit(NavPosition, bool),
}

fn walk(store: &FrameStore) -> Vec<Entry> {
    let mut out = Vec::new();
    let mut stack = vec![Step::Enter(FrameId::ROOT)];

    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Emit(position, navigable) => {
                out.push(Entry {
                    position,
                    navigable,
                });
                continue;
            }
            Step::Enter(id) => id,
        };
        let Some(frame) = store.get(id) else {
            continue;
        };

        let mut steps = Vec::new();
        if frame.slots_editable() && !frame.is_section() {
            for (&label, structure) in &frame.labels {
                for_each_unit(structure, &SlotId::root(), |unit| {
                    if unit.kind.is_editable() {
                        steps.push(Step::Emit(
                            NavPosition::Slot {
                                frame: id,
                                label,
                                slot: unit.id,
                            },
                            true,
                        ));
                    }
                });
            }
        }
        if frame.allows_children() && !frame.is_collapsed() {
            if id != FrameId::ROOT {
                steps.push(Step::Emit(NavPosition::body(id), true));
            }
            steps.extend(frame.children.iter().map(|&c| Step::Enter(c)));
        }
        steps.extend(frame.joint_children.iter().map(|&j| Step::Enter(j)));
        if !frame.is_section() && id != FrameId::ROOT {
            steps.push(Step::Emit(NavPosition::below(id), !frame.is_joint()));
        }

        stack.extend(steps.into_iter().rev());
    }
    out
}

/// Every navigable position in document order
pub fn all_positions(store: &FrameStore) -> Vec<NavPosition> {
    walk(store)
        .into_iter()
        .filter(|e| e.navigable)
        .map(|e| e.position)
        .collect()
}

/// Frame-level positions (body and below) in document order
pub fn caret_positions(store: &FrameStore) -> Vec<NavPosition> {
    walk(store)
        .into_iter()
        .filter(|e| e.navigable && e.position.is_frame_level())
        .map(|e| e.position)
        .collect()
}

/// Whether the caret may rest at `position`
pub fn is_valid_position(store: &FrameStore, position: &NavPosition) -> bool {
    walk(store)
        .iter()
        .any(|e| e.navigable && &e.position == position)
}

/// The next position from `from` in `direction`, or `None` at either end of
/// the program or when `from` does not exist
pub fn adjacent_position(
    store: &FrameStore,
    from: &NavPosition,
    direction: Direction,
) -> Option<NavPosition> {
    let entries = walk(store);
    let index = entries.iter().position(|e| &e.position == from)?;

    let frame_level_only = matches!(direction, Direction::Up | Direction::Down);
    let usable = |e: &&Entry| e.navigable && (!frame_level_only || e.position.is_frame_level());

    let found = match direction {
        Direction::Right | Direction::Down => entries[index + 1..].iter().find(usable),
        Direction::Left | Direction::Up => entries[..index].iter().rev().find(usable),
    };
    found.map(|e| e.position.clone())
}

/// The frame-level position just before `id`'s first position. After `id`
/// is removed this position still exists, which makes it the natural
/// resting place for the caret.
pub fn position_before(store: &FrameStore, id: FrameId) -> Option<NavPosition> {
    let entries = walk(store);
    let start = entries.iter().position(|e| e.position.frame_id() == id)?;
    entries[..start]
        .iter()
        .rev()
        .find(|e| e.navigable && e.position.is_frame_level())
        .map(|e| e.position.clone())
}
