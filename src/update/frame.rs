//! Structural edit message handlers: add, delete, clipboard, move, wrap,
//! frame flags and undo/redo

use super::{caret_after, repair_caret};
use crate::commands::Cmd;
use crate::frame::{CaretPosition, CollapsedState, FrameId, FrozenState};
use crate::messages::FrameMsg;
use crate::model::EditorModel;
use crate::mutation;
use crate::navigation::{caret, FrameSelection, NavPosition};
use crate::store::FrameStore;

pub fn update_frame(model: &mut EditorModel, msg: FrameMsg) -> Option<Cmd> {
    match msg {
        FrameMsg::Add(ty) => {
            let (anchor, pos) = frame_caret(&model.caret)?;
            let before = model.snapshot();
            let Some(id) = model.store.add_frame_at_caret(anchor, pos, ty) else {
                model.set_status(format!("Cannot add {} here", ty.name()));
                return Some(Cmd::Redraw);
            };
            model.history.push(before);
            model.clear_selection();
            model.caret = caret_after(model, id);
            model.is_modified = true;
            Some(Cmd::Redraw)
        }

        FrameMsg::DeleteSelection { confirmed } => delete_selection(model, confirmed),

        FrameMsg::DeleteBefore => {
            let NavPosition::Frame {
                id,
                caret: CaretPosition::Below,
            } = model.caret
            else {
                return None;
            };
            model.set_selection(FrameSelection::new(vec![id]));
            delete_selection(model, false)
        }

        FrameMsg::Copy => {
            let roots = model.selected_roots();
            let clipboard = mutation::copy_subtrees(&model.store, &roots)?;
            model.set_status(format!("Copied {} frames", clipboard.frame_count()));
            model.clipboard = Some(clipboard);
            Some(Cmd::Redraw)
        }

        FrameMsg::Cut => {
            let roots = model.selected_roots();
            let clipboard = mutation::copy_subtrees(&model.store, &roots)?;
            model.clipboard = Some(clipboard);
            delete_selection(model, true)
        }

        FrameMsg::Paste => {
            let clipboard = model.clipboard.as_ref()?;
            let ty = clipboard.first_type()?;
            let (anchor, pos) = frame_caret(&model.caret)?;
            let target = model.store.target_for_caret(anchor, pos, ty);
            let before = model.snapshot();
            let pasted = target.and_then(|t| mutation::paste_subtrees(&mut model.store, clipboard, t));
            let Some(last) = pasted.and_then(|ids| ids.last().copied()) else {
                model.set_status("Cannot paste here");
                return Some(Cmd::Redraw);
            };
            model.history.push(before);
            model.clear_selection();
            model.caret = position_after(model, last);
            model.is_modified = true;
            Some(Cmd::Redraw)
        }

        FrameMsg::MoveSelectionToCaret => {
            let roots = model.selected_roots();
            let first = *roots.first()?;
            let ty = model.store.frame_type(first)?;
            let (anchor, pos) = frame_caret(&model.caret)?;
            let before = model.snapshot();
            let moved = model
                .store
                .target_for_caret(anchor, pos, ty)
                .is_some_and(|target| mutation::move_frames(&mut model.store, &roots, target));
            if !moved {
                model.set_status("Cannot move here");
                return Some(Cmd::Redraw);
            }
            model.history.push(before);
            model.clear_selection();
            if let Some(&last) = roots.last() {
                model.caret = position_after(model, last);
            }
            model.is_modified = true;
            Some(Cmd::Redraw)
        }

        FrameMsg::WrapSelection(ty) => {
            let roots = model.selected_roots();
            let before = model.snapshot();
            let Some(wrapper) = mutation::wrap_frames(&mut model.store, &roots, ty) else {
                model.set_status(format!("Cannot wrap in {}", ty.name()));
                return Some(Cmd::Redraw);
            };
            model.history.push(before);
            model.clear_selection();
            model.caret = caret_after(model, wrapper);
            model.is_modified = true;
            Some(Cmd::Redraw)
        }

        FrameMsg::ToggleCollapsed(id) => {
            let state = match model.store.get(id)?.collapsed {
                CollapsedState::Visible => CollapsedState::Collapsed,
                CollapsedState::Collapsed => CollapsedState::Visible,
            };
            toggle_flag(model, id, |store| store.set_collapsed(id, state))
        }

        FrameMsg::ToggleFrozen(id) => {
            let state = match model.store.get(id)?.frozen {
                FrozenState::Unfrozen => FrozenState::Frozen,
                FrozenState::Frozen => FrozenState::Unfrozen,
            };
            toggle_flag(model, id, |store| store.set_frozen(id, state))
        }

        FrameMsg::ToggleDisabled(id) => {
            let disabled = !model.store.get(id)?.disabled;
            toggle_flag(model, id, |store| store.set_disabled(id, disabled))
        }

        FrameMsg::Undo => {
            let current = model.snapshot();
            let previous = model.history.undo(current)?;
            model.restore(previous);
            model.set_status("Undo");
            Some(Cmd::Redraw)
        }

        FrameMsg::Redo => {
            let current = model.snapshot();
            let next = model.history.redo(current)?;
            model.restore(next);
            model.set_status("Redo");
            Some(Cmd::Redraw)
        }
    }
}

/// Anchor frame and caret kind of a frame-level caret
fn frame_caret(position: &NavPosition) -> Option<(FrameId, CaretPosition)> {
    match *position {
        NavPosition::Frame { id, caret } => Some((id, caret)),
        NavPosition::Slot { .. } => None,
    }
}

/// Caret after a frame that was pasted or moved in: below it, or in the body
/// of a joint frame (which has no position below it)
fn position_after(model: &EditorModel, id: FrameId) -> NavPosition {
    let below = NavPosition::below(id);
    if caret::is_valid_position(&model.store, &below) {
        below
    } else {
        caret_after(model, id)
    }
}

fn delete_selection(model: &mut EditorModel, confirmed: bool) -> Option<Cmd> {
    let roots = model.selected_roots();
    if roots.is_empty() {
        return None;
    }

    let threshold = model.config.delete_confirm_threshold;
    let mut count = roots.len();
    for &root in &roots {
        if count > threshold {
            break;
        }
        count += mutation::count_descendants(&model.store, root, Some(threshold + 1));
    }
    if count > threshold && !confirmed {
        tracing::debug!(count, threshold, "delete needs confirmation");
        return Some(Cmd::ConfirmDelete { count });
    }

    let before = model.snapshot();
    let landing = caret::position_before(&model.store, roots[0]);
    let removed = mutation::remove_frames(&mut model.store, &roots);
    if removed == 0 {
        model.set_status("Cannot delete here");
        return None;
    }
    model.history.push(before);
    model.clear_selection();
    model.caret = landing.unwrap_or_default();
    repair_caret(model, roots[0]);
    model.set_status(format!("Deleted {} frames", removed));
    model.is_modified = true;
    Some(Cmd::Redraw)
}

fn toggle_flag(
    model: &mut EditorModel,
    id: FrameId,
    apply: impl FnOnce(&mut FrameStore) -> bool,
) -> Option<Cmd> {
    let before = model.snapshot();
    if !apply(&mut model.store) {
        return None;
    }
    model.history.push(before);
    repair_caret(model, id);
    model.is_modified = true;
    Some(Cmd::Redraw)
}
