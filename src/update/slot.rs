//! Slot content message handlers

use super::{caret_after, repair_caret};
use crate::commands::Cmd;
use crate::frame::FrameId;
use crate::messages::SlotMsg;
use crate::model::EditorModel;
use crate::navigation;

pub fn update_slot(model: &mut EditorModel, msg: SlotMsg) -> Option<Cmd> {
    let before = model.snapshot();
    let (frame, changed) = match msg {
        SlotMsg::SetText { frame, label, text } => {
            (frame, model.store.set_slot_text(frame, label, &text))
        }
        SlotMsg::SetUnitText {
            frame,
            label,
            slot,
            class,
            text,
        } => (
            frame,
            model.store.set_unit_text(frame, label, &slot, class, &text),
        ),
    };
    if !changed {
        tracing::debug!(frame_id = %frame, "slot edit rejected");
        return None;
    }

    model.history.push(before);
    model.is_modified = true;
    settle_caret(model, frame);
    Some(Cmd::Redraw)
}

/// Re-parsing can renumber slot units; a caret on a unit that no longer
/// exists moves to the edited frame's first slot
fn settle_caret(model: &mut EditorModel, frame: FrameId) {
    if navigation::is_valid_position(&model.store, &model.caret) {
        return;
    }
    if model.caret.frame_id() == frame {
        model.caret = caret_after(model, frame);
    }
    repair_caret(model, frame);
}
