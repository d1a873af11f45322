//! Caret movement and selection message handlers

use crate::commands::Cmd;
use crate::messages::CaretMsg;
use crate::model::EditorModel;
use crate::navigation::{self, extend_selection};

pub fn update_caret(model: &mut EditorModel, msg: CaretMsg) -> Option<Cmd> {
    match msg {
        CaretMsg::Move(direction) => {
            let next = navigation::adjacent_position(&model.store, &model.caret, direction)?;
            model.caret = next;
            if !model.selection.is_empty() {
                model.clear_selection();
            }
            Some(Cmd::Redraw)
        }

        CaretMsg::SetPosition(position) => {
            if !navigation::is_valid_position(&model.store, &position) {
                tracing::trace!(%position, "caret target does not exist");
                return None;
            }
            model.caret = position;
            model.clear_selection();
            Some(Cmd::Redraw)
        }

        CaretMsg::ExtendSelection(direction) => {
            let step = extend_selection(&model.store, &model.caret, &model.selection, direction)?;
            model.caret = step.caret;
            model.set_selection(step.selection);
            Some(Cmd::Redraw)
        }

        CaretMsg::ClearSelection => {
            if model.selection.is_empty() {
                return None;
            }
            model.clear_selection();
            Some(Cmd::Redraw)
        }
    }
}
