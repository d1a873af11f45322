//! Applying results of external analysis

use crate::commands::Cmd;
use crate::messages::AnalysisMsg;
use crate::model::EditorModel;
use crate::validation;

pub fn update_analysis(model: &mut EditorModel, msg: AnalysisMsg) -> Option<Cmd> {
    match msg {
        AnalysisMsg::LineErrors(errors) => {
            let applied = validation::apply_line_errors(&mut model.store, &model.line_map, &errors);
            tracing::debug!(reported = errors.len(), applied, "analysis errors applied");
            Some(Cmd::Redraw)
        }

        // Frames that vanished since the analysis started are ignored
        AnalysisMsg::SetFrameError { frame, message } => {
            validation::set_frame_error(&mut model.store, frame, message).then_some(Cmd::Redraw)
        }

        AnalysisMsg::ClearFrameError(frame) => {
            validation::clear_frame_error(&mut model.store, frame).then_some(Cmd::Redraw)
        }
    }
}
