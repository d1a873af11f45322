//! File and settings message handlers

use crate::commands::Cmd;
use crate::messages::AppMsg;
use crate::model::EditorModel;
use crate::persist::{self, Document};
use crate::store::FrameStore;

pub fn update_app(model: &mut EditorModel, msg: AppMsg) -> Option<Cmd> {
    match msg {
        AppMsg::SaveFile => match model.file_path.clone() {
            Some(path) => Some(save_to(model, path)),
            None => {
                model.set_status("No file path - cannot save");
                Some(Cmd::Redraw)
            }
        },

        AppMsg::SaveFileAs(path) => {
            model.file_path = Some(path.clone());
            Some(save_to(model, path))
        }

        AppMsg::SaveCompleted(result) => {
            model.is_saving = false;
            match result {
                Ok(()) => {
                    model.is_modified = false;
                    if let Some(path) = &model.file_path {
                        let status = format!("Saved: {}", path.display());
                        model.set_status(status);
                    }
                }
                Err(e) => model.set_status(format!("Error: {}", e)),
            }
            Some(Cmd::Redraw)
        }

        AppMsg::LoadFile(path) => {
            model.set_status("Loading...");
            Some(Cmd::LoadFile { path })
        }

        AppMsg::FileLoaded { path, result } => {
            let content = match result {
                Ok(content) => content,
                Err(e) => {
                    model.set_status(format!("Error: {}", e));
                    return Some(Cmd::Redraw);
                }
            };
            match persist::load(&content) {
                Ok(document) => {
                    model.set_status(format!("Loaded: {}", path.display()));
                    model.replace_document(document, Some(path));
                }
                Err(e) => {
                    // The current program stays as it was
                    tracing::warn!(path = %path.display(), error = %e, "rejected file");
                    model.set_status(format!("Cannot load {}: {}", path.display(), e));
                }
            }
            Some(Cmd::Redraw)
        }

        AppMsg::NewFile => {
            let headers = model.headers.clone();
            model.replace_document(
                Document {
                    store: FrameStore::new(),
                    headers,
                    line_map: Default::default(),
                },
                None,
            );
            model.set_status("New program");
            Some(Cmd::Redraw)
        }

        AppMsg::SetEmptySlotChecks(enabled) => {
            if model.config.validate_empty_slots == enabled {
                return None;
            }
            model.set_empty_slot_checks(enabled);
            Some(Cmd::Redraw)
        }
    }
}

fn save_to(model: &mut EditorModel, path: std::path::PathBuf) -> Cmd {
    let output = model.encode();
    model.is_saving = true;
    model.set_status("Saving...");
    Cmd::batch(vec![
        Cmd::SaveFile {
            path,
            content: output.text.clone(),
        },
        Cmd::Analyze {
            source: output.text,
            line_map: output.line_map,
        },
    ])
}
