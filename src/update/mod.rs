//! Update functions for the Elm-style architecture
//!
//! All state transformations flow through these functions.

mod analysis;
mod app;
mod caret;
mod frame;
mod slot;

use crate::commands::Cmd;
use crate::frame::FrameId;
use crate::messages::Msg;
use crate::model::EditorModel;
use crate::navigation::{self, NavPosition};

#[cfg(debug_assertions)]
use crate::tracing::StoreSnapshot;
#[cfg(debug_assertions)]
use tracing::{debug, span, Level};

pub use analysis::update_analysis;
pub use app::update_app;
pub use caret::update_caret;
pub use frame::update_frame;
pub use slot::update_slot;

/// Main update function - dispatches to sub-handlers
///
/// In debug builds, this wraps with tracing instrumentation.
/// In release builds, it's a direct dispatch with zero overhead.
#[inline]
pub fn update(model: &mut EditorModel, msg: Msg) -> Option<Cmd> {
    #[cfg(debug_assertions)]
    {
        update_traced(model, msg)
    }
    #[cfg(not(debug_assertions))]
    {
        update_inner(model, msg)
    }
}

/// Inner update logic (no tracing)
fn update_inner(model: &mut EditorModel, msg: Msg) -> Option<Cmd> {
    match msg {
        Msg::Caret(m) => caret::update_caret(model, m),
        Msg::Frame(m) => frame::update_frame(model, m),
        Msg::Slot(m) => slot::update_slot(model, m),
        Msg::Analysis(m) => analysis::update_analysis(model, m),
        Msg::App(m) => app::update_app(model, m),
    }
}

/// Caret position right after a frame was created, pasted or moved: its
/// first slot, else its body, else below it
pub(crate) fn caret_after(model: &EditorModel, id: FrameId) -> NavPosition {
    let first_slot = navigation::all_positions(&model.store)
        .into_iter()
        .find(|p| !p.is_frame_level() && p.frame_id() == id);
    if let Some(slot) = first_slot {
        return slot;
    }
    match model.store.get(id) {
        Some(frame) if frame.allows_children() && !frame.is_collapsed() => NavPosition::body(id),
        Some(frame) if frame.is_joint() => NavPosition::below(model.store.chain_head(id)),
        _ => NavPosition::below(id),
    }
}

/// Put the caret back on a valid position after an edit hid or removed
/// the one it was on. `near` is the frame the edit was about.
pub(crate) fn repair_caret(model: &mut EditorModel, near: FrameId) {
    if navigation::is_valid_position(&model.store, &model.caret) {
        return;
    }
    let below = NavPosition::below(model.store.chain_head(near));
    model.caret = if navigation::is_valid_position(&model.store, &below) {
        below
    } else {
        navigation::caret::position_before(&model.store, near).unwrap_or_default()
    };
    tracing::trace!(caret = %model.caret, "caret repaired");
}

/// Traced update wrapper (debug builds only)
///
/// Captures before/after program state and logs diffs for debugging.
#[cfg(debug_assertions)]
fn update_traced(model: &mut EditorModel, msg: Msg) -> Option<Cmd> {
    let msg_name = msg_type_name(&msg);
    let _span = span!(Level::DEBUG, "update", msg = %msg_name).entered();

    let before = StoreSnapshot::from_model(model);
    debug!(target: "message", msg = %msg_name, "processing");

    let result = update_inner(model, msg);

    let after = StoreSnapshot::from_model(model);
    if let Some(diff) = before.diff(&after) {
        debug!(target: "caret", %diff, "state changed");
    }

    model.assert_invariants_with_context(&msg_name);
    result
}

/// Get a display name for a message type
///
/// Example outputs:
/// - `Caret::Move(Up)`
/// - `Frame::Add(While)`
#[cfg(debug_assertions)]
fn msg_type_name(msg: &Msg) -> String {
    match msg {
        Msg::Caret(m) => format!("Caret::{:?}", m),
        Msg::Frame(m) => format!("Frame::{:?}", m),
        Msg::Slot(m) => format!("Slot::{:?}", m),
        Msg::Analysis(m) => format!("Analysis::{:?}", m),
        Msg::App(m) => format!("App::{:?}", m),
    }
}
