//! Message flows through `update`: editing, deletion, clipboard, history,
//! files and analysis

mod common;

use std::path::PathBuf;

use common::{
    add_with_text, chain_store, empty_model, model_with, nested_whiles, try_chain_store, SHAPES_SPY,
};
use trellis::commands::Cmd;
use trellis::frame::{CollapsedState, FrameId, FrameType, SlotErrorKind};
use trellis::messages::{AnalysisMsg, AppMsg, CaretMsg, FrameMsg, Msg};
use trellis::navigation::{Direction, FrameSelection, NavPosition};
use trellis::persist;
use trellis::slot::SlotId;
use trellis::store::FrameStore;
use trellis::update::update;

fn frame(msg: FrameMsg) -> Msg {
    Msg::Frame(msg)
}

// ========================================================================
// Adding and editing
// ========================================================================

#[test]
fn test_add_puts_caret_in_first_slot() {
    let mut model = empty_model();
    assert_eq!(update(&mut model, Msg::add_frame(FrameType::If)), Some(Cmd::Redraw));

    let if_id = model.store.children_of(FrameId::MAIN)[0];
    assert_eq!(
        model.caret,
        NavPosition::Slot {
            frame: if_id,
            label: 0,
            slot: SlotId::from_indices([0]),
        }
    );
    assert!(model.is_modified);
}

#[test]
fn test_add_without_slots_puts_caret_in_body() {
    let mut model = empty_model();
    update(&mut model, Msg::add_frame(FrameType::Try));
    let try_id = model.store.children_of(FrameId::MAIN)[0];
    assert_eq!(model.caret, NavPosition::body(try_id));
}

#[test]
fn test_rejected_add_leaves_program_and_history_alone() {
    let mut model = empty_model();
    let before = model.store.clone();
    assert_eq!(update(&mut model, Msg::add_frame(FrameType::Break)), Some(Cmd::Redraw));
    assert_eq!(model.store, before);
    assert!(!model.history.can_undo());
    assert!(model.status_message.contains("break"));
}

#[test]
fn test_slot_edit_and_undo_redo() {
    let mut model = empty_model();
    update(&mut model, Msg::add_frame(FrameType::If));
    let if_id = model.store.children_of(FrameId::MAIN)[0];
    update(&mut model, Msg::set_text(if_id, 0, "ready and  willing"));
    assert_eq!(
        model.store.get(if_id).unwrap().label(0).unwrap().to_code(),
        "ready and willing"
    );

    update(&mut model, frame(FrameMsg::Undo));
    assert!(model.store.get(if_id).unwrap().label(0).unwrap().is_empty());
    update(&mut model, frame(FrameMsg::Undo));
    assert_eq!(model.store.user_frame_count(), 0);
    assert_eq!(update(&mut model, frame(FrameMsg::Undo)), None);

    update(&mut model, frame(FrameMsg::Redo));
    update(&mut model, frame(FrameMsg::Redo));
    assert_eq!(
        model.store.get(if_id).unwrap().label(0).unwrap().to_code(),
        "ready and willing"
    );
    assert_eq!(update(&mut model, frame(FrameMsg::Redo)), None);
}

#[test]
fn test_rejected_slot_text_is_not_recorded() {
    let mut store = FrameStore::new();
    let call = add_with_text(&mut store, FrameId::MAIN, FrameType::FuncCall, "f()");
    let mut model = model_with(store, NavPosition::below(call));
    assert_eq!(update(&mut model, Msg::set_text(call, 0, "f(")), None);
    assert!(!model.history.can_undo());
}

#[test]
fn test_undo_history_is_bounded() {
    let mut model = empty_model();
    for _ in 0..12 {
        model.caret = NavPosition::body(FrameId::MAIN);
        update(&mut model, Msg::add_frame(FrameType::Comment));
    }
    assert_eq!(model.history.undo_len(), 10);
    while update(&mut model, frame(FrameMsg::Undo)).is_some() {}
    assert_eq!(model.store.user_frame_count(), 2);
}

// ========================================================================
// Caret and selection
// ========================================================================

#[test]
fn test_selection_then_move_clears_it() {
    let (store, [first, if_id, elif_id, else_id, _]) = chain_store();
    let mut model = model_with(store, NavPosition::below(first));

    update(&mut model, Msg::Caret(CaretMsg::ExtendSelection(Direction::Down)));
    assert_eq!(model.selection.frames, vec![if_id, elif_id, else_id]);
    assert!(model.store.get(elif_id).unwrap().selected);

    update(&mut model, Msg::move_caret(Direction::Down));
    assert!(model.selection.is_empty());
    assert!(!model.store.get(elif_id).unwrap().selected);
}

#[test]
fn test_set_position_rejects_unknown_places() {
    let (store, [first, ..]) = chain_store();
    let mut model = model_with(store, NavPosition::below(first));
    let nowhere = NavPosition::below(FrameId(99));
    assert_eq!(update(&mut model, Msg::Caret(CaretMsg::SetPosition(nowhere))), None);
    assert_eq!(model.caret, NavPosition::below(first));
}

// ========================================================================
// Deletion
// ========================================================================

#[test]
fn test_large_delete_asks_first() {
    let (store, outer) = nested_whiles(30);
    let mut model = model_with(store, NavPosition::below(outer));
    model.set_selection(FrameSelection::new(vec![outer]));
    let before = model.store.clone();

    let cmd = update(&mut model, frame(FrameMsg::DeleteSelection { confirmed: false }));
    assert!(matches!(cmd, Some(Cmd::ConfirmDelete { count }) if count > 20));
    assert_eq!(model.store, before);

    let cmd = update(&mut model, frame(FrameMsg::DeleteSelection { confirmed: true }));
    assert_eq!(cmd, Some(Cmd::Redraw));
    assert_eq!(model.store.user_frame_count(), 0);
    assert_eq!(model.caret, NavPosition::body(FrameId::MAIN));
}

#[test]
fn test_small_delete_lands_caret_before_the_frames() {
    let (store, [first, if_id, elif_id, else_id, last]) = chain_store();
    let mut model = model_with(store, NavPosition::below(if_id));
    model.set_selection(FrameSelection::new(vec![if_id, elif_id, else_id]));

    update(&mut model, frame(FrameMsg::DeleteSelection { confirmed: false }));
    assert_eq!(model.store.children_of(FrameId::MAIN), &[first, last]);
    assert_eq!(model.caret, NavPosition::below(first));
    assert!(model.selection.is_empty());
}

#[test]
fn test_delete_that_would_break_a_try_chain_is_refused() {
    let (store, [_, except, _, _]) = try_chain_store();
    let mut model = model_with(store, NavPosition::body(FrameId::MAIN));
    model.set_selection(FrameSelection::new(vec![except]));
    let before = model.store.clone();

    let cmd = update(&mut model, frame(FrameMsg::DeleteSelection { confirmed: true }));
    assert_eq!(cmd, None);
    assert_eq!(model.store, before);
    assert!(!model.history.can_undo());
    assert!(model.status_message.contains("Cannot delete"));
}

#[test]
fn test_delete_before_caret() {
    let (store, [first, if_id, _, _, last]) = chain_store();
    let mut model = model_with(store, NavPosition::below(first));
    update(&mut model, frame(FrameMsg::DeleteBefore));
    assert_eq!(model.store.children_of(FrameId::MAIN), &[if_id, last]);
    assert_eq!(model.caret, NavPosition::body(FrameId::MAIN));

    // Nothing to delete from inside a body
    assert_eq!(update(&mut model, frame(FrameMsg::DeleteBefore)), None);
}

// ========================================================================
// Clipboard and moves
// ========================================================================

#[test]
fn test_copy_then_paste_below() {
    let (store, [_, if_id, elif_id, else_id, last]) = chain_store();
    let mut model = model_with(store, NavPosition::below(last));
    model.set_selection(FrameSelection::new(vec![if_id, elif_id, else_id]));

    update(&mut model, frame(FrameMsg::Copy));
    assert_eq!(model.clipboard.as_ref().map(|c| c.frame_count()), Some(3));

    model.clear_selection();
    update(&mut model, frame(FrameMsg::Paste));
    let main = model.store.children_of(FrameId::MAIN).to_vec();
    assert_eq!(main.len(), 4);
    let pasted = main[3];
    assert_eq!(model.store.joints_of(pasted).len(), 2);
    assert_eq!(model.caret, NavPosition::below(pasted));
}

#[test]
fn test_cut_removes_and_keeps_clipboard() {
    let (store, [first, if_id, _, _, last]) = chain_store();
    let mut model = model_with(store, NavPosition::below(first));
    model.set_selection(FrameSelection::new(vec![first]));

    update(&mut model, frame(FrameMsg::Cut));
    assert_eq!(model.store.children_of(FrameId::MAIN), &[if_id, last]);
    assert_eq!(model.clipboard.as_ref().map(|c| c.len()), Some(1));
}

#[test]
fn test_paste_where_it_does_not_fit() {
    let (store, [first, ..]) = chain_store();
    let mut model = model_with(store, NavPosition::below(first));
    model.set_selection(FrameSelection::new(vec![first]));
    update(&mut model, frame(FrameMsg::Copy));

    model.caret = NavPosition::body(FrameId::IMPORTS);
    let before = model.store.clone();
    update(&mut model, frame(FrameMsg::Paste));
    assert_eq!(model.store, before);
    assert_eq!(model.status_message, "Cannot paste here");
}

#[test]
fn test_move_selection_into_body() {
    let (store, [first, if_id, ..]) = chain_store();
    let mut model = model_with(store, NavPosition::body(if_id));
    model.set_selection(FrameSelection::new(vec![first]));

    update(&mut model, frame(FrameMsg::MoveSelectionToCaret));
    assert_eq!(model.store.children_of(if_id), &[first]);
    assert_eq!(model.caret, NavPosition::below(first));
}

#[test]
fn test_wrap_selection() {
    let (store, [first, if_id, ..]) = chain_store();
    let mut model = model_with(store, NavPosition::below(first));
    model.set_selection(FrameSelection::new(vec![first]));

    update(&mut model, frame(FrameMsg::WrapSelection(FrameType::While)));
    let wrapper = model.store.children_of(FrameId::MAIN)[0];
    assert_eq!(model.store.frame_type(wrapper), Some(FrameType::While));
    assert_eq!(model.store.children_of(wrapper), &[first]);
    assert_eq!(model.store.children_of(FrameId::MAIN)[1], if_id);
}

#[test]
fn test_collapsing_moves_caret_out_of_the_body() {
    let mut store = FrameStore::new();
    let loop_id = add_with_text(&mut store, FrameId::MAIN, FrameType::While, "go");
    let step = add_with_text(&mut store, loop_id, FrameType::FuncCall, "step()");
    let mut model = model_with(store, NavPosition::below(step));

    update(&mut model, frame(FrameMsg::ToggleCollapsed(loop_id)));
    assert_eq!(
        model.store.get(loop_id).unwrap().collapsed,
        CollapsedState::Collapsed
    );
    assert_eq!(model.caret, NavPosition::below(loop_id));

    // Statements cannot be collapsed
    assert_eq!(update(&mut model, frame(FrameMsg::ToggleCollapsed(step))), None);
}

// ========================================================================
// Files
// ========================================================================

#[test]
fn test_save_as_requests_write_and_analysis() {
    let mut store = FrameStore::new();
    let call = add_with_text(&mut store, FrameId::MAIN, FrameType::FuncCall, "f()");
    let mut model = model_with(store, NavPosition::below(call));
    let path = PathBuf::from("/tmp/out.spy");

    let cmd = update(&mut model, Msg::App(AppMsg::SaveFileAs(path.clone())));
    let expected = persist::save(&model.store, &model.headers);
    match cmd {
        Some(Cmd::Batch(cmds)) => {
            assert_eq!(
                cmds[0],
                Cmd::SaveFile {
                    path: path.clone(),
                    content: expected.text.clone(),
                }
            );
            assert!(matches!(&cmds[1], Cmd::Analyze { line_map, .. } if *line_map == expected.line_map));
        }
        other => panic!("expected a batch, got {:?}", other),
    }
    assert!(model.is_saving);

    update(&mut model, Msg::App(AppMsg::SaveCompleted(Ok(()))));
    assert!(!model.is_saving);
    assert!(!model.is_modified);
    assert_eq!(model.file_path, Some(path));
}

#[test]
fn test_save_without_path_only_reports() {
    let mut model = empty_model();
    assert_eq!(update(&mut model, Msg::App(AppMsg::SaveFile)), Some(Cmd::Redraw));
    assert!(model.status_message.contains("No file path"));
    assert!(!model.is_saving);
}

#[test]
fn test_analysis_errors_follow_the_saved_line_map() {
    let mut store = FrameStore::new();
    let call = add_with_text(&mut store, FrameId::MAIN, FrameType::FuncCall, "f()");
    let mut model = model_with(store, NavPosition::below(call));
    update(&mut model, Msg::App(AppMsg::SaveFileAs(PathBuf::from("x.spy"))));

    let line = model.line_map.line_of(call).unwrap();
    update(
        &mut model,
        Msg::Analysis(AnalysisMsg::LineErrors(vec![
            (line, "NameError: f".to_string()),
            (0, "ignored".to_string()),
        ])),
    );
    assert_eq!(model.store.get(call).unwrap().error.as_deref(), Some("NameError: f"));

    update(&mut model, Msg::Analysis(AnalysisMsg::ClearFrameError(call)));
    assert_eq!(model.store.get(call).unwrap().error, None);
    assert_eq!(
        update(
            &mut model,
            Msg::Analysis(AnalysisMsg::SetFrameError {
                frame: FrameId(500),
                message: "gone".to_string(),
            })
        ),
        None
    );
}

#[test]
fn test_loading_a_good_file_replaces_the_program() {
    let mut model = empty_model();
    update(&mut model, Msg::add_frame(FrameType::Comment));
    let path = PathBuf::from("shapes.spy");

    update(
        &mut model,
        Msg::App(AppMsg::FileLoaded {
            path: path.clone(),
            result: Ok(SHAPES_SPY.to_string()),
        }),
    );
    assert_eq!(model.file_path, Some(path));
    assert!(!model.history.can_undo());
    assert!(!model.is_modified);
    assert_eq!(persist::save(&model.store, &model.headers).text, SHAPES_SPY);
}

#[test]
fn test_loading_a_bad_file_keeps_the_program() {
    let mut model = empty_model();
    update(&mut model, Msg::add_frame(FrameType::Comment));
    let before = model.store.clone();
    let corrupted = SHAPES_SPY.replacen("total = 0", "total = 2", 1);

    update(
        &mut model,
        Msg::App(AppMsg::FileLoaded {
            path: PathBuf::from("shapes.spy"),
            result: Ok(corrupted),
        }),
    );
    assert_eq!(model.store, before);
    assert_eq!(model.file_path, None);
    assert!(model.status_message.contains("checksum"));
}

#[test]
fn test_new_file_starts_over() {
    let (store, [first, ..]) = chain_store();
    let mut model = model_with(store, NavPosition::below(first));
    update(&mut model, Msg::App(AppMsg::NewFile));
    assert_eq!(model.store.user_frame_count(), 0);
    assert_eq!(model.caret, NavPosition::default());
}

#[test]
fn test_turning_empty_slot_checks_off_and_on() {
    let mut model = empty_model();
    update(&mut model, Msg::add_frame(FrameType::While));
    let loop_id = model.store.children_of(FrameId::MAIN)[0];
    let has_empty = |model: &trellis::EditorModel| {
        model
            .store
            .get(loop_id)
            .unwrap()
            .slot_errors
            .iter()
            .any(|e| e.kind == SlotErrorKind::EmptySlot)
    };
    assert!(has_empty(&model));

    update(&mut model, Msg::App(AppMsg::SetEmptySlotChecks(false)));
    assert!(!has_empty(&model));
    assert_eq!(update(&mut model, Msg::App(AppMsg::SetEmptySlotChecks(false))), None);
    update(&mut model, Msg::App(AppMsg::SetEmptySlotChecks(true)));
    assert!(has_empty(&model));
}
