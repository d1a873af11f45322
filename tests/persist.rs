//! `.spy` encoding: round trips, line maps, corrupted input, files on disk

mod common;

use common::{add_with_text, SHAPES_SPY};
use tempfile::TempDir;
use trellis::frame::{CollapsedState, FrameId, FrameType};
use trellis::persist::{
    self, load, load_into, save, DocumentHeaders, LoadError, EDITOR_DIVIDER_KEY,
};
use trellis::store::FrameStore;

fn frame_type_at(document: &persist::Document, line: usize) -> Option<FrameType> {
    let id = document.line_map.frame_at(line)?;
    document.store.frame_type(id)
}

/// Replace one body line and fix up nothing else
fn tamper(source: &str, from: &str, to: &str) -> String {
    assert!(source.contains(from));
    source.replacen(from, to, 1)
}

// ========================================================================
// Round trips
// ========================================================================

#[test]
fn test_sample_round_trips_byte_for_byte() {
    let document = load(SHAPES_SPY).unwrap();
    document.store.check_invariants().unwrap();
    let output = save(&document.store, &document.headers);
    assert_eq!(output.text, SHAPES_SPY);
    assert_eq!(output.line_map, document.line_map);
}

#[test]
fn test_edit_then_save_then_load_keeps_the_edit() {
    let mut document = load(SHAPES_SPY).unwrap();
    let call = add_with_text(
        &mut document.store,
        FrameId::MAIN,
        FrameType::FuncCall,
        "print(\"bye\",total)",
    );
    let text = save(&document.store, &document.headers).text;
    assert!(text.ends_with("    count = 1\nprint(\"bye\", total)\n"));

    let reloaded = load(&text).unwrap();
    let last = *reloaded.store.children_of(FrameId::MAIN).last().unwrap();
    assert_eq!(
        reloaded.store.get(last).unwrap().labels,
        document.store.get(call).unwrap().labels
    );
    assert_eq!(save(&reloaded.store, &reloaded.headers).text, text);
}

#[test]
fn test_empty_program_round_trips() {
    let text = save(&FrameStore::new(), &DocumentHeaders::default()).text;
    let document = load(&text).unwrap();
    assert_eq!(document.store.user_frame_count(), 0);
    assert_eq!(save(&document.store, &document.headers).text, text);
}

// ========================================================================
// Structure of the loaded sample
// ========================================================================

#[test]
fn test_sample_line_map_points_at_frames() {
    let document = load(SHAPES_SPY).unwrap();
    assert_eq!(frame_type_at(&document, 4), Some(FrameType::Import));
    assert_eq!(frame_type_at(&document, 5), Some(FrameType::FromImport));
    assert_eq!(frame_type_at(&document, 8), Some(FrameType::FuncDef));
    assert_eq!(frame_type_at(&document, 14), Some(FrameType::Comment));
    assert_eq!(frame_type_at(&document, 19), Some(FrameType::Elif));
    assert_eq!(frame_type_at(&document, 32), Some(FrameType::Else));
    // Headers, section and state directives belong to no frame
    for line in [0, 2, 3, 7, 13] {
        assert_eq!(document.line_map.frame_at(line), None, "line {}", line);
    }
}

#[test]
fn test_sample_keeps_frame_state_and_disabled_frames() {
    let document = load(SHAPES_SPY).unwrap();
    let area = document.line_map.frame_at(8).unwrap();
    assert_eq!(
        document.store.get(area).unwrap().collapsed,
        CollapsedState::Collapsed
    );
    let disabled = document.line_map.frame_at(23).unwrap();
    let frame = document.store.get(disabled).unwrap();
    assert!(frame.disabled);
    assert_eq!(frame.frame_type, FrameType::FuncCall);
}

#[test]
fn test_sample_joint_chains() {
    let document = load(SHAPES_SPY).unwrap();
    let store = &document.store;
    let types = |id: FrameId| -> Vec<FrameType> {
        store
            .joints_of(id)
            .iter()
            .filter_map(|&j| store.frame_type(j))
            .collect()
    };

    let if_id = document.line_map.frame_at(17).unwrap();
    assert_eq!(types(if_id), vec![FrameType::Elif, FrameType::Else]);
    let try_id = document.line_map.frame_at(24).unwrap();
    assert_eq!(types(try_id), vec![FrameType::Except, FrameType::Finally]);
    let while_id = document.line_map.frame_at(30).unwrap();
    assert_eq!(types(while_id), vec![FrameType::Else]);

    let for_id = document.line_map.frame_at(16).unwrap();
    assert_eq!(store.children_of(for_id), &[if_id]);
}

#[test]
fn test_sample_headers_survive() {
    let document = load(SHAPES_SPY).unwrap();
    assert_eq!(document.headers.platform, "std");
    let dividers = document.headers.dividers(EDITOR_DIVIDER_KEY).unwrap();
    assert_eq!(dividers.0.get("0"), Some(&50.5));
}

// ========================================================================
// Rejected input
// ========================================================================

#[test]
fn test_edited_body_fails_the_checksum() {
    let source = tamper(SHAPES_SPY, "total = 0\n", "total = 1\n");
    assert!(matches!(load(&source), Err(LoadError::ChecksumMismatch { .. })));
}

#[test]
fn test_uppercase_checksum_is_accepted() {
    let line = SHAPES_SPY.lines().nth(2).unwrap();
    let upper = format!("#(=> Checksum:{}", line["#(=> Checksum:".len()..].to_uppercase());
    let source = tamper(SHAPES_SPY, line, &upper);
    assert!(load(&source).is_ok());
}

#[test]
fn test_missing_header_and_checksum() {
    assert_eq!(load("import math\n"), Err(LoadError::MissingHeader));
    assert_eq!(
        load("#(=> Strype:1:std\n#(=> Section:Imports\n"),
        Err(LoadError::MissingChecksum)
    );
    assert!(matches!(
        load("#(=> Strype:9:std\n"),
        Err(LoadError::UnsupportedVersion { found: 9 })
    ));
}

#[test]
fn test_failed_load_into_leaves_store_untouched() {
    let mut store = FrameStore::new();
    add_with_text(&mut store, FrameId::MAIN, FrameType::FuncCall, "keep()");
    let mut headers = DocumentHeaders::default();
    let (before, before_headers) = (store.clone(), headers.clone());

    let corrupted = tamper(SHAPES_SPY, "    break\n", "    brake\n");
    assert!(!load_into(&mut store, &mut headers, &corrupted));
    assert_eq!(store, before);
    assert_eq!(headers, before_headers);

    assert!(load_into(&mut store, &mut headers, SHAPES_SPY));
    assert_eq!(save(&store, &headers).text, SHAPES_SPY);
}

// ========================================================================
// Files
// ========================================================================

#[test]
fn test_write_then_read_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("shapes.spy");
    let document = load(SHAPES_SPY).unwrap();

    let line_map = persist::write_file(&path, &document.store, &document.headers).unwrap();
    assert_eq!(line_map, document.line_map);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SHAPES_SPY);

    let reread = persist::read_file(&path).unwrap();
    assert_eq!(reread.store, document.store);
}

#[test]
fn test_read_missing_or_corrupt_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(persist::read_file(&dir.path().join("absent.spy")).is_err());

    let path = dir.path().join("bad.spy");
    std::fs::write(&path, "not a program\n").unwrap();
    let err = persist::read_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("bad.spy"));
}
