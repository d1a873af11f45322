//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use trellis::frame::{FrameId, FrameType};
use trellis::model::EditorModel;
use trellis::navigation::NavPosition;
use trellis::persist::{self, DocumentHeaders};
use trellis::store::{FrameStore, InsertTarget};
use trellis::EditorConfig;

/// Sample program exercising every section, joint chains, disabled and
/// collapsed frames
pub const SHAPES_SPY: &str = include_str!("../../samples/shapes.spy");

/// Append a frame as the last child of `parent`
pub fn add(store: &mut FrameStore, parent: FrameId, ty: FrameType) -> FrameId {
    let index = store.children_of(parent).len();
    store
        .add_frame(InsertTarget::Child { parent, index }, ty)
        .unwrap_or_else(|| panic!("{:?} not accepted in {}", ty, parent))
}

/// Append a joint frame to the end of `head`'s chain
pub fn add_joint(store: &mut FrameStore, head: FrameId, ty: FrameType) -> FrameId {
    let index = store.joints_of(head).len();
    store
        .add_frame(InsertTarget::Joint { head, index }, ty)
        .unwrap_or_else(|| panic!("{:?} not accepted after {}", ty, head))
}

/// Append a frame with its first label set from text
pub fn add_with_text(store: &mut FrameStore, parent: FrameId, ty: FrameType, text: &str) -> FrameId {
    let id = add(store, parent, ty);
    assert!(store.set_slot_text(id, 0, text), "rejected slot text {:?}", text);
    id
}

/// `if` (1) with body statement (2) and `else` (3) with body statement (4)
pub fn if_else_store() -> (FrameStore, [FrameId; 4]) {
    let mut store = FrameStore::new();
    let if_id = add_with_text(&mut store, FrameId::MAIN, FrameType::If, "a");
    let body = add_with_text(&mut store, if_id, FrameType::FuncCall, "f()");
    let else_id = add_joint(&mut store, if_id, FrameType::Else);
    let else_body = add_with_text(&mut store, else_id, FrameType::FuncCall, "g()");
    (store, [if_id, body, else_id, else_body])
}

/// `call(1)`, `if(2) elif(3) else(4)`, `call(5)` in the main section
pub fn chain_store() -> (FrameStore, [FrameId; 5]) {
    let mut store = FrameStore::new();
    let first = add_with_text(&mut store, FrameId::MAIN, FrameType::FuncCall, "a()");
    let if_id = add_with_text(&mut store, FrameId::MAIN, FrameType::If, "x");
    let elif_id = add_joint(&mut store, if_id, FrameType::Elif);
    let else_id = add_joint(&mut store, if_id, FrameType::Else);
    let last = add_with_text(&mut store, FrameId::MAIN, FrameType::FuncCall, "b()");
    (store, [first, if_id, elif_id, else_id, last])
}

/// Model around `store` with the caret at `caret`
pub fn model_with(store: FrameStore, caret: NavPosition) -> EditorModel {
    let mut model = EditorModel::new(EditorConfig::default());
    model.store = store;
    model.caret = caret;
    model
}

/// Model with an empty program and the caret in the main section
pub fn empty_model() -> EditorModel {
    model_with(FrameStore::new(), NavPosition::body(FrameId::MAIN))
}

/// Build a deep nest of `while` loops, each holding the next
pub fn nested_whiles(depth: usize) -> (FrameStore, FrameId) {
    let mut store = FrameStore::new();
    let mut parent = FrameId::MAIN;
    let mut outer = None;
    for _ in 0..depth {
        parent = add_with_text(&mut store, parent, FrameType::While, "True");
        outer.get_or_insert(parent);
    }
    (store, outer.unwrap_or(FrameId::MAIN))
}

/// Assert the store is consistent and survives a save and reload unchanged
pub fn assert_reloads(store: &FrameStore) {
    store.check_invariants().unwrap();
    let text = persist::save(store, &DocumentHeaders::default()).text;
    let document = persist::load(&text).unwrap_or_else(|e| panic!("reload failed: {}\n{}", e, text));
    assert_eq!(persist::save(&document.store, &document.headers).text, text);
}

/// `try` (1) with `except` (2), `else` (3) and `finally` (4), each with a body statement
pub fn try_chain_store() -> (FrameStore, [FrameId; 4]) {
    let mut store = FrameStore::new();
    let try_id = add(&mut store, FrameId::MAIN, FrameType::Try);
    add_with_text(&mut store, try_id, FrameType::FuncCall, "risky()");
    let except = add_joint(&mut store, try_id, FrameType::Except);
    assert!(store.set_slot_text(except, 0, "ValueError"));
    add_with_text(&mut store, except, FrameType::FuncCall, "recover()");
    let else_id = add_joint(&mut store, try_id, FrameType::Else);
    add_with_text(&mut store, else_id, FrameType::FuncCall, "proceed()");
    let finally = add_joint(&mut store, try_id, FrameType::Finally);
    add_with_text(&mut store, finally, FrameType::FuncCall, "cleanup()");
    (store, [try_id, except, else_id, finally])
}

/// `def f(n)` in the definitions section holding `while n` whose body ends in
/// `return n`. Returns the store, the def, the loop and the return.
pub fn def_with_loop_return() -> (FrameStore, [FrameId; 3]) {
    let mut store = FrameStore::new();
    let def = add_with_text(&mut store, FrameId::DEFS, FrameType::FuncDef, "f");
    assert!(store.set_slot_text(def, 1, "n"));
    let looped = add_with_text(&mut store, def, FrameType::While, "n");
    let ret = add_with_text(&mut store, looped, FrameType::Return, "n");
    (store, [def, looped, ret])
}
