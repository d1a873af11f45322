//! Application model - the complete state of one editor
//!
//! The store is owned here and only mutated from `update`; a renderer reads
//! the model between messages.

use std::path::PathBuf;

use crate::config::EditorConfig;
use crate::history::{History, Snapshot};
use crate::mutation::Clipboard;
use crate::navigation::selection::apply_selection;
use crate::navigation::{FrameSelection, NavPosition};
use crate::persist::{self, Document, DocumentHeaders, SaveOutput};
use crate::store::FrameStore;
use crate::validation::{self, LineFrameMap};

/// The complete editor model
#[derive(Debug, Clone)]
pub struct EditorModel {
    pub store: FrameStore,
    pub caret: NavPosition,
    pub selection: FrameSelection,
    pub clipboard: Option<Clipboard>,
    pub history: History,
    pub headers: DocumentHeaders,
    pub config: EditorConfig,
    pub file_path: Option<PathBuf>,
    pub is_modified: bool,
    pub is_saving: bool,
    /// Message shown to the user after the last action
    pub status_message: String,
    /// Line map of the last save, used to place analyser errors
    pub line_map: LineFrameMap,
}

impl EditorModel {
    /// Empty program with the caret in the imports section
    pub fn new(config: EditorConfig) -> Self {
        let mut store = FrameStore::new();
        store.set_empty_slot_checks(config.validate_empty_slots);
        Self {
            store,
            caret: NavPosition::default(),
            selection: FrameSelection::default(),
            clipboard: None,
            history: History::with_max_size(config.undo_limit),
            headers: DocumentHeaders::default(),
            config,
            file_path: None,
            is_modified: false,
            is_saving: false,
            status_message: String::new(),
            line_map: LineFrameMap::new(),
        }
    }

    /// Model for a loaded document
    pub fn with_document(document: Document, path: Option<PathBuf>, config: EditorConfig) -> Self {
        let mut model = Self::new(config);
        model.replace_document(document, path);
        model
    }

    /// Swap in a freshly loaded document, resetting caret, selection and
    /// history
    pub fn replace_document(&mut self, document: Document, path: Option<PathBuf>) {
        self.store = document.store;
        self.headers = document.headers;
        self.line_map = document.line_map;
        self.apply_slot_check_setting();
        self.caret = NavPosition::default();
        self.selection.clear();
        self.history.clear();
        self.file_path = path;
        self.is_modified = false;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // ==================== History ====================

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            store: self.store.clone(),
            caret: self.caret.clone(),
        }
    }

    /// Remember the current state before an edit
    pub fn record_undo(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    /// Restore a snapshot taken earlier
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.store = snapshot.store;
        self.caret = snapshot.caret;
        self.selection.clear();
        apply_selection(&mut self.store, &self.selection);
        self.is_modified = true;
    }

    // ==================== Selection ====================

    pub fn set_selection(&mut self, selection: FrameSelection) {
        self.selection = selection;
        apply_selection(&mut self.store, &self.selection);
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(FrameSelection::default());
    }

    /// Frames an action applies to: the selection, or nothing
    pub fn selected_roots(&self) -> Vec<crate::frame::FrameId> {
        self.selection.roots(&self.store)
    }

    // ==================== Settings ====================

    pub fn set_empty_slot_checks(&mut self, enabled: bool) {
        self.config.validate_empty_slots = enabled;
        self.apply_slot_check_setting();
    }

    fn apply_slot_check_setting(&mut self) {
        let enabled = self.config.validate_empty_slots;
        self.store.set_empty_slot_checks(enabled);
        if enabled {
            validation::validate_all(&mut self.store);
        } else {
            validation::clear_empty_slot_errors(&mut self.store);
        }
    }

    // ==================== Output ====================

    /// Encode the program, remembering the line map for analyser errors
    pub fn encode(&mut self) -> SaveOutput {
        let output = persist::save(&self.store, &self.headers);
        self.line_map = output.line_map.clone();
        output
    }

    /// Assert store and caret invariants (debug builds only)
    #[cfg(debug_assertions)]
    pub fn assert_invariants_with_context(&self, context: &str) {
        if let Err(violation) = self.store.check_invariants() {
            debug_assert!(false, "after {}: {}", context, violation);
        }
        debug_assert!(
            crate::navigation::is_valid_position(&self.store, &self.caret),
            "after {}: caret at invalid position {}",
            context,
            self.caret
        );
    }

    /// No-op in release builds
    #[cfg(not(debug_assertions))]
    #[inline]
    pub fn assert_invariants_with_context(&self, _context: &str) {}
}

impl Default for EditorModel {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
