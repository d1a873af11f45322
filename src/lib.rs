//! trellis - structured frame-based code editing core
//!
//! A program is a tree of typed frames whose labels hold nested slot
//! structures. This crate provides the frame store, flat slot addressing,
//! caret and selection navigation, structural mutations, error annotation,
//! the `.spy` encoding, and an Elm-style editor shell around them.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod frame;
pub mod history;
pub mod messages;
pub mod model;
pub mod mutation;
pub mod navigation;
pub mod persist;
pub mod slot;
pub mod store;
pub mod tracing;
pub mod update;
pub mod validation;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::EditorConfig;
pub use frame::{Frame, FrameId, FrameType};
pub use messages::Msg;
pub use model::EditorModel;
pub use navigation::{Direction, NavPosition};
pub use slot::{SlotId, SlotStructure};
pub use store::{FrameStore, InsertTarget};
