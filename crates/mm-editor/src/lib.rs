pub mod clipboard;
pub mod commands;
pub mod config;
pub mod editor;

pub use commands::{History, HistoryEntry, Operation, Selection};
pub use config::HistoryConfig;
pub use editor::MindMap;

// Re-export the core crate so embedders only need one dependency
pub use mm_core;
