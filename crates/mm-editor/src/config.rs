//! History configuration.

use serde::{Deserialize, Serialize};

/// Options recognized by the undo/redo history.
///
/// Deserializes from the embedder's settings with camelCase keys
/// (`allowUndo`, `maxHistorySize`); missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Record operations at all. When false, `record` is a no-op and
    /// undo/redo always report nothing to do. Default: **true**.
    pub allow_undo: bool,

    /// Maximum number of undoable entries; the oldest is evicted past this.
    /// Default: **100**.
    pub max_history_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            allow_undo: true,
            max_history_size: 100,
        }
    }
}
