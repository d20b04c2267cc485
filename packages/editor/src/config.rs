use serde::{Deserialize, Serialize};

/// Editor behavior knobs. Loaded by the host application and handed to
/// [`crate::EditSession::new`]; everything has a sensible default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Maximum number of history snapshots kept (0 = unlimited). The
    /// oldest entries are dropped once the cap is exceeded.
    pub max_undo_levels: usize,

    /// Palette cycled through when new labels are created.
    pub label_colors: Vec<String>,

    /// Icon assigned to freshly inserted labels.
    pub default_label_icon: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: 100,
            label_colors: vec![
                "#0ea5e9".to_string(),
                "#22c55e".to_string(),
                "#f97316".to_string(),
                "#a855f7".to_string(),
                "#ec4899".to_string(),
                "#14b8a6".to_string(),
                "#eab308".to_string(),
            ],
            default_label_icon: "Tag".to_string(),
        }
    }
}
