use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Request a GLES 3.0 context instead of desktop GL 3.3 core.
    pub gles: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glwidget".to_string(),
            width: 800,
            height: 600,
            vsync: true,
            gles: false,
        }
    }
}
