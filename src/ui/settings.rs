use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, RenderConfig};

/// Everything the settings window edits. Persisted between runs;
/// the API key is deliberately not a field here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub ui_scale: f32,
    pub generation: GenerationConfig,
    pub render: RenderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ui_scale: 1.0,
            generation: GenerationConfig::default(),
            render: RenderConfig::default(),
        }
    }
}
