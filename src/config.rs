use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

/// How the remote model is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub create_max_tokens: u32,
    pub edit_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            temperature: 0.3,
            create_max_tokens: 1000,
            edit_max_tokens: 1200,
            timeout_secs: 60,
        }
    }
}

/// How the manim subprocess is run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Explicit engine executable. Skips the search when set.
    pub engine_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub retry_low_fidelity: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            timeout_secs: 120,
            retry_low_fidelity: true,
        }
    }
}

/// The credential is only ever read from the environment or typed in;
/// it is never written to disk.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
