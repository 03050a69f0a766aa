use std::sync::Arc;

pub const EDIT_PREFIX: &str = "EDITED: ";

/// How a run ended. Holding the video and the error in one enum keeps
/// an entry from ever carrying both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Video(Arc<[u8]>),
    Error(String),
}

/// One recorded generate or edit result. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub prompt: String,
    pub original_prompt: String,
    pub code: String,
    pub outcome: Outcome,
}

impl HistoryEntry {
    pub fn created(prompt: &str, code: String, outcome: Outcome) -> Self {
        Self {
            prompt: prompt.to_string(),
            original_prompt: prompt.to_string(),
            code,
            outcome,
        }
    }

    /// A successful edit of `base`. Keeps the lineage's first request.
    pub fn edited(base: &HistoryEntry, changes: &str, code: String, video: Arc<[u8]>) -> Self {
        Self {
            prompt: format!("{EDIT_PREFIX}{changes}"),
            original_prompt: base.original_prompt.clone(),
            code,
            outcome: Outcome::Video(video),
        }
    }

    pub fn video(&self) -> Option<&[u8]> {
        match &self.outcome {
            Outcome::Video(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            Outcome::Video(_) => None,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.prompt.starts_with(EDIT_PREFIX)
    }
}
