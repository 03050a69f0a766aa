use crate::model::session_state::SessionState;
use crate::ui::settings::Settings;

pub enum EngineCommand {
    Generate { prompt: String, api_key: String },
    ApplyEdit { changes: String, api_key: String },
    BeginEdit { index: usize },
    CancelEdit,
    StartNew,
    UpdateSettings(Settings),
}

pub enum EngineResponse {
    /// Stage text while a pipeline runs.
    Progress(String),

    /// Full session snapshot, sent after every command.
    SessionUpdated(SessionState),

    Failed(String),
}
