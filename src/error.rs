use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that can stop a generate or edit run.
/// The display strings are what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Please enter your OpenRouter API key")]
    MissingCredential,

    #[error("Please describe the animation you want")]
    EmptyPrompt,

    #[error("Please describe the changes you want to make")]
    EmptyChanges,

    #[error("No animation selected for editing")]
    NotEditing,

    #[error("API Error: {0}")]
    Api(String),

    #[error("No valid code generated")]
    NoCode,

    #[error("Could not prepare render directory: {0}")]
    Workspace(String),

    #[error("Execution Error:\n{0}")]
    Render(#[from] RenderError),

    #[error("Video read error: {0}")]
    VideoRead(String),
}

impl PipelineError {
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error(
        "{stderr}\n\nPossible solutions:\n1. Check code syntax\n2. Verify FFmpeg installation\n3. Ensure proper class definition"
    )]
    Failed { stderr: String },

    #[error("Video file not found")]
    VideoNotFound,

    #[error("Animation rendering timed out after {secs} seconds. Try a simpler animation.")]
    Timeout { secs: u64 },

    #[error("{0}")]
    Launch(String),
}
