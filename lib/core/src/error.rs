use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error raised by one pipeline stage. The orchestrator continues with a
/// stage-specific default for recoverable kinds and aborts the request for
/// fatal ones.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("External call failed: {0}")]
    ExternalCall(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StageError {
    /// Dictionary/storage I/O is fatal for the request; everything else is
    /// recovered with a deterministic fallback.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageError::Storage(_))
    }
}

impl From<notex_model::Error> for StageError {
    fn from(err: notex_model::Error) -> Self {
        match err {
            notex_model::Error::MalformedResponse(msg) => StageError::MalformedOutput(msg),
            other => StageError::ExternalCall(other.to_string()),
        }
    }
}

/// Error terminating a whole pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Stage failed: {0}")]
    Stage(#[from] StageError),
}
