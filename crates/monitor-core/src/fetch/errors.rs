use crate::errors::MonitorError;

/// Failure of a single fetch. Recoverable: recorded in the cache and retried
/// on the next natural tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("{message}")]
    Adapter { message: String },

    #[error("failed to start command: {message}")]
    SpawnFailed { message: String },

    #[error("command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("malformed adapter output: {message}")]
    MalformedOutput { message: String },

    #[error("fetch panicked")]
    Panicked,
}

impl FetchError {
    pub fn adapter(message: impl Into<String>) -> Self {
        FetchError::Adapter {
            message: message.into(),
        }
    }
}

impl MonitorError for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "FETCH_TIMEOUT",
            FetchError::Adapter { .. } => "FETCH_ADAPTER_FAILED",
            FetchError::SpawnFailed { .. } => "FETCH_SPAWN_FAILED",
            FetchError::CommandFailed { .. } => "FETCH_COMMAND_FAILED",
            FetchError::MalformedOutput { .. } => "FETCH_MALFORMED_OUTPUT",
            FetchError::Panicked => "FETCH_PANICKED",
        }
    }
}
