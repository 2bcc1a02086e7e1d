use crate::errors::MonitorError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("unexpected data for '{key}': expected {expected}")]
    UnexpectedShape { key: String, expected: &'static str },

    #[error("panel render panicked: {message}")]
    Panicked { message: String },
}

impl RenderError {
    pub fn shape(key: &str, expected: &'static str) -> Self {
        RenderError::UnexpectedShape {
            key: key.to_string(),
            expected,
        }
    }
}

impl MonitorError for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            RenderError::UnexpectedShape { .. } => "RENDER_UNEXPECTED_SHAPE",
            RenderError::Panicked { .. } => "RENDER_PANICKED",
        }
    }
}
