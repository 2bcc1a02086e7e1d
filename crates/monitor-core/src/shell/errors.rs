use crate::errors::{ConfigError, MonitorError};

/// Errors that stop the dashboard from starting or keep it from running.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Failed to initialize terminal: {message}")]
    TerminalInit { message: String },

    #[error("No panels configured")]
    NoPanels,

    #[error("Terminal I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl MonitorError for DashboardError {
    fn error_code(&self) -> &'static str {
        match self {
            DashboardError::TerminalInit { .. } => "DASHBOARD_TERMINAL_INIT",
            DashboardError::NoPanels => "DASHBOARD_NO_PANELS",
            DashboardError::Io { .. } => "DASHBOARD_IO_ERROR",
            DashboardError::Config { source } => source.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            DashboardError::NoPanels => true,
            DashboardError::Config { source } => source.is_user_error(),
            _ => false,
        }
    }
}
