use std::error::Error;

/// Base trait for all application errors
pub trait MonitorError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type MonitorResult<T> = Result<T, Box<dyn MonitorError>>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Panel '{panel}' references undefined resource '{resource}'")]
    UndefinedResource { panel: String, resource: String },

    #[error("Duplicate panel id '{id}'")]
    DuplicatePanel { id: String },

    #[error("Unknown key name '{key}' in [keys].{action}")]
    UnknownKey { action: String, key: String },

    #[error("Could not find home directory")]
    HomeDirNotFound,

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl MonitorError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ConfigError::UndefinedResource { .. } => "CONFIG_UNDEFINED_RESOURCE",
            ConfigError::DuplicatePanel { .. } => "CONFIG_DUPLICATE_PANEL",
            ConfigError::UnknownKey { .. } => "CONFIG_UNKNOWN_KEY",
            ConfigError::HomeDirNotFound => "CONFIG_HOME_NOT_FOUND",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        !matches!(
            self,
            ConfigError::HomeDirNotFound | ConfigError::IoError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_result() {
        let _result: MonitorResult<i32> = Ok(42);
    }

    #[test]
    fn test_undefined_resource_display() {
        let error = ConfigError::UndefinedResource {
            panel: "containers".to_string(),
            resource: "docker".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Panel 'containers' references undefined resource 'docker'"
        );
        assert_eq!(error.error_code(), "CONFIG_UNDEFINED_RESOURCE");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_config_parse_error() {
        let error = ConfigError::ConfigParseError {
            path: "/tmp/config.toml".to_string(),
            message: "invalid TOML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse config file '/tmp/config.toml': invalid TOML syntax"
        );
        assert_eq!(error.error_code(), "CONFIG_PARSE_ERROR");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_io_error_is_not_user_error() {
        let error = ConfigError::from(std::io::Error::other("disk gone"));
        assert_eq!(error.error_code(), "CONFIG_IO_ERROR");
        assert!(!error.is_user_error());
    }
}
