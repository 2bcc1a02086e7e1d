//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values and panel layout
//! 2. **User config** - `~/.monitor/config.toml` (global user preferences)
//! 3. **Project config** - `./.monitor/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::types::{DashboardConfig, KeyConfig, MonitorConfig};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

/// Load configuration from the hierarchy of config files.
///
/// Missing config files are not errors; unreadable or malformed ones are.
/// The built-in panel layout is applied when no file declares panels, and the
/// merged result is validated.
pub fn load_hierarchy() -> Result<MonitorConfig, ConfigError> {
    let mut config = MonitorConfig::default();

    if let Some(user) = load_optional(&user_config_path()?)? {
        config = merge_configs(config, user);
    }

    if let Some(project) = load_optional(&project_config_path()?)? {
        config = merge_configs(config, project);
    }

    let config = config.with_builtin_layout();
    validate_config(&config)?;

    Ok(config)
}

/// `~/.monitor/config.toml`
pub fn user_config_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home_dir.join(".monitor").join("config.toml"))
}

/// `./.monitor/config.toml`
pub fn project_config_path() -> Result<PathBuf, ConfigError> {
    Ok(std::env::current_dir()?.join(".monitor").join("config.toml"))
}

fn load_optional(path: &Path) -> Result<Option<MonitorConfig>, ConfigError> {
    match load_config_file(path) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::IoError { source }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!(
                event = "core.config.file_not_found",
                path = %path.display()
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Load a single configuration file.
pub fn load_config_file(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Merge two configurations, with override_config taking precedence.
///
/// Optional scalars are overridden only when present. A non-empty panel list
/// replaces the base list wholesale (panel order is meaningful); resources
/// merge by name.
pub fn merge_configs(base: MonitorConfig, override_config: MonitorConfig) -> MonitorConfig {
    let o = override_config.dashboard;
    let b = base.dashboard;

    MonitorConfig {
        dashboard: DashboardConfig {
            title: o.title.or(b.title),
            default_env: o.default_env.or(b.default_env),
            refresh_interval_secs: o.refresh_interval_secs.or(b.refresh_interval_secs),
            staleness_multiplier: o.staleness_multiplier.or(b.staleness_multiplier),
            offline_after_failures: o.offline_after_failures.or(b.offline_after_failures),
            http_timeout_secs: o.http_timeout_secs.or(b.http_timeout_secs),
            shell_timeout_secs: o.shell_timeout_secs.or(b.shell_timeout_secs),
        },
        keys: KeyConfig {
            quit: override_config.keys.quit.or(base.keys.quit),
            refresh: override_config.keys.refresh.or(base.keys.refresh),
            next: override_config.keys.next.or(base.keys.next),
            previous: override_config.keys.previous.or(base.keys.previous),
        },
        panels: if override_config.panels.is_empty() {
            base.panels
        } else {
            override_config.panels
        },
        resources: {
            let mut merged = base.resources;
            merged.extend(override_config.resources);
            merged
        },
    }
}
