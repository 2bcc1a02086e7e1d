//! Configuration validation.

use std::collections::HashSet;

use crate::config::types::{AdapterKind, MonitorConfig};
use crate::errors::ConfigError;
use crate::navigation::keys::KeyInput;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.into(),
    }
}

/// Validate a merged configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), ConfigError> {
    let dashboard = &config.dashboard;

    if dashboard.refresh_interval_secs == Some(0) {
        return Err(invalid("dashboard.refresh_interval_secs must be greater than 0"));
    }
    if dashboard.staleness_multiplier == Some(0) {
        return Err(invalid("dashboard.staleness_multiplier must be at least 1"));
    }
    if dashboard.offline_after_failures == Some(0) {
        return Err(invalid("dashboard.offline_after_failures must be at least 1"));
    }
    if dashboard.http_timeout_secs == Some(0) || dashboard.shell_timeout_secs == Some(0) {
        return Err(invalid("dashboard timeouts must be greater than 0"));
    }

    let bindings = [
        ("quit", &config.keys.quit),
        ("refresh", &config.keys.refresh),
        ("next", &config.keys.next),
        ("previous", &config.keys.previous),
    ];
    for (action, keys) in bindings {
        for key in keys.iter().flatten() {
            if KeyInput::parse(key).is_none() {
                return Err(ConfigError::UnknownKey {
                    action: action.to_string(),
                    key: key.clone(),
                });
            }
        }
    }

    for (name, resource) in &config.resources {
        match resource.adapter {
            AdapterKind::Command if resource.command.as_deref().is_none_or(str::is_empty) => {
                return Err(invalid(format!(
                    "resources.{} uses the command adapter but has no command",
                    name
                )));
            }
            AdapterKind::Tcp if resource.targets.is_empty() => {
                return Err(invalid(format!(
                    "resources.{} uses the tcp adapter but has no targets",
                    name
                )));
            }
            _ => {}
        }
        if resource.timeout_secs == Some(0) || resource.interval_secs == Some(0) {
            return Err(invalid(format!(
                "resources.{} intervals and timeouts must be greater than 0",
                name
            )));
        }
    }

    let mut seen = HashSet::new();
    for panel in &config.panels {
        if panel.id.is_empty() {
            return Err(invalid("panel id must not be empty"));
        }
        if !seen.insert(panel.id.as_str()) {
            return Err(ConfigError::DuplicatePanel {
                id: panel.id.clone(),
            });
        }
        if panel.interval_secs == Some(0) {
            return Err(invalid(format!(
                "panels.{}.interval_secs must be greater than 0",
                panel.id
            )));
        }
        for resource in &panel.resources {
            if !config.resources.contains_key(resource) {
                return Err(ConfigError::UndefinedResource {
                    panel: panel.id.clone(),
                    resource: resource.clone(),
                });
            }
        }
    }

    Ok(())
}
