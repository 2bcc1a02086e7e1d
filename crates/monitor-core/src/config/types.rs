//! Configuration type definitions for the monitor CLI.
//!
//! These types are serialized/deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [dashboard]
//! refresh_interval_secs = 10
//! staleness_multiplier = 2
//! offline_after_failures = 3
//!
//! [keys]
//! quit = ["q", "esc", "ctrl-c"]
//!
//! [resources.containers]
//! adapter = "command"
//! command = "ssh ops@{env}-docker docker stats --no-stream --format '{{json .}}' | jq -s ."
//! timeout_secs = 45
//!
//! [resources.services]
//! adapter = "tcp"
//! targets = ["user-auth={env}-auth.internal:443", "mcp-host={env}-mcp.internal:8080"]
//!
//! [[panels]]
//! id = "containers"
//! label = "Containers"
//! kind = "containers"
//! resources = ["containers"]
//! interval_secs = 15
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration loaded from TOML config files.
///
/// Loaded from:
/// 1. User config: `~/.monitor/config.toml`
/// 2. Project config: `./.monitor/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonitorConfig {
    /// Dashboard-wide settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Key binding overrides
    #[serde(default)]
    pub keys: KeyConfig,

    /// Panels in registration order. Empty means the built-in layout.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<PanelConfig>,

    /// Resource definitions by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceConfig>,
}

/// Dashboard-wide settings.
///
/// Every field is optional so that a project config can override a single
/// value without restating the rest; accessors fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    /// Identity text shown in the header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Environment used when `--env` is not passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_env: Option<String>,

    /// Refresh interval for panels that do not set their own.
    /// Default: 10 seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_secs: Option<u64>,

    /// Data older than `multiplier × refresh interval` is flagged stale.
    /// Default: 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staleness_multiplier: Option<u32>,

    /// Consecutive failures before a resource is shown as offline.
    /// Default: 3.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_after_failures: Option<u32>,

    /// Timeout for HTTP-class (probe) fetches. Default: 10 seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// Timeout for remote-shell-class (command) fetches. Default: 45 seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_timeout_secs: Option<u64>,
}

/// Key binding overrides. Digits always select panels by position.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quit: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Vec<String>>,
}

/// Presentation variant of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Overview,
    ServiceHealth,
    Infrastructure,
    Containers,
    BlueGreen,
}

impl PanelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKind::Overview => "overview",
            PanelKind::ServiceHealth => "service_health",
            PanelKind::Infrastructure => "infrastructure",
            PanelKind::Containers => "containers",
            PanelKind::BlueGreen => "blue_green",
        }
    }
}

/// One `[[panels]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub id: String,
    pub label: String,
    pub kind: PanelKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Resource names (keys of `[resources]`). An overview panel with no
    /// resources summarises every resource.
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

/// Transport used to fetch a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Run a shell command and parse stdout as JSON.
    Command,
    /// Probe `host:port` targets over TCP.
    Tcp,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Command => "command",
            AdapterKind::Tcp => "tcp",
        }
    }
}

/// One `[resources.<name>]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub adapter: AdapterKind,

    /// Cache key; `{env}` is substituted. Default: `<name>:{env}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Shell command for the `command` adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// `name=host:port` or `host:port` entries for the `tcp` adapter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Overrides the interval derived from the panels showing this resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}
