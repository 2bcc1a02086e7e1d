//! # Configuration System
//!
//! Hierarchical TOML configuration for the monitor CLI.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values and panel layout
//! 2. **User config** - `~/.monitor/config.toml` (global user preferences)
//! 3. **Project config** - `./.monitor/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use monitor_core::config::MonitorConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::load_hierarchy()?;
//!     println!("{} panels", config.panels.len());
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{
    AdapterKind, DashboardConfig, KeyConfig, MonitorConfig, PanelConfig, PanelKind,
    ResourceConfig,
};
pub use validation::validate_config;

impl MonitorConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
