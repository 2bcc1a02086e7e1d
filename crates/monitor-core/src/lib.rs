//! monitor-core: engine behind the `monitor` terminal dashboard
//!
//! Panels render from a shared cache that a background scheduler keeps
//! fresh on independent per-resource timers. Nothing in this crate touches
//! the terminal; the binary crate hosts the event loop and draws.
//!
//! # Main Entry Points
//!
//! - [`scheduler`] - Per-resource refresh timers feeding the cache
//! - [`cache`] - Generation-stamped data cache
//! - [`panels`] - Panel rendering from cache snapshots
//! - [`navigation`] - Panel registry, active panel, key dispatch
//! - [`plan`] - Wiring configuration into panels and fetchers
//! - [`config`] - Configuration management

pub mod cache;
pub mod config;
pub mod errors;
pub mod events;
pub mod fetch;
pub mod logging;
pub mod navigation;
pub mod panels;
pub mod plan;
pub mod scheduler;
pub mod shell;

// Re-export commonly used types at crate root for convenience
pub use cache::{CacheEntry, DataCache};
pub use config::MonitorConfig;
pub use errors::{ConfigError, MonitorError, MonitorResult};
pub use fetch::{FetchError, ResourceFetcher};
pub use navigation::{Action, KeyBindings, KeyInput, NavigationController, NavigationState};
pub use panels::{CacheSnapshot, Panel, PanelContent, RenderError, Tone};
pub use plan::{DashboardPlan, PlanSummary};
pub use scheduler::{RefreshRequest, RefreshScheduler, SchedulerStats, TickResult};
pub use shell::{DashboardError, ShellState};

// Re-export logging initialization
pub use logging::init_logging;
