//! Application lifecycle events shared by the CLI and the dashboard host.

use tracing::{error, info};

pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

pub fn log_app_error(error: &dyn std::error::Error) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_type = std::any::type_name_of_val(error)
    );
}

/// Dashboard wired and about to take over the terminal.
pub fn log_dashboard_started(env: &str, panels: usize, resources: usize) {
    info!(
        event = "core.dashboard.started",
        env = env,
        panels = panels,
        resources = resources
    );
}

/// Dashboard torn down; `reason` is `quit`, `signal` or `error`.
pub fn log_dashboard_stopped(env: &str, reason: &str) {
    info!(event = "core.dashboard.stopped", env = env, reason = reason);
}
