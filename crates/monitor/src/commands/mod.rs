use clap::ArgMatches;
use tracing::{error, info};

use monitor_core::config::MonitorConfig;
use monitor_core::events;

mod completions;
mod dashboard;
mod panels;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    let result = match matches.subcommand() {
        Some(("dashboard", sub_matches)) => dashboard::handle_dashboard_command(sub_matches),
        Some(("panels", sub_matches)) => panels::handle_panels_command(sub_matches),
        Some(("completions", sub_matches)) => completions::handle_completions_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    };

    events::log_app_shutdown();
    result
}

/// Load configuration, reporting problems to the user.
///
/// Unlike a missing file, a broken one is fatal: the dashboard would
/// otherwise silently show a different layout than the one configured.
pub(crate) fn load_config() -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    match MonitorConfig::load_hierarchy() {
        Ok(config) => {
            info!(
                event = "cli.config.load_completed",
                panels = config.panels.len(),
                resources = config.resources.len()
            );
            Ok(config)
        }
        Err(e) => {
            eprintln!("Error: Could not load config: {}", e);
            eprintln!("Tip: Check ~/.monitor/config.toml and ./.monitor/config.toml.");
            error!(event = "cli.config.load_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

/// `--env` if given, else the configured default.
pub(crate) fn resolve_env(matches: &ArgMatches, config: &MonitorConfig) -> String {
    matches
        .get_one::<String>("env")
        .cloned()
        .unwrap_or_else(|| config.dashboard.default_env().to_string())
}
