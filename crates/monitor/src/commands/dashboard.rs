use std::time::Duration;

use clap::ArgMatches;
use tracing::{error, info};

use monitor_core::plan::DashboardPlan;
use monitor_core::{DashboardError, MonitorError, events};

use crate::commands::{load_config, resolve_env};

pub(crate) fn handle_dashboard_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let env = resolve_env(matches, &config);
    let interval = matches.get_one::<u64>("interval").copied();

    info!(
        event = "cli.dashboard_started",
        env = env.as_str(),
        interval_override_secs = interval
    );

    let plan = match DashboardPlan::build(&config, &env, interval.map(Duration::from_secs)) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Tip: Run 'monitor panels --env {}' to inspect the layout.", env);
            error!(event = "cli.dashboard_failed", env = env.as_str(), error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(crate::dashboard::run(plan)) {
        Ok(()) => {
            info!(event = "cli.dashboard_completed", env = env.as_str());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let DashboardError::TerminalInit { .. } = e {
                eprintln!("Tip: The dashboard needs an interactive terminal. Use 'monitor panels' in scripts.");
            }
            error!(
                event = "cli.dashboard_failed",
                env = env.as_str(),
                error_code = e.error_code(),
                error = %e
            );
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}
