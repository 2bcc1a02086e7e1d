use clap::ArgMatches;
use tracing::{error, info};

use monitor_core::events;
use monitor_core::plan::DashboardPlan;

use crate::commands::{load_config, resolve_env};
use crate::table::PlanTable;

pub(crate) fn handle_panels_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = load_config()?;
    let env = resolve_env(matches, &config);

    info!(event = "cli.panels_started", env = env.as_str(), json = json_output);

    let plan = match DashboardPlan::build(&config, &env, None) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Error: {}", e);
            error!(event = "cli.panels_failed", env = env.as_str(), error = %e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };
    let summary = plan.summary();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Environment: {}", summary.env);
        println!();
        let table = PlanTable::new(&summary);
        table.print_panels(&summary.panels);
        println!();
        table.print_resources(&summary.resources);
    }

    info!(
        event = "cli.panels_completed",
        panels = summary.panels.len(),
        resources = summary.resources.len()
    );

    Ok(())
}
