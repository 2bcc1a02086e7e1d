use clap::{Arg, ArgAction, Command, value_parser};
use clap_complete::Shell;

pub fn build_cli() -> Command {
    Command::new("monitor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live multi-panel operations dashboard")
        .long_about("monitor shows service health, container stats, infrastructure and blue/green deployment state for one environment in a single terminal session. Every resource refreshes on its own timer in the background; switching panels never waits on the network.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("dashboard")
                .about("Open the live dashboard")
                .arg(
                    Arg::new("env")
                        .long("env")
                        .short('e')
                        .help("Environment to monitor (overrides config, default: staging)")
                )
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .short('i')
                        .help("Refresh interval in seconds for every resource (overrides config)")
                        .value_parser(value_parser!(u64).range(1..))
                )
        )
        .subcommand(
            Command::new("panels")
                .about("List the configured panels and the resources behind them")
                .arg(
                    Arg::new("env")
                        .long("env")
                        .short('e')
                        .help("Environment used to expand resource keys")
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .help("Shell to generate completions for")
                        .required(true)
                        .index(1)
                        .value_parser(value_parser!(Shell))
                )
        )
}
