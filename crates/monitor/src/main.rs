use monitor_core::init_logging;
use monitor_core::logging::{default_log_file, init_file_logging};

mod app;
mod commands;
mod dashboard;
mod table;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = app::build_cli();
    let matches = app.get_matches();

    // Quiet unless -v; logs are JSON on stderr
    let quiet = !matches.get_flag("verbose");

    if matches.subcommand_name() == Some("dashboard") {
        // The dashboard owns the terminal, so its logs go to a file.
        match default_log_file() {
            Some(path) => {
                if let Err(e) = init_file_logging(quiet, &path) {
                    eprintln!(
                        "Warning: Could not open log file {}: {}. Logging disabled.",
                        path.display(),
                        e
                    );
                }
            }
            None => eprintln!("Warning: Could not find home directory. Logging disabled."),
        }
    } else {
        init_logging(quiet);
    }

    commands::run_command(&matches)?;

    Ok(())
}
