pub mod app;

use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use uuid::Uuid;

use app::cli::Cli;
use app::error::AppError;
use app::launcher::{run_console, startup_exit_code, startup_message, write_config};
use app::logging::init_logging;

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let trace_id = Uuid::new_v4().to_string();

    if cli.write_config {
        return match write_config(&cli, &trace_id) {
            Ok(path) => {
                println!("wrote {}", path.display());
                ExitCode::SUCCESS
            }
            Err(err) => startup_failure(&err),
        };
    }

    info!(trace_id = %trace_id, "starting droidpad");
    match run_console(&cli, &trace_id) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => startup_failure(&err),
    }
}

fn startup_failure(err: &AppError) -> ExitCode {
    eprintln!("{}", startup_message(err));
    ExitCode::from(startup_exit_code(err))
}
