//! logops binary
//!
//! Parses the invocation, loads settings, wires logging and signal handling,
//! then hands off to the [`ActionDispatcher`].

use std::process::ExitCode;

use clap::Parser;
use logops::dispatch::{ActionDispatcher, DispatchOutcome};
use logops::runner::CommandInvoker;
use logops::settings::Settings;
use logops::shutdown::{install_signal_handlers, Shutdown};
use logops_logging::{init_logging, LogConfig};
use tracing::{info, warn};

mod cli;

use cli::error::HelpfulError;
use cli::Cli;

/// Exit code used when an interrupt stops a batch early.
const EXIT_INTERRUPTED: u8 = 130;

fn run(cli: &Cli) -> Result<DispatchOutcome, HelpfulError> {
    let settings = Settings::load(cli.config.as_deref()).map_err(|err| {
        HelpfulError::new(format!("{:#}", err))
            .with_context("Failed to load settings")
            .with_suggestion(format!(
                "TRY: create {} or pass --config <path>",
                Settings::default_path().display()
            ))
    })?;

    let shutdown = Shutdown::new();
    if let Err(err) = install_signal_handlers(&shutdown) {
        warn!("Failed to install signal handlers: {:#}", err);
    }

    let invoker =
        CommandInvoker::new(settings.manage_program.clone()).with_working_dir(&settings.project_dir);
    let dispatcher = ActionDispatcher::new(&settings, &invoker, shutdown);

    let outcome = dispatcher.dispatch(&cli.invocation())?;
    info!("dispatch finished");
    Ok(outcome)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig::new("logops").verbose(cli.verbose)) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run(&cli) {
        Ok(outcome) => {
            cli::output::print_outcome(&outcome);
            match outcome {
                DispatchOutcome::Pipeline { report, .. } if report.interrupted => {
                    ExitCode::from(EXIT_INTERRUPTED)
                }
                _ => ExitCode::SUCCESS,
            }
        }
        Err(err) => {
            eprint!("{}", err);
            ExitCode::from(1)
        }
    }
}
