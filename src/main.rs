//! Moodcheck CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use moodcheck::cli::Cli;
use moodcheck::pipeline;
use moodcheck::ui::create_ui;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` wins when set; otherwise only warnings are logged so the
/// check narrative on stdout stays readable.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moodcheck=warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    tracing::debug!("moodcheck starting with args: {:?}", cli);

    let mut ui = create_ui();

    let project_root = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            ui.error(&format!("Error: cannot determine the project directory: {}", e));
            return ExitCode::from(1);
        }
    };

    match pipeline::run(&project_root, ui.as_mut()) {
        Ok(outcome) => ExitCode::from(outcome.exit_code),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
