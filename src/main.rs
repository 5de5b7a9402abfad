//! widedeep CLI
//!
//! Train wide & deep models from YAML experiment files.
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! widedeep train experiment.yaml
//!
//! # Train with overrides
//! widedeep train experiment.yaml --epochs 10 --batch-size 256
//!
//! # Validate config
//! widedeep validate experiment.yaml --detailed
//! ```

use clap::Parser;
use std::process::ExitCode;
use widedeep::cli::{init_tracing, run_command, Cli, LogLevel};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
