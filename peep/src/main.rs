//! # peep - Main Entry Point
//!
//! Parses arguments, then hands a [`RunConfig`] to the driver. Exit codes:
//! `0` success, `1` any analysis, instrumentation or execution failure,
//! `2` usage errors.

use anyhow::{Context, Result};
use clap::Parser;

use peep::cli::Args;
use peep::driver::{self, RunConfig};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    std::process::exit(match run(args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

#[tokio::main]
async fn run(args: Args) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    driver::run(RunConfig::from_args(&args, &cwd)).await
}
