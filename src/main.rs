use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Duration;

mod cli;
mod client;
mod config;
mod gather;
mod plan;
mod report;
mod scope;
mod tally;
mod util;

use cli::RootArgs;
use client::OctaneClient;
use scope::{run_all, RunOptions};

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let config = config::load_config(&args.config)?;
    let client = OctaneClient::connect(&config.octane, Duration::from_secs(args.timeout_secs))?;
    let options = RunOptions {
        out_dir: &args.out_dir,
        echo: args.echo,
    };

    let summary = run_all(&client, &config.octane, &options);
    if summary.prerequisites_met() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("entity metadata was unavailable for at least one scope");
        Ok(ExitCode::FAILURE)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
