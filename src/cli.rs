//! CLI argument parsing.
//!
//! Every flag is optional; running with no arguments reads
//! `conf/config.json` and writes both reports into the working directory.
use crate::config::DEFAULT_CONFIG_PATH;
use clap::Parser;
use std::path::PathBuf;

/// Default per-request timeout for metadata calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(
    name = "octane-commands",
    version,
    about = "Tally command names per entity and service from the Octane metadata API",
    after_help = "Writes sharedspaceCommands.json and workspaceCommands.json.\n\nExamples:\n  octane-commands\n  octane-commands --config conf/staging.json --out-dir reports --echo"
)]
pub struct RootArgs {
    /// Path to the JSON config holding the `octane` connection block
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory that receives the report files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Echo each report's JSON to the log
    #[arg(long)]
    pub echo: bool,

    /// Per-request timeout in seconds
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}
