//! HistAtlas CLI - Command-line interface
//!
//! Drives the period loader from a terminal: list the periods of a manifest,
//! load periods, simulate a slider drag and warm the cache.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use console::style;

use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "histatlas", version, about = "Historical atlas period loader")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Location the period files are fetched from
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// JSON manifest listing the periods
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Fetch on the calling thread instead of the background worker
    #[arg(long, global = true)]
    pub direct: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a configuration file with the given data location
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// List the periods in the manifest
    Periods,

    /// Load periods one after another and describe each result
    Load {
        /// Ordinals to load, in order
        #[arg(required = true)]
        ordinals: Vec<usize>,
    },

    /// Simulate dragging the time slider from one period to another
    Drag {
        /// Starting ordinal
        from: usize,

        /// Final ordinal
        to: usize,

        /// Pause between slider events in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },

    /// Load every period once to fill the cache
    Warm,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Init { force } => commands::init::run(&cli.global, force),
        Commands::Periods => commands::periods::run(&cli.global),
        Commands::Load { ordinals } => commands::load::run(&cli.global, &ordinals),
        Commands::Drag {
            from,
            to,
            interval_ms,
        } => commands::drag::run(&cli.global, from, to, interval_ms),
        Commands::Warm => commands::warm::run(&cli.global),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_drag_with_global_flags() {
        let cli = Cli::try_parse_from([
            "histatlas",
            "drag",
            "0",
            "9",
            "--interval-ms",
            "15",
            "--direct",
            "-vv",
        ])
        .unwrap();

        assert!(cli.global.direct);
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Commands::Drag {
                from,
                to,
                interval_ms,
            } => assert_eq!((from, to, interval_ms), (0, 9, 15)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_load_requires_ordinals() {
        assert!(Cli::try_parse_from(["histatlas", "load"]).is_err());
    }
}
