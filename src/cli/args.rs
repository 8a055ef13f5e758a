use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "focus-poll",
    about = "Run a command on an interval while the terminal has focus"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    Watch {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Enables polling with this interval, overriding the config file.
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Keep polling regardless of terminal focus.
        #[arg(long)]
        no_focus_tracking: bool,
        #[arg(long)]
        json: bool,
    },
    Once {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    Init {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum ConfigCommands {
    Path,
}
