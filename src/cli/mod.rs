mod args;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

use crate::{config::load_config_with_path, domain::failure::FetchFailure};

use args::{Cli, Commands};

pub fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<FetchFailure>().is_some() {
        2
    } else {
        1
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            config,
            interval_ms,
            no_focus_tracking,
            json,
        } => {
            let loaded = load_config_with_path(config.as_deref())?;
            let mut cfg = loaded.config;
            if let Some(interval) = interval_ms {
                cfg.polling.enabled = true;
                cfg.polling.interval_ms = interval;
            }
            commands::watch::run(cfg, loaded.resolved_path, !no_focus_tracking, json).await
        }
        Commands::Once { config, json } => {
            let loaded = load_config_with_path(config.as_deref())?;
            commands::once::run(loaded.config, json).await
        }
        Commands::Check { config } => {
            let loaded = load_config_with_path(config.as_deref())?;
            commands::check::run(&loaded.config, &loaded.resolved_path)
        }
        Commands::Init { path, force } => commands::init::run(path, force),
        Commands::Config { command } => commands::config::run(command),
    }
}
