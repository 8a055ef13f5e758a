use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinSet};

use crate::{
    app::poller::Poller,
    cli::output::ResultPrinter,
    config::{stability_warnings, Config, ResolvedConfigPath},
    infra::{
        activity::{InputCommand, TerminalFocusSource},
        fetch::CommandFetcher,
    },
    ports::FetchPort,
};

pub(crate) async fn run(
    cfg: Config,
    resolved_config: ResolvedConfigPath,
    focus_tracking: bool,
    json: bool,
) -> Result<()> {
    eprintln!(
        "config: {} (source: {})",
        resolved_config.path.display(),
        resolved_config.source
    );
    for warning in stability_warnings(&cfg) {
        eprintln!("{warning}");
    }
    if focus_tracking {
        eprintln!("keys: r = refresh now, q = quit");
    }

    let (terminal, mut commands) = if focus_tracking {
        let (terminal, commands) = TerminalFocusSource::start()?;
        (Some(terminal), Some(commands))
    } else {
        (None, None)
    };

    let fetcher: Arc<dyn FetchPort<Value>> = Arc::new(CommandFetcher::new(
        cfg.fetch.command.clone(),
        cfg.fetch.format,
    ));
    let mut builder = Poller::builder(fetcher).options(cfg.poller_options());
    if let Some(terminal) = &terminal {
        builder = builder.activity_source(terminal.source());
    }
    let poller = builder.build()?;

    let mut printer = ResultPrinter::new(json, terminal.is_some());
    let mut snapshots = poller.subscribe();
    let mut activity = poller.activity();
    let mut refreshes: JoinSet<Result<Value>> = JoinSet::new();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                printer.print_snapshot(&snapshot)?;
            }
            changed = activity.changed() => {
                if changed.is_err() {
                    break;
                }
                let active = *activity.borrow_and_update();
                let status = if active {
                    "focus regained; polling resumed"
                } else {
                    "focus lost; polling paused"
                };
                printer.print_status(status)?;
            }
            Some(joined) = refreshes.join_next(), if !refreshes.is_empty() => {
                match joined {
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => printer.print_status(&format!("refresh failed: {err:#}"))?,
                    Err(err) => tracing::warn!(error = %err, "refresh task failed"),
                }
            }
            command = next_command(&mut commands) => {
                match command {
                    Some(InputCommand::Refresh) => {
                        let orchestrator = poller.orchestrator().clone();
                        refreshes.spawn(async move { orchestrator.run().await });
                    }
                    Some(InputCommand::Quit) | None => break,
                    Some(InputCommand::None) => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.shutdown();
    refreshes.abort_all();
    drop(terminal);
    Ok(())
}

async fn next_command(
    commands: &mut Option<mpsc::UnboundedReceiver<InputCommand>>,
) -> Option<InputCommand> {
    match commands {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
