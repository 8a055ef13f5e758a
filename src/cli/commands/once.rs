use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::{
    app::poller::{Poller, PollerOptions},
    cli::output::render_value,
    config::{stability_warnings, Config},
    domain::polling::PollingConfig,
    infra::fetch::CommandFetcher,
    ports::FetchPort,
};

pub(crate) async fn run(cfg: Config, json: bool) -> Result<()> {
    for warning in stability_warnings(&cfg) {
        eprintln!("{warning}");
    }

    let fetcher: Arc<dyn FetchPort<Value>> = Arc::new(CommandFetcher::new(
        cfg.fetch.command.clone(),
        cfg.fetch.format,
    ));
    let poller = Poller::builder(fetcher)
        .options(PollerOptions {
            run_on_load: false,
            polling: PollingConfig::disabled(),
            ..cfg.poller_options()
        })
        .build()?;

    let result = poller.run().await;
    let snapshot = poller.snapshot();
    poller.shutdown();
    let value = result?;

    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!("{}", render_value(&value));
    }
    Ok(())
}
