use anyhow::Result;

use crate::{
    config::{stability_warnings, Config, ResolvedConfigPath},
    domain::polling::POLLING_INTERVAL_MINIMUM_MS,
};

pub(crate) fn run(cfg: &Config, resolved_config: &ResolvedConfigPath) -> Result<()> {
    for warning in stability_warnings(cfg) {
        eprintln!("{warning}");
    }

    println!(
        "config: {} (source: {})",
        resolved_config.path.display(),
        resolved_config.source
    );
    println!("fetch: {} (format: {:?})", cfg.fetch.command, cfg.fetch.format);
    println!("run_on_load: {}", cfg.run_on_load);
    println!("concurrency_policy: {}", cfg.concurrency_policy);
    if cfg.polling.is_eligible() {
        println!("polling: every {}ms while focused", cfg.polling.interval_ms);
    } else {
        println!(
            "polling: inert (enabled={}, interval_ms={}, requires > {}ms)",
            cfg.polling.enabled, cfg.polling.interval_ms, POLLING_INTERVAL_MINIMUM_MS
        );
    }
    Ok(())
}
