pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infra;
pub mod ports;

pub use app::{
    activity::ActivitySignal,
    orchestrator::RequestOrchestrator,
    poller::{Poller, PollerBuilder, PollerOptions},
    scheduler::{PollingScheduler, TimerPhase},
};
pub use domain::{
    failure::FetchFailure,
    fetch_state::FetchSnapshot,
    polling::{ConcurrencyPolicy, PollingConfig, POLLING_INTERVAL_MINIMUM_MS},
};
pub use ports::{ActivitySourcePort, ClockPort, FetchFn, FetchPort};
