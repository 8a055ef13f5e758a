use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use tokio::{runtime::Handle, sync::watch};

use crate::{
    app::{
        activity::ActivitySignal,
        orchestrator::RequestOrchestrator,
        scheduler::{PollingScheduler, TimerPhase},
        trigger::{TriggerDispatcher, TriggerSource},
    },
    domain::{
        fetch_state::FetchSnapshot,
        polling::{ConcurrencyPolicy, PollingConfig},
    },
    infra::{activity::ManualActivitySource, clock::SystemClock},
    ports::{ActivitySourcePort, ClockPort, FetchPort},
};

/// Construction-time options, frozen for the lifetime of a [`Poller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerOptions {
    pub run_on_load: bool,
    pub polling: PollingConfig,
    pub concurrency_policy: ConcurrencyPolicy,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            run_on_load: true,
            polling: PollingConfig::default(),
            concurrency_policy: ConcurrencyPolicy::default(),
        }
    }
}

pub struct PollerBuilder<T> {
    fetch: Arc<dyn FetchPort<T>>,
    activity: Option<Arc<dyn ActivitySourcePort>>,
    clock: Option<Arc<dyn ClockPort>>,
    options: PollerOptions,
}

impl<T> PollerBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(fetch: Arc<dyn FetchPort<T>>) -> Self {
        Self {
            fetch,
            activity: None,
            clock: None,
            options: PollerOptions::default(),
        }
    }

    pub fn options(mut self, options: PollerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run_on_load(mut self, run_on_load: bool) -> Self {
        self.options.run_on_load = run_on_load;
        self
    }

    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.options.polling = polling;
        self
    }

    pub fn polling_enabled(mut self, enabled: bool) -> Self {
        self.options.polling.enabled = enabled;
        self
    }

    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.options.polling.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn concurrency_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.options.concurrency_policy = policy;
        self
    }

    /// Without an explicit source the context is treated as always active.
    pub fn activity_source(mut self, source: Arc<dyn ActivitySourcePort>) -> Self {
        self.activity = Some(source);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn ClockPort>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Wires the orchestrator, activity signal and scheduler, then performs the
    /// load-on-start run and arms polling as configured.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Poller<T>> {
        let runtime =
            Handle::try_current().context("a poller must be built inside a tokio runtime")?;
        let options = self.options;

        let source: Arc<dyn ActivitySourcePort> = match self.activity {
            Some(source) => source,
            None => Arc::new(ManualActivitySource::new()),
        };
        let clock: Arc<dyn ClockPort> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        let orchestrator = RequestOrchestrator::new(self.fetch, clock);
        let activity = ActivitySignal::attach(source)?;
        let dispatcher = TriggerDispatcher::new(
            orchestrator.clone(),
            options.concurrency_policy,
            runtime.clone(),
        );
        let scheduler = PollingScheduler::new(dispatcher.clone(), activity.watch(), runtime);

        if options.run_on_load {
            dispatcher.trigger(TriggerSource::Load);
        }
        let phase = scheduler.apply(options.polling);

        tracing::info!(
            run_on_load = options.run_on_load,
            polling_enabled = options.polling.enabled,
            polling_interval_ms = options.polling.interval_ms,
            policy = %options.concurrency_policy,
            timer = ?phase,
            "poller started"
        );

        Ok(Poller {
            orchestrator,
            activity,
            scheduler,
            options,
            torn_down: AtomicBool::new(false),
        })
    }
}

/// A fetch wrapped with in-flight tracking, load-on-start and
/// activity-gated polling. Dropping it tears everything down.
pub struct Poller<T> {
    orchestrator: RequestOrchestrator<T>,
    activity: ActivitySignal,
    scheduler: PollingScheduler<T>,
    options: PollerOptions,
    torn_down: AtomicBool,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn builder(fetch: Arc<dyn FetchPort<T>>) -> PollerBuilder<T> {
        PollerBuilder::new(fetch)
    }

    /// Manual trigger. Never gated by the concurrency policy; a failure is
    /// returned to the caller as a [`FetchFailure`](crate::FetchFailure).
    pub async fn run(&self) -> Result<T> {
        self.orchestrator.run().await
    }

    pub fn orchestrator(&self) -> &RequestOrchestrator<T> {
        &self.orchestrator
    }

    pub fn data(&self) -> Option<T> {
        self.orchestrator.data()
    }

    pub fn loading(&self) -> bool {
        self.orchestrator.loading()
    }

    pub fn snapshot(&self) -> FetchSnapshot<T> {
        self.orchestrator.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<T>> {
        self.orchestrator.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.activity.is_active()
    }

    pub fn activity(&self) -> watch::Receiver<bool> {
        self.activity.watch()
    }

    pub fn options(&self) -> PollerOptions {
        self.options
    }

    /// Current polling config; starts out as the construction-time one.
    pub fn polling(&self) -> PollingConfig {
        self.scheduler
            .epoch()
            .map(|epoch| epoch.config)
            .unwrap_or(self.options.polling)
    }

    pub fn timer_phase(&self) -> TimerPhase {
        self.scheduler.phase()
    }

    pub fn timer_arm_count(&self) -> u64 {
        self.scheduler.arm_count()
    }

    /// Starts a new polling epoch. A config equal to the current one leaves
    /// the armed timer in place.
    pub fn set_polling(&self, polling: PollingConfig) -> TimerPhase {
        self.scheduler.apply(polling)
    }

    pub fn is_shut_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Clears the timer, releases activity subscriptions and stops in-flight
    /// invocations from writing their results. Idempotent.
    pub fn shutdown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.orchestrator.retire();
        self.scheduler.shutdown();
        self.activity.detach();
        tracing::info!("poller shut down");
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        // Scheduler and activity signal release their resources in their own
        // Drop impls; only the orchestrator handle outlives this value.
        self.orchestrator.retire();
    }
}
