mod gate;

use std::{
    fmt::{Display, Formatter},
    sync::{Arc, Mutex},
};

use tokio::runtime::Handle;

use self::gate::{lock_gate, GateLease, SharedGate, TriggerGate};
use crate::{
    app::orchestrator::{RequestOrchestrator, RunId},
    domain::polling::ConcurrencyPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Load,
    Tick,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Tick => "tick",
        }
    }
}

impl Display for TriggerSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    Queued,
    Skipped,
}

/// Starts automatic invocations on the runtime according to the configured
/// [`ConcurrencyPolicy`]. Failures have no caller to return to and are logged.
pub(crate) struct TriggerDispatcher<T> {
    orchestrator: RequestOrchestrator<T>,
    policy: ConcurrencyPolicy,
    gate: SharedGate,
    runtime: Handle,
}

impl<T> Clone for TriggerDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            policy: self.policy,
            gate: Arc::clone(&self.gate),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> TriggerDispatcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        orchestrator: RequestOrchestrator<T>,
        policy: ConcurrencyPolicy,
        runtime: Handle,
    ) -> Self {
        Self {
            orchestrator,
            policy,
            gate: Arc::new(Mutex::new(TriggerGate::default())),
            runtime,
        }
    }

    pub(crate) fn run_id(&self) -> RunId {
        self.orchestrator.run_id()
    }

    pub(crate) fn trigger(&self, source: TriggerSource) -> TriggerOutcome {
        let outcome = match self.policy {
            ConcurrencyPolicy::AllowOverlap => {
                self.spawn_single(source);
                TriggerOutcome::Started
            }
            ConcurrencyPolicy::SkipIfInFlight => {
                if self.orchestrator.loading() {
                    TriggerOutcome::Skipped
                } else {
                    self.spawn_single(source);
                    TriggerOutcome::Started
                }
            }
            ConcurrencyPolicy::QueueOne => {
                let outcome = lock_gate(&self.gate).admit();
                if outcome == TriggerOutcome::Started {
                    self.spawn_serialized(source);
                }
                outcome
            }
        };

        tracing::debug!(
            trigger = %source,
            policy = %self.policy,
            outcome = ?outcome,
            "automatic trigger"
        );
        outcome
    }

    fn spawn_single(&self, source: TriggerSource) {
        let orchestrator = self.orchestrator.clone();
        self.runtime.spawn(async move {
            run_detached(&orchestrator, source).await;
        });
    }

    fn spawn_serialized(&self, source: TriggerSource) {
        let orchestrator = self.orchestrator.clone();
        let lease = GateLease::new(Arc::clone(&self.gate));
        self.runtime.spawn(async move {
            loop {
                run_detached(&orchestrator, source).await;
                if orchestrator.is_retired() || !lease.hand_over() {
                    break;
                }
            }
        });
    }
}

async fn run_detached<T>(orchestrator: &RequestOrchestrator<T>, source: TriggerSource)
where
    T: Clone + Send + Sync + 'static,
{
    if orchestrator.is_retired() {
        tracing::debug!(trigger = %source, "trigger dropped after teardown");
        return;
    }
    if let Err(err) = orchestrator.run().await {
        tracing::warn!(
            error = %format!("{err:#}"),
            trigger = %source,
            "automatic fetch failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use tokio::{runtime::Handle, time::sleep};

    use super::{TriggerDispatcher, TriggerOutcome, TriggerSource};
    use crate::{
        app::orchestrator::RequestOrchestrator, domain::polling::ConcurrencyPolicy,
        infra::clock::SystemClock, ports::FetchFn,
    };

    fn dispatcher(
        calls: Arc<AtomicUsize>,
        policy: ConcurrencyPolicy,
        panic_on_first: bool,
    ) -> TriggerDispatcher<usize> {
        let orchestrator = RequestOrchestrator::new(
            FetchFn::arc(move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    sleep(Duration::from_millis(100)).await;
                    if panic_on_first && n == 1 {
                        panic!("fetch blew up");
                    }
                    anyhow::Ok(n)
                }
            }),
            Arc::new(SystemClock),
        );
        TriggerDispatcher::new(orchestrator, policy, Handle::current())
    }

    #[tokio::test(start_paused = true)]
    async fn retired_orchestrator_starts_no_new_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher(calls.clone(), ConcurrencyPolicy::AllowOverlap, false);

        dispatcher.orchestrator.retire();
        dispatcher.trigger(TriggerSource::Tick);
        sleep(Duration::from_secs(1)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn queue_one_recovers_after_fetch_panics() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher(calls.clone(), ConcurrencyPolicy::QueueOne, true);

        assert_eq!(dispatcher.trigger(TriggerSource::Load), TriggerOutcome::Started);
        sleep(Duration::from_millis(500)).await;
        assert!(!dispatcher.orchestrator.loading());

        assert_eq!(dispatcher.trigger(TriggerSource::Tick), TriggerOutcome::Started);
        sleep(Duration::from_millis(500)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.orchestrator.data(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn queue_one_coalesces_into_one_follow_up() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher(calls.clone(), ConcurrencyPolicy::QueueOne, false);

        assert_eq!(dispatcher.trigger(TriggerSource::Load), TriggerOutcome::Started);
        assert_eq!(dispatcher.trigger(TriggerSource::Tick), TriggerOutcome::Queued);
        assert_eq!(dispatcher.trigger(TriggerSource::Tick), TriggerOutcome::Queued);
        sleep(Duration::from_secs(1)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.trigger(TriggerSource::Tick), TriggerOutcome::Started);
    }
}
