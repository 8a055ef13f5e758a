use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use anyhow::Result;
use tokio::sync::watch;

use crate::{
    domain::{
        failure::FetchFailure,
        fetch_state::{FetchSnapshot, FetchState},
    },
    ports::{ClockPort, FetchPort},
};

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an orchestrator's `run`. Shared by every clone of the same
/// orchestrator; a freshly constructed orchestrator gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

impl RunId {
    fn next() -> Self {
        Self(NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Owns invocation of the wrapped fetch and the resulting [`FetchState`].
///
/// Cloning is cheap and yields a handle to the same state. The fetch is
/// captured at construction and cannot be swapped afterwards.
///
/// `loading` is informational: concurrent `run` calls are not serialized.
pub struct RequestOrchestrator<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    id: RunId,
    fetch: Arc<dyn FetchPort<T>>,
    clock: Arc<dyn ClockPort>,
    state: Mutex<FetchState<T>>,
    snapshots: watch::Sender<FetchSnapshot<T>>,
    alive: AtomicBool,
}

impl<T> Clone for RequestOrchestrator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> RequestOrchestrator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(fetch: Arc<dyn FetchPort<T>>, clock: Arc<dyn ClockPort>) -> Self {
        let (snapshots, _) = watch::channel(FetchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                id: RunId::next(),
                fetch,
                clock,
                state: Mutex::new(FetchState::default()),
                snapshots,
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Invokes the fetch once. `loading` stays true until this call settles,
    /// including on failure or when the returned future is dropped early.
    pub async fn run(&self) -> Result<T> {
        let mut guard = InFlightGuard::enter(&self.inner);
        let value = self
            .inner
            .fetch
            .fetch()
            .await
            .map_err(FetchFailure::new)?;
        guard.succeed(value.clone());
        Ok(value)
    }

    pub fn data(&self) -> Option<T> {
        self.inner.lock_state().data()
    }

    pub fn loading(&self) -> bool {
        self.inner.lock_state().loading()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock_state().in_flight()
    }

    pub fn snapshot(&self) -> FetchSnapshot<T> {
        self.inner.lock_state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<T>> {
        self.inner.snapshots.subscribe()
    }
}

impl<T> RequestOrchestrator<T> {
    pub fn run_id(&self) -> RunId {
        self.inner.id
    }

    /// Marks the owning unit as torn down. Invocations that settle afterwards
    /// no longer write their result or publish snapshots.
    pub(crate) fn retire(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        !self.inner.alive.load(Ordering::SeqCst)
    }
}

impl<T: Clone> Inner<T> {
    fn lock_state(&self) -> MutexGuard<'_, FetchState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) {
        let snapshot = {
            let mut state = self.lock_state();
            state.begin();
            state.snapshot()
        };
        tracing::debug!(run_id = self.id.0, "fetch started");
        self.publish(snapshot);
    }

    fn settle(&self, result: Option<T>) {
        let alive = self.alive.load(Ordering::SeqCst);
        let succeeded = result.is_some();
        let snapshot = {
            let mut state = self.lock_state();
            let result = if alive { result } else { None };
            state.settle(result, self.clock.now());
            state.snapshot()
        };

        if !alive {
            tracing::debug!(run_id = self.id.0, "discarding fetch result after teardown");
            return;
        }
        tracing::debug!(run_id = self.id.0, succeeded, "fetch settled");
        self.publish(snapshot);
    }

    fn publish(&self, snapshot: FetchSnapshot<T>) {
        if self.alive.load(Ordering::SeqCst) {
            self.snapshots.send_replace(snapshot);
        }
    }
}

struct InFlightGuard<'a, T: Clone> {
    inner: &'a Inner<T>,
    result: Option<T>,
}

impl<'a, T: Clone> InFlightGuard<'a, T> {
    fn enter(inner: &'a Inner<T>) -> Self {
        inner.begin();
        Self {
            inner,
            result: None,
        }
    }

    fn succeed(&mut self, value: T) {
        self.result = Some(value);
    }
}

impl<T: Clone> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        self.inner.settle(self.result.take());
    }
}
