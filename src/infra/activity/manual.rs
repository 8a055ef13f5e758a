use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use anyhow::Result;

use crate::ports::{ActivityHandler, ActivitySourcePort, SubscriptionId};

type Handlers = BTreeMap<SubscriptionId, (Stream, ActivityHandler)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Active,
    Inactive,
}

/// In-process activity source. Events are delivered synchronously to the
/// handlers registered at emit time, in subscription order.
#[derive(Default)]
pub struct ManualActivitySource {
    next_id: AtomicU64,
    handlers: Mutex<Handlers>,
}

impl ManualActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit_active(&self) {
        self.emit(Stream::Active);
    }

    pub fn emit_inactive(&self) {
        self.emit(Stream::Inactive);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_handlers().len()
    }

    /// Handlers currently registered for "became active", as a source would
    /// hold them in a pending delivery.
    pub fn active_handlers(&self) -> Vec<ActivityHandler> {
        self.handlers_for(Stream::Active)
    }

    pub fn inactive_handlers(&self) -> Vec<ActivityHandler> {
        self.handlers_for(Stream::Inactive)
    }

    fn emit(&self, stream: Stream) {
        // Handlers run without the lock held so they may (un)subscribe.
        for handler in self.handlers_for(stream) {
            handler();
        }
    }

    fn handlers_for(&self, stream: Stream) -> Vec<ActivityHandler> {
        self.lock_handlers()
            .values()
            .filter(|(kind, _)| *kind == stream)
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    fn subscribe(&self, stream: Stream, handler: ActivityHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_handlers().insert(id, (stream, handler));
        id
    }

    fn lock_handlers(&self) -> MutexGuard<'_, Handlers> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActivitySourcePort for ManualActivitySource {
    fn subscribe_active(&self, handler: ActivityHandler) -> Result<SubscriptionId> {
        Ok(self.subscribe(Stream::Active, handler))
    }

    fn subscribe_inactive(&self, handler: ActivityHandler) -> Result<SubscriptionId> {
        Ok(self.subscribe(Stream::Inactive, handler))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock_handlers().remove(&id);
    }
}
