use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError, Weak,
};

use anyhow::{Context, Result};
use tokio::sync::watch;

use crate::ports::{ActivityHandler, ActivitySourcePort, SubscriptionId};

/// Tracks whether the consuming context is in the foreground.
///
/// Subscribes to both activity streams once in [`ActivitySignal::attach`] and
/// unsubscribes exactly once, either through [`ActivitySignal::detach`] or on
/// drop. Starts out active.
pub struct ActivitySignal {
    shared: Arc<Shared>,
    source: Arc<dyn ActivitySourcePort>,
    subscriptions: Mutex<Option<Subscriptions>>,
}

struct Shared {
    attached: AtomicBool,
    active: watch::Sender<bool>,
}

#[derive(Debug, Clone, Copy)]
struct Subscriptions {
    inactive: SubscriptionId,
    active: SubscriptionId,
}

impl ActivitySignal {
    pub fn attach(source: Arc<dyn ActivitySourcePort>) -> Result<Self> {
        let (active, _) = watch::channel(true);
        let shared = Arc::new(Shared {
            attached: AtomicBool::new(true),
            active,
        });

        let inactive = source
            .subscribe_inactive(handler(&shared, false))
            .context("failed to subscribe to inactivity events")?;
        let active = match source.subscribe_active(handler(&shared, true)) {
            Ok(id) => id,
            Err(err) => {
                source.unsubscribe(inactive);
                return Err(err.context("failed to subscribe to activity events"));
            }
        };
        tracing::debug!("activity signal attached");

        Ok(Self {
            shared,
            source,
            subscriptions: Mutex::new(Some(Subscriptions { inactive, active })),
        })
    }

    pub fn is_active(&self) -> bool {
        *self.shared.active.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<bool> {
        self.shared.active.subscribe()
    }

    pub fn is_attached(&self) -> bool {
        self.shared.attached.load(Ordering::SeqCst)
    }

    /// Releases both subscriptions. Safe to call more than once.
    pub fn detach(&self) {
        let taken = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(subscriptions) = taken else {
            return;
        };

        self.shared.attached.store(false, Ordering::SeqCst);
        self.source.unsubscribe(subscriptions.inactive);
        self.source.unsubscribe(subscriptions.active);
        tracing::debug!("activity signal detached");
    }
}

impl Drop for ActivitySignal {
    fn drop(&mut self) {
        self.detach();
    }
}

fn handler(shared: &Arc<Shared>, becomes_active: bool) -> ActivityHandler {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    Arc::new(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        if !shared.attached.load(Ordering::SeqCst) {
            return;
        }
        let previous = shared.active.send_replace(becomes_active);
        if previous != becomes_active {
            tracing::debug!(active = becomes_active, "activity changed");
        }
    })
}
