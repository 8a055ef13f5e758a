use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::TriggerOutcome;

/// Admission state for [`ConcurrencyPolicy::QueueOne`]. One automatic
/// invocation holds the gate at a time; anything that arrives meanwhile
/// collapses into a single pending follow-up.
///
/// [`ConcurrencyPolicy::QueueOne`]: crate::domain::polling::ConcurrencyPolicy::QueueOne
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct TriggerGate {
    in_flight: bool,
    pending: bool,
}

impl TriggerGate {
    pub(super) fn admit(&mut self) -> TriggerOutcome {
        if self.in_flight {
            self.pending = true;
            TriggerOutcome::Queued
        } else {
            self.in_flight = true;
            TriggerOutcome::Started
        }
    }

    /// Called by the holder after an invocation settles. Returns `true` when
    /// a follow-up was pending, in which case the holder keeps the gate.
    pub(super) fn hand_over(&mut self) -> bool {
        if std::mem::take(&mut self.pending) {
            return true;
        }
        self.in_flight = false;
        false
    }

    pub(super) fn release(&mut self) {
        self.in_flight = false;
        self.pending = false;
    }
}

pub(super) type SharedGate = Arc<Mutex<TriggerGate>>;

pub(super) fn lock_gate(gate: &Mutex<TriggerGate>) -> MutexGuard<'_, TriggerGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held by the task that was admitted. Dropping it frees the gate, so a task
/// that panics or is aborted mid-fetch cannot wedge later triggers.
pub(super) struct GateLease {
    gate: SharedGate,
}

impl GateLease {
    pub(super) fn new(gate: SharedGate) -> Self {
        Self { gate }
    }

    pub(super) fn hand_over(&self) -> bool {
        lock_gate(&self.gate).hand_over()
    }
}

impl Drop for GateLease {
    fn drop(&mut self) {
        lock_gate(&self.gate).release();
    }
}
