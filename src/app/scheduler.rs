use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::{
    app::{
        orchestrator::RunId,
        trigger::{TriggerDispatcher, TriggerSource},
    },
    domain::polling::PollingConfig,
};

/// Inputs that define one polling epoch. A change to any of them forces the
/// timer through disarm before it may be armed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingEpoch {
    pub config: PollingConfig,
    pub run_id: RunId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Disarmed,
    Armed { period: Duration },
}

enum TimerState {
    Disarmed,
    Armed {
        period: Duration,
        task: JoinHandle<()>,
    },
}

impl TimerState {
    fn phase(&self) -> TimerPhase {
        match self {
            Self::Disarmed => TimerPhase::Disarmed,
            Self::Armed { period, .. } => TimerPhase::Armed { period: *period },
        }
    }

    fn disarm(&mut self) {
        if let Self::Armed { period, task } = std::mem::replace(self, Self::Disarmed) {
            task.abort();
            let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(period_ms, "polling timer disarmed");
        }
    }
}

struct SchedulerState {
    epoch: Option<PollingEpoch>,
    timer: TimerState,
    arm_count: u64,
    shut_down: bool,
}

/// Arms a recurring timer while polling is eligible. Each tick samples the
/// activity signal and triggers a run only while active; an inactive tick is
/// dropped, not deferred.
///
/// Ticks do not wait for a previous invocation to settle. Whether a tick that
/// lands on an in-flight invocation overlaps, is skipped or is queued is up to
/// the dispatcher's [`ConcurrencyPolicy`](crate::ConcurrencyPolicy).
pub struct PollingScheduler<T> {
    dispatcher: TriggerDispatcher<T>,
    activity: watch::Receiver<bool>,
    runtime: Handle,
    state: Mutex<SchedulerState>,
}

impl<T> PollingScheduler<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        dispatcher: TriggerDispatcher<T>,
        activity: watch::Receiver<bool>,
        runtime: Handle,
    ) -> Self {
        Self {
            dispatcher,
            activity,
            runtime,
            state: Mutex::new(SchedulerState {
                epoch: None,
                timer: TimerState::Disarmed,
                arm_count: 0,
                shut_down: false,
            }),
        }
    }

    /// Re-evaluates the timer for `config`. Unchanged inputs leave an armed
    /// timer untouched; changed inputs always disarm first.
    pub fn apply(&self, config: PollingConfig) -> TimerPhase {
        let epoch = PollingEpoch {
            config,
            run_id: self.dispatcher.run_id(),
        };

        let mut state = self.lock_state();
        if state.shut_down {
            return TimerPhase::Disarmed;
        }
        if state.epoch == Some(epoch) {
            return state.timer.phase();
        }

        state.epoch = Some(epoch);
        state.timer.disarm();

        if config.is_eligible() {
            let period = config.interval();
            state.timer = TimerState::Armed {
                period,
                task: self.spawn_timer(period),
            };
            state.arm_count += 1;
            tracing::debug!(period_ms = config.interval_ms, "polling timer armed");
        } else {
            tracing::debug!(
                enabled = config.enabled,
                interval_ms = config.interval_ms,
                "polling not eligible; timer stays disarmed"
            );
        }

        state.timer.phase()
    }

    /// Disarms unconditionally and refuses to arm again.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        state.shut_down = true;
        state.timer.disarm();
    }

    pub fn phase(&self) -> TimerPhase {
        self.lock_state().timer.phase()
    }

    pub fn epoch(&self) -> Option<PollingEpoch> {
        self.lock_state().epoch
    }

    /// Number of times a timer has been armed over this scheduler's lifetime.
    pub fn arm_count(&self) -> u64 {
        self.lock_state().arm_count
    }

    fn spawn_timer(&self, period: Duration) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        let activity = self.activity.clone();

        self.runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let is_active = *activity.borrow();
                if is_active {
                    dispatcher.trigger(TriggerSource::Tick);
                } else {
                    tracing::debug!("tick skipped while inactive");
                }
            }
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for PollingScheduler<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.shut_down = true;
        state.timer.disarm();
    }
}
