use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read-only view of the orchestrator's state. `data` stays `None` until the
/// first successful completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchSnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for FetchSnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            updated_at: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FetchState<T> {
    data: Option<T>,
    in_flight: usize,
    updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            in_flight: 0,
            updated_at: None,
        }
    }
}

impl<T: Clone> FetchState<T> {
    pub(crate) fn begin(&mut self) {
        self.in_flight += 1;
    }

    /// Settles one invocation. `result` is `None` when the fetch failed, in
    /// which case the stored data is left untouched.
    pub(crate) fn settle(&mut self, result: Option<T>, at: DateTime<Utc>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if let Some(value) = result {
            self.data = Some(value);
            self.updated_at = Some(at);
        }
    }

    pub(crate) fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub(crate) fn data(&self) -> Option<T> {
        self.data.clone()
    }

    pub(crate) fn snapshot(&self) -> FetchSnapshot<T> {
        FetchSnapshot {
            data: self.data.clone(),
            loading: self.loading(),
            updated_at: self.updated_at,
        }
    }
}
