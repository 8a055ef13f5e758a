use std::{
    fmt::{Display, Formatter},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Intervals at or below this floor never arm the polling timer.
pub const POLLING_INTERVAL_MINIMUM_MS: u64 = 999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub interval_ms: u64,
}

impl PollingConfig {
    pub fn every(interval: Duration) -> Self {
        Self {
            enabled: true,
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn is_eligible(&self) -> bool {
        can_poll(self.enabled, self.interval_ms)
    }
}

pub fn can_poll(enabled: bool, interval_ms: u64) -> bool {
    enabled && interval_ms > POLLING_INTERVAL_MINIMUM_MS
}

/// How automatic triggers (load-on-start and ticks) treat an invocation that
/// is still in flight. Manual runs are never gated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    #[default]
    AllowOverlap,
    SkipIfInFlight,
    QueueOne,
}

impl ConcurrencyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowOverlap => "allow_overlap",
            Self::SkipIfInFlight => "skip_if_in_flight",
            Self::QueueOne => "queue_one",
        }
    }
}

impl Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{can_poll, PollingConfig};

    #[test]
    fn eligibility_requires_enabled_and_interval_above_floor() {
        assert!(!can_poll(false, 0));
        assert!(!can_poll(false, 5_000));
        assert!(!can_poll(true, 500));
        assert!(!can_poll(true, 999));
        assert!(can_poll(true, 1_000));
    }

    #[test]
    fn default_config_is_inert() {
        let cfg = PollingConfig::default();
        assert!(!cfg.enabled);
        assert_eq!(cfg.interval_ms, 0);
        assert!(!cfg.is_eligible());
    }

    #[test]
    fn every_enables_polling_with_millisecond_interval() {
        let cfg = PollingConfig::every(Duration::from_secs(2));
        assert!(cfg.enabled);
        assert_eq!(cfg.interval_ms, 2_000);
        assert_eq!(cfg.interval(), Duration::from_secs(2));
        assert!(cfg.is_eligible());
    }
}
