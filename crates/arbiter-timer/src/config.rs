//! Alert schedule configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// When alerts fire, as seconds remaining before the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Remaining-time marks, e.g. `[60, 30, 10]`. Marks not strictly
    /// below a timer's duration are skipped for that timer.
    pub alert_before_secs: Vec<u64>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            alert_before_secs: vec![60, 30, 10],
        }
    }
}

impl TimerConfig {
    /// A schedule without alerts.
    pub fn silent() -> Self {
        Self {
            alert_before_secs: Vec::new(),
        }
    }

    /// Sorts marks from earliest alert to latest and drops zero and
    /// duplicate marks.
    pub fn validated(mut self) -> Self {
        if self.alert_before_secs.contains(&0) {
            warn!("alert mark of 0 seconds ignored, the deadline itself fires");
        }
        self.alert_before_secs.retain(|s| *s > 0);
        self.alert_before_secs.sort_unstable_by(|a, b| b.cmp(a));
        self.alert_before_secs.dedup();
        self
    }

    /// Remaining-time marks that apply to a timer of `duration`, in firing
    /// order.
    pub fn alert_points(&self, duration: Duration) -> Vec<Duration> {
        self.alert_before_secs
            .iter()
            .map(|s| Duration::from_secs(*s))
            .filter(|remaining| *remaining < duration)
            .collect()
    }
}
