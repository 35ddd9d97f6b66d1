//! Timers on the Tokio clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

use crate::{TimerCallbacks, TimerConfig, TimerHandle, TimerService};

/// Arms each timer as a task on a Tokio runtime.
///
/// The task sleeps until each alert mark, then the deadline. Callbacks
/// run on the blocking pool and are awaited one at a time, so alerts and
/// the final fire never overlap. Cancelling aborts the task.
///
/// The runtime handle is captured at construction, so `start` may be
/// called from any thread.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    runtime: Handle,
    config: TimerConfig,
}

impl TokioTimer {
    /// Uses the runtime this is called from. Panics outside a runtime.
    pub fn new(config: TimerConfig) -> Self {
        Self::with_handle(Handle::current(), config)
    }

    pub fn with_handle(runtime: Handle, config: TimerConfig) -> Self {
        Self {
            runtime,
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }
}

impl TimerService for TokioTimer {
    fn start(&self, duration: Duration, callbacks: TimerCallbacks) -> TimerHandle {
        let alerts = self.config.alert_points(duration);
        debug!(secs = duration.as_secs(), alerts = alerts.len(), "timer armed");

        let task = self.runtime.spawn(async move {
            let deadline = TokioInstant::now() + duration;
            let TimerCallbacks { on_alert, on_fire } = callbacks;

            for remaining in alerts {
                time::sleep_until(deadline - remaining).await;
                trace!(remaining_secs = remaining.as_secs(), "timer alert");
                let on_alert = Arc::clone(&on_alert);
                if let Err(e) = tokio::task::spawn_blocking(move || on_alert(remaining)).await {
                    warn!(error = %e, "timer alert callback failed");
                }
            }

            time::sleep_until(deadline).await;
            trace!("timer fired");
            if let Err(e) = tokio::task::spawn_blocking(on_fire).await {
                warn!(error = %e, "timer fire callback failed");
            }
        });

        let abort = task.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}
