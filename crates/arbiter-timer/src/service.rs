//! The timer service seam.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Called at each alert mark with the time remaining.
pub type AlertFn = Arc<dyn Fn(Duration) + Send + Sync>;

/// Called once at the deadline.
pub type FireFn = Box<dyn FnOnce() + Send>;

pub struct TimerCallbacks {
    pub on_alert: AlertFn,
    pub on_fire: FireFn,
}

impl TimerCallbacks {
    /// Callbacks with no alert behavior.
    pub fn on_fire(on_fire: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_alert: Arc::new(|_| {}),
            on_fire: Box::new(on_fire),
        }
    }
}

/// Something that can arm deadline timers.
pub trait TimerService: Send + Sync + 'static {
    /// Arms a timer that fires after `duration`. The timer lives as long
    /// as the returned handle.
    fn start(&self, duration: Duration, callbacks: TimerCallbacks) -> TimerHandle;
}

/// An armed timer. Dropping it cancels the timer.
#[must_use = "dropping a TimerHandle cancels the timer"]
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}
