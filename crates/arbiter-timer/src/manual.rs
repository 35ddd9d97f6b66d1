//! A timer service driven by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{FireFn, TimerCallbacks, TimerHandle, TimerService};

struct Armed {
    id: u64,
    duration: Duration,
    callbacks: TimerCallbacks,
}

#[derive(Default)]
struct Shared {
    armed: Mutex<Vec<Armed>>,
    next_id: AtomicU64,
}

/// Keeps armed timers in a list until someone fires them.
///
/// Cloning shares the list, so a test can hand one clone to the engine and
/// keep another to fire.
#[derive(Clone, Default)]
pub struct ManualTimer {
    shared: Arc<Shared>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_count(&self) -> usize {
        self.lock().len()
    }

    /// Durations of the armed timers, oldest first.
    pub fn armed_durations(&self) -> Vec<Duration> {
        self.lock().iter().map(|a| a.duration).collect()
    }

    /// Fires the most recently armed timer. Returns `false` if none is
    /// armed.
    pub fn fire(&self) -> bool {
        match self.take() {
            Some(pending) => {
                pending.fire();
                true
            }
            None => false,
        }
    }

    /// Raises an alert on the most recently armed timer without disarming
    /// it.
    pub fn alert(&self, remaining: Duration) -> bool {
        let on_alert = self.lock().last().map(|a| Arc::clone(&a.callbacks.on_alert));
        match on_alert {
            Some(on_alert) => {
                on_alert(remaining);
                true
            }
            None => false,
        }
    }

    /// Disarms the most recently armed timer and returns its fire callback
    /// to be run later, possibly on another thread. This is how a timer
    /// that fires just as it is being cancelled looks to the receiver.
    pub fn take(&self) -> Option<PendingFire> {
        self.lock().pop().map(|a| PendingFire {
            on_fire: a.callbacks.on_fire,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Armed>> {
        self.shared.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimerService for ManualTimer {
    fn start(&self, duration: Duration, callbacks: TimerCallbacks) -> TimerHandle {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Armed {
            id,
            duration,
            callbacks,
        });
        let timer = self.clone();
        TimerHandle::new(move || timer.lock().retain(|a| a.id != id))
    }
}

/// A fire callback taken out of a [`ManualTimer`].
pub struct PendingFire {
    on_fire: FireFn,
}

impl PendingFire {
    pub fn fire(self) {
        (self.on_fire)();
    }
}
