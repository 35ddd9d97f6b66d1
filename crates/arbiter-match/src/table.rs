//! The match side of the stage engine: slots, outgoing messages and the
//! deadline timer.

use std::sync::{Arc, Weak};
use std::time::Duration;

use arbiter_protocol::{Recipient, SlotHolder, SlotId};
use arbiter_stage::MatchHost;
use arbiter_timer::{TimerCallbacks, TimerHandle, TimerService};
use tokio::time::Instant;

use crate::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub holder: SlotHolder,
    pub eliminated: bool,
}

struct Armed {
    _handle: TimerHandle,
    deadline: Instant,
}

/// Owned by the match and lent to the stage tree on every event.
pub(crate) struct Table {
    pub slots: Vec<Slot>,
    outbox: Vec<(Recipient, String)>,
    timers: Arc<dyn TimerService>,
    owner: Weak<Match>,
    /// Bumped whenever the timer is started or stopped. Callbacks carry
    /// the generation they were armed with and are ignored once it moves.
    generation: u64,
    armed: Option<Armed>,
}

impl Table {
    pub fn new(timers: Arc<dyn TimerService>, owner: Weak<Match>) -> Self {
        Self {
            slots: Vec::new(),
            outbox: Vec::new(),
            timers,
            owner,
            generation: 0,
            armed: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn holder(&self, slot: SlotId) -> Option<SlotHolder> {
        self.slots.get(slot.index()).map(|s| s.holder)
    }

    /// Computer slots still in the game.
    pub fn live_computers(&self) -> Vec<SlotId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.holder.is_computer() && !s.eliminated)
            .map(|(i, _)| SlotId(i))
            .collect()
    }

    pub fn drain_outbox(&mut self) -> Vec<(Recipient, String)> {
        std::mem::take(&mut self.outbox)
    }
}

impl MatchHost for Table {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn is_computer(&self, slot: SlotId) -> bool {
        self.holder(slot).is_some_and(|h| h.is_computer())
    }

    fn is_eliminated(&self, slot: SlotId) -> bool {
        self.slots.get(slot.index()).is_some_and(|s| s.eliminated)
    }

    fn eliminate(&mut self, slot: SlotId) {
        if let Some(s) = self.slots.get_mut(slot.index()) {
            s.eliminated = true;
        }
    }

    fn post(&mut self, recipient: Recipient, text: String) {
        self.outbox.push((recipient, text));
    }

    fn start_timer(&mut self, duration: Duration) {
        self.stop_timer();
        let generation = self.generation;
        let on_alert = {
            let owner = self.owner.clone();
            Arc::new(move |remaining| {
                if let Some(m) = owner.upgrade() {
                    m.on_timer_alert(generation, remaining);
                }
            })
        };
        let on_fire = {
            let owner = self.owner.clone();
            Box::new(move || {
                if let Some(m) = owner.upgrade() {
                    m.on_timeout(generation);
                }
            })
        };
        let handle = self.timers.start(duration, TimerCallbacks { on_alert, on_fire });
        self.armed = Some(Armed {
            _handle: handle,
            deadline: Instant::now() + duration,
        });
    }

    fn stop_timer(&mut self) {
        self.generation += 1;
        self.armed = None;
    }

    fn timer_remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|a| a.deadline.saturating_duration_since(Instant::now()))
    }
}
