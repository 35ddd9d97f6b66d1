//! What a stage can see and touch while it runs.
//!
//! Stages never hold on to the match. Every hook receives a
//! [`StageContext`] for the duration of one call: the shared readiness
//! mask plus a [`MatchHost`] implemented by whoever owns the stage tree.

use std::time::Duration;

use arbiter_protocol::{Recipient, SlotId};

use crate::{Readiness, ReadinessMask};

/// The owner of a stage tree, as seen from inside it.
///
/// The match controller implements this on its roster/outbox/timer
/// state. Tests implement it on a plain struct.
pub trait MatchHost {
    /// Number of slots in the match. Fixed once the tree is built.
    fn slot_count(&self) -> usize;

    fn is_computer(&self, slot: SlotId) -> bool;

    fn is_eliminated(&self, slot: SlotId) -> bool;

    /// Marks a slot eliminated in the roster.
    fn eliminate(&mut self, slot: SlotId);

    /// Queues text for delivery once the current event is handled.
    fn post(&mut self, recipient: Recipient, text: String);

    /// Arms the match timer, replacing any armed one.
    fn start_timer(&mut self, duration: Duration);

    fn stop_timer(&mut self);

    /// Time left on the armed timer, if one is armed.
    fn timer_remaining(&self) -> Option<Duration>;
}

/// Borrowed view handed to every stage hook.
pub struct StageContext<'a> {
    mask: &'a mut ReadinessMask,
    host: &'a mut dyn MatchHost,
}

impl<'a> StageContext<'a> {
    pub fn new(mask: &'a mut ReadinessMask, host: &'a mut dyn MatchHost) -> Self {
        Self { mask, host }
    }

    pub fn slot_count(&self) -> usize {
        self.host.slot_count()
    }

    /// All slot ids, in order.
    pub fn slots(&self) -> impl Iterator<Item = SlotId> + use<> {
        (0..self.host.slot_count()).map(SlotId)
    }

    pub fn is_computer(&self, slot: SlotId) -> bool {
        self.host.is_computer(slot)
    }

    pub fn is_eliminated(&self, slot: SlotId) -> bool {
        self.host.is_eliminated(slot)
    }

    // -- messages ---------------------------------------------------------

    pub fn broadcast(&mut self, text: impl Into<String>) {
        self.host.post(Recipient::All, text.into());
    }

    pub fn tell(&mut self, slot: SlotId, text: impl Into<String>) {
        self.host.post(Recipient::Slot(slot), text.into());
    }

    pub fn group(&mut self, text: impl Into<String>) {
        self.host.post(Recipient::Group, text.into());
    }

    // -- timer ------------------------------------------------------------

    pub fn start_timer(&mut self, duration: Duration) {
        self.host.start_timer(duration);
    }

    pub fn stop_timer(&mut self) {
        self.host.stop_timer();
    }

    pub fn timer_remaining(&self) -> Option<Duration> {
        self.host.timer_remaining()
    }

    // -- readiness --------------------------------------------------------

    pub fn readiness(&self, slot: SlotId) -> Readiness {
        self.mask.get(slot)
    }

    pub fn is_ready(&self, slot: SlotId) -> bool {
        self.mask.get(slot) != Readiness::Unset
    }

    /// Marks a slot ready on the stage's own initiative.
    pub fn set_ready(&mut self, slot: SlotId) -> bool {
        self.mask.set(slot, true)
    }

    pub fn unset_ready(&mut self, slot: SlotId) -> bool {
        self.mask.unset(slot)
    }

    /// Resets readiness for another go at the same stage.
    pub fn clear_ready(&mut self) {
        self.mask.clear();
    }

    pub fn all_ready(&self) -> bool {
        self.mask.is_ready()
    }

    /// Skips a slot until it next issues a valid request.
    pub fn hook(&mut self, slot: SlotId) {
        if self.mask.pin(slot) {
            tracing::debug!(%slot, "slot hooked");
            self.tell(
                slot,
                "You did not act in time and will be skipped until you act again.",
            );
        }
    }

    /// Removes a slot from play for the rest of the match.
    pub fn eliminate(&mut self, slot: SlotId) {
        self.mask.pin(slot);
        if !self.host.is_eliminated(slot) {
            self.host.eliminate(slot);
            tracing::debug!(%slot, "slot eliminated");
        }
    }

    pub(crate) fn mask_mut(&mut self) -> &mut ReadinessMask {
        self.mask
    }
}
