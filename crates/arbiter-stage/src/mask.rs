//! Per-slot readiness for the active leaf stage.

use arbiter_protocol::SlotId;

/// Where one slot stands in the current stage.
///
/// Three states rather than two booleans: a pinned slot is "ready" for the
/// purpose of finishing the stage, but unlike a set slot it is not reset
/// when the stage changes and ignores further set/unset calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Has not acted in this stage.
    Unset,
    /// Acted in this stage.
    Set,
    /// Excluded from acting: eliminated, left, or hooked after a timeout.
    Pinned,
}

/// Tracks which slots are ready and whether a stage may finish.
///
/// The mask is ready when no slot is [`Readiness::Unset`] **and** at least
/// one change since the last [`clear`](Self::clear) came from a human.
/// That second condition stops a table of computers, or a table where
/// everyone is pinned, from finishing a stage nobody played.
///
/// Slot indices out of range panic.
#[derive(Debug, Clone)]
pub struct ReadinessMask {
    slots: Vec<Readiness>,
    unset_count: usize,
    human_acted: bool,
    epoch: u64,
}

impl ReadinessMask {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![Readiness::Unset; slot_count],
            unset_count: slot_count,
            human_acted: false,
            epoch: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: SlotId) -> Readiness {
        self.slots[slot.index()]
    }

    /// Marks a slot ready and returns whether the whole mask is ready now.
    ///
    /// A pinned slot stays pinned, but a human call still counts as a
    /// genuine action.
    pub fn set(&mut self, slot: SlotId, is_human: bool) -> bool {
        if is_human {
            self.human_acted = true;
        }
        self.record(slot, Readiness::Set);
        self.is_ready()
    }

    /// Marks a slot not ready. The human-action flag is left alone.
    pub fn unset(&mut self, slot: SlotId) -> bool {
        self.record(slot, Readiness::Unset);
        self.is_ready()
    }

    /// Pins a slot. Returns `true` if it was not pinned before.
    ///
    /// Pinning is always a reaction to something a person did (leaving,
    /// being eliminated, ignoring a deadline), so it counts as a human
    /// action.
    pub fn pin(&mut self, slot: SlotId) -> bool {
        self.human_acted = true;
        let state = &mut self.slots[slot.index()];
        match *state {
            Readiness::Pinned => false,
            Readiness::Unset => {
                self.unset_count -= 1;
                *state = Readiness::Pinned;
                true
            }
            Readiness::Set => {
                *state = Readiness::Pinned;
                true
            }
        }
    }

    /// Turns a pinned slot back into an unset one. Returns `true` if the
    /// slot was pinned.
    pub fn unpin(&mut self, slot: SlotId) -> bool {
        let state = &mut self.slots[slot.index()];
        if *state == Readiness::Pinned {
            *state = Readiness::Unset;
            self.unset_count += 1;
            true
        } else {
            false
        }
    }

    /// Puts back a pin removed by [`unpin`](Self::unpin) without counting
    /// it as a new human action.
    pub(crate) fn restore_pin(&mut self, slot: SlotId) {
        let state = &mut self.slots[slot.index()];
        if *state == Readiness::Unset {
            self.unset_count -= 1;
        }
        *state = Readiness::Pinned;
    }

    /// Resets every set slot to unset and forgets any human action.
    /// Pinned slots stay pinned.
    pub fn clear(&mut self) {
        for state in &mut self.slots {
            if *state == Readiness::Set {
                *state = Readiness::Unset;
                self.unset_count += 1;
            }
        }
        self.human_acted = false;
        self.epoch += 1;
    }

    /// Counts [`clear`](Self::clear) calls. A change means every slot that
    /// was set has to act again.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_ready(&self) -> bool {
        self.unset_count == 0 && self.human_acted
    }

    /// Slots that still have to act.
    pub fn unset_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == Readiness::Unset)
            .map(|(i, _)| SlotId(i))
    }

    fn record(&mut self, slot: SlotId, target: Readiness) {
        let state = &mut self.slots[slot.index()];
        if *state == Readiness::Pinned || *state == target {
            return;
        }
        match target {
            Readiness::Set => self.unset_count -= 1,
            Readiness::Unset => self.unset_count += 1,
            Readiness::Pinned => unreachable!("pins go through pin()"),
        }
        *state = target;
    }
}
