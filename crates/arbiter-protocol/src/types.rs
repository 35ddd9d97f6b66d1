//! Identity newtypes and message addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A human user, as known to the chat platform in front of the engine.
///
/// Newtype over `u64` so a `UserId` can never be passed where a `GroupId`
/// is expected. `#[serde(transparent)]` keeps the JSON form a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A group chat. A match bound to a group is a *public* match; a match
/// without one is *private* and joined by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// A match (one game session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// A seat in a started match, counted from zero.
///
/// Slots are what stages see. A user may own several slots when a game
/// is played with more than one seat per user, and computer stand-ins
/// occupy slots too. The index is used directly into per-slot tables, so
/// it is a `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub usize);

impl SlotId {
    /// The slot's position, for indexing per-slot tables.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A computer stand-in. Numbered per match, starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputerId(pub u64);

impl fmt::Display for ComputerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// Who sits in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotHolder {
    User(UserId),
    Computer(ComputerId),
}

impl SlotHolder {
    /// The human behind this slot, if any.
    pub fn user(&self) -> Option<UserId> {
        match self {
            Self::User(uid) => Some(*uid),
            Self::Computer(_) => None,
        }
    }

    pub fn is_computer(&self) -> bool {
        matches!(self, Self::Computer(_))
    }
}

impl fmt::Display for SlotHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(uid) => uid.fmt(f),
            Self::Computer(cid) => cid.fmt(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Where a piece of text produced inside a match should go.
///
/// Stages only know slots. The match controller turns a `Recipient` into
/// concrete deliveries: `All` goes to the group of a public match, or to
/// every participant of a private one; `Slot` goes to the user holding
/// the slot (computer slots are silent); `Group` prefers the group and
/// falls back to `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Everyone taking part in the match.
    All,

    /// Whoever holds one slot.
    Slot(SlotId),

    /// One specific user, slot or not.
    User(UserId),

    /// The match's group channel.
    Group,
}
