//! Shared vocabulary for Arbiter.
//!
//! Every other crate in the workspace talks about users, groups, matches
//! and seats. This crate gives each of those a distinct type so they can't
//! be mixed up, plus [`Recipient`], the answer to "who should hear this?".
//!
//! ```text
//! Stage (Recipient::Slot) → Match controller (resolves to UserId / GroupId) → Messenger
//! ```
//!
//! Nothing here knows about locks, stages or timers.

mod types;

pub use types::{ComputerId, GroupId, MatchId, Recipient, SlotHolder, SlotId, UserId};
