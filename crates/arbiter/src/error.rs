//! Unified error type for Arbiter.

use arbiter_match::MatchError;
use arbiter_protocol::{GroupId, MatchId, UserId};

/// Top-level error returned by the [`Arbiter`](crate::Arbiter) facade.
///
/// Match rule violations arrive as [`ArbiterError::Match`]; the remaining
/// variants come from routing a user to the right match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArbiterError {
    /// A match refused the operation.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// No game is registered under this name.
    #[error("unknown game: {0}")]
    UnknownGame(String),

    /// The group has no match to join.
    #[error("group {0} has no match")]
    GroupNotInMatch(GroupId),

    /// The user is not taking part in any match.
    #[error("{0} is not in any match")]
    NotInAnyMatch(UserId),

    /// A private match was addressed from a group.
    #[error("match {0} is private; join it by id")]
    NeedPrivateJoin(MatchId),

    /// A public match was addressed from outside its group.
    #[error("match {0} belongs to group {1}; join it there")]
    NeedPublicJoin(MatchId, GroupId),

    /// No timer service was configured and no Tokio runtime is running.
    #[error("no timer service configured and no Tokio runtime available")]
    NoRuntime,
}
