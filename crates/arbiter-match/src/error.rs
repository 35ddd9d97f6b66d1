//! Error types for match operations.

use arbiter_protocol::{GroupId, MatchId, UserId};

/// Why a match operation was refused.
///
/// Every variant is a caller-state problem: the operation was not allowed
/// right now, nothing was changed, and the caller may try something else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// No match with this id is registered.
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// Only the host may do this.
    #[error("{0} is not the host of match {1}")]
    NotHost(UserId, MatchId),

    /// The user has not joined this match, or has left it.
    #[error("{0} is not in match {1}")]
    NotInMatch(UserId, MatchId),

    /// The request came from a group other than the match's own.
    #[error("match {0} belongs to another group")]
    NotThisGroup(MatchId),

    #[error("match {0} has already started")]
    AlreadyStarted(MatchId),

    #[error("match {0} has not started yet")]
    NotStarted(MatchId),

    /// The match is finished; nothing can change it any more.
    #[error("match {0} is over")]
    AlreadyOver(MatchId),

    #[error("{0} is already in match {1}")]
    AlreadyInMatch(UserId, MatchId),

    /// A user takes part in at most one match at a time.
    #[error("{0} is already playing in match {1}")]
    InOtherMatch(UserId, MatchId),

    /// A group hosts at most one match at a time.
    #[error("group {0} already has match {1}")]
    GroupOccupied(GroupId, MatchId),

    #[error("this game allows at most {max} players")]
    MaxPlayerReached { max: usize },

    /// The score recorder refused the multiplier for this user.
    #[error("{user} does not have enough score to play at multiple {multiple}")]
    ScoreNotEnough { user: UserId, multiple: u32 },

    /// Every slot of the user has been eliminated.
    #[error("{0} has been eliminated")]
    Eliminated(UserId),

    /// The game rejected its options for the table about to start.
    #[error("invalid game options: {0}")]
    InvalidOptions(String),
}
