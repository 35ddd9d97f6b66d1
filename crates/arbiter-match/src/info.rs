//! Read-only snapshots of a match.

use arbiter_protocol::{GroupId, MatchId, SlotHolder, SlotId, UserId};
use serde::Serialize;

use crate::{MatchState, ParticipantState};

/// Everything observable about one match at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchInfo {
    pub match_id: MatchId,
    pub game: String,
    pub group: Option<GroupId>,
    pub host: UserId,
    pub state: MatchState,
    pub bench_to: usize,
    pub multiple: u32,
    /// The game's own description of its options.
    pub options: String,
    pub participants: Vec<ParticipantInfo>,
    /// Empty until the match starts.
    pub slots: Vec<SlotInfo>,
    /// Names from the root stage down to the running leaf. Empty unless
    /// the match is started.
    pub stage: Vec<String>,
    pub remaining_secs: Option<u64>,
    /// Commands accepted by the running stages.
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantInfo {
    pub user: UserId,
    pub state: ParticipantState,
    pub is_host: bool,
    pub slots: Vec<SlotId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    pub slot: SlotId,
    pub holder: SlotHolder,
    pub eliminated: bool,
}

/// One line of a match listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub game: String,
    pub group: Option<GroupId>,
    pub host: UserId,
    pub state: MatchState,
    pub players: usize,
    /// 0 = unlimited.
    pub max_players: usize,
}
