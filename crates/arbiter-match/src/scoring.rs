//! Score recording at the end of a match.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use arbiter_protocol::{GroupId, MatchId, SlotHolder, SlotId, UserId};
use serde::Serialize;

/// The final score of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotScore {
    pub slot: SlotId,
    pub holder: SlotHolder,
    pub score: i64,
}

/// Everything the recorder is told about a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub game: String,
    pub group: Option<GroupId>,
    pub host: UserId,
    pub multiple: u32,
    /// One entry per slot, computers included.
    pub scores: Vec<SlotScore>,
    /// Achievements earned by human players.
    pub achievements: Vec<(UserId, String)>,
}

/// Persists match results and gates high-stakes matches.
pub trait ScoreRecorder: Send + Sync + 'static {
    /// Called once per match that finished normally with a non-zero
    /// multiplier and more than one human player.
    fn record_match(&self, record: &MatchRecord);

    /// Whether `user` may join or configure a match at `multiple`. Only
    /// consulted for multipliers above the game's default.
    fn may_play(&self, user: UserId, multiple: u32) -> bool {
        let _ = (user, multiple);
        true
    }
}

/// Records nothing and allows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl ScoreRecorder for NoopRecorder {
    fn record_match(&self, _record: &MatchRecord) {}
}

/// Keeps records in memory. Per-user multiplier caps can be set to
/// exercise [`ScoreRecorder::may_play`].
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<MatchRecord>>,
    caps: Mutex<HashMap<UserId, u32>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MatchRecord> {
        lock(&self.records).clone()
    }

    /// Limits `user` to multipliers up to `max`.
    pub fn cap_multiple(&self, user: UserId, max: u32) {
        lock(&self.caps).insert(user, max);
    }
}

impl ScoreRecorder for MemoryRecorder {
    fn record_match(&self, record: &MatchRecord) {
        lock(&self.records).push(record.clone());
    }

    fn may_play(&self, user: UserId, multiple: u32) -> bool {
        lock(&self.caps).get(&user).is_none_or(|max| multiple <= *max)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MatchRecord {
        MatchRecord {
            match_id: MatchId(1),
            game: "coin".into(),
            group: None,
            host: UserId(1),
            multiple: 1,
            scores: vec![SlotScore {
                slot: SlotId(0),
                holder: SlotHolder::User(UserId(1)),
                score: 3,
            }],
            achievements: Vec::new(),
        }
    }

    #[test]
    fn test_memory_recorder_keeps_records() {
        let recorder = MemoryRecorder::new();
        recorder.record_match(&record());
        assert_eq!(recorder.records(), vec![record()]);
    }

    #[test]
    fn test_may_play_respects_caps() {
        let recorder = MemoryRecorder::new();
        assert!(recorder.may_play(UserId(1), 100));
        recorder.cap_multiple(UserId(1), 3);
        assert!(recorder.may_play(UserId(1), 3));
        assert!(!recorder.may_play(UserId(1), 4));
        assert!(recorder.may_play(UserId(2), 4));
    }

    #[test]
    fn test_record_serializes_holders() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["scores"][0]["holder"]["user"], 1);
        assert_eq!(json["match_id"], 1);
    }
}
