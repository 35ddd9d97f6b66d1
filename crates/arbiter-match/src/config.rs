//! Engine and per-match configuration, and the match state machine.

use arbiter_timer::TimerConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Settings shared by every match a manager creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Slots each joining user takes.
    pub slots_per_user: usize,

    /// How many rounds of computer actions to run when no human can act
    /// any more, before giving up and terminating the match.
    pub autopilot_pass_limit: usize,

    /// Alert schedule for match timers.
    pub timer: TimerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slots_per_user: 1,
            autopilot_pass_limit: 256,
            timer: TimerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Fixes values that would make matches unplayable.
    pub fn validated(mut self) -> Self {
        if self.slots_per_user == 0 {
            warn!("slots_per_user of 0 raised to 1");
            self.slots_per_user = 1;
        }
        if self.autopilot_pass_limit == 0 {
            warn!("autopilot_pass_limit of 0 raised to 1");
            self.autopilot_pass_limit = 1;
        }
        self.timer = self.timer.validated();
        self
    }
}

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// The host-controlled settings of one match. Frozen once it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Fill the table with computers up to this many slots. 0 = no bench.
    pub bench_to: usize,

    /// Score multiplier. 0 = trial match, nothing is recorded.
    pub multiple: u32,

    pub slots_per_user: usize,
}

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// Where a match is in its life. Never goes backwards:
///
/// ```text
/// NotStarted → Started → Over
/// ```
///
/// A match can also go from `NotStarted` straight to `Over` when it is
/// terminated before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    NotStarted,
    Started,
    Over,
}

impl MatchState {
    /// Users may join, leave and change settings.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::NotStarted)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Started)
    }

    pub fn is_over(&self) -> bool {
        matches!(self, Self::Over)
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::Started),
            Self::Started => Some(Self::Over),
            Self::Over => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (self == Self::NotStarted && target == Self::Over)
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::Started => write!(f, "Started"),
            Self::Over => write!(f, "Over"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_state_next_follows_strict_order() {
        assert_eq!(MatchState::NotStarted.next(), Some(MatchState::Started));
        assert_eq!(MatchState::Started.next(), Some(MatchState::Over));
        assert_eq!(MatchState::Over.next(), None);
    }

    #[test]
    fn test_match_state_can_transition_to() {
        assert!(MatchState::NotStarted.can_transition_to(MatchState::Started));
        assert!(MatchState::NotStarted.can_transition_to(MatchState::Over));
        assert!(MatchState::Started.can_transition_to(MatchState::Over));
        assert!(!MatchState::Over.can_transition_to(MatchState::NotStarted));
        assert!(!MatchState::Started.can_transition_to(MatchState::NotStarted));
    }

    #[test]
    fn test_match_state_predicates() {
        assert!(MatchState::NotStarted.is_joinable());
        assert!(!MatchState::Started.is_joinable());
        assert!(MatchState::Started.is_active());
        assert!(MatchState::Over.is_over());
    }

    #[test]
    fn test_match_state_display() {
        assert_eq!(MatchState::NotStarted.to_string(), "NotStarted");
        assert_eq!(MatchState::Over.to_string(), "Over");
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.slots_per_user, 1);
        assert_eq!(config.autopilot_pass_limit, 256);
        assert_eq!(config.timer.alert_before_secs, vec![60, 30, 10]);
    }

    #[test]
    fn test_engine_config_validated_raises_zeroes() {
        let config = EngineConfig {
            slots_per_user: 0,
            autopilot_pass_limit: 0,
            timer: TimerConfig::default(),
        }
        .validated();
        assert_eq!(config.slots_per_user, 1);
        assert_eq!(config.autopilot_pass_limit, 1);
    }

    #[test]
    fn test_engine_config_deserializes_partial() {
        let config: EngineConfig = serde_json::from_str(r#"{"slots_per_user": 2}"#).unwrap();
        assert_eq!(config.slots_per_user, 2);
        assert_eq!(config.autopilot_pass_limit, 256);
    }
}
