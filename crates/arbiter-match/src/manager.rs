//! Match manager: creates matches and finds them by id, user or group.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arbiter_protocol::{GroupId, MatchId, UserId};
use arbiter_timer::TimerService;

use crate::registry::Registry;
use crate::{EngineConfig, GameHandle, Match, MatchError, MatchSummary, Messenger, ScoreRecorder};

/// Counter for generating unique match IDs.
static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(1);

/// The collaborators every match talks to.
pub struct MatchServices {
    pub messenger: Arc<dyn Messenger>,
    pub recorder: Arc<dyn ScoreRecorder>,
    pub timers: Arc<dyn TimerService>,
    pub config: EngineConfig,
}

/// Owns the registry of live matches.
///
/// A match is registered from creation until it is over. Lookups return
/// `Arc<Match>`, so an operation already holding a match can finish even
/// if the match is released meanwhile.
pub struct MatchManager {
    registry: Arc<Registry>,
    services: Arc<MatchServices>,
}

impl MatchManager {
    pub fn new(services: MatchServices) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            services: Arc::new(MatchServices {
                config: services.config.validated(),
                ..services
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.services.config
    }

    /// Creates a match of `game` hosted by `host`, in `group` for a public
    /// match or `None` for a private one.
    ///
    /// A group's previous match is terminated first if it has not started;
    /// a running one makes this fail with `AlreadyStarted`.
    pub fn new_match(
        &self,
        game: GameHandle,
        host: UserId,
        group: Option<GroupId>,
    ) -> Result<Arc<Match>, MatchError> {
        if let Some(existing) = group.and_then(|g| self.registry.by_group(g)) {
            match existing.terminate(false) {
                Ok(()) | Err(MatchError::AlreadyOver(_)) => {}
                Err(e) => return Err(e),
            }
            tracing::info!(match_id = %existing.id(), "replaced by a new match");
        }
        if let Some(current) = self.registry.user_match(host) {
            return Err(MatchError::InOtherMatch(host, current));
        }

        let id = MatchId(NEXT_MATCH_ID.fetch_add(1, Ordering::Relaxed));
        let m = Match::new(
            id,
            game,
            host,
            group,
            Arc::clone(&self.services),
            Arc::downgrade(&self.registry),
        );
        self.registry.insert(&m, host)?;
        tracing::info!(match_id = %id, game = m.game().name(), %host, ?group, "match created");
        Ok(m)
    }

    pub fn get(&self, id: MatchId) -> Option<Arc<Match>> {
        self.registry.get(id)
    }

    /// The match `user` currently takes part in.
    pub fn by_user(&self, user: UserId) -> Option<Arc<Match>> {
        self.registry.by_user(user)
    }

    pub fn by_group(&self, group: GroupId) -> Option<Arc<Match>> {
        self.registry.by_group(group)
    }

    /// Every registered match, oldest first.
    pub fn matches(&self) -> Vec<Arc<Match>> {
        self.registry.all()
    }

    /// Matches that can still be joined.
    pub fn summaries(&self) -> Vec<MatchSummary> {
        self.matches()
            .iter()
            .map(|m| m.summary())
            .filter(|s| s.state.is_joinable())
            .collect()
    }

    pub fn match_count(&self) -> usize {
        self.registry.all().len()
    }
}
