//! The `Arbiter` facade and its builder.
//!
//! `Arbiter` ties a [`MatchManager`] to a catalogue of games and routes
//! users to matches: public matches live in a group and are joined from
//! there, private matches are joined by id.

use std::collections::HashMap;
use std::sync::Arc;

use arbiter_match::{
    EngineConfig, GameHandle, GameInfo, GameLogic, Match, MatchError, MatchManager, MatchServices,
    MatchSummary, Messenger, NoopRecorder, NullMessenger, ScoreRecorder,
};
use arbiter_protocol::{GroupId, MatchId, UserId};
use arbiter_stage::StageCode;
use arbiter_timer::{TimerService, TokioTimer};

use crate::ArbiterError;

/// Builder for an [`Arbiter`].
///
/// # Example
///
/// ```rust,ignore
/// use arbiter::prelude::*;
///
/// let arbiter = Arbiter::builder()
///     .messenger(Arc::new(MyChat))
///     .game(MyGame)
///     .build()?;
/// ```
pub struct ArbiterBuilder {
    messenger: Arc<dyn Messenger>,
    recorder: Arc<dyn ScoreRecorder>,
    timers: Option<Arc<dyn TimerService>>,
    config: EngineConfig,
    games: Vec<GameHandle>,
}

impl ArbiterBuilder {
    /// Creates a builder that drops messages, records nothing and uses a
    /// Tokio timer.
    pub fn new() -> Self {
        Self {
            messenger: Arc::new(NullMessenger),
            recorder: Arc::new(NoopRecorder),
            timers: None,
            config: EngineConfig::default(),
            games: Vec::new(),
        }
    }

    pub fn messenger(mut self, messenger: Arc<dyn Messenger>) -> Self {
        self.messenger = messenger;
        self
    }

    pub fn score_recorder(mut self, recorder: Arc<dyn ScoreRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Replaces the default Tokio timer, e.g. with a `ManualTimer` in tests.
    pub fn timer_service(mut self, timers: Arc<dyn TimerService>) -> Self {
        self.timers = Some(timers);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a game to the catalogue. A later game with the same name
    /// replaces an earlier one.
    pub fn game(mut self, game: impl GameLogic) -> Self {
        self.games.push(GameHandle::new(game));
        self
    }

    /// Builds the engine. Without an explicit timer service this must run
    /// inside a Tokio runtime.
    pub fn build(self) -> Result<Arbiter, ArbiterError> {
        let config = self.config.validated();
        let timers = match self.timers {
            Some(timers) => timers,
            None => {
                let runtime =
                    tokio::runtime::Handle::try_current().map_err(|_| ArbiterError::NoRuntime)?;
                Arc::new(TokioTimer::with_handle(runtime, config.timer.clone()))
            }
        };
        let games = self
            .games
            .into_iter()
            .map(|g| (g.name().to_string(), g))
            .collect::<HashMap<_, _>>();
        tracing::info!(games = games.len(), "arbiter ready");

        Ok(Arbiter {
            manager: MatchManager::new(MatchServices {
                messenger: self.messenger,
                recorder: self.recorder,
                timers,
                config,
            }),
            games,
        })
    }
}

impl Default for ArbiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A game catalogue plus the matches being played.
pub struct Arbiter {
    manager: MatchManager,
    games: HashMap<String, GameHandle>,
}

impl Arbiter {
    pub fn builder() -> ArbiterBuilder {
        ArbiterBuilder::new()
    }

    pub fn manager(&self) -> &MatchManager {
        &self.manager
    }

    /// Registered games, sorted by name.
    pub fn games(&self) -> Vec<&GameInfo> {
        let mut games: Vec<&GameInfo> = self.games.values().map(GameHandle::info).collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        games
    }

    /// Creates a match of the game called `game`. With a group the match is
    /// public to that group; without, it is private.
    pub fn new_match(
        &self,
        game: &str,
        host: UserId,
        group: Option<GroupId>,
    ) -> Result<Arc<Match>, ArbiterError> {
        let handle = self
            .games
            .get(game)
            .ok_or_else(|| ArbiterError::UnknownGame(game.to_string()))?;
        Ok(self.manager.new_match(handle.clone(), host, group)?)
    }

    /// Joins the match being set up in `group`.
    pub fn join_public(&self, user: UserId, group: GroupId) -> Result<Arc<Match>, ArbiterError> {
        let m = self
            .manager
            .by_group(group)
            .ok_or(ArbiterError::GroupNotInMatch(group))?;
        self.join(user, m.id(), Some(group))
    }

    /// Joins a private match by id.
    pub fn join_private(&self, user: UserId, id: MatchId) -> Result<Arc<Match>, ArbiterError> {
        self.join(user, id, None)
    }

    /// Joins match `id`, addressed from `from` (a group, or `None` for a
    /// private conversation).
    pub fn join(
        &self,
        user: UserId,
        id: MatchId,
        from: Option<GroupId>,
    ) -> Result<Arc<Match>, ArbiterError> {
        let m = self.manager.get(id).ok_or(MatchError::NotFound(id))?;
        match (m.group(), from) {
            (Some(own), from) if from != Some(own) => {
                return Err(ArbiterError::NeedPublicJoin(id, own));
            }
            (None, Some(_)) => return Err(ArbiterError::NeedPrivateJoin(id)),
            _ => {}
        }
        m.join(user)?;
        Ok(m)
    }

    /// The match `user` takes part in.
    pub fn current_match(&self, user: UserId) -> Result<Arc<Match>, ArbiterError> {
        self.manager
            .by_user(user)
            .ok_or(ArbiterError::NotInAnyMatch(user))
    }

    /// Passes `text` to the user's match.
    pub fn request(
        &self,
        user: UserId,
        group: Option<GroupId>,
        text: &str,
    ) -> Result<StageCode, ArbiterError> {
        Ok(self.current_match(user)?.request(user, group, text)?)
    }

    pub fn leave(&self, user: UserId, force: bool) -> Result<(), ArbiterError> {
        Ok(self.current_match(user)?.leave(user, force)?)
    }

    /// Matches waiting for players.
    pub fn summaries(&self) -> Vec<MatchSummary> {
        self.manager.summaries()
    }
}
