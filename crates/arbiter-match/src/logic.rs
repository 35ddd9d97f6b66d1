//! The `GameLogic` trait: the contract a game fulfils to be playable.
//!
//! A game provides three things:
//!
//! 1. [`GameInfo`]: its name, player limit and default multiplier.
//! 2. Options: a value the host tunes with text requests before the match
//!    starts ([`GameOptions`]).
//! 3. A factory that turns the options and a slot count into the game's
//!    state plus the root of its stage tree.
//!
//! The manager stores games behind [`GameHandle`], which erases the
//! associated types so matches of different games can live side by side.

use std::any::Any;
use std::sync::Arc;

use arbiter_stage::{GameState, StageNode, StageRunner, StageTree};
use serde::Serialize;

// ---------------------------------------------------------------------------
// GameInfo
// ---------------------------------------------------------------------------

/// Static facts about a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameInfo {
    /// Name users type to create a match.
    pub name: String,
    pub description: String,
    /// Most slots the game supports. 0 = unlimited.
    pub max_players: usize,
    /// Multiplier new matches start with. Raising it above this value is
    /// subject to [`ScoreRecorder::may_play`](crate::ScoreRecorder::may_play).
    pub default_multiple: u32,
}

// ---------------------------------------------------------------------------
// GameOptions
// ---------------------------------------------------------------------------

/// Host-adjustable settings of one match.
pub trait GameOptions: Send + 'static {
    /// Applies one option request such as `"rounds 5"`. Returns `false` if
    /// the text is not an option this game understands.
    fn set_option(&mut self, text: &str) -> bool;

    /// Human-readable summary of the current options.
    fn status(&self) -> String;

    /// Checks (and may adjust) the options for a table of `slot_count`
    /// slots right before the match starts.
    fn validate(&mut self, slot_count: usize) -> Result<(), String> {
        let _ = slot_count;
        Ok(())
    }

    /// Table size to fill to when the host benches without a number.
    fn best_player_count(&self) -> usize {
        2
    }
}

// ---------------------------------------------------------------------------
// GameLogic
// ---------------------------------------------------------------------------

/// A playable game.
///
/// Implementations are shared between all matches of the game, so they
/// hold no per-match state; everything per-match lives in `State`.
pub trait GameLogic: Send + Sync + 'static {
    type Options: GameOptions + Default;
    type State: GameState;

    fn info(&self) -> GameInfo;

    /// Options for a fresh match.
    fn new_options(&self) -> Self::Options {
        Self::Options::default()
    }

    /// Builds the game state and stage tree for a starting match.
    fn new_game(
        &self,
        options: &Self::Options,
        slot_count: usize,
    ) -> (Self::State, StageNode<Self::State>);
}

// ---------------------------------------------------------------------------
// Type erasure
// ---------------------------------------------------------------------------

/// Options of any game, recoverable as their concrete type.
pub(crate) trait DynOptions: GameOptions {
    fn as_any(&self) -> &dyn Any;
}

impl<T: GameOptions> DynOptions for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

trait ErasedGame: Send + Sync {
    fn new_options(&self) -> Box<dyn DynOptions>;
    fn build(&self, options: &dyn DynOptions, slot_count: usize) -> Option<Box<dyn StageRunner>>;
}

struct Erased<L>(L);

impl<L: GameLogic> ErasedGame for Erased<L> {
    fn new_options(&self) -> Box<dyn DynOptions> {
        Box::new(self.0.new_options())
    }

    fn build(&self, options: &dyn DynOptions, slot_count: usize) -> Option<Box<dyn StageRunner>> {
        let options = options.as_any().downcast_ref::<L::Options>()?;
        let (state, root) = self.0.new_game(options, slot_count);
        Some(Box::new(StageTree::new(state, root, slot_count)))
    }
}

/// A registered game, cheap to clone.
#[derive(Clone)]
pub struct GameHandle {
    info: Arc<GameInfo>,
    game: Arc<dyn ErasedGame>,
}

impl GameHandle {
    pub fn new<L: GameLogic>(logic: L) -> Self {
        Self {
            info: Arc::new(logic.info()),
            game: Arc::new(Erased(logic)),
        }
    }

    pub fn info(&self) -> &GameInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub(crate) fn new_options(&self) -> Box<dyn DynOptions> {
        self.game.new_options()
    }

    /// `None` if `options` were made by a different game.
    pub(crate) fn build(
        &self,
        options: &dyn DynOptions,
        slot_count: usize,
    ) -> Option<Box<dyn StageRunner>> {
        self.game.build(options, slot_count)
    }
}

impl std::fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHandle").field("name", &self.info.name).finish()
    }
}
