//! A whole stage tree: game state, root stage and readiness mask.

use std::time::Duration;

use arbiter_protocol::SlotId;

use crate::{Caller, MatchHost, Readiness, ReadinessMask, StageCode, StageContext, StageNode};

/// Game state shared by all stages of one match.
pub trait GameState: Send + 'static {
    /// Final score of a slot. Read once, when the root stage is over.
    fn slot_score(&self, slot: SlotId) -> i64;

    /// Achievements earned during the match, read with the scores.
    fn achievements(&self) -> Vec<(SlotId, String)> {
        Vec::new()
    }
}

/// The object-safe face of a [`StageTree`], used by the match controller
/// so it does not need to know the game's state type.
pub trait StageRunner: Send {
    fn begin(&mut self, host: &mut dyn MatchHost);
    fn handle_request(&mut self, host: &mut dyn MatchHost, caller: Caller, text: &str) -> StageCode;
    fn handle_timeout(&mut self, host: &mut dyn MatchHost) -> StageCode;
    fn handle_leave(&mut self, host: &mut dyn MatchHost, slot: SlotId) -> StageCode;
    fn handle_computer_act(
        &mut self,
        host: &mut dyn MatchHost,
        slot: SlotId,
        as_if_human: bool,
    ) -> StageCode;
    fn handle_alert(&mut self, host: &mut dyn MatchHost, remaining: Duration);

    fn is_over(&self) -> bool;

    /// Changes whenever readiness is reset (a checkout anywhere in the
    /// tree, or a stage starting its round over).
    fn readiness_epoch(&self) -> u64;

    fn readiness(&self, slot: SlotId) -> Readiness;

    /// Active stage names from the root down, e.g. `["match", "round 2"]`.
    fn stage_path(&self) -> Vec<String>;

    fn command_info(&self) -> Vec<String>;

    fn scores(&self) -> Vec<i64>;

    fn achievements(&self) -> Vec<(SlotId, String)>;
}

pub struct StageTree<G> {
    game: G,
    root: StageNode<G>,
    mask: ReadinessMask,
}

impl<G: GameState> StageTree<G> {
    pub fn new(game: G, root: StageNode<G>, slot_count: usize) -> Self {
        Self {
            game,
            root,
            mask: ReadinessMask::new(slot_count),
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn root(&self) -> &StageNode<G> {
        &self.root
    }

    pub fn mask(&self) -> &ReadinessMask {
        &self.mask
    }

    fn run(
        &mut self,
        host: &mut dyn MatchHost,
        f: impl FnOnce(&mut StageNode<G>, &mut G, &mut StageContext<'_>) -> StageCode,
    ) -> StageCode {
        let mut ctx = StageContext::new(&mut self.mask, host);
        f(&mut self.root, &mut self.game, &mut ctx)
    }
}

impl<G: GameState> StageRunner for StageTree<G> {
    fn begin(&mut self, host: &mut dyn MatchHost) {
        let mut ctx = StageContext::new(&mut self.mask, host);
        self.root.begin(&mut self.game, &mut ctx);
    }

    fn handle_request(&mut self, host: &mut dyn MatchHost, caller: Caller, text: &str) -> StageCode {
        self.run(host, |root, game, ctx| root.handle_request(game, ctx, caller, text))
    }

    fn handle_timeout(&mut self, host: &mut dyn MatchHost) -> StageCode {
        self.run(host, |root, game, ctx| root.handle_timeout(game, ctx))
    }

    fn handle_leave(&mut self, host: &mut dyn MatchHost, slot: SlotId) -> StageCode {
        self.run(host, |root, game, ctx| root.handle_leave(game, ctx, slot))
    }

    fn handle_computer_act(
        &mut self,
        host: &mut dyn MatchHost,
        slot: SlotId,
        as_if_human: bool,
    ) -> StageCode {
        self.run(host, |root, game, ctx| {
            root.handle_computer_act(game, ctx, slot, as_if_human)
        })
    }

    fn handle_alert(&mut self, host: &mut dyn MatchHost, remaining: Duration) {
        let mut ctx = StageContext::new(&mut self.mask, host);
        self.root.handle_alert(&mut ctx, remaining);
    }

    fn is_over(&self) -> bool {
        self.root.is_over()
    }

    fn readiness_epoch(&self) -> u64 {
        self.mask.epoch()
    }

    fn readiness(&self, slot: SlotId) -> Readiness {
        self.mask.get(slot)
    }

    fn stage_path(&self) -> Vec<String> {
        let mut path = Vec::new();
        if !self.root.is_over() {
            self.root.path(&mut path);
        }
        path
    }

    fn command_info(&self) -> Vec<String> {
        let mut info = Vec::new();
        self.root.command_info(&mut info);
        info
    }

    fn scores(&self) -> Vec<i64> {
        (0..self.mask.len()).map(|i| self.game.slot_score(SlotId(i))).collect()
    }

    fn achievements(&self) -> Vec<(SlotId, String)> {
        self.game.achievements()
    }
}
