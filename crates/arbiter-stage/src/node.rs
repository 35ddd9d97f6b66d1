//! Stage traits and the node type that drives them.
//!
//! Game code implements [`AtomicStage`] for leaves and [`CompositeStage`]
//! for stages that run a sequence of children, then wraps values in a
//! [`StageNode`]. The node carries the engine's side of the contract:
//! readiness bookkeeping, hook/unpin handling and the checkout cascade.
//!
//! ```text
//! StageNode (composite) ── current: Option<StageNode> ── StageNode (atomic)
//! ```
//!
//! A composite holds at most one child. On checkout the child is taken
//! out of the `Option` and handed to
//! [`CompositeStage::next_sub_stage`] by value before the next child is
//! begun.

use std::any::Any;
use std::time::Duration;

use arbiter_protocol::SlotId;

use crate::command::Commands;
use crate::{
    ActionResult, Caller, CheckoutReason, CheckoutResult, ControlResult, Readiness, StageCode,
    StageContext,
};

// ---------------------------------------------------------------------------
// Game-facing traits
// ---------------------------------------------------------------------------

/// A leaf stage: it answers requests and timeouts itself.
///
/// `G` is the game state shared by every stage of the tree. All hooks have
/// defaults; a stage that only needs commands implements `name` and
/// `commands`.
pub trait AtomicStage<G>: Send + Sized + 'static {
    fn name(&self) -> String;

    /// Registers commands in priority order. Runs once per stage instance.
    fn commands(_commands: &mut Commands<Self, G, ActionResult>) {}

    /// Runs when the stage is entered, typically to announce it and arm
    /// the timer.
    fn on_stage_begin(&mut self, _game: &mut G, _ctx: &mut StageContext<'_>) {}

    /// The deadline passed. Slots that had not acted are already hooked.
    fn on_timeout(&mut self, _game: &mut G, _ctx: &mut StageContext<'_>) -> CheckoutResult {
        CheckoutResult::Checkout
    }

    /// A slot left the match for good. The slot is already pinned.
    fn on_player_leave(
        &mut self,
        _game: &mut G,
        _ctx: &mut StageContext<'_>,
        _slot: SlotId,
    ) -> CheckoutResult {
        CheckoutResult::Continue
    }

    /// A computer stand-in is asked to act. Returning
    /// [`ActionResult::Ready`] marks it ready like a human's ready move.
    fn on_computer_act(
        &mut self,
        _game: &mut G,
        _ctx: &mut StageContext<'_>,
        _slot: SlotId,
    ) -> ActionResult {
        ActionResult::Ready
    }

    /// Every slot is ready. Return `Continue`, or clear readiness, to keep
    /// the stage going.
    fn on_all_ready(&mut self, _game: &mut G, _ctx: &mut StageContext<'_>) -> CheckoutResult {
        CheckoutResult::Checkout
    }
}

/// A stage that runs one child stage at a time.
pub trait CompositeStage<G>: Send + Sized + 'static {
    fn name(&self) -> String;

    /// Commands tried before the request is passed to the child.
    fn commands(_commands: &mut Commands<Self, G, ControlResult>) {}

    /// Picks the first child.
    fn on_stage_begin(&mut self, game: &mut G, ctx: &mut StageContext<'_>) -> StageNode<G>;

    /// Picks the child after `finished`, or `None` to end this stage.
    ///
    /// `finished` is moved in and dropped when this returns, before the
    /// returned child begins. Use [`StageNode::downcast_ref`] to tell which
    /// kind of child ended.
    fn next_sub_stage(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        finished: StageNode<G>,
        reason: CheckoutReason,
    ) -> Option<StageNode<G>>;

    /// Runs before the leave reaches the child.
    fn on_player_leave(&mut self, _game: &mut G, _ctx: &mut StageContext<'_>, _slot: SlotId) {}

    /// Runs before a computer action reaches the child. Anything other
    /// than `Ok` stops it there.
    fn on_computer_act(
        &mut self,
        _game: &mut G,
        _ctx: &mut StageContext<'_>,
        _slot: SlotId,
    ) -> ControlResult {
        ControlResult::Ok
    }
}

// ---------------------------------------------------------------------------
// StageNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Atomic,
    Composite,
}

/// A stage in the tree: a kind tag plus the boxed stage and its engine
/// state.
pub struct StageNode<G> {
    kind: StageKind,
    driver: Box<dyn Driver<G>>,
}

impl<G: 'static> StageNode<G> {
    pub fn atomic<S: AtomicStage<G>>(stage: S) -> Self {
        Self {
            kind: StageKind::Atomic,
            driver: Box::new(AtomicNode {
                stage,
                commands: {
                    let mut commands = Commands::new();
                    S::commands(&mut commands);
                    commands
                },
                begun: false,
                over: false,
            }),
        }
    }

    pub fn composite<S: CompositeStage<G>>(stage: S) -> Self {
        Self {
            kind: StageKind::Composite,
            driver: Box::new(CompositeNode {
                stage,
                commands: {
                    let mut commands = Commands::new();
                    S::commands(&mut commands);
                    commands
                },
                current: None,
                begun: false,
                over: false,
            }),
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn name(&self) -> String {
        self.driver.name()
    }

    pub fn is_over(&self) -> bool {
        self.driver.is_over()
    }

    /// Whether the wrapped stage is an `S`.
    pub fn is<S: 'static>(&self) -> bool {
        self.driver.stage_any().is::<S>()
    }

    pub fn downcast_ref<S: 'static>(&self) -> Option<&S> {
        self.driver.stage_any().downcast_ref::<S>()
    }

    pub(crate) fn begin(&mut self, game: &mut G, ctx: &mut StageContext<'_>) {
        self.driver.begin(game, ctx);
    }

    pub(crate) fn handle_request(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        caller: Caller,
        text: &str,
    ) -> StageCode {
        self.driver.handle_request(game, ctx, caller, text)
    }

    pub(crate) fn handle_timeout(&mut self, game: &mut G, ctx: &mut StageContext<'_>) -> StageCode {
        self.driver.handle_timeout(game, ctx)
    }

    pub(crate) fn handle_leave(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        slot: SlotId,
    ) -> StageCode {
        self.driver.handle_leave(game, ctx, slot)
    }

    pub(crate) fn handle_computer_act(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        slot: SlotId,
        as_if_human: bool,
    ) -> StageCode {
        self.driver.handle_computer_act(game, ctx, slot, as_if_human)
    }

    pub(crate) fn handle_alert(&mut self, ctx: &mut StageContext<'_>, remaining: Duration) {
        self.driver.handle_alert(ctx, remaining);
    }

    /// Names from this node down to the active leaf.
    pub(crate) fn path(&self, out: &mut Vec<String>) {
        self.driver.path(out);
    }

    /// Command descriptions from this node down to the active leaf.
    pub(crate) fn command_info(&self, out: &mut Vec<String>) {
        self.driver.command_info(out);
    }
}

impl<G> std::fmt::Debug for StageNode<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageNode")
            .field("kind", &self.kind)
            .field("name", &self.driver.name())
            .field("over", &self.driver.is_over())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// The engine side of a stage. One implementation per stage kind.
trait Driver<G>: Send {
    fn name(&self) -> String;
    fn is_over(&self) -> bool;
    fn stage_any(&self) -> &dyn Any;
    fn begin(&mut self, game: &mut G, ctx: &mut StageContext<'_>);
    fn handle_request(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        caller: Caller,
        text: &str,
    ) -> StageCode;
    fn handle_timeout(&mut self, game: &mut G, ctx: &mut StageContext<'_>) -> StageCode;
    fn handle_leave(&mut self, game: &mut G, ctx: &mut StageContext<'_>, slot: SlotId)
    -> StageCode;
    fn handle_computer_act(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        slot: SlotId,
        as_if_human: bool,
    ) -> StageCode;
    fn handle_alert(&mut self, ctx: &mut StageContext<'_>, remaining: Duration);
    fn path(&self, out: &mut Vec<String>);
    fn command_info(&self, out: &mut Vec<String>);
}

// -- atomic -----------------------------------------------------------------

struct AtomicNode<S, G> {
    stage: S,
    commands: Commands<S, G, ActionResult>,
    begun: bool,
    over: bool,
}

impl<G: 'static, S: AtomicStage<G>> AtomicNode<S, G> {
    /// Turns a handler's code into the stage's answer: checks the mask,
    /// gives the stage its all-ready hook, and ends it on checkout.
    fn settle(&mut self, game: &mut G, ctx: &mut StageContext<'_>, code: StageCode) -> StageCode {
        let mut code = code;
        // Checked whatever the code was, so a table emptied by leaves or
        // eliminations still moves on.
        if code != StageCode::Checkout && ctx.all_ready() {
            let answer = self.stage.on_all_ready(game, ctx);
            code = if answer == CheckoutResult::Checkout && ctx.all_ready() {
                StageCode::Checkout
            } else {
                StageCode::Continue
            };
        }
        if code == StageCode::Checkout {
            self.over = true;
            ctx.stop_timer();
        }
        code
    }

    fn ready_code(ctx: &mut StageContext<'_>, result: ActionResult, slot: SlotId, human: bool) -> StageCode {
        match result {
            ActionResult::Ready => {
                ctx.mask_mut().set(slot, human);
                StageCode::Ok
            }
            other => other.into(),
        }
    }
}

impl<G: 'static, S: AtomicStage<G>> Driver<G> for AtomicNode<S, G> {
    fn name(&self) -> String {
        self.stage.name()
    }

    fn is_over(&self) -> bool {
        self.over
    }

    fn stage_any(&self) -> &dyn Any {
        &self.stage
    }

    fn begin(&mut self, game: &mut G, ctx: &mut StageContext<'_>) {
        assert!(!self.begun, "stage {} began twice", self.stage.name());
        self.begun = true;
        self.stage.on_stage_begin(game, ctx);
        self.settle(game, ctx, StageCode::Ok);
    }

    fn handle_request(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        caller: Caller,
        text: &str,
    ) -> StageCode {
        if self.over {
            return StageCode::NotFound;
        }
        let was_hooked = ctx.mask_mut().unpin(caller.slot);
        let Some(result) = self.commands.dispatch(&mut self.stage, game, ctx, caller, text) else {
            if was_hooked {
                ctx.mask_mut().restore_pin(caller.slot);
            }
            return StageCode::NotFound;
        };
        if was_hooked {
            ctx.tell(caller.slot, "You are back in the game.");
        }
        let code = Self::ready_code(ctx, result, caller.slot, true);
        self.settle(game, ctx, code)
    }

    fn handle_timeout(&mut self, game: &mut G, ctx: &mut StageContext<'_>) -> StageCode {
        if self.over {
            return StageCode::Checkout;
        }
        let idle: Vec<SlotId> = ctx.slots().filter(|s| ctx.readiness(*s) == Readiness::Unset).collect();
        for slot in idle {
            ctx.hook(slot);
        }
        let code = StageCode::from(self.stage.on_timeout(game, ctx));
        if code == StageCode::Checkout {
            self.over = true;
            ctx.stop_timer();
        }
        code
    }

    fn handle_leave(&mut self, game: &mut G, ctx: &mut StageContext<'_>, slot: SlotId) -> StageCode {
        if self.over {
            return StageCode::Checkout;
        }
        ctx.mask_mut().pin(slot);
        let code = StageCode::from(self.stage.on_player_leave(game, ctx, slot));
        self.settle(game, ctx, code)
    }

    fn handle_computer_act(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        slot: SlotId,
        as_if_human: bool,
    ) -> StageCode {
        if self.over {
            return StageCode::Checkout;
        }
        let result = self.stage.on_computer_act(game, ctx, slot);
        let code = Self::ready_code(ctx, result, slot, as_if_human);
        self.settle(game, ctx, code)
    }

    fn handle_alert(&mut self, ctx: &mut StageContext<'_>, remaining: Duration) {
        if self.over {
            return;
        }
        ctx.broadcast(format!("{} seconds left.", remaining.as_secs()));
        let idle: Vec<SlotId> = ctx
            .slots()
            .filter(|s| ctx.readiness(*s) == Readiness::Unset && !ctx.is_computer(*s))
            .collect();
        for slot in idle {
            ctx.tell(slot, "Time is running out, please act.");
        }
    }

    fn path(&self, out: &mut Vec<String>) {
        out.push(self.stage.name());
    }

    fn command_info(&self, out: &mut Vec<String>) {
        out.extend(self.commands.iter().map(|c| c.description().to_string()));
    }
}

// -- composite --------------------------------------------------------------

struct CompositeNode<S, G> {
    stage: S,
    commands: Commands<S, G, ControlResult>,
    current: Option<StageNode<G>>,
    begun: bool,
    over: bool,
}

impl<G: 'static, S: CompositeStage<G>> CompositeNode<S, G> {
    /// Moves on from the current child until one is running or there are
    /// none left. Does nothing once the stage is over.
    fn checkout(&mut self, game: &mut G, ctx: &mut StageContext<'_>, reason: CheckoutReason) {
        let mut reason = reason;
        while let Some(finished) = self.current.take() {
            tracing::debug!(stage = %self.stage.name(), child = %finished.name(), %reason, "checkout");
            let next = self.stage.next_sub_stage(game, ctx, finished, reason);
            ctx.mask_mut().clear();
            let Some(mut child) = next else {
                self.over = true;
                return;
            };
            child.begin(game, ctx);
            let skip = child.is_over();
            self.current = Some(child);
            if !skip {
                return;
            }
            reason = CheckoutReason::Skip;
        }
    }

    /// Runs `f` on the child and checks out with `reason` if it finished.
    fn pass_down(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        reason: CheckoutReason,
        f: impl FnOnce(&mut StageNode<G>, &mut G, &mut StageContext<'_>) -> StageCode,
    ) -> StageCode {
        let Some(child) = self.current.as_mut() else {
            return StageCode::Checkout;
        };
        let code = f(child, game, ctx);
        if child.is_over() {
            self.checkout(game, ctx, reason);
        }
        code
    }
}

impl<G: 'static, S: CompositeStage<G>> Driver<G> for CompositeNode<S, G> {
    fn name(&self) -> String {
        self.stage.name()
    }

    fn is_over(&self) -> bool {
        self.over
    }

    fn stage_any(&self) -> &dyn Any {
        &self.stage
    }

    fn begin(&mut self, game: &mut G, ctx: &mut StageContext<'_>) {
        assert!(!self.begun, "stage {} began twice", self.stage.name());
        self.begun = true;
        let mut child = self.stage.on_stage_begin(game, ctx);
        child.begin(game, ctx);
        let skip = child.is_over();
        self.current = Some(child);
        if skip {
            self.checkout(game, ctx, CheckoutReason::Skip);
        }
    }

    fn handle_request(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        caller: Caller,
        text: &str,
    ) -> StageCode {
        if self.over {
            return StageCode::NotFound;
        }
        if let Some(result) = self.commands.dispatch(&mut self.stage, game, ctx, caller, text) {
            return result.into();
        }
        self.pass_down(game, ctx, CheckoutReason::ByRequest, |child, game, ctx| {
            child.handle_request(game, ctx, caller, text)
        })
    }

    fn handle_timeout(&mut self, game: &mut G, ctx: &mut StageContext<'_>) -> StageCode {
        self.pass_down(game, ctx, CheckoutReason::ByTimeout, |child, game, ctx| {
            child.handle_timeout(game, ctx)
        })
    }

    fn handle_leave(&mut self, game: &mut G, ctx: &mut StageContext<'_>, slot: SlotId) -> StageCode {
        if self.over {
            return StageCode::Checkout;
        }
        self.stage.on_player_leave(game, ctx, slot);
        self.pass_down(game, ctx, CheckoutReason::ByLeave, |child, game, ctx| {
            child.handle_leave(game, ctx, slot)
        })
    }

    fn handle_computer_act(
        &mut self,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        slot: SlotId,
        as_if_human: bool,
    ) -> StageCode {
        if self.over {
            return StageCode::Checkout;
        }
        let result = self.stage.on_computer_act(game, ctx, slot);
        if result != ControlResult::Ok {
            return result.into();
        }
        self.pass_down(game, ctx, CheckoutReason::ByRequest, |child, game, ctx| {
            child.handle_computer_act(game, ctx, slot, as_if_human)
        })
    }

    fn handle_alert(&mut self, ctx: &mut StageContext<'_>, remaining: Duration) {
        if let Some(child) = self.current.as_mut() {
            child.handle_alert(ctx, remaining);
        }
    }

    fn path(&self, out: &mut Vec<String>) {
        out.push(self.stage.name());
        if let Some(child) = &self.current {
            child.path(out);
        }
    }

    fn command_info(&self, out: &mut Vec<String>) {
        out.extend(self.commands.iter().map(|c| c.description().to_string()));
        if let Some(child) = &self.current {
            child.command_info(out);
        }
    }
}
