//! Integration tests for the stage engine using a small mock game.

use std::time::Duration;

use arbiter_protocol::{Recipient, SlotId};
use arbiter_stage::{
    ActionResult, AtomicStage, Caller, CheckoutReason, CheckoutResult, Commands, CompositeStage,
    ControlResult, GameState, MatchHost, Readiness, StageCode, StageContext, StageKind, StageNode,
    StageRunner, StageTree,
};

// =========================================================================
// Fake host: records everything the tree asks of it.
// =========================================================================

struct FakeHost {
    computers: Vec<bool>,
    eliminated: Vec<bool>,
    posts: Vec<(Recipient, String)>,
    timer: Option<Duration>,
    timer_starts: usize,
    timer_stops: usize,
}

impl FakeHost {
    fn humans(n: usize) -> Self {
        Self::with_computers(vec![false; n])
    }

    fn with_computers(computers: Vec<bool>) -> Self {
        let n = computers.len();
        Self {
            computers,
            eliminated: vec![false; n],
            posts: Vec::new(),
            timer: None,
            timer_starts: 0,
            timer_stops: 0,
        }
    }

    fn told(&self, slot: usize) -> Vec<&str> {
        self.posts
            .iter()
            .filter(|(r, _)| *r == Recipient::Slot(SlotId(slot)))
            .map(|(_, t)| t.as_str())
            .collect()
    }
}

impl MatchHost for FakeHost {
    fn slot_count(&self) -> usize {
        self.computers.len()
    }

    fn is_computer(&self, slot: SlotId) -> bool {
        self.computers[slot.index()]
    }

    fn is_eliminated(&self, slot: SlotId) -> bool {
        self.eliminated[slot.index()]
    }

    fn eliminate(&mut self, slot: SlotId) {
        self.eliminated[slot.index()] = true;
    }

    fn post(&mut self, recipient: Recipient, text: String) {
        self.posts.push((recipient, text));
    }

    fn start_timer(&mut self, duration: Duration) {
        self.timer = Some(duration);
        self.timer_starts += 1;
    }

    fn stop_timer(&mut self) {
        if self.timer.take().is_some() {
            self.timer_stops += 1;
        }
    }

    fn timer_remaining(&self) -> Option<Duration> {
        self.timer
    }
}

// =========================================================================
// Mock game
// =========================================================================

#[derive(Default)]
struct Board {
    log: Vec<String>,
    /// How many times `on_all_ready` restarts the turn instead of ending it.
    replays: u32,
    scores: Vec<i64>,
}

impl GameState for Board {
    fn slot_score(&self, slot: SlotId) -> i64 {
        self.scores.get(slot.index()).copied().unwrap_or(0)
    }

    fn achievements(&self) -> Vec<(SlotId, String)> {
        vec![(SlotId(0), "first".to_string())]
    }
}

struct Turn {
    timeout: CheckoutResult,
}

impl Default for Turn {
    fn default() -> Self {
        Self {
            timeout: CheckoutResult::Checkout,
        }
    }
}

impl AtomicStage<Board> for Turn {
    fn name(&self) -> String {
        "turn".to_string()
    }

    fn commands(c: &mut Commands<Self, Board, ActionResult>) {
        c.add("ready", |r| r.keyword("ready"), |_, board, _, caller, ()| {
            board.log.push(format!("ready {}", caller.slot));
            ActionResult::Ready
        })
        .add("fail", |r| r.keyword("fail"), |_, _, _, _, ()| ActionResult::Failed)
        .add("done", |r| r.keyword("done"), |_, _, _, _, ()| ActionResult::Checkout)
        .add("out: eliminate yourself", |r| r.keyword("out"), |_, _, ctx, caller, ()| {
            ctx.eliminate(caller.slot);
            ActionResult::Ok
        })
        .add(
            "score <n>",
            |r| {
                r.keyword("score")?;
                r.parse::<i64>()
            },
            |_, board, _, caller, n| {
                board.scores.resize(caller.slot.index() + 1, 0);
                board.scores[caller.slot.index()] = n;
                ActionResult::Ok
            },
        )
        .add("anything", |r| r.keyword("ready").map(|_| r.rest()), |_, board, _, _, rest| {
            board.log.push(format!("shadowed {rest}"));
            ActionResult::Ok
        });
    }

    fn on_stage_begin(&mut self, _board: &mut Board, ctx: &mut StageContext<'_>) {
        ctx.start_timer(Duration::from_secs(60));
    }

    fn on_timeout(&mut self, board: &mut Board, _ctx: &mut StageContext<'_>) -> CheckoutResult {
        board.log.push("timeout".to_string());
        self.timeout
    }

    fn on_player_leave(
        &mut self,
        board: &mut Board,
        _ctx: &mut StageContext<'_>,
        slot: SlotId,
    ) -> CheckoutResult {
        board.log.push(format!("leaf leave {slot}"));
        CheckoutResult::Continue
    }

    fn on_all_ready(&mut self, board: &mut Board, ctx: &mut StageContext<'_>) -> CheckoutResult {
        if board.replays > 0 {
            board.replays -= 1;
            ctx.clear_ready();
            ctx.broadcast("again");
            CheckoutResult::Continue
        } else {
            CheckoutResult::Checkout
        }
    }
}

/// A leaf that is finished as soon as it begins.
struct Instant;

impl AtomicStage<Board> for Instant {
    fn name(&self) -> String {
        "instant".to_string()
    }

    fn on_stage_begin(&mut self, _board: &mut Board, ctx: &mut StageContext<'_>) {
        for slot in ctx.slots() {
            ctx.set_ready(slot);
        }
    }
}

struct Rounds {
    left: u32,
    first_instant: bool,
}

impl Rounds {
    fn new(rounds: u32) -> Self {
        Self {
            left: rounds,
            first_instant: false,
        }
    }
}

impl CompositeStage<Board> for Rounds {
    fn name(&self) -> String {
        "rounds".to_string()
    }

    fn commands(c: &mut Commands<Self, Board, ControlResult>) {
        c.add(
            "skip",
            |r| r.keyword("ready").and_then(|_| r.keyword("skip")),
            |_, board, _, _, ()| {
                board.log.push("skip".to_string());
                ControlResult::Ok
            },
        );
    }

    fn on_stage_begin(&mut self, _board: &mut Board, _ctx: &mut StageContext<'_>) -> StageNode<Board> {
        if self.first_instant {
            StageNode::atomic(Instant)
        } else {
            self.left -= 1;
            StageNode::atomic(Turn::default())
        }
    }

    fn next_sub_stage(
        &mut self,
        board: &mut Board,
        _ctx: &mut StageContext<'_>,
        finished: StageNode<Board>,
        reason: CheckoutReason,
    ) -> Option<StageNode<Board>> {
        assert!(finished.is_over());
        assert!(finished.is::<Turn>() || finished.is::<Instant>());
        board.log.push(format!("next after {} {}", finished.name(), reason));
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        Some(StageNode::atomic(Turn::default()))
    }

    fn on_player_leave(&mut self, board: &mut Board, _ctx: &mut StageContext<'_>, slot: SlotId) {
        board.log.push(format!("composite leave {slot}"));
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn caller(slot: usize) -> Caller {
    Caller {
        slot: SlotId(slot),
        is_public: true,
    }
}

fn single_turn(host: &mut FakeHost) -> StageTree<Board> {
    let n = host.slot_count();
    let mut tree = StageTree::new(Board::default(), StageNode::atomic(Turn::default()), n);
    tree.begin(host);
    tree
}

fn rounds(host: &mut FakeHost, stage: Rounds) -> StageTree<Board> {
    let n = host.slot_count();
    let mut tree = StageTree::new(Board::default(), StageNode::composite(stage), n);
    tree.begin(host);
    tree
}

// =========================================================================
// Atomic stages
// =========================================================================

#[test]
fn test_atomic_all_ready_checks_out_once() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    assert_eq!(tree.handle_request(&mut host, caller(0), "ready"), StageCode::Ok);
    assert!(!tree.is_over());
    assert_eq!(tree.handle_request(&mut host, caller(1), "ready"), StageCode::Checkout);
    assert!(tree.is_over());
    assert_eq!(host.timer_starts, 1);
    assert_eq!(host.timer_stops, 1);
}

#[test]
fn test_atomic_first_registered_command_wins() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    tree.handle_request(&mut host, caller(0), "ready");
    assert_eq!(tree.game().log, vec!["ready #0"]);
}

#[test]
fn test_atomic_parser_must_consume_whole_message() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    // "ready" rejects trailing text, so the catch-all after it matches.
    assert_eq!(tree.handle_request(&mut host, caller(0), "ready now"), StageCode::Ok);
    assert_eq!(tree.game().log, vec!["shadowed now"]);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Unset);
}

#[test]
fn test_atomic_unknown_request_not_found() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    assert_eq!(tree.handle_request(&mut host, caller(0), "dance"), StageCode::NotFound);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Unset);
}

#[test]
fn test_atomic_failed_and_explicit_checkout() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    assert_eq!(tree.handle_request(&mut host, caller(0), "fail"), StageCode::Failed);
    assert!(!tree.is_over());
    assert_eq!(tree.handle_request(&mut host, caller(0), "done"), StageCode::Checkout);
    assert!(tree.is_over());
    assert_eq!(tree.handle_request(&mut host, caller(1), "ready"), StageCode::NotFound);
}

#[test]
fn test_atomic_computers_alone_never_finish_stage() {
    let mut host = FakeHost::with_computers(vec![true, true]);
    let mut tree = single_turn(&mut host);

    assert_eq!(tree.handle_computer_act(&mut host, SlotId(0), false), StageCode::Ok);
    assert_eq!(tree.handle_computer_act(&mut host, SlotId(1), false), StageCode::Ok);
    assert!(!tree.is_over());
}

#[test]
fn test_atomic_computer_as_if_human_finishes_stage() {
    let mut host = FakeHost::with_computers(vec![true, true]);
    let mut tree = single_turn(&mut host);

    tree.handle_computer_act(&mut host, SlotId(0), true);
    assert_eq!(tree.handle_computer_act(&mut host, SlotId(1), true), StageCode::Checkout);
}

#[test]
fn test_atomic_human_then_computer_finishes_stage() {
    let mut host = FakeHost::with_computers(vec![false, true]);
    let mut tree = single_turn(&mut host);

    tree.handle_computer_act(&mut host, SlotId(1), false);
    assert_eq!(tree.handle_request(&mut host, caller(0), "ready"), StageCode::Checkout);
}

#[test]
fn test_atomic_all_ready_hook_can_replay_round() {
    let mut host = FakeHost::humans(2);
    let mut tree = StageTree::new(
        Board {
            replays: 1,
            ..Board::default()
        },
        StageNode::atomic(Turn::default()),
        2,
    );
    tree.begin(&mut host);
    let epoch = tree.readiness_epoch();

    tree.handle_request(&mut host, caller(0), "ready");
    assert_eq!(tree.handle_request(&mut host, caller(1), "ready"), StageCode::Continue);
    assert!(!tree.is_over());
    assert_ne!(tree.readiness_epoch(), epoch);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Unset);

    tree.handle_request(&mut host, caller(0), "ready");
    assert_eq!(tree.handle_request(&mut host, caller(1), "ready"), StageCode::Checkout);
}

#[test]
fn test_atomic_timeout_hooks_idle_slots() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    tree.handle_request(&mut host, caller(0), "ready");
    assert_eq!(tree.handle_timeout(&mut host), StageCode::Checkout);
    assert!(tree.is_over());
    assert_eq!(tree.readiness(SlotId(1)), Readiness::Pinned);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Set);
    assert_eq!(host.told(1).len(), 1);
    assert!(host.told(0).is_empty());
}

#[test]
fn test_atomic_hooked_slot_unpinned_by_matching_request() {
    let mut host = FakeHost::humans(2);
    let mut tree = StageTree::new(
        Board::default(),
        StageNode::atomic(Turn {
            timeout: CheckoutResult::Continue,
        }),
        2,
    );
    tree.begin(&mut host);

    assert_eq!(tree.handle_timeout(&mut host), StageCode::Continue);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Pinned);

    // Text that matches nothing leaves the hook in place.
    assert_eq!(tree.handle_request(&mut host, caller(0), "dance"), StageCode::NotFound);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Pinned);

    assert_eq!(tree.handle_request(&mut host, caller(0), "fail"), StageCode::Failed);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Unset);
    assert_eq!(host.told(0).len(), 2);
}

#[test]
fn test_atomic_leave_pins_and_remaining_player_finishes() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    host.eliminate(SlotId(1));
    assert_eq!(tree.handle_leave(&mut host, SlotId(1)), StageCode::Continue);
    assert_eq!(tree.readiness(SlotId(1)), Readiness::Pinned);
    assert_eq!(tree.handle_request(&mut host, caller(0), "ready"), StageCode::Checkout);
}

#[test]
fn test_atomic_eliminate_pins_slot_in_mask_and_roster() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    tree.handle_request(&mut host, caller(1), "out");
    assert!(host.is_eliminated(SlotId(1)));
    assert_eq!(tree.readiness(SlotId(1)), Readiness::Pinned);
}

#[test]
fn test_atomic_alert_tells_only_idle_humans() {
    let mut host = FakeHost::with_computers(vec![false, false, true]);
    let mut tree = single_turn(&mut host);

    tree.handle_request(&mut host, caller(0), "ready");
    tree.handle_alert(&mut host, Duration::from_secs(30));
    assert!(host.told(0).is_empty());
    assert_eq!(host.told(1).len(), 1);
    assert!(host.told(2).is_empty());
    assert!(host.posts.iter().any(|(r, t)| *r == Recipient::All && t.contains("30")));
}

#[test]
fn test_scores_and_achievements_read_from_game_state() {
    let mut host = FakeHost::humans(2);
    let mut tree = single_turn(&mut host);

    tree.handle_request(&mut host, caller(1), "score 7");
    assert_eq!(tree.scores(), vec![0, 7]);
    assert_eq!(tree.achievements(), vec![(SlotId(0), "first".to_string())]);
}

// =========================================================================
// Composite stages
// =========================================================================

#[test]
fn test_composite_advances_children_until_done() {
    let mut host = FakeHost::humans(2);
    let mut tree = rounds(&mut host, Rounds::new(2));
    assert_eq!(tree.stage_path(), vec!["rounds", "turn"]);

    tree.handle_request(&mut host, caller(0), "ready");
    assert_eq!(tree.handle_request(&mut host, caller(1), "ready"), StageCode::Checkout);
    assert!(!tree.is_over());
    // The new child starts with a cleared mask.
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Unset);

    tree.handle_request(&mut host, caller(0), "ready");
    tree.handle_request(&mut host, caller(1), "ready");
    assert!(tree.is_over());
    assert!(tree.stage_path().is_empty());
    let nexts: Vec<&String> = tree.game().log.iter().filter(|l| l.starts_with("next")).collect();
    assert_eq!(nexts, vec!["next after turn by request", "next after turn by request"]);
}

#[test]
fn test_composite_own_commands_tried_first() {
    let mut host = FakeHost::humans(2);
    let mut tree = rounds(&mut host, Rounds::new(1));

    assert_eq!(tree.handle_request(&mut host, caller(0), "ready skip"), StageCode::Ok);
    assert_eq!(tree.game().log, vec!["skip"]);
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Unset);
}

#[test]
fn test_composite_timeout_checks_out_by_timeout() {
    let mut host = FakeHost::humans(2);
    let mut tree = rounds(&mut host, Rounds::new(2));

    assert_eq!(tree.handle_timeout(&mut host), StageCode::Checkout);
    assert!(tree.game().log.contains(&"next after turn by timeout".to_string()));
    // Hooked slots stay pinned into the next round.
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Pinned);
    assert_eq!(host.timer_starts, 2);
}

#[test]
fn test_composite_leave_hook_runs_before_child() {
    let mut host = FakeHost::humans(2);
    let mut tree = rounds(&mut host, Rounds::new(1));

    host.eliminate(SlotId(0));
    tree.handle_leave(&mut host, SlotId(0));
    assert_eq!(tree.game().log, vec!["composite leave #0", "leaf leave #0"]);

    assert_eq!(tree.handle_request(&mut host, caller(1), "ready"), StageCode::Checkout);
    assert!(tree.is_over());
}

#[test]
fn test_composite_skips_child_over_on_begin() {
    let mut host = FakeHost::humans(2);
    let tree = rounds(
        &mut host,
        Rounds {
            left: 1,
            first_instant: true,
        },
    );

    assert_eq!(tree.game().log, vec!["next after instant skip"]);
    assert_eq!(tree.stage_path(), vec!["rounds", "turn"]);
    // The skip cleared the mask the instant stage filled.
    assert_eq!(tree.readiness(SlotId(0)), Readiness::Unset);
}

#[test]
fn test_composite_checkout_after_over_is_noop() {
    let mut host = FakeHost::humans(1);
    let mut tree = rounds(&mut host, Rounds::new(1));

    tree.handle_request(&mut host, caller(0), "ready");
    assert!(tree.is_over());
    let log_len = tree.game().log.len();

    assert_eq!(tree.handle_timeout(&mut host), StageCode::Checkout);
    assert_eq!(tree.handle_leave(&mut host, SlotId(0)), StageCode::Checkout);
    assert_eq!(tree.handle_request(&mut host, caller(0), "ready"), StageCode::NotFound);
    assert_eq!(tree.game().log.len(), log_len);
}

#[test]
fn test_command_info_lists_composite_then_leaf() {
    let mut host = FakeHost::humans(1);
    let tree = rounds(&mut host, Rounds::new(1));

    let info = tree.command_info();
    assert_eq!(info.first().map(String::as_str), Some("skip"));
    assert!(info.contains(&"score <n>".to_string()));
}

#[test]
fn test_stage_node_kind_and_downcast() {
    let node: StageNode<Board> = StageNode::atomic(Turn::default());
    assert_eq!(node.kind(), StageKind::Atomic);
    assert!(node.is::<Turn>());
    assert!(node.downcast_ref::<Instant>().is_none());

    let node: StageNode<Board> = StageNode::composite(Rounds::new(3));
    assert_eq!(node.kind(), StageKind::Composite);
    assert_eq!(node.downcast_ref::<Rounds>().map(|r| r.left), Some(3));
    assert!(!node.is_over());
}
