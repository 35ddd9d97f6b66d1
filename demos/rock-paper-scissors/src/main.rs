use arbiter::prelude::*;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Game types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Throw {
    Rock,
    Paper,
    Scissors,
}

impl Throw {
    const NAMES: [&'static str; 3] = ["rock", "paper", "scissors"];

    fn from_index(i: usize) -> Self {
        match i % 3 {
            0 => Self::Rock,
            1 => Self::Paper,
            _ => Self::Scissors,
        }
    }

    fn beats(self, other: Throw) -> bool {
        (self as usize + 2) % 3 == other as usize
    }

    fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

struct Options {
    rounds: u32,
    time_secs: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rounds: 3,
            time_secs: 30,
        }
    }
}

impl GameOptions for Options {
    fn set_option(&mut self, text: &str) -> bool {
        let mut r = ArgReader::new(text);
        let (Some(option), Some(value)) = (r.one_of(&["rounds", "time"]), r.parse::<u64>()) else {
            return false;
        };
        if !r.is_empty() {
            return false;
        }
        match option {
            0 if (1..=9).contains(&value) => self.rounds = value as u32,
            1 if (10..=300).contains(&value) => self.time_secs = value,
            _ => return false,
        }
        true
    }

    fn status(&self) -> String {
        format!("{} round(s), {}s per throw", self.rounds, self.time_secs)
    }

    fn validate(&mut self, slot_count: usize) -> Result<(), String> {
        if slot_count < 2 {
            return Err("rock-paper-scissors needs at least 2 players".into());
        }
        Ok(())
    }
}

struct Table {
    throws: Vec<Option<Throw>>,
    scores: Vec<i64>,
}

impl Table {
    fn new(slots: usize) -> Self {
        Self {
            throws: vec![None; slots],
            scores: vec![0; slots],
        }
    }

    /// Scores the current throws: one point per opponent beaten. Slots
    /// that did not throw score nothing and cannot be beaten.
    fn settle_round(&mut self) -> String {
        let throws = std::mem::replace(&mut self.throws, vec![None; self.scores.len()]);
        let mut line = Vec::with_capacity(throws.len());
        for (i, mine) in throws.iter().enumerate() {
            let Some(mine) = mine else {
                line.push(format!("{} -", SlotId(i)));
                continue;
            };
            let wins = throws.iter().flatten().filter(|t| mine.beats(**t)).count();
            self.scores[i] += wins as i64;
            line.push(format!("{} {}", SlotId(i), mine.name()));
        }
        line.join(", ")
    }
}

impl GameState for Table {
    fn slot_score(&self, slot: SlotId) -> i64 {
        self.scores[slot.index()]
    }

    fn achievements(&self) -> Vec<(SlotId, String)> {
        let best = self.scores.iter().copied().max().unwrap_or(0);
        let leaders: Vec<usize> = (0..self.scores.len()).filter(|&i| self.scores[i] == best).collect();
        match leaders.as_slice() {
            [only] if best > 0 => vec![(SlotId(*only), "outright winner".into())],
            _ => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

struct Series {
    rounds: u32,
    time: Duration,
}

impl Series {
    fn round(&self, number: u32) -> StageNode<Table> {
        StageNode::atomic(Round {
            number,
            time: self.time,
        })
    }
}

impl CompositeStage<Table> for Series {
    fn name(&self) -> String {
        "series".into()
    }

    fn on_stage_begin(&mut self, _table: &mut Table, _ctx: &mut StageContext<'_>) -> StageNode<Table> {
        self.round(1)
    }

    fn next_sub_stage(
        &mut self,
        table: &mut Table,
        ctx: &mut StageContext<'_>,
        finished: StageNode<Table>,
        reason: CheckoutReason,
    ) -> Option<StageNode<Table>> {
        let number = finished.downcast_ref::<Round>()?.number;
        let throws = table.settle_round();
        ctx.broadcast(format!("Round {number} ({reason}): {throws}"));
        (number < self.rounds).then(|| self.round(number + 1))
    }
}

struct Round {
    number: u32,
    time: Duration,
}

impl AtomicStage<Table> for Round {
    fn name(&self) -> String {
        format!("round {}", self.number)
    }

    fn commands(c: &mut Commands<Self, Table, ActionResult>) {
        c.add("rock|paper|scissors", |r| r.one_of(&Throw::NAMES), |_, table, ctx, caller, i| {
            if ctx.is_ready(caller.slot) {
                ctx.tell(caller.slot, "You already threw this round.");
                return ActionResult::Failed;
            }
            if caller.is_public {
                ctx.tell(caller.slot, "Throw in private, everyone can see this.");
                return ActionResult::Failed;
            }
            table.throws[caller.slot.index()] = Some(Throw::from_index(i));
            ActionResult::Ready
        });
    }

    fn on_stage_begin(&mut self, _table: &mut Table, ctx: &mut StageContext<'_>) {
        ctx.broadcast(format!(
            "Round {} begins. Throw rock, paper or scissors within {}s.",
            self.number,
            self.time.as_secs()
        ));
        ctx.start_timer(self.time);
    }

    fn on_computer_act(
        &mut self,
        table: &mut Table,
        _ctx: &mut StageContext<'_>,
        slot: SlotId,
    ) -> ActionResult {
        let throw = Throw::from_index(rand::rng().random_range(0..3));
        table.throws[slot.index()] = Some(throw);
        ActionResult::Ready
    }
}

// ---------------------------------------------------------------------------
// Game logic
// ---------------------------------------------------------------------------

struct RockPaperScissors;

impl GameLogic for RockPaperScissors {
    type Options = Options;
    type State = Table;

    fn info(&self) -> GameInfo {
        GameInfo {
            name: "rps".into(),
            description: "Rock-paper-scissors for any number of players".into(),
            max_players: 8,
            default_multiple: 1,
        }
    }

    fn new_game(&self, options: &Options, slot_count: usize) -> (Table, StageNode<Table>) {
        let series = Series {
            rounds: options.rounds,
            time: Duration::from_secs(options.time_secs),
        };
        (Table::new(slot_count), StageNode::composite(series))
    }
}

// ---------------------------------------------------------------------------
// Console driver
// ---------------------------------------------------------------------------

struct Console;

impl Messenger for Console {
    fn deliver(&self, to: Delivery, text: &str) {
        let to = match to {
            Delivery::User(user) => user.to_string(),
            Delivery::Group(group) => group.to_string(),
        };
        for line in text.lines() {
            println!("[{to}] {line}");
        }
    }
}

/// Splits `<user>[@<group>] <text>` into its parts.
fn parse_line(line: &str) -> Option<(UserId, Option<GroupId>, &str)> {
    let (who, text) = line.trim().split_once(' ')?;
    let (user, group) = match who.split_once('@') {
        Some((user, group)) => (user, Some(GroupId(group.parse().ok()?))),
        None => (who, None),
    };
    Some((UserId(user.parse().ok()?), group, text.trim()))
}

fn dispatch(
    arbiter: &Arbiter,
    user: UserId,
    group: Option<GroupId>,
    text: &str,
) -> Result<String, ArbiterError> {
    let Some(command) = text.strip_prefix('#') else {
        let code = arbiter.request(user, group, text)?;
        return Ok(match code {
            StageCode::NotFound => "Unknown command.".into(),
            StageCode::Failed => "Not accepted.".into(),
            _ => String::new(),
        });
    };

    let mut r = ArgReader::new(command);
    match r.next_token().unwrap_or_default() {
        "new" => {
            let m = arbiter.new_match("rps", user, group)?;
            Ok(format!("Created {}.", m.id()))
        }
        "join" => {
            let m = match (group, r.parse::<u64>()) {
                (_, Some(id)) => arbiter.join(user, MatchId(id), group)?,
                (Some(group), None) => arbiter.join_public(user, group)?,
                (None, None) => return Ok("usage: #join <match id>".into()),
            };
            Ok(format!("You are in {}.", m.id()))
        }
        "start" => {
            arbiter.current_match(user)?.game_start(user, group)?;
            Ok(String::new())
        }
        "bench" => {
            let target = r.parse::<usize>();
            arbiter.current_match(user)?.set_bench_to(user, target)?;
            Ok(format!("Bench set to {}.", target.map_or("the default".into(), |n| n.to_string())))
        }
        "multiple" => {
            let Some(multiple) = r.parse::<u32>() else {
                return Ok("usage: #multiple <n>".into());
            };
            arbiter.current_match(user)?.set_multiple(user, multiple)?;
            Ok(format!("Multiple set to {multiple}."))
        }
        "leave" => {
            arbiter.leave(user, r.keyword("force").is_some())?;
            Ok("You left.".into())
        }
        "interrupt" => {
            let cancel = r.keyword("cancel").is_some();
            arbiter.current_match(user)?.user_interrupt(user, cancel)?;
            Ok(String::new())
        }
        "info" => {
            let info = arbiter.current_match(user)?.info();
            Ok(serde_json::to_string_pretty(&info).unwrap_or_default())
        }
        "list" => {
            let lines: Vec<String> = arbiter
                .summaries()
                .iter()
                .map(|s| format!("{} {} hosted by {}, {} player(s)", s.match_id, s.game, s.host, s.players))
                .collect();
            Ok(if lines.is_empty() { "No open matches.".into() } else { lines.join("\n") })
        }
        _ => Ok("commands: #new #join #start #bench #multiple #leave #interrupt #info #list".into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    arbiter::init_tracing();

    let arbiter = Arbiter::builder()
        .messenger(Arc::new(Console))
        .score_recorder(Arc::new(MemoryRecorder::new()))
        .game(RockPaperScissors)
        .build()?;

    eprintln!("rock-paper-scissors: type `<user>[@<group>] <text>`, e.g. `1@7 #new`");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some((user, group, text)) = parse_line(&line) else {
            eprintln!("could not parse `{line}`");
            continue;
        };
        match dispatch(&arbiter, user, group, text) {
            Ok(reply) if reply.is_empty() => {}
            Ok(reply) => println!("> {reply}"),
            Err(e) => {
                tracing::debug!(user = %user, error = %e, "request refused");
                println!("> {e}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbiter() -> (Arbiter, ManualTimer, Arc<MemoryRecorder>) {
        let timer = ManualTimer::new();
        let recorder = Arc::new(MemoryRecorder::new());
        let arbiter = Arbiter::builder()
            .timer_service(Arc::new(timer.clone()))
            .score_recorder(recorder.clone())
            .game(RockPaperScissors)
            .build()
            .unwrap();
        (arbiter, timer, recorder)
    }

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    #[test]
    fn test_throw_cycle() {
        assert!(Throw::Paper.beats(Throw::Rock));
        assert!(Throw::Rock.beats(Throw::Scissors));
        assert!(Throw::Scissors.beats(Throw::Paper));
        assert!(!Throw::Rock.beats(Throw::Paper));
        assert!(!Throw::Rock.beats(Throw::Rock));
    }

    #[test]
    fn test_settle_round_counts_beaten_opponents() {
        let mut table = Table::new(4);
        table.throws = vec![Some(Throw::Rock), Some(Throw::Scissors), Some(Throw::Scissors), None];
        let line = table.settle_round();
        assert_eq!(table.scores, vec![2, 0, 0, 0]);
        assert_eq!(line, "#0 rock, #1 scissors, #2 scissors, #3 -");
        assert!(table.throws.iter().all(Option::is_none));
    }

    #[test]
    fn test_options_accept_only_sane_values() {
        let mut options = Options::default();
        assert!(options.set_option("rounds 5"));
        assert!(options.set_option("time 60"));
        assert!(!options.set_option("rounds 0"));
        assert!(!options.set_option("time 5"));
        assert!(!options.set_option("rounds 2 please"));
        assert_eq!(options.status(), "5 round(s), 60s per throw");
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("1@7 #new"), Some((UserId(1), Some(GroupId(7)), "#new")));
        assert_eq!(parse_line("2 rock"), Some((UserId(2), None, "rock")));
        assert_eq!(parse_line("bob rock"), None);
        assert_eq!(parse_line("#new"), None);
    }

    #[test]
    fn test_private_series_is_played_and_recorded() {
        let (arbiter, _timer, recorder) = arbiter();
        dispatch(&arbiter, ALICE, None, "#new").unwrap();
        dispatch(&arbiter, ALICE, None, "rounds 1").unwrap();
        let id = arbiter.current_match(ALICE).unwrap().id();
        dispatch(&arbiter, BOB, None, &format!("#join {}", id.0)).unwrap();
        dispatch(&arbiter, ALICE, None, "#start").unwrap();

        dispatch(&arbiter, ALICE, None, "paper").unwrap();
        assert_eq!(dispatch(&arbiter, ALICE, None, "rock").unwrap(), "Not accepted.");
        dispatch(&arbiter, BOB, None, "rock").unwrap();

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        let scores: Vec<i64> = records[0].scores.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![1, 0]);
        assert!(matches!(arbiter.current_match(ALICE), Err(ArbiterError::NotInAnyMatch(_))));
    }

    #[test]
    fn test_public_throw_is_refused() {
        let (arbiter, _timer, _) = arbiter();
        dispatch(&arbiter, ALICE, Some(GroupId(7)), "#new").unwrap();
        dispatch(&arbiter, BOB, Some(GroupId(7)), "#join").unwrap();
        dispatch(&arbiter, ALICE, Some(GroupId(7)), "#start").unwrap();

        assert_eq!(dispatch(&arbiter, ALICE, Some(GroupId(7)), "rock").unwrap(), "Not accepted.");
        assert_eq!(dispatch(&arbiter, ALICE, None, "rock").unwrap(), "");
    }

    #[test]
    fn test_computers_fill_the_bench() {
        let (arbiter, timer, _) = arbiter();
        dispatch(&arbiter, ALICE, None, "#new").unwrap();
        dispatch(&arbiter, ALICE, None, "#bench 3").unwrap();
        dispatch(&arbiter, ALICE, None, "rounds 2").unwrap();
        dispatch(&arbiter, ALICE, None, "#start").unwrap();

        let m = arbiter.current_match(ALICE).unwrap();
        assert_eq!(m.info().slots.len(), 3);
        assert_eq!(m.stage_info().as_deref().map(|s| s.starts_with("series > round 1")), Some(true));

        dispatch(&arbiter, ALICE, None, "scissors").unwrap();
        assert!(m.stage_info().unwrap().starts_with("series > round 2"));

        // Alice sits the last round out.
        assert!(timer.fire());
        assert_eq!(m.state(), MatchState::Over);
    }

    #[test]
    fn test_unknown_text_and_help() {
        let (arbiter, _timer, _) = arbiter();
        dispatch(&arbiter, ALICE, None, "#new").unwrap();
        assert_eq!(dispatch(&arbiter, ALICE, None, "lizard").unwrap(), "Unknown command.");
        assert!(dispatch(&arbiter, ALICE, None, "#what").unwrap().starts_with("commands:"));
        assert_eq!(dispatch(&arbiter, BOB, None, "#join").unwrap(), "usage: #join <match id>");
    }
}
