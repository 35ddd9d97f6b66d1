//! The match controller: one lock around roster, options, stage tree and
//! timer.
//!
//! Every entry point (user operation or timer callback) takes the match
//! lock, re-checks the lifecycle state, changes what it needs, lets the
//! computers catch up, and flushes queued messages before unlocking. Two
//! events on the same match therefore never interleave, and a timer that
//! fires after it was replaced sees a newer generation and does nothing.
//!
//! ```text
//! join / leave / set_bench_to / set_multiple / request(option)   NotStarted
//!                         │ game_start
//!                         ▼
//! request / leave(force) / user_interrupt / timer                 Started
//!                         │ root stage over, or terminate
//!                         ▼
//!                        Over  (released from the registry)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use arbiter_protocol::{ComputerId, GroupId, MatchId, Recipient, SlotHolder, SlotId, UserId};
use arbiter_stage::{Caller, MatchHost, Readiness, StageCode, StageRunner};
use tracing::{debug, info, warn};

use crate::logic::DynOptions;
use crate::participant::{Participant, ParticipantState, Seats};
use crate::registry::Registry;
use crate::table::{Slot, Table};
use crate::{
    Delivery, GameHandle, MatchConfig, MatchError, MatchInfo, MatchRecord, MatchServices,
    MatchState, MatchSummary, ParticipantInfo, SlotInfo, SlotScore,
};

/// One match of one game.
///
/// Shared as `Arc<Match>`: the registry holds one until the match is over,
/// and callers may hold their own to finish an operation after that.
pub struct Match {
    id: MatchId,
    group: Option<GroupId>,
    game: GameHandle,
    services: Arc<MatchServices>,
    registry: Weak<Registry>,
    inner: Mutex<MatchInner>,
}

struct MatchInner {
    state: MatchState,
    host: UserId,
    config: MatchConfig,
    options: Box<dyn DynOptions>,
    seats: Seats,
    table: Table,
    runner: Option<Box<dyn StageRunner>>,
}

/// What ended a started match.
enum Ending {
    Finished,
    Terminated(&'static str),
}

impl Match {
    pub(crate) fn new(
        id: MatchId,
        game: GameHandle,
        host: UserId,
        group: Option<GroupId>,
        services: Arc<MatchServices>,
        registry: Weak<Registry>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| {
            let mut seats = Seats::default();
            seats.take(Participant::new(host, false));
            let config = MatchConfig {
                bench_to: 0,
                multiple: game.info().default_multiple,
                slots_per_user: services.config.slots_per_user,
            };
            let inner = MatchInner {
                state: MatchState::NotStarted,
                host,
                config,
                options: game.new_options(),
                seats,
                table: Table::new(Arc::clone(&services.timers), me.clone()),
                runner: None,
            };
            Self {
                id,
                group,
                game,
                services,
                registry,
                inner: Mutex::new(inner),
            }
        })
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    /// The group a public match is played in. `None` for private matches.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn game(&self) -> &GameHandle {
        &self.game
    }

    pub fn state(&self) -> MatchState {
        self.lock().state
    }

    pub fn host(&self) -> UserId {
        self.lock().host
    }

    pub fn config(&self) -> MatchConfig {
        self.lock().config
    }

    /// Whether `user` is an active participant.
    pub fn has_user(&self, user: UserId) -> bool {
        self.lock().seats.get(user).is_some_and(Participant::is_active)
    }

    fn lock(&self) -> MutexGuard<'_, MatchInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Adds `user` to a match that has not started.
    pub fn join(&self, user: UserId) -> Result<(), MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        self.ensure_not_started(inner)?;
        if inner.seats.get(user).is_some() {
            return Err(MatchError::AlreadyInMatch(user, self.id));
        }
        let max = self.game.info().max_players;
        if max > 0 && (inner.seats.len() + 1) * inner.config.slots_per_user > max {
            return Err(MatchError::MaxPlayerReached { max });
        }
        self.check_multiple(user, inner.config.multiple)?;
        if let Some(registry) = self.registry.upgrade() {
            registry.bind_user(user, self.id)?;
        }

        let seat = inner.seats.take(Participant::new(user, true));
        info!(match_id = %self.id, %user, seat, players = inner.seats.len(), "user joined");
        inner.table.post(
            Recipient::All,
            format!("{user} joined. {} player(s) now.", inner.seats.len()),
        );
        self.flush(inner);
        Ok(())
    }

    /// Removes `user` from the match.
    ///
    /// Before the start this simply frees the seat. Once started, leaving
    /// gives up the user's slots and needs `force`, unless every slot of
    /// the user has already been eliminated.
    pub fn leave(&self, user: UserId, force: bool) -> Result<(), MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.state {
            MatchState::Over => Err(MatchError::AlreadyOver(self.id)),
            MatchState::NotStarted => {
                self.leave_before_start(inner, user)?;
                self.flush(inner);
                Ok(())
            }
            MatchState::Started => {
                self.leave_started(inner, user, force)?;
                self.flush(inner);
                Ok(())
            }
        }
    }

    fn leave_before_start(&self, inner: &mut MatchInner, user: UserId) -> Result<(), MatchError> {
        if inner.seats.vacate(user).is_none() {
            return Err(MatchError::NotInMatch(user, self.id));
        }
        self.unbind(user);
        info!(match_id = %self.id, %user, players = inner.seats.len(), "user left");
        inner.table.post(Recipient::User(user), "You left the match.".into());
        inner.table.post(Recipient::All, format!("{user} left."));

        if inner.host == user {
            let next = inner.seats.iter().next().map(|p| p.user);
            match next {
                Some(next) => self.switch_host(inner, next),
                None => self.end(inner, Ending::Terminated("everyone left")),
            }
        }
        Ok(())
    }

    fn leave_started(
        &self,
        inner: &mut MatchInner,
        user: UserId,
        force: bool,
    ) -> Result<(), MatchError> {
        let slots = match inner.seats.get(user) {
            Some(p) if p.is_active() => p.slots.clone(),
            _ => return Err(MatchError::NotInMatch(user, self.id)),
        };
        let all_out = slots.iter().all(|&s| inner.table.is_eliminated(s));
        if !all_out && !force {
            return Err(MatchError::AlreadyStarted(self.id));
        }

        if let Some(p) = inner.seats.get_mut(user) {
            p.state = ParticipantState::Left;
            p.wants_interrupt = false;
        }
        self.unbind(user);
        info!(match_id = %self.id, %user, force, "user left started match");
        inner.table.post(Recipient::All, format!("{user} left the game."));

        if let Some(runner) = inner.runner.as_mut() {
            for slot in slots {
                if !inner.table.is_eliminated(slot) {
                    inner.table.eliminate(slot);
                    runner.handle_leave(&mut inner.table, slot);
                }
            }
        }

        if !self.any_human_can_act(inner) {
            self.end(inner, Ending::Terminated("no players remain"));
            return Ok(());
        }
        if inner.host == user {
            let next = inner.seats.active().next().map(|p| p.user);
            if let Some(next) = next {
                self.switch_host(inner, next);
            }
        }
        self.settle(inner);
        Ok(())
    }

    fn switch_host(&self, inner: &mut MatchInner, next: UserId) {
        let previous = std::mem::replace(&mut inner.host, next);
        if let Some(p) = inner.seats.get_mut(next) {
            p.leave_on_config_change = false;
        }
        info!(match_id = %self.id, %previous, host = %next, "host switched");
        inner.table.post(Recipient::All, format!("{next} is now the host."));
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Fills the table with computers up to `target` slots, or to the
    /// game's preferred size when `target` is `None`. 0 removes the bench.
    pub fn set_bench_to(&self, user: UserId, target: Option<usize>) -> Result<(), MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        self.ensure_host_before_start(inner, user)?;
        let target = target.unwrap_or_else(|| inner.options.best_player_count());
        let max = self.game.info().max_players;
        if max > 0 && target > max {
            return Err(MatchError::MaxPlayerReached { max });
        }

        inner.config.bench_to = target;
        info!(match_id = %self.id, bench_to = target, "bench changed");
        inner.table.post(Recipient::All, format!("Computers will fill the table up to {target} slot(s)."));
        self.kick_for_config_change(inner);
        self.flush(inner);
        Ok(())
    }

    /// Sets the score multiplier. 0 makes the match a trial.
    pub fn set_multiple(&self, user: UserId, multiple: u32) -> Result<(), MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        self.ensure_host_before_start(inner, user)?;
        self.check_multiple(user, multiple)?;

        inner.config.multiple = multiple;
        info!(match_id = %self.id, multiple, "multiple changed");
        let text = if multiple == 0 {
            "This is now a trial match; scores will not be recorded.".to_string()
        } else {
            format!("Score multiple set to {multiple}.")
        };
        inner.table.post(Recipient::All, text);
        self.kick_for_config_change(inner);
        self.flush(inner);
        Ok(())
    }

    fn check_multiple(&self, user: UserId, multiple: u32) -> Result<(), MatchError> {
        if multiple > self.game.info().default_multiple
            && !self.services.recorder.may_play(user, multiple)
        {
            return Err(MatchError::ScoreNotEnough { user, multiple });
        }
        Ok(())
    }

    /// Everyone who agreed to the old settings, except the host, has to
    /// join again.
    fn kick_for_config_change(&self, inner: &mut MatchInner) {
        let kicked: Vec<UserId> = inner
            .seats
            .iter()
            .filter(|p| p.leave_on_config_change)
            .map(|p| p.user)
            .collect();
        for user in kicked {
            inner.seats.vacate(user);
            self.unbind(user);
            info!(match_id = %self.id, %user, "user removed after config change");
            inner.table.post(
                Recipient::User(user),
                "The match settings changed. Join again if you still want to play.".into(),
            );
        }
    }

    // -----------------------------------------------------------------------
    // Start
    // -----------------------------------------------------------------------

    /// Starts the match. Only the host may start it, from the match's own
    /// group when it has one.
    pub fn game_start(&self, user: UserId, group: Option<GroupId>) -> Result<(), MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        self.ensure_not_started(inner)?;
        if inner.seats.get(user).is_none() {
            return Err(MatchError::NotInMatch(user, self.id));
        }
        self.ensure_group(group)?;
        if inner.host != user {
            return Err(MatchError::NotHost(user, self.id));
        }

        let human_slots = inner.seats.len() * inner.config.slots_per_user;
        let slot_count = inner.config.bench_to.max(human_slots);
        inner.options.validate(slot_count).map_err(MatchError::InvalidOptions)?;
        let runner = self
            .game
            .build(inner.options.as_ref(), slot_count)
            .ok_or_else(|| MatchError::InvalidOptions("options belong to another game".into()))?;

        self.seat_slots(inner, slot_count);
        inner.runner = Some(runner);
        debug_assert!(inner.state.can_transition_to(MatchState::Started));
        inner.state = MatchState::Started;
        info!(
            match_id = %self.id,
            game = self.game.name(),
            players = inner.seats.len(),
            slots = slot_count,
            "match started"
        );
        inner.table.post(
            Recipient::All,
            format!("{} started with {slot_count} slot(s). {}", self.game.name(), inner.options.status()),
        );

        if let Some(runner) = inner.runner.as_mut() {
            runner.begin(&mut inner.table);
        }
        self.settle(inner);
        self.flush(inner);
        Ok(())
    }

    /// Hands out slots in seat order, then fills the rest with computers.
    fn seat_slots(&self, inner: &mut MatchInner, slot_count: usize) {
        let per_user = inner.config.slots_per_user;
        let mut slots = Vec::with_capacity(slot_count);
        for p in inner.seats.iter_mut() {
            p.slots = (slots.len()..slots.len() + per_user).map(SlotId).collect();
            for _ in 0..per_user {
                slots.push(Slot {
                    holder: SlotHolder::User(p.user),
                    eliminated: false,
                });
            }
        }
        let mut computer = 0;
        while slots.len() < slot_count {
            slots.push(Slot {
                holder: SlotHolder::Computer(ComputerId(computer)),
                eliminated: false,
            });
            computer += 1;
        }
        inner.table.slots = slots;
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Passes a text request to the match.
    ///
    /// Before the start, the host uses requests to set game options. After
    /// the start, the request goes to the stage tree on behalf of one of the
    /// user's slots. An unrecognised request is `Ok(StageCode::NotFound)`.
    pub fn request(
        &self,
        user: UserId,
        group: Option<GroupId>,
        text: &str,
    ) -> Result<StageCode, MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let code = match inner.state {
            MatchState::Over => return Err(MatchError::AlreadyOver(self.id)),
            MatchState::NotStarted => self.set_option(inner, user, text)?,
            MatchState::Started => self.play(inner, user, group, text)?,
        };
        self.flush(inner);
        Ok(code)
    }

    fn set_option(
        &self,
        inner: &mut MatchInner,
        user: UserId,
        text: &str,
    ) -> Result<StageCode, MatchError> {
        if inner.seats.get(user).is_none() {
            return Err(MatchError::NotInMatch(user, self.id));
        }
        if inner.host != user {
            return Err(MatchError::NotHost(user, self.id));
        }
        if !inner.options.set_option(text) {
            return Ok(StageCode::NotFound);
        }
        debug!(match_id = %self.id, option = text, "option set");
        inner.table.post(Recipient::All, inner.options.status());
        self.kick_for_config_change(inner);
        Ok(StageCode::Ok)
    }

    fn play(
        &self,
        inner: &mut MatchInner,
        user: UserId,
        group: Option<GroupId>,
        text: &str,
    ) -> Result<StageCode, MatchError> {
        let slots = match inner.seats.get(user) {
            Some(p) if p.is_active() => p.slots.clone(),
            _ => return Err(MatchError::NotInMatch(user, self.id)),
        };
        self.ensure_group(group)?;
        let Some(runner) = inner.runner.as_mut() else {
            return Err(MatchError::NotStarted(self.id));
        };

        let live: Vec<SlotId> = slots
            .into_iter()
            .filter(|&s| !inner.table.is_eliminated(s))
            .collect();
        let slot = live
            .iter()
            .copied()
            .find(|&s| runner.readiness(s) == Readiness::Unset)
            .or_else(|| live.first().copied())
            .ok_or(MatchError::Eliminated(user))?;

        let caller = Caller {
            slot,
            is_public: group.is_some(),
        };
        let code = runner.handle_request(&mut inner.table, caller, text);
        debug!(match_id = %self.id, %user, %slot, %code, "request handled");
        self.settle(inner);
        Ok(code)
    }

    /// Votes to stop a started match, or withdraws the vote. The match is
    /// terminated once every active participant has voted.
    pub fn user_interrupt(&self, user: UserId, cancel: bool) -> Result<(), MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.state {
            MatchState::Over => return Err(MatchError::AlreadyOver(self.id)),
            MatchState::NotStarted => return Err(MatchError::NotStarted(self.id)),
            MatchState::Started => {}
        }
        let Some(p) = inner.seats.get_mut(user).filter(|p| p.is_active()) else {
            return Err(MatchError::NotInMatch(user, self.id));
        };
        p.wants_interrupt = !cancel;

        let active = inner.seats.active().count();
        let votes = inner.seats.active().filter(|p| p.wants_interrupt).count();
        if cancel {
            inner.table.post(Recipient::All, format!("{user} wants to keep playing."));
        } else if votes == active {
            self.end(inner, Ending::Terminated("all players agreed to stop"));
        } else {
            inner.table.post(
                Recipient::All,
                format!("{user} wants to stop the match ({votes}/{active})."),
            );
        }
        self.flush(inner);
        Ok(())
    }

    /// Ends the match without recording scores. Without `force` only a
    /// match that has not started can be terminated.
    pub fn terminate(&self, force: bool) -> Result<(), MatchError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.state {
            MatchState::Over if force => return Ok(()),
            MatchState::Over => return Err(MatchError::AlreadyOver(self.id)),
            MatchState::Started if !force => return Err(MatchError::AlreadyStarted(self.id)),
            _ => {}
        }
        self.end(inner, Ending::Terminated("terminated"));
        self.flush(inner);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Timer callbacks
    // -----------------------------------------------------------------------

    pub(crate) fn on_timeout(&self, generation: u64) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.state.is_active() || inner.table.generation() != generation {
            debug!(match_id = %self.id, generation, "stale timeout dropped");
            return;
        }
        inner.table.stop_timer();
        info!(match_id = %self.id, "stage timed out");
        if let Some(runner) = inner.runner.as_mut() {
            runner.handle_timeout(&mut inner.table);
        }
        self.settle(inner);
        self.flush(inner);
    }

    pub(crate) fn on_timer_alert(&self, generation: u64, remaining: Duration) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.state.is_active() || inner.table.generation() != generation {
            debug!(match_id = %self.id, generation, "stale alert dropped");
            return;
        }
        if let Some(runner) = inner.runner.as_mut() {
            runner.handle_alert(&mut inner.table, remaining);
        }
        self.flush(inner);
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Lets computers act, then ends the match if the game is over.
    fn settle(&self, inner: &mut MatchInner) {
        if !inner.state.is_active() {
            return;
        }
        if self.any_human_can_act(inner) {
            self.run_computers(inner);
        } else if !self.autopilot(inner) {
            warn!(
                match_id = %self.id,
                limit = self.services.config.autopilot_pass_limit,
                "computers could not finish the game"
            );
            self.end(inner, Ending::Terminated("the game could not finish"));
            return;
        }
        if inner.runner.as_ref().is_some_and(|r| r.is_over()) {
            self.end(inner, Ending::Finished);
        }
    }

    fn any_human_can_act(&self, inner: &MatchInner) -> bool {
        inner
            .seats
            .active()
            .any(|p| p.slots.iter().any(|&s| !inner.table.is_eliminated(s)))
    }

    /// Every unready computer acts until each has acted successfully in a
    /// row on the current stage.
    fn run_computers(&self, inner: &mut MatchInner) {
        let computers = inner.table.live_computers();
        let Some(runner) = inner.runner.as_mut() else {
            return;
        };
        if computers.is_empty() {
            return;
        }

        let limit = self.services.config.autopilot_pass_limit * computers.len();
        let mut epoch = runner.readiness_epoch();
        let mut streak = 0;
        let mut attempts = 0;
        let mut next = 0;
        while streak < computers.len() && !runner.is_over() {
            let slot = computers[next % computers.len()];
            next += 1;
            if runner.readiness(slot) != Readiness::Unset {
                streak += 1;
                continue;
            }
            if attempts == limit {
                warn!(match_id = %self.id, attempts, "computers keep failing, giving up");
                return;
            }
            attempts += 1;
            let code = runner.handle_computer_act(&mut inner.table, slot, false);
            if runner.readiness_epoch() != epoch {
                epoch = runner.readiness_epoch();
                streak = 0;
            } else if code == StageCode::Failed {
                streak = 0;
            } else {
                streak += 1;
            }
        }
    }

    /// No human can act: computers play the rest of the game as if they
    /// were human. Returns `false` if the pass limit ran out first.
    fn autopilot(&self, inner: &mut MatchInner) -> bool {
        let computers = inner.table.live_computers();
        let Some(runner) = inner.runner.as_mut() else {
            return true;
        };
        let mut passes = 0;
        while !runner.is_over() {
            if passes == self.services.config.autopilot_pass_limit {
                return false;
            }
            passes += 1;
            let mut acted = false;
            for &slot in &computers {
                if runner.is_over() {
                    break;
                }
                if runner.readiness(slot) == Readiness::Unset {
                    runner.handle_computer_act(&mut inner.table, slot, true);
                    acted = true;
                }
            }
            if !acted {
                // Nobody can move until the timer runs out.
                break;
            }
        }
        debug!(match_id = %self.id, passes, "autopilot pass done");
        true
    }

    /// Moves the match to `Over` and releases it from the registry.
    fn end(&self, inner: &mut MatchInner, ending: Ending) {
        if inner.state.is_over() {
            return;
        }
        let was_started = inner.state.is_active();
        debug_assert!(inner.state.can_transition_to(MatchState::Over));
        inner.state = MatchState::Over;
        inner.table.stop_timer();

        match ending {
            Ending::Finished => {
                info!(match_id = %self.id, "match over");
                let record = self.record(inner);
                inner.table.post(Recipient::All, results_text(&record));
                let humans = inner.seats.len();
                if record.multiple != 0 && humans > 1 {
                    self.services.recorder.record_match(&record);
                    info!(match_id = %self.id, humans, multiple = record.multiple, "scores recorded");
                }
            }
            Ending::Terminated(reason) => {
                info!(match_id = %self.id, reason, was_started, "match terminated");
                inner.table.post(Recipient::All, format!("Match terminated: {reason}."));
            }
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.release(self.id);
        }
    }

    fn record(&self, inner: &MatchInner) -> MatchRecord {
        let (scores, achievements) = match inner.runner.as_ref() {
            Some(runner) => (runner.scores(), runner.achievements()),
            None => (Vec::new(), Vec::new()),
        };
        MatchRecord {
            match_id: self.id,
            game: self.game.name().to_string(),
            group: self.group,
            host: inner.host,
            multiple: inner.config.multiple,
            scores: inner
                .table
                .slots
                .iter()
                .zip(scores)
                .enumerate()
                .map(|(i, (slot, score))| SlotScore {
                    slot: SlotId(i),
                    holder: slot.holder,
                    score,
                })
                .collect(),
            achievements: achievements
                .into_iter()
                .filter_map(|(slot, name)| {
                    inner.table.holder(slot).and_then(|h| h.user()).map(|u| (u, name))
                })
                .collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn ensure_not_started(&self, inner: &MatchInner) -> Result<(), MatchError> {
        match inner.state {
            MatchState::NotStarted => Ok(()),
            MatchState::Started => Err(MatchError::AlreadyStarted(self.id)),
            MatchState::Over => Err(MatchError::AlreadyOver(self.id)),
        }
    }

    fn ensure_host_before_start(&self, inner: &MatchInner, user: UserId) -> Result<(), MatchError> {
        self.ensure_not_started(inner)?;
        if inner.seats.get(user).is_none() {
            return Err(MatchError::NotInMatch(user, self.id));
        }
        if inner.host != user {
            return Err(MatchError::NotHost(user, self.id));
        }
        Ok(())
    }

    /// A request from a group must come from the match's own group.
    fn ensure_group(&self, group: Option<GroupId>) -> Result<(), MatchError> {
        match (group, self.group) {
            (Some(from), Some(own)) if from != own => Err(MatchError::NotThisGroup(self.id)),
            _ => Ok(()),
        }
    }

    fn unbind(&self, user: UserId) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unbind_user(user, self.id);
        }
    }

    /// Delivers everything queued during this event.
    fn flush(&self, inner: &mut MatchInner) {
        for (recipient, text) in inner.table.drain_outbox() {
            for to in self.resolve(inner, recipient) {
                self.services.messenger.deliver(to, &text);
            }
        }
    }

    fn resolve(&self, inner: &MatchInner, recipient: Recipient) -> Vec<Delivery> {
        match recipient {
            Recipient::All | Recipient::Group => match self.group {
                Some(group) => vec![Delivery::Group(group)],
                None => inner.seats.active().map(|p| Delivery::User(p.user)).collect(),
            },
            Recipient::User(user) => vec![Delivery::User(user)],
            Recipient::Slot(slot) => inner
                .table
                .holder(slot)
                .and_then(|h| h.user())
                .filter(|&u| inner.seats.get(u).is_some_and(Participant::is_active))
                .map(Delivery::User)
                .into_iter()
                .collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// The running stage path and time left, e.g. `"round 2 > choose (25s left)"`.
    /// `None` unless the match is started.
    pub fn stage_info(&self) -> Option<String> {
        let inner = self.lock();
        if !inner.state.is_active() {
            return None;
        }
        let path = inner.runner.as_ref()?.stage_path().join(" > ");
        Some(match inner.table.timer_remaining() {
            Some(left) => format!("{path} ({}s left)", left.as_secs()),
            None => path,
        })
    }

    pub fn info(&self) -> MatchInfo {
        let inner = self.lock();
        let started = inner.state.is_active();
        let runner = inner.runner.as_ref().filter(|_| started);
        MatchInfo {
            match_id: self.id,
            game: self.game.name().to_string(),
            group: self.group,
            host: inner.host,
            state: inner.state,
            bench_to: inner.config.bench_to,
            multiple: inner.config.multiple,
            options: inner.options.status(),
            participants: inner
                .seats
                .iter()
                .map(|p| ParticipantInfo {
                    user: p.user,
                    state: p.state,
                    is_host: p.user == inner.host,
                    slots: p.slots.clone(),
                })
                .collect(),
            slots: inner
                .table
                .slots
                .iter()
                .enumerate()
                .map(|(i, s)| SlotInfo {
                    slot: SlotId(i),
                    holder: s.holder,
                    eliminated: s.eliminated,
                })
                .collect(),
            stage: runner.map(|r| r.stage_path()).unwrap_or_default(),
            remaining_secs: inner
                .table
                .timer_remaining()
                .filter(|_| started)
                .map(|d| d.as_secs()),
            commands: runner.map(|r| r.command_info()).unwrap_or_default(),
        }
    }

    pub fn summary(&self) -> MatchSummary {
        let inner = self.lock();
        MatchSummary {
            match_id: self.id,
            game: self.game.name().to_string(),
            group: self.group,
            host: inner.host,
            state: inner.state,
            players: inner.seats.active().count(),
            max_players: self.game.info().max_players,
        }
    }
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("game", &self.game.name())
            .finish_non_exhaustive()
    }
}

fn results_text(record: &MatchRecord) -> String {
    let mut text = String::from("Game over.");
    for s in &record.scores {
        text.push_str(&format!("\n{} {}: {}", s.slot, s.holder, s.score));
    }
    for (user, achievement) in &record.achievements {
        text.push_str(&format!("\n{user} earned {achievement}"));
    }
    text
}
