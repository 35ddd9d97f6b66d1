//! # Arbiter
//!
//! A turn-based match engine for games hosted in chat.
//!
//! A game describes itself as a tree of stages (see [`arbiter_stage`]);
//! Arbiter runs matches of it: users join, the host starts, requests and
//! timers drive the stage tree, computers fill empty seats and scores are
//! recorded at the end.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use arbiter::prelude::*;
//!
//! arbiter::init_tracing();
//! let arbiter = Arbiter::builder()
//!     .messenger(Arc::new(MyChat))
//!     .game(MyGame)
//!     .build()?;
//!
//! let m = arbiter.new_match("my-game", UserId(1), Some(GroupId(7)))?;
//! arbiter.join_public(UserId(2), GroupId(7))?;
//! m.game_start(UserId(1), Some(GroupId(7)))?;
//! arbiter.request(UserId(2), Some(GroupId(7)), "move 3")?;
//! ```

mod engine;
mod error;

pub use engine::{Arbiter, ArbiterBuilder};
pub use error::ArbiterError;

pub use arbiter_match;
pub use arbiter_protocol;
pub use arbiter_stage;
pub use arbiter_timer;

/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Does nothing if
/// a subscriber is already installed.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything a game or a chat adapter usually needs.
pub mod prelude {
    pub use std::sync::Arc;
    pub use std::time::Duration;

    pub use crate::{Arbiter, ArbiterBuilder, ArbiterError};
    pub use arbiter_match::{
        Delivery, EngineConfig, GameHandle, GameInfo, GameLogic, GameOptions, Match, MatchError,
        MatchInfo, MatchRecord, MatchState, MatchSummary, MemoryRecorder, Messenger,
        ScoreRecorder,
    };
    pub use arbiter_protocol::{GroupId, MatchId, Recipient, SlotHolder, SlotId, UserId};
    pub use arbiter_stage::{
        ActionResult, ArgReader, AtomicStage, Caller, CheckoutReason, CheckoutResult, Command,
        Commands, CompositeStage, ControlResult, GameState, Readiness, StageCode, StageContext,
        StageNode,
    };
    pub use arbiter_timer::{ManualTimer, TimerConfig, TokioTimer};
}
