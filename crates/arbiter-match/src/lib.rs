//! Matches: who plays, with which settings, and what happens when the
//! game ends.
//!
//! # Architecture
//!
//! ```text
//! MatchManager
//!   ├── Registry: MatchId → Arc<Match>, UserId → MatchId, GroupId → MatchId
//!   └── MatchServices (Messenger, ScoreRecorder, TimerService, EngineConfig)
//!
//! Match (one Mutex)
//!   ├── seats, host, MatchConfig, game options
//!   ├── Table: slots, outgoing messages, deadline timer  (implements MatchHost)
//!   └── StageRunner: the game's stage tree
//! ```
//!
//! Games plug in through [`GameLogic`]; register them as a [`GameHandle`].
//! All operations are synchronous. A match calls its messenger and
//! recorder while holding its own lock, and takes the registry lock only
//! after its own.

mod config;
mod controller;
mod error;
mod info;
mod logic;
mod manager;
mod messenger;
mod participant;
mod registry;
mod scoring;
mod table;

pub use config::{EngineConfig, MatchConfig, MatchState};
pub use controller::Match;
pub use error::MatchError;
pub use info::{MatchInfo, MatchSummary, ParticipantInfo, SlotInfo};
pub use logic::{GameHandle, GameInfo, GameLogic, GameOptions};
pub use manager::{MatchManager, MatchServices};
pub use messenger::{Delivery, Messenger, NullMessenger};
pub use participant::ParticipantState;
pub use scoring::{MatchRecord, MemoryRecorder, NoopRecorder, ScoreRecorder, SlotScore};
