//! The stage engine behind every Arbiter match.
//!
//! A game is a tree of stages. Leaves ([`AtomicStage`]) take player
//! requests and timeouts directly; inner nodes ([`CompositeStage`]) run one
//! child at a time and choose the next child whenever the current one
//! checks out. One [`ReadinessMask`] is shared by the whole tree and
//! decides when a leaf is finished.
//!
//! ```text
//! request ──► composite commands ──► child ──► ... ──► leaf commands
//!                                                       │
//!                          mask.set / settle ◄──────────┘
//!                                 │
//!             checkout ◄── over? ─┘   (parent picks the next child)
//! ```
//!
//! The engine is synchronous and knows nothing about locks or threads.
//! Whoever owns a [`StageTree`] (the match controller) serializes calls
//! into it and implements [`MatchHost`] for messages, timers and the
//! roster.

mod args;
mod code;
mod command;
mod context;
mod mask;
mod node;
mod tree;

pub use args::ArgReader;
pub use code::{ActionResult, CheckoutReason, CheckoutResult, ControlResult, StageCode};
pub use command::{Caller, Command, Commands};
pub use context::{MatchHost, StageContext};
pub use mask::{Readiness, ReadinessMask};
pub use node::{AtomicStage, CompositeStage, StageKind, StageNode};
pub use tree::{GameState, StageRunner, StageTree};
