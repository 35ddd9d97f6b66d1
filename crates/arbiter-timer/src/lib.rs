//! Deadline timers for Arbiter matches.
//!
//! A match arms at most one timer at a time: "this stage ends in 90
//! seconds". Before the deadline the timer raises alerts at configured
//! remaining-time marks; at the deadline it fires once. Dropping the
//! [`TimerHandle`] cancels whatever has not run yet.
//!
//! Two services are provided:
//!
//! - [`TokioTimer`] sleeps on the Tokio clock and runs callbacks on the
//!   blocking pool, since they take the match lock.
//! - [`ManualTimer`] never fires on its own. Tests and step-by-step
//!   drivers fire it explicitly.
//!
//! # Races
//!
//! Cancelling cannot recall a callback that already started. A callback
//! may therefore run after its timer was replaced; receivers must check
//! that the timer is still the current one before acting.

mod config;
mod manual;
mod service;
mod tokio_timer;

pub use config::TimerConfig;
pub use manual::{ManualTimer, PendingFire};
pub use service::{AlertFn, FireFn, TimerCallbacks, TimerHandle, TimerService};
pub use tokio_timer::TokioTimer;
