//! Watch loop subsystem.
//!
//! # State Transitions
//! ```text
//! Init → Watching:          subscribed; initial document (or default) installed
//! Watching → Watching:      change event → re-read → parse → install or keep
//! Watching → Watching:      read failed → re-read after backoff, until one succeeds
//! Watching → Resubscribing: change stream ended (session loss)
//! Resubscribing → Watching: subscribe succeeded; node re-read to catch up
//! any → Closed:             owning suite closed or dropped
//! ```
//!
//! # Design Decisions
//! - One task per subscription, sole writer of its cache entry
//! - Failures keep the last good policy and go to the reporter
//! - Identical node content is applied once, whatever the event count

pub mod backoff;
pub mod state;
pub(crate) mod task;

pub use backoff::BackoffConfig;
pub use state::{StateCell, WatchState};
