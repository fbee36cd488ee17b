//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Watch loops produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!     → reporter.rs (failure hook handed a typed WatchError)
//! ```
//!
//! # Design Decisions
//! - Structured fields (path, category, revision) on every event
//! - JSON output selectable for production
//! - The reporter is a hook; the default one only logs

pub mod logging;
pub mod metrics;
pub mod reporter;

pub use reporter::{ErrorReporter, LogReporter};
