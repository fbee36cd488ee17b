//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Suite close (shutdown.rs):
//!     close() / drop → trigger → watch loop leaves its next await → Closed
//!
//! Signals (signals.rs, binaries only):
//!     SIGTERM/SIGINT → close every suite → exit
//! ```
//!
//! # Design Decisions
//! - One shutdown coordinator per watch loop; nothing process-wide
//! - Every await in a watch loop races the shutdown signal

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
