//! Dynamic RPC policy configuration sourced from a coordination store.
//!
//! # Data Flow
//! ```text
//! (client, server, category, prefix)
//!     → template (render node path)
//!     → store (initial read + change subscription)
//!     → policy::parser (bytes → typed, validated policy)
//!     → cache (atomic swap of the active snapshot)
//!     → RPC request path reads the snapshot on every call
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod store;
pub mod suite;
pub mod template;
pub mod watch;

pub use cache::{CacheKey, PolicyHandle, PolicyRegistry, PolicySnapshot};
pub use config::Settings;
pub use error::{Error, WatchError};
pub use policy::{Category, PolicyDocument};
pub use store::{ChangeEvent, CoordinationClient};
pub use suite::{ClientSuite, ServerSuite, Suite, SuiteOptions};
pub use template::{ConfigParam, ConfigParamConfig};
