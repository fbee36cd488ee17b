//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → SuiteOptions::from_settings + store::connect
//! ```
//!
//! # Design Decisions
//! - Every section is optional; an empty file is valid
//! - serde checks shape, validation.rs checks values and reports all problems at once
//! - These settings are read once at startup; policies themselves reload
//!   through the watch loops

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, ConfigError};
pub use schema::{LimiterConfig, ObservabilityConfig, Settings};
pub use validation::{validate_settings, ValidationError};
