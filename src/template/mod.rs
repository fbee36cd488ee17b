//! Path templating subsystem.
//!
//! # Data Flow
//! ```text
//! ConfigParamConfig (prefix + client/server templates)
//!     → path.rs (compile template into segments)
//!     → param.rs (substitute names, join prefix, freeze ConfigParam)
//! ```
//!
//! # Design Decisions
//! - Templates are compiled once at suite construction; rendering is pure
//! - Unknown or empty placeholders are construction errors, never run-time ones

pub mod param;
pub mod path;

pub use param::{ConfigParam, ConfigParamConfig, ParamDraft};
pub use path::{render, Field, PathTemplate, TemplateError};

/// Default coordination-store host used when nothing is configured.
pub const DEFAULT_SERVER: &str = "127.0.0.1:2181";

/// Default client-side template.
pub const DEFAULT_CLIENT_TEMPLATE: &str = "{{.ClientServiceName}}/{{.ServerServiceName}}/{{.Category}}";

/// Default server-side template.
pub const DEFAULT_SERVER_TEMPLATE: &str = "{{.ServerServiceName}}/{{.Category}}";

/// Default node prefix.
pub const DEFAULT_PREFIX: &str = "/KitexConfig";
