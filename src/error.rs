//! Crate-level error taxonomy.
//!
//! Construction-time failures surface as [`Error`]. Failures inside a running
//! watch loop never escape it; they are delivered to the error reporter as
//! [`WatchError`] while the previous policy stays in effect.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::policy::parser::ParseError;
use crate::store::StoreError;
use crate::template::TemplateError;

/// Errors returned synchronously to callers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed path template: {0}")]
    MalformedTemplate(#[from] TemplateError),

    #[error("malformed document: {0}")]
    MalformedDocument(#[from] ParseError),

    #[error("coordination store unavailable: {0}")]
    CoordinationUnavailable(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Kind of a run-time watch failure, for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchErrorKind {
    MalformedDocument,
    CoordinationUnavailable,
}

/// A failure observed by a running watch loop.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("malformed document at {path}: {source}")]
    MalformedDocument {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("coordination store unavailable for {path}: {source}")]
    CoordinationUnavailable {
        path: String,
        #[source]
        source: StoreError,
    },
}

impl WatchError {
    pub fn kind(&self) -> WatchErrorKind {
        match self {
            WatchError::MalformedDocument { .. } => WatchErrorKind::MalformedDocument,
            WatchError::CoordinationUnavailable { .. } => WatchErrorKind::CoordinationUnavailable,
        }
    }

    /// Node path the failure relates to.
    pub fn path(&self) -> &str {
        match self {
            WatchError::MalformedDocument { path, .. } => path,
            WatchError::CoordinationUnavailable { path, .. } => path,
        }
    }
}
