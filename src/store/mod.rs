//! Coordination-store capability.
//!
//! # Data Flow
//! ```text
//! watch loop
//!     → read(path)        snapshot of node bytes (None = absent)
//!     → subscribe(path)   stream of ChangeEvent until session loss
//! ```
//!
//! # Design Decisions
//! - Session handling lives inside each driver; a watch loop only sees
//!   a stream that ends and resubscribes
//! - Delivery is at-least-once; subscribers re-read on every event
//! - Drivers are injected as `Arc<dyn CoordinationClient>`, never global

pub mod fs;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::DEFAULT_SERVER;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// What happened to a watched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    DataChanged,
    Deleted,
}

/// Notification for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Change notifications for one path. Ends when the session is lost.
pub type ChangeStream = BoxStream<'static, ChangeEvent>;

/// Error type for coordination-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("read of {path} timed out after {timeout_ms} ms")]
    Timeout { path: String, timeout_ms: u64 },

    #[error("invalid node path '{0}'")]
    InvalidPath(String),

    #[error("no driver for endpoint '{0}'")]
    UnsupportedEndpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// The capability surface a watch loop needs from the store.
#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Snapshot read. `Ok(None)` means the node does not exist.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.read(path).await?.is_some())
    }

    /// Subscribe to create/change/delete events for `path`.
    async fn subscribe(&self, path: &str) -> Result<ChangeStream, StoreError>;
}

/// Credentials presented to the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthConfig {
    pub scheme: String,
    pub credential: String,
}

/// Connection parameters for the coordination store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store endpoints. `memory://` and `file://<root>` select in-tree drivers.
    pub endpoints: Vec<String>,

    /// Session timeout in milliseconds; also bounds each read.
    pub session_timeout_ms: u64,

    pub auth: Option<AuthConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_SERVER.to_string()],
            session_timeout_ms: 10_000,
            auth: None,
        }
    }
}

/// Open a driver for the first endpoint in `config`.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn CoordinationClient>, StoreError> {
    let endpoint = config
        .endpoints
        .first()
        .ok_or_else(|| StoreError::Unavailable("no endpoints configured".into()))?;

    if config.auth.is_some() {
        tracing::warn!(endpoint = %endpoint, "Auth is not applied by in-tree drivers");
    }

    if endpoint == "memory://" {
        tracing::info!("Using in-memory coordination store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    if let Some(root) = endpoint.strip_prefix("file://") {
        let store = FsStore::open(PathBuf::from(root))?;
        tracing::info!(root = %store.root().display(), "Using file-backed coordination store");
        return Ok(Arc::new(store));
    }
    Err(StoreError::UnsupportedEndpoint(endpoint.clone()))
}
