//! Suites installed into an RPC client or server.
//!
//! # Responsibilities
//! - Render one node path per governed category at construction
//! - Start one watch loop per path and own its lifecycle
//! - Hand the RPC path read-only policy handles
//!
//! # Design Decisions
//! - Every path is rendered before any loop starts, so a template error
//!   leaves nothing running
//! - Dropping a suite stops its loops; `close` also waits for them

pub mod client;
pub mod options;
pub mod server;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::cache::{CacheKey, PolicyCache, PolicyHandle, PolicySnapshot};
use crate::lifecycle::Shutdown;
use crate::store::CoordinationClient;
use crate::template::ConfigParam;
use crate::watch::task::WatchLoop;
use crate::watch::{StateCell, WatchState};

pub use client::ClientSuite;
pub use options::{PolicyListener, SuiteOptions};
pub use server::ServerSuite;

/// What the RPC framework needs from an installed suite.
#[async_trait]
pub trait Suite: Send + Sync {
    /// Handles for every category this suite governs.
    fn policies(&self) -> Vec<PolicyHandle>;

    /// Stop all watch loops and wait for them to finish.
    async fn close(&self);
}

/// One subscription: a param, its cache entry and its watch loop.
pub struct PolicySuite {
    param: ConfigParam,
    handle: PolicyHandle,
    state: Arc<StateCell>,
    shutdown: Shutdown,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PolicySuite {
    /// Take the initial snapshot and spawn the watch loop.
    pub async fn start(param: ConfigParam, store: Arc<dyn CoordinationClient>, options: &SuiteOptions) -> Self {
        let key = CacheKey::new(param.path(), param.category());
        let cache = Arc::new(PolicyCache::new(key.clone()));
        let handle = PolicyHandle::new(Arc::clone(&cache));
        let state = Arc::new(StateCell::new());
        let shutdown = Shutdown::new();

        let span = tracing::info_span!(
            "policy_watch",
            path = %key.path,
            category = %key.category,
            watch_id = %uuid::Uuid::new_v4(),
        );

        let mut watch = WatchLoop::new(
            key,
            store,
            cache,
            options.parser(),
            options.reporter(),
            options.listeners.clone(),
            options.backoff.clone(),
            options.read_timeout,
            Arc::clone(&state),
        );
        let initial = watch.init().instrument(span.clone()).await;

        let rx = shutdown.subscribe();
        let task = tokio::spawn(watch.run(initial, rx).instrument(span));

        if let Some(registry) = &options.registry {
            registry.register(handle.clone());
        }

        Self {
            param,
            handle,
            state,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn param(&self) -> &ConfigParam {
        &self.param
    }

    pub fn handle(&self) -> PolicyHandle {
        self.handle.clone()
    }

    /// Current policy. Never blocks.
    pub fn get(&self) -> Arc<PolicySnapshot> {
        self.handle.get()
    }

    pub fn state(&self) -> WatchState {
        self.state.get()
    }

    /// Stop the watch loop and wait for it. Idempotent.
    pub async fn close(&self) {
        if self.shutdown.trigger() {
            tracing::debug!(path = %self.param.path(), "Stopping watch loop");
        }
        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(path = %self.param.path(), error = %e, "Watch task ended abnormally");
            }
        }
    }
}

impl Drop for PolicySuite {
    fn drop(&mut self) {
        if self.shutdown.trigger() {
            tracing::debug!(path = %self.param.path(), "Suite dropped without close");
        }
    }
}

impl std::fmt::Debug for PolicySuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicySuite")
            .field("param", &self.param)
            .field("state", &self.state())
            .field("revision", &self.handle.revision())
            .finish()
    }
}
