//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rpc_config_zookeeper::cache::CacheKey;
use rpc_config_zookeeper::error::{WatchError, WatchErrorKind};
use rpc_config_zookeeper::observability::ErrorReporter;
use rpc_config_zookeeper::suite::SuiteOptions;
use rpc_config_zookeeper::watch::BackoffConfig;

/// Poll `cond` until it holds or `timeout` passes.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Reporter that remembers what it was given.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(CacheKey, WatchErrorKind)>>,
}

impl RecordingReporter {
    pub fn count(&self, kind: WatchErrorKind) -> usize {
        self.events.lock().unwrap().iter().filter(|(_, k)| *k == kind).count()
    }

    pub fn total(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, key: &CacheKey, error: &WatchError) {
        self.events.lock().unwrap().push((key.clone(), error.kind()));
    }
}

/// Options with short backoff and a recording reporter.
pub fn test_options() -> (SuiteOptions, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let options = SuiteOptions::new()
        .with_error_reporter(reporter.clone())
        .with_backoff(BackoffConfig {
            base_delay_ms: 10,
            max_delay_ms: 50,
            jitter_ratio: 0.0,
        })
        .with_read_timeout(Duration::from_secs(1));
    (options, reporter)
}

pub const WAIT: Duration = Duration::from_secs(5);
