//! The per-subscription watch task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::cache::{CacheKey, PolicyCache};
use crate::error::WatchError;
use crate::observability::metrics;
use crate::observability::ErrorReporter;
use crate::policy::parser::{ConfigParser, ParseError};
use crate::store::{ChangeEvent, ChangeStream, CoordinationClient, StoreError};
use crate::suite::PolicyListener;
use crate::watch::backoff::BackoffConfig;
use crate::watch::state::{StateCell, WatchState};

pub(crate) struct WatchLoop {
    pub(crate) key: CacheKey,
    pub(crate) store: Arc<dyn CoordinationClient>,
    pub(crate) cache: Arc<PolicyCache>,
    pub(crate) parser: Arc<dyn ConfigParser>,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    pub(crate) listeners: Vec<Arc<dyn PolicyListener>>,
    pub(crate) backoff: BackoffConfig,
    pub(crate) read_timeout: Duration,
    pub(crate) state: Arc<StateCell>,
    /// Last node content processed, valid or not.
    last_seen: Option<Vec<u8>>,
    /// Consecutive failed reads. Non-zero arms the catch-up read timer.
    read_failures: u32,
}

/// What woke the watching loop.
enum Wake {
    Event(Option<ChangeEvent>),
    RetryRead,
}

impl WatchLoop {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: CacheKey,
        store: Arc<dyn CoordinationClient>,
        cache: Arc<PolicyCache>,
        parser: Arc<dyn ConfigParser>,
        reporter: Arc<dyn ErrorReporter>,
        listeners: Vec<Arc<dyn PolicyListener>>,
        backoff: BackoffConfig,
        read_timeout: Duration,
        state: Arc<StateCell>,
    ) -> Self {
        Self {
            key,
            store,
            cache,
            parser,
            reporter,
            listeners,
            backoff,
            read_timeout,
            state,
            last_seen: None,
            read_failures: 0,
        }
    }

    /// Subscribe, then take the initial snapshot.
    ///
    /// Subscribing first means no change between the two steps is lost.
    /// Every failure here is non-fatal: the cache keeps the built-in default.
    /// A failed read is retried from [`WatchLoop::run`].
    pub(crate) async fn init(&mut self) -> Option<ChangeStream> {
        self.state.set(WatchState::Init);

        let stream = match self.store.subscribe(&self.key.path).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                self.report_store(e);
                None
            }
        };

        match self.read_tracked().await {
            Ok(Some(raw)) => match self.apply(raw) {
                Ok(revision) => {
                    tracing::info!(revision, "Initial policy loaded");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Initial document rejected, using built-in default");
                    self.report_parse(e);
                }
            },
            Ok(None) => {
                tracing::warn!("Node absent at startup, using built-in default");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Initial read failed, using built-in default");
                self.report_store(e);
            }
        }

        stream
    }

    /// Run until `shutdown` fires.
    pub(crate) async fn run(mut self, initial: Option<ChangeStream>, mut shutdown: broadcast::Receiver<()>) {
        metrics::subscription_started();
        let mut stream = initial;
        let mut attempt: u32 = 0;

        loop {
            if let Some(mut events) = stream.take() {
                self.state.set(WatchState::Watching);
                let opened = Instant::now();
                let mut delivered = false;
                loop {
                    let retry = self.pending_retry();
                    let Some(wake) = until_shutdown(&mut shutdown, next_wake(&mut events, retry)).await else {
                        return self.close();
                    };
                    match wake {
                        Wake::Event(Some(event)) => {
                            delivered = true;
                            tracing::debug!(kind = ?event.kind, "Change event");
                        }
                        Wake::RetryRead => {
                            tracing::debug!(failures = self.read_failures, "Retrying failed read");
                        }
                        Wake::Event(None) => {
                            tracing::warn!("Change stream ended, resubscribing");
                            break;
                        }
                    }
                    if until_shutdown(&mut shutdown, self.refresh()).await.is_none() {
                        return self.close();
                    }
                }
                // A stream that ends at once does not count as recovered.
                if delivered || opened.elapsed() >= self.backoff.ceiling() {
                    attempt = 0;
                }
            }

            self.state.set(WatchState::Resubscribing);
            attempt = attempt.saturating_add(1);
            let delay = self.backoff.delay(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Waiting before resubscribe");
            metrics::record_resubscribe(self.key.category);
            if until_shutdown(&mut shutdown, tokio::time::sleep(delay)).await.is_none() {
                return self.close();
            }

            let Some(result) = until_shutdown(&mut shutdown, self.store.subscribe(&self.key.path)).await else {
                return self.close();
            };
            match result {
                Ok(events) => {
                    tracing::info!(attempt, "Resubscribed");
                    stream = Some(events);
                    // Changes made while unsubscribed produced no event.
                    if until_shutdown(&mut shutdown, self.refresh()).await.is_none() {
                        return self.close();
                    }
                }
                Err(e) => self.report_store(e),
            }
        }
    }

    /// Re-read the node and install it if it changed and parses.
    async fn refresh(&mut self) {
        match self.read_tracked().await {
            Ok(Some(raw)) => {
                if self.last_seen.as_deref() == Some(raw.as_slice()) {
                    tracing::debug!("Node content unchanged, skipping");
                    return;
                }
                match self.apply(raw) {
                    Ok(revision) => tracing::info!(revision, "Policy applied"),
                    Err(e) => self.report_parse(e),
                }
            }
            Ok(None) => {
                tracing::info!(
                    revision = self.cache.get().revision,
                    "Node absent, keeping current policy"
                );
            }
            Err(e) => self.report_store(e),
        }
    }

    /// Read and keep the failure count that drives the retry timer.
    async fn read_tracked(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        let result = self.read_node().await;
        self.read_failures = match result {
            Ok(_) => 0,
            Err(_) => self.read_failures.saturating_add(1),
        };
        result
    }

    /// Delay before the next catch-up read, if one is owed.
    fn pending_retry(&self) -> Option<Duration> {
        (self.read_failures > 0).then(|| self.backoff.delay(self.read_failures))
    }

    async fn read_node(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::time::timeout(self.read_timeout, self.store.read(&self.key.path)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                path: self.key.path.clone(),
                timeout_ms: self.read_timeout.as_millis() as u64,
            }),
        }
    }

    /// Parse and install. The cache is untouched on error.
    fn apply(&mut self, raw: Vec<u8>) -> Result<u64, ParseError> {
        let parsed = self.parser.parse(self.key.category, &raw);
        self.last_seen = Some(raw);

        let document = parsed?;
        if document.category() != self.key.category {
            return Err(ParseError::CategoryMismatch {
                expected: self.key.category,
                found: document.category(),
            });
        }

        let snapshot = self.cache.set(document);
        for listener in &self.listeners {
            listener.on_update(&self.key, &snapshot.document);
        }
        metrics::record_applied(self.key.category);
        Ok(snapshot.revision)
    }

    fn report_parse(&self, source: ParseError) {
        metrics::record_rejected(self.key.category);
        self.reporter.report(
            &self.key,
            &WatchError::MalformedDocument {
                path: self.key.path.clone(),
                source,
            },
        );
    }

    fn report_store(&self, source: StoreError) {
        metrics::record_store_error(self.key.category);
        self.reporter.report(
            &self.key,
            &WatchError::CoordinationUnavailable {
                path: self.key.path.clone(),
                source,
            },
        );
    }

    fn close(self) {
        self.state.set(WatchState::Closed);
        metrics::subscription_stopped();
        tracing::info!(revision = self.cache.get().revision, "Watch closed");
    }
}

/// Wait for the next change event, or for the retry timer when one is armed.
async fn next_wake(events: &mut ChangeStream, retry: Option<Duration>) -> Wake {
    match retry {
        Some(delay) => tokio::select! {
            event = events.next() => Wake::Event(event),
            _ = tokio::time::sleep(delay) => Wake::RetryRead,
        },
        None => Wake::Event(events.next().await),
    }
}

/// Drive `fut` unless shutdown fires first. A closed channel counts as shutdown.
async fn until_shutdown<F: Future>(shutdown: &mut broadcast::Receiver<()>, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = shutdown.recv() => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures_util::stream;

    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::observability::LogReporter;
    use crate::policy::{Category, JsonParser};
    use crate::store::MemoryStore;

    const PATH: &str = "/KitexConfig/orderSvc/paymentSvc/retry";

    fn watch_loop(store: Arc<dyn CoordinationClient>, backoff: BackoffConfig) -> (WatchLoop, Arc<PolicyCache>, Arc<StateCell>) {
        let key = CacheKey::new(PATH, Category::Retry);
        let cache = Arc::new(PolicyCache::new(key.clone()));
        let state = Arc::new(StateCell::new());
        let watch = WatchLoop::new(
            key,
            store,
            Arc::clone(&cache),
            Arc::new(JsonParser::default()),
            Arc::new(LogReporter),
            Vec::new(),
            backoff,
            Duration::from_secs(1),
            Arc::clone(&state),
        );
        (watch, cache, state)
    }

    fn backoff(base_delay_ms: u64, max_delay_ms: u64) -> BackoffConfig {
        BackoffConfig {
            base_delay_ms,
            max_delay_ms,
            jitter_ratio: 0.0,
        }
    }

    async fn eventually<F: Fn() -> bool>(cond: F) -> bool {
        for _ in 0..1000 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    fn max_attempts(cache: &PolicyCache) -> Option<u32> {
        cache.get().document.as_retry().map(|retry| retry.max_attempts)
    }

    #[tokio::test]
    async fn test_close_during_resubscribe_backoff() {
        let store = MemoryStore::new();
        let (mut watch, _cache, state) = watch_loop(Arc::new(store.clone()), backoff(60_000, 60_000));
        let shutdown = Shutdown::new();

        let initial = watch.init().await;
        assert_eq!(state.get(), WatchState::Init);
        let task = tokio::spawn(watch.run(initial, shutdown.subscribe()));
        assert!(eventually(|| state.get() == WatchState::Watching).await);

        store.expire_sessions();
        assert!(eventually(|| state.get() == WatchState::Resubscribing).await);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        assert_eq!(state.get(), WatchState::Closed);
        assert_eq!(store.total_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_failed_initial_read_is_retried() {
        let store = MemoryStore::new();
        store.set(PATH, r#"{"max_attempts":3}"#);
        store.fail_next_reads(2);
        let (mut watch, cache, _state) = watch_loop(Arc::new(store.clone()), backoff(10, 50));
        let shutdown = Shutdown::new();

        let initial = watch.init().await;
        assert!(initial.is_some());
        assert!(cache.get().is_default());

        let task = tokio::spawn(watch.run(initial, shutdown.subscribe()));
        // No writes: only the retry timer can pick the document up.
        assert!(eventually(|| max_attempts(&cache) == Some(3)).await);
        assert_eq!(cache.get().revision, 1);

        shutdown.trigger();
        task.await.unwrap();
    }

    /// Subscribes fine, but every stream ends immediately.
    #[derive(Default)]
    struct FlappingStore {
        subscribes: AtomicUsize,
    }

    #[async_trait]
    impl CoordinationClient for FlappingStore {
        async fn read(&self, _path: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        async fn subscribe(&self, _path: &str) -> Result<ChangeStream, StoreError> {
            self.subscribes.fetch_add(1, Ordering::SeqCst);
            Ok(stream::empty().boxed())
        }
    }

    #[tokio::test]
    async fn test_flapping_session_keeps_backing_off() {
        let store = Arc::new(FlappingStore::default());
        let (mut watch, _cache, _state) = watch_loop(store.clone(), backoff(20, 10_000));
        let shutdown = Shutdown::new();

        let initial = watch.init().await;
        let task = tokio::spawn(watch.run(initial, shutdown.subscribe()));
        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.trigger();
        task.await.unwrap();

        // 20 + 40 + 80 + 160 ms fit in the window; a reset delay would allow ~25.
        let subscribes = store.subscribes.load(Ordering::SeqCst);
        assert!((3..=8).contains(&subscribes), "{subscribes} subscribes");
    }
}
