//! In-process coordination store.
//!
//! Holds nodes in memory and fans out change events to subscribers. Besides
//! embedding, it lets tests drive session loss ([`MemoryStore::expire_sessions`])
//! and outages ([`MemoryStore::set_unavailable`], [`MemoryStore::fail_next_reads`]).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;

use crate::store::{ChangeEvent, ChangeKind, ChangeStream, CoordinationClient, StoreError};

#[derive(Default)]
struct Inner {
    nodes: DashMap<String, Vec<u8>>,
    watchers: DashMap<String, Vec<mpsc::UnboundedSender<ChangeEvent>>>,
    unavailable: AtomicBool,
    failing_reads: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

/// A thread-safe in-memory node tree.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a node and notify subscribers.
    pub fn set(&self, path: &str, data: impl Into<Vec<u8>>) {
        let kind = match self.inner.nodes.insert(path.to_string(), data.into()) {
            Some(_) => ChangeKind::DataChanged,
            None => ChangeKind::Created,
        };
        self.notify(path, kind);
    }

    /// Remove a node. Returns false if it did not exist.
    pub fn delete(&self, path: &str) -> bool {
        let existed = self.inner.nodes.remove(path).is_some();
        if existed {
            self.notify(path, ChangeKind::Deleted);
        }
        existed
    }

    /// Drop every subscription, as a session loss would.
    pub fn expire_sessions(&self) {
        self.inner.watchers.clear();
    }

    /// Make reads and subscriptions fail until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the next `count` reads while subscriptions keep working.
    pub fn fail_next_reads(&self, count: usize) {
        self.inner.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Live subscriptions on `path`.
    pub fn subscription_count(&self, path: &str) -> usize {
        match self.inner.watchers.get_mut(path) {
            Some(mut senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.len()
            }
            None => 0,
        }
    }

    /// Live subscriptions across all paths.
    pub fn total_subscriptions(&self) -> usize {
        let mut total = 0;
        for mut entry in self.inner.watchers.iter_mut() {
            entry.value_mut().retain(|tx| !tx.is_closed());
            total += entry.value().len();
        }
        total
    }

    /// Number of successful `subscribe` calls so far.
    pub fn subscribe_calls(&self) -> usize {
        self.inner.subscribe_calls.load(Ordering::SeqCst)
    }

    fn notify(&self, path: &str, kind: ChangeKind) {
        if let Some(mut senders) = self.inner.watchers.get_mut(path) {
            senders.retain(|tx| tx.send(ChangeEvent::new(path, kind)).is_ok());
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CoordinationClient for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_available()?;
        let injected = self
            .inner
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected read failure".into()));
        }
        Ok(self.inner.nodes.get(path).map(|r| r.value().clone()))
    }

    async fn subscribe(&self, path: &str) -> Result<ChangeStream, StoreError> {
        self.check_available()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .watchers
            .entry(path.to_string())
            .or_default()
            .push(tx);
        self.inner.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_and_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.read("/a").await.unwrap(), None);
        store.set("/a", "one");
        assert_eq!(store.read("/a").await.unwrap(), Some(b"one".to_vec()));
        assert!(store.exists("/a").await.unwrap());
        assert!(store.delete("/a"));
        assert!(!store.delete("/a"));
        assert!(!store.exists("/a").await.unwrap());
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let store = MemoryStore::new();
        let mut events = store.subscribe("/a").await.unwrap();
        store.set("/a", "1");
        store.set("/a", "2");
        store.set("/b", "ignored");
        store.delete("/a");

        let kinds: Vec<_> = [
            events.next().await.unwrap(),
            events.next().await.unwrap(),
            events.next().await.unwrap(),
        ]
        .into_iter()
        .map(|e| e.kind)
        .collect();
        assert_eq!(kinds, [ChangeKind::Created, ChangeKind::DataChanged, ChangeKind::Deleted]);
    }

    #[tokio::test]
    async fn test_expire_ends_streams() {
        let store = MemoryStore::new();
        let mut events = store.subscribe("/a").await.unwrap();
        assert_eq!(store.subscription_count("/a"), 1);
        store.expire_sessions();
        assert!(events.next().await.is_none());
        assert_eq!(store.total_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_dropped_stream_is_pruned() {
        let store = MemoryStore::new();
        let events = store.subscribe("/a").await.unwrap();
        drop(events);
        assert_eq!(store.subscription_count("/a"), 0);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.read("/a").await, Err(StoreError::Unavailable(_))));
        assert!(store.subscribe("/a").await.is_err());
        store.set_unavailable(false);
        assert!(store.read("/a").await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_next_reads() {
        let store = MemoryStore::new();
        store.set("/a", "1");
        store.fail_next_reads(2);
        assert!(store.subscribe("/a").await.is_ok());
        assert!(store.read("/a").await.is_err());
        assert!(store.read("/a").await.is_err());
        assert_eq!(store.read("/a").await.unwrap(), Some(b"1".to_vec()));
    }
}
