//! Policy cache subsystem.
//!
//! # Data Flow
//! ```text
//! watch loop (sole writer)
//!     → PolicyCache::set (build new snapshot, atomic store)
//! RPC request path (many readers)
//!     → PolicyHandle::get (lock-free load of the current snapshot)
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; replacement swaps a whole `Arc`
//! - Readers never fail: they see the built-in default until the first good read
//! - The registry is injected per process, never a global

pub mod registry;

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::policy::{Category, PolicyDocument};

pub use registry::PolicyRegistry;

/// Identity of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub category: Category,
}

impl CacheKey {
    pub fn new(path: impl Into<String>, category: Category) -> Self {
        Self {
            path: path.into(),
            category,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.category, self.path)
    }
}

/// Where the active document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOrigin {
    BuiltinDefault,
    Store,
}

/// One immutable version of a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySnapshot {
    pub document: PolicyDocument,
    /// 0 for the built-in default, then +1 per applied document.
    pub revision: u64,
    pub origin: PolicyOrigin,
}

impl PolicySnapshot {
    pub fn builtin(category: Category) -> Self {
        Self {
            document: PolicyDocument::default_for(category),
            revision: 0,
            origin: PolicyOrigin::BuiltinDefault,
        }
    }

    pub fn is_default(&self) -> bool {
        self.origin == PolicyOrigin::BuiltinDefault
    }
}

/// Current policy for one key.
#[derive(Debug)]
pub struct PolicyCache {
    key: CacheKey,
    current: ArcSwap<PolicySnapshot>,
}

impl PolicyCache {
    pub(crate) fn new(key: CacheKey) -> Self {
        let current = ArcSwap::from_pointee(PolicySnapshot::builtin(key.category));
        Self { key, current }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Current snapshot. Never blocks.
    pub fn get(&self) -> Arc<PolicySnapshot> {
        self.current.load_full()
    }

    /// Install a new document and return the snapshot that is now visible.
    /// Only the owning watch loop calls this, so load-then-store cannot race.
    pub(crate) fn set(&self, document: PolicyDocument) -> Arc<PolicySnapshot> {
        let revision = self.current.load().revision + 1;
        let snapshot = Arc::new(PolicySnapshot {
            document,
            revision,
            origin: PolicyOrigin::Store,
        });
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }
}

/// Read-only handle given to the request path.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    cache: Arc<PolicyCache>,
}

impl PolicyHandle {
    pub(crate) fn new(cache: Arc<PolicyCache>) -> Self {
        Self { cache }
    }

    pub fn key(&self) -> &CacheKey {
        self.cache.key()
    }

    pub fn get(&self) -> Arc<PolicySnapshot> {
        self.cache.get()
    }

    pub fn revision(&self) -> u64 {
        self.cache.current.load().revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RetryPolicy;

    fn retry(max_attempts: u32) -> PolicyDocument {
        PolicyDocument::Retry(RetryPolicy {
            max_attempts,
            disabled: false,
            retry_on: vec![crate::policy::RetryCondition::Timeout],
            ..RetryPolicy::default()
        })
    }

    #[test]
    fn test_starts_with_default() {
        let cache = PolicyCache::new(CacheKey::new("/a", Category::Retry));
        let snapshot = cache.get();
        assert!(snapshot.is_default());
        assert_eq!(snapshot.revision, 0);
        assert_eq!(snapshot.document, PolicyDocument::default_for(Category::Retry));
    }

    #[test]
    fn test_set_is_visible_to_handles() {
        let cache = Arc::new(PolicyCache::new(CacheKey::new("/a", Category::Retry)));
        let handle = PolicyHandle::new(Arc::clone(&cache));
        let before = handle.get();

        cache.set(retry(3));
        let installed = cache.set(retry(5));
        assert_eq!(installed.revision, 2);
        assert_eq!(handle.get().document, retry(5));
        assert_eq!(handle.revision(), 2);

        // Old snapshots stay intact for readers still holding them.
        assert!(before.is_default());
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let cache = Arc::new(PolicyCache::new(CacheKey::new("/a", Category::Retry)));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = PolicyHandle::new(Arc::clone(&cache));
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let snapshot = handle.get();
                        if let Some(p) = snapshot.document.as_retry() {
                            if !snapshot.is_default() {
                                assert_eq!(u64::from(p.max_attempts), snapshot.revision);
                            }
                        }
                    }
                })
            })
            .collect();
        for n in 1..=200 {
            cache.set(retry(n));
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
