//! Shared lookup of policy handles by key.

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::{CacheKey, PolicyHandle, PolicySnapshot};

/// Maps cache keys to the handles of running suites.
///
/// Handles stay registered after their suite closes so the last policy
/// remains in effect; a new suite for the same key replaces the entry.
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    inner: Arc<DashMap<CacheKey, PolicyHandle>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, handle: PolicyHandle) {
        self.inner.insert(handle.key().clone(), handle);
    }

    /// Current policy for `key`, or the built-in default if nothing is registered.
    pub fn get(&self, key: &CacheKey) -> Arc<PolicySnapshot> {
        match self.inner.get(key) {
            Some(handle) => handle.get(),
            None => Arc::new(PolicySnapshot::builtin(key.category)),
        }
    }

    pub fn handle(&self, key: &CacheKey) -> Option<PolicyHandle> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("entries", &self.inner.len())
            .finish()
    }
}
