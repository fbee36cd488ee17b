//! Failure-notification hook.

use crate::cache::CacheKey;
use crate::error::WatchError;

/// Receives every run-time failure a watch loop recovers from.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, key: &CacheKey, error: &WatchError);
}

impl<F> ErrorReporter for F
where
    F: Fn(&CacheKey, &WatchError) + Send + Sync,
{
    fn report(&self, key: &CacheKey, error: &WatchError) {
        self(key, error)
    }
}

/// Default reporter: logs at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, key: &CacheKey, error: &WatchError) {
        tracing::error!(
            path = %key.path,
            category = %key.category,
            kind = ?error.kind(),
            error = %error,
            "Keeping current policy"
        );
    }
}
