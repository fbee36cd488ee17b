//! Limiter policy.
//!
//! A cap of zero is ambiguous on the wire. Unless the document sets
//! `zero_means_unlimited`, the parser fills it from its [`ZeroLimit`]
//! setting, which defaults to [`ZeroLimit::RejectAll`].

use serde::{Deserialize, Serialize};

/// How a zero cap is read when the document does not say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroLimit {
    #[default]
    RejectAll,
    Unlimited,
}

/// Effective cap handed to the limiter engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    /// At most this many; `Max(0)` rejects everything.
    Max(u64),
}

/// Parameters for the rate/concurrency limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimiterPolicy {
    #[serde(default)]
    pub qps_limit: u64,

    #[serde(default)]
    pub connection_limit: u64,

    #[serde(default)]
    pub zero_means_unlimited: Option<bool>,
}

impl Default for LimiterPolicy {
    fn default() -> Self {
        Self {
            qps_limit: 0,
            connection_limit: 0,
            zero_means_unlimited: Some(true),
        }
    }
}

impl LimiterPolicy {
    pub fn qps(&self) -> Quota {
        self.quota(self.qps_limit)
    }

    pub fn connections(&self) -> Quota {
        self.quota(self.connection_limit)
    }

    fn quota(&self, cap: u64) -> Quota {
        if cap == 0 && self.zero_means_unlimited.unwrap_or(false) {
            Quota::Unlimited
        } else {
            Quota::Max(cap)
        }
    }

    pub(crate) fn resolve_zero(&mut self, zero: ZeroLimit) {
        if self.zero_means_unlimited.is_none() {
            self.zero_means_unlimited = Some(zero == ZeroLimit::Unlimited);
        }
    }

    // Caps are unsigned, so the decoder already rejected negatives.
    pub(crate) fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rejects_by_default() {
        let mut p = LimiterPolicy {
            qps_limit: 0,
            connection_limit: 10,
            zero_means_unlimited: None,
        };
        p.resolve_zero(ZeroLimit::RejectAll);
        assert_eq!(p.qps(), Quota::Max(0));
        assert_eq!(p.connections(), Quota::Max(10));
    }

    #[test]
    fn test_zero_unlimited_when_flagged() {
        let mut p = LimiterPolicy {
            qps_limit: 0,
            connection_limit: 0,
            zero_means_unlimited: None,
        };
        p.resolve_zero(ZeroLimit::Unlimited);
        assert_eq!(p.qps(), Quota::Unlimited);

        // Explicit document flag wins over the parser setting.
        let mut explicit = LimiterPolicy {
            zero_means_unlimited: Some(false),
            ..p
        };
        explicit.resolve_zero(ZeroLimit::Unlimited);
        assert_eq!(explicit.connections(), Quota::Max(0));
    }

    #[test]
    fn test_default_is_unlimited() {
        assert_eq!(LimiterPolicy::default().qps(), Quota::Unlimited);
    }
}
