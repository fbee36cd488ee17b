//! Document parsers.
//!
//! # Responsibilities
//! - Decode raw node bytes for a known category
//! - Apply the limiter zero-cap setting
//! - Run range validation before anything reaches the cache
//!
//! Input comes from an externally editable store, so every failure is a
//! [`ParseError`] and nothing here panics.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::policy::{Category, PolicyDocument, ZeroLimit};

/// Failure to turn node bytes into a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{category} document is not valid {format}: {message}")]
    Syntax {
        category: Category,
        format: &'static str,
        message: String,
    },

    #[error("{category} document out of range: {reason}")]
    Invalid { category: Category, reason: String },

    #[error("parser produced a {found} document for a {expected} node")]
    CategoryMismatch { expected: Category, found: Category },
}

/// Turns raw bytes into a validated policy for `category`.
pub trait ConfigParser: Send + Sync + std::fmt::Debug {
    fn parse(&self, category: Category, raw: &[u8]) -> Result<PolicyDocument, ParseError>;
}

/// JSON documents. This is the default parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser {
    zero: ZeroLimit,
}

impl JsonParser {
    pub fn new(zero: ZeroLimit) -> Self {
        Self { zero }
    }
}

impl ConfigParser for JsonParser {
    fn parse(&self, category: Category, raw: &[u8]) -> Result<PolicyDocument, ParseError> {
        finish(Decoder::Json(raw).document(category)?, self.zero)
    }
}

/// TOML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser {
    zero: ZeroLimit,
}

impl TomlParser {
    pub fn new(zero: ZeroLimit) -> Self {
        Self { zero }
    }
}

impl ConfigParser for TomlParser {
    fn parse(&self, category: Category, raw: &[u8]) -> Result<PolicyDocument, ParseError> {
        let text = std::str::from_utf8(raw).map_err(|e| ParseError::Syntax {
            category,
            format: "TOML",
            message: e.to_string(),
        })?;
        finish(Decoder::Toml(text).document(category)?, self.zero)
    }
}

enum Decoder<'a> {
    Json(&'a [u8]),
    Toml(&'a str),
}

impl Decoder<'_> {
    fn document(&self, category: Category) -> Result<PolicyDocument, ParseError> {
        Ok(match category {
            Category::Retry => PolicyDocument::Retry(self.value(category)?),
            Category::CircuitBreak => PolicyDocument::CircuitBreak(self.value(category)?),
            Category::Limit => PolicyDocument::Limiter(self.value(category)?),
            Category::RpcTimeout => PolicyDocument::Timeout(self.value(category)?),
        })
    }

    fn value<T: DeserializeOwned>(&self, category: Category) -> Result<T, ParseError> {
        match self {
            Decoder::Json(raw) => serde_json::from_slice(raw).map_err(|e| ParseError::Syntax {
                category,
                format: "JSON",
                message: e.to_string(),
            }),
            Decoder::Toml(text) => toml::from_str(text).map_err(|e| ParseError::Syntax {
                category,
                format: "TOML",
                message: e.message().to_string(),
            }),
        }
    }
}

fn finish(mut document: PolicyDocument, zero: ZeroLimit) -> Result<PolicyDocument, ParseError> {
    if let PolicyDocument::Limiter(limiter) = &mut document {
        limiter.resolve_zero(zero);
    }
    document.validate().map_err(|reason| ParseError::Invalid {
        category: document.category(),
        reason,
    })?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Quota, RetryCondition, RetryPolicy};

    fn json(category: Category, raw: &str) -> Result<PolicyDocument, ParseError> {
        JsonParser::default().parse(category, raw.as_bytes())
    }

    #[test]
    fn test_retry_document() {
        let doc = json(Category::Retry, r#"{"max_attempts":3,"backoff_ms":100}"#).unwrap();
        let retry = doc.as_retry().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.backoff_ms, 100);
        assert!(retry.retries_on(RetryCondition::Timeout));
    }

    #[test]
    fn test_invalid_retry_document() {
        let err = json(Category::Retry, r#"{"max_attempts":0}"#).unwrap_err();
        assert!(matches!(err, ParseError::Invalid { category: Category::Retry, .. }));
    }

    #[test]
    fn test_disabled_retry_document() {
        let doc = json(Category::Retry, r#"{"max_attempts":0,"disabled":true}"#).unwrap();
        assert!(!doc.as_retry().unwrap().is_enabled());
    }

    #[test]
    fn test_malformed_bytes() {
        for raw in ["", "{", "null", "[1,2]", r#"{"max_attempts":-1}"#, r#"{"max_attempts":"3"}"#] {
            let err = json(Category::Retry, raw).unwrap_err();
            assert!(matches!(err, ParseError::Syntax { .. }), "{raw:?} -> {err:?}");
        }
        let err = JsonParser::default()
            .parse(Category::Limit, &[0xff, 0xfe, 0x00])
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_unknown_retry_condition() {
        let err = json(Category::Retry, r#"{"max_attempts":2,"retry_on":["cosmic_rays"]}"#).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let doc = json(Category::RpcTimeout, r#"{"rpc_timeout_ms":250,"owner":"ops"}"#).unwrap();
        assert_eq!(doc.as_timeout().unwrap().rpc_timeout_ms, 250);
    }

    #[test]
    fn test_circuit_break_document() {
        let doc = json(Category::CircuitBreak, r#"{"error_rate":0.3,"min_sample":10}"#).unwrap();
        assert_eq!(doc.as_circuit_break().unwrap().min_sample, 10);
        assert!(json(Category::CircuitBreak, r#"{"error_rate":1.5}"#).is_err());
        assert!(json(Category::CircuitBreak, r#"{"min_sample":0}"#).is_err());
    }

    #[test]
    fn test_limiter_zero_setting() {
        let raw = br#"{"qps_limit":0,"connection_limit":100}"#;
        let strict = JsonParser::new(ZeroLimit::RejectAll).parse(Category::Limit, raw).unwrap();
        assert_eq!(strict.as_limiter().unwrap().qps(), Quota::Max(0));

        let lenient = JsonParser::new(ZeroLimit::Unlimited).parse(Category::Limit, raw).unwrap();
        assert_eq!(lenient.as_limiter().unwrap().qps(), Quota::Unlimited);
        assert_eq!(lenient.as_limiter().unwrap().connections(), Quota::Max(100));
    }

    #[test]
    fn test_toml_parser() {
        let raw = b"max_attempts = 4\nbackoff_ms = 20\nretry_on = [\"overloaded\"]\n";
        let doc = TomlParser::default().parse(Category::Retry, raw).unwrap();
        assert_eq!(
            doc,
            PolicyDocument::Retry(RetryPolicy {
                max_attempts: 4,
                backoff_ms: 20,
                max_backoff_ms: 0,
                retry_on: vec![RetryCondition::Overloaded],
                disabled: false,
            })
        );
        let err = TomlParser::default().parse(Category::Retry, b"max_attempts = ").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { format: "TOML", .. }));
    }

    #[test]
    fn test_toml_rejects_nan_error_rate() {
        let err = TomlParser::default()
            .parse(Category::CircuitBreak, b"error_rate = nan\nmin_sample = 5\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }
}
