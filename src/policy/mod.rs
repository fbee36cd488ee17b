//! Policy document subsystem.
//!
//! # Data Flow
//! ```text
//! raw node bytes
//!     → parser.rs (JSON or TOML, per category)
//!     → retry.rs / circuit_break.rs / limiter.rs / timeout.rs (range checks)
//!     → PolicyDocument (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - The category travels with the subscription; it is never inferred from content
//! - Every category has a built-in default used until the first good read
//! - Unknown fields are ignored so newer publishers do not break older readers

pub mod circuit_break;
pub mod limiter;
pub mod parser;
pub mod retry;
pub mod timeout;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use circuit_break::CircuitBreakPolicy;
pub use limiter::{LimiterPolicy, Quota, ZeroLimit};
pub use parser::{ConfigParser, JsonParser, ParseError, TomlParser};
pub use retry::{RetryCondition, RetryPolicy};
pub use timeout::TimeoutPolicy;

/// The policy kind a node governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Category {
    #[serde(rename = "retry")]
    Retry,
    #[serde(rename = "circuitbreak")]
    CircuitBreak,
    #[serde(rename = "limit")]
    Limit,
    #[serde(rename = "rpc_timeout")]
    RpcTimeout,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Retry,
        Category::CircuitBreak,
        Category::Limit,
        Category::RpcTimeout,
    ];

    /// Tag used in node paths.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Retry => "retry",
            Category::CircuitBreak => "circuitbreak",
            Category::Limit => "limit",
            Category::RpcTimeout => "rpc_timeout",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// A parsed, validated policy for one category.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDocument {
    Retry(RetryPolicy),
    CircuitBreak(CircuitBreakPolicy),
    Limiter(LimiterPolicy),
    Timeout(TimeoutPolicy),
}

impl PolicyDocument {
    /// Built-in default for `category`.
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::Retry => PolicyDocument::Retry(RetryPolicy::default()),
            Category::CircuitBreak => PolicyDocument::CircuitBreak(CircuitBreakPolicy::default()),
            Category::Limit => PolicyDocument::Limiter(LimiterPolicy::default()),
            Category::RpcTimeout => PolicyDocument::Timeout(TimeoutPolicy::default()),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            PolicyDocument::Retry(_) => Category::Retry,
            PolicyDocument::CircuitBreak(_) => Category::CircuitBreak,
            PolicyDocument::Limiter(_) => Category::Limit,
            PolicyDocument::Timeout(_) => Category::RpcTimeout,
        }
    }

    /// Range checks for the variant.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PolicyDocument::Retry(p) => p.validate(),
            PolicyDocument::CircuitBreak(p) => p.validate(),
            PolicyDocument::Limiter(p) => p.validate(),
            PolicyDocument::Timeout(p) => p.validate(),
        }
    }

    pub fn as_retry(&self) -> Option<&RetryPolicy> {
        match self {
            PolicyDocument::Retry(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_circuit_break(&self) -> Option<&CircuitBreakPolicy> {
        match self {
            PolicyDocument::CircuitBreak(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_limiter(&self) -> Option<&LimiterPolicy> {
        match self {
            PolicyDocument::Limiter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_timeout(&self) -> Option<&TimeoutPolicy> {
        match self {
            PolicyDocument::Timeout(p) => Some(p),
            _ => None,
        }
    }
}
