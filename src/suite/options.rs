//! Suite construction options.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, PolicyRegistry};
use crate::config::Settings;
use crate::observability::{ErrorReporter, LogReporter};
use crate::policy::{ConfigParser, JsonParser, PolicyDocument, ZeroLimit};
use crate::template::param::ParamHook;
use crate::template::{ConfigParamConfig, ParamDraft};
use crate::watch::BackoffConfig;

/// Receives every policy a watch loop installs. This is how the external
/// retry, circuit-breaker and limiter engines are fed.
pub trait PolicyListener: Send + Sync {
    fn on_update(&self, key: &CacheKey, document: &PolicyDocument);
}

impl<F> PolicyListener for F
where
    F: Fn(&CacheKey, &PolicyDocument) + Send + Sync,
{
    fn on_update(&self, key: &CacheKey, document: &PolicyDocument) {
        self(key, document)
    }
}

/// Options applied when a suite is built. Never mutated afterwards.
#[derive(Clone)]
pub struct SuiteOptions {
    /// Prefix and templates. Default: `/KitexConfig` with the standard templates.
    pub paths: ConfigParamConfig,

    /// Document parser. Default: [`JsonParser`] using `limiter_zero`.
    pub parser: Option<Arc<dyn ConfigParser>>,

    /// Failure hook. Default: [`LogReporter`].
    pub reporter: Option<Arc<dyn ErrorReporter>>,

    /// Resubscribe backoff. Default: 100 ms doubling up to 5 s, 10% jitter.
    pub backoff: BackoffConfig,

    /// Reading of a zero limiter cap when documents do not say. Default: reject all.
    pub limiter_zero: ZeroLimit,

    /// Upper bound for one store read. Default: 10 s.
    pub read_timeout: Duration,

    pub listeners: Vec<Arc<dyn PolicyListener>>,

    pub registry: Option<PolicyRegistry>,

    pub param_hook: Option<ParamHook>,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            paths: ConfigParamConfig::default(),
            parser: None,
            reporter: None,
            backoff: BackoffConfig::default(),
            limiter_zero: ZeroLimit::default(),
            read_timeout: Duration::from_secs(10),
            listeners: Vec::new(),
            registry: None,
            param_hook: None,
        }
    }
}

impl SuiteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options matching a loaded settings file.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            paths: settings.paths.clone(),
            backoff: settings.resubscribe.clone(),
            limiter_zero: settings.limiter.zero,
            read_timeout: Duration::from_millis(settings.store.session_timeout_ms),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.paths.prefix = prefix.into();
        self
    }

    /// Replace prefix and both templates.
    pub fn with_path_template(mut self, paths: ConfigParamConfig) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ConfigParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_limiter_zero(mut self, zero: ZeroLimit) -> Self {
        self.limiter_zero = zero;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn PolicyListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_registry(mut self, registry: PolicyRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_param_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ParamDraft) + Send + Sync + 'static,
    {
        self.param_hook = Some(Arc::new(hook));
        self
    }

    pub(crate) fn parser(&self) -> Arc<dyn ConfigParser> {
        match &self.parser {
            Some(parser) => Arc::clone(parser),
            None => Arc::new(JsonParser::new(self.limiter_zero)),
        }
    }

    pub(crate) fn reporter(&self) -> Arc<dyn ErrorReporter> {
        match &self.reporter {
            Some(reporter) => Arc::clone(reporter),
            None => Arc::new(LogReporter),
        }
    }
}

impl fmt::Debug for SuiteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteOptions")
            .field("paths", &self.paths)
            .field("parser", &self.parser)
            .field("custom_reporter", &self.reporter.is_some())
            .field("backoff", &self.backoff)
            .field("limiter_zero", &self.limiter_zero)
            .field("read_timeout", &self.read_timeout)
            .field("listeners", &self.listeners.len())
            .field("registry", &self.registry)
            .field("param_hook", &self.param_hook.is_some())
            .finish()
    }
}
