//! Client-side suite: retry, circuit breaker and RPC timeout policies for
//! calls from one client to one destination service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{PolicyHandle, PolicySnapshot};
use crate::error::Error;
use crate::policy::{Category, CircuitBreakPolicy, RetryPolicy, TimeoutPolicy};
use crate::store::CoordinationClient;
use crate::suite::{PolicySuite, Suite, SuiteOptions};
use crate::template::{ConfigParam, PathTemplate};

/// Watches the client-governed categories for a (client, service) pair.
#[derive(Debug)]
pub struct ClientSuite {
    retry: PolicySuite,
    circuit_break: PolicySuite,
    timeout: PolicySuite,
}

impl ClientSuite {
    pub const CATEGORIES: [Category; 3] = [Category::Retry, Category::CircuitBreak, Category::RpcTimeout];

    /// `service` is the destination service name and `client` the local identity.
    pub async fn new(
        service: &str,
        client: &str,
        store: Arc<dyn CoordinationClient>,
        options: SuiteOptions,
    ) -> Result<Self, Error> {
        let template = PathTemplate::parse(&options.paths.client_template)?;
        let param = |category| {
            ConfigParam::render(
                client,
                service,
                category,
                &options.paths.prefix,
                &template,
                options.param_hook.as_ref(),
            )
        };
        let retry = param(Category::Retry)?;
        let circuit_break = param(Category::CircuitBreak)?;
        let timeout = param(Category::RpcTimeout)?;

        tracing::info!(service = %service, client = %client, "Starting client config suite");
        Ok(Self {
            retry: PolicySuite::start(retry, Arc::clone(&store), &options).await,
            circuit_break: PolicySuite::start(circuit_break, Arc::clone(&store), &options).await,
            timeout: PolicySuite::start(timeout, store, &options).await,
        })
    }

    pub fn retry(&self) -> &PolicySuite {
        &self.retry
    }

    pub fn circuit_break(&self) -> &PolicySuite {
        &self.circuit_break
    }

    pub fn timeout(&self) -> &PolicySuite {
        &self.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        typed(&self.retry.get(), |d| d.as_retry().cloned())
    }

    pub fn circuit_break_policy(&self) -> CircuitBreakPolicy {
        typed(&self.circuit_break.get(), |d| d.as_circuit_break().cloned())
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        typed(&self.timeout.get(), |d| d.as_timeout().copied())
    }
}

/// Every cache entry holds its own category, so the fallback is unreachable.
pub(crate) fn typed<T: Default>(
    snapshot: &PolicySnapshot,
    pick: impl FnOnce(&crate::policy::PolicyDocument) -> Option<T>,
) -> T {
    pick(&snapshot.document).unwrap_or_default()
}

#[async_trait]
impl Suite for ClientSuite {
    fn policies(&self) -> Vec<PolicyHandle> {
        vec![self.retry.handle(), self.circuit_break.handle(), self.timeout.handle()]
    }

    async fn close(&self) {
        self.retry.close().await;
        self.circuit_break.close().await;
        self.timeout.close().await;
        tracing::info!(
            service = %self.retry.param().server_service_name(),
            client = %self.retry.param().client_service_name(),
            "Client config suite closed"
        );
    }
}
