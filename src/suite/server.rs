//! Server-side suite: limiter policy for one service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::PolicyHandle;
use crate::error::Error;
use crate::policy::{Category, LimiterPolicy};
use crate::store::CoordinationClient;
use crate::suite::client::typed;
use crate::suite::{PolicySuite, Suite, SuiteOptions};
use crate::template::{ConfigParam, PathTemplate};

/// Watches the limiter document of a service.
#[derive(Debug)]
pub struct ServerSuite {
    limit: PolicySuite,
}

impl ServerSuite {
    pub const CATEGORIES: [Category; 1] = [Category::Limit];

    /// `service` is the local service name.
    pub async fn new(service: &str, store: Arc<dyn CoordinationClient>, options: SuiteOptions) -> Result<Self, Error> {
        let template = PathTemplate::parse(&options.paths.server_template)?;
        let param = ConfigParam::render(
            "",
            service,
            Category::Limit,
            &options.paths.prefix,
            &template,
            options.param_hook.as_ref(),
        )?;

        tracing::info!(service = %service, "Starting server config suite");
        Ok(Self {
            limit: PolicySuite::start(param, store, &options).await,
        })
    }

    pub fn limit(&self) -> &PolicySuite {
        &self.limit
    }

    pub fn limiter_policy(&self) -> LimiterPolicy {
        typed(&self.limit.get(), |d| d.as_limiter().copied())
    }
}

#[async_trait]
impl Suite for ServerSuite {
    fn policies(&self) -> Vec<PolicyHandle> {
        vec![self.limit.handle()]
    }

    async fn close(&self) {
        self.limit.close().await;
        tracing::info!(service = %self.limit.param().server_service_name(), "Server config suite closed");
    }
}
