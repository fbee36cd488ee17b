//! Subscription identity.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::policy::Category;
use crate::template::path::{PathTemplate, PathValues, TemplateError};
use crate::template::{DEFAULT_CLIENT_TEMPLATE, DEFAULT_PREFIX, DEFAULT_SERVER_TEMPLATE};

/// Template configuration used to render node paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigParamConfig {
    /// Node prefix joined in front of every rendered path.
    pub prefix: String,

    /// Template for client-side suites.
    pub client_template: String,

    /// Template for server-side suites.
    pub server_template: String,
}

impl Default for ConfigParamConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            client_template: DEFAULT_CLIENT_TEMPLATE.to_string(),
            server_template: DEFAULT_SERVER_TEMPLATE.to_string(),
        }
    }
}

/// Mutable view handed to a parameter hook before the param is frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDraft {
    pub client_service_name: String,
    pub server_service_name: String,
    pub prefix: String,
    pub path: String,
}

/// Hook that may adjust a rendered param once.
pub type ParamHook = Arc<dyn Fn(&mut ParamDraft) + Send + Sync>;

/// Logical identity of one config subscription. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigParam {
    client_service_name: String,
    server_service_name: String,
    category: Category,
    prefix: String,
    path: String,
}

impl ConfigParam {
    /// Render a param from its names and a compiled template.
    pub fn render(
        client_service_name: &str,
        server_service_name: &str,
        category: Category,
        prefix: &str,
        template: &PathTemplate,
        hook: Option<&ParamHook>,
    ) -> Result<Self, TemplateError> {
        let rendered = template.render(&PathValues {
            client_service_name,
            server_service_name,
            category,
        })?;

        let mut draft = ParamDraft {
            client_service_name: client_service_name.to_string(),
            server_service_name: server_service_name.to_string(),
            prefix: prefix.to_string(),
            path: join_path(prefix, &rendered),
        };
        if let Some(hook) = hook {
            hook(&mut draft);
        }

        Ok(Self {
            client_service_name: draft.client_service_name,
            server_service_name: draft.server_service_name,
            category,
            prefix: draft.prefix,
            path: draft.path,
        })
    }

    pub fn client_service_name(&self) -> &str {
        &self.client_service_name
    }

    pub fn server_service_name(&self) -> &str {
        &self.server_service_name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full node path in the coordination store.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ConfigParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.category, self.path)
    }
}

/// Join a prefix and a rendered template with exactly one separator.
/// The result is always absolute.
pub fn join_path(prefix: &str, rendered: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let rendered = rendered.trim_start_matches('/');
    match (prefix.is_empty(), prefix.starts_with('/')) {
        (true, _) => format!("/{rendered}"),
        (false, true) => format!("{prefix}/{rendered}"),
        (false, false) => format!("/{prefix}/{rendered}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/KitexConfig", "a/b"), "/KitexConfig/a/b");
        assert_eq!(join_path("/KitexConfig/", "/a/b"), "/KitexConfig/a/b");
        assert_eq!(join_path("", "a"), "/a");
        assert_eq!(join_path("cfg", "a"), "/cfg/a");
    }

    #[test]
    fn test_render_client_param() {
        let template = PathTemplate::parse(DEFAULT_CLIENT_TEMPLATE).unwrap();
        let param = ConfigParam::render(
            "orderSvc",
            "paymentSvc",
            Category::Retry,
            DEFAULT_PREFIX,
            &template,
            None,
        )
        .unwrap();
        assert_eq!(param.path(), "/KitexConfig/orderSvc/paymentSvc/retry");
        assert_eq!(param.category(), Category::Retry);
        assert_eq!(param.prefix(), "/KitexConfig");
    }

    #[test]
    fn test_hook_adjusts_path() {
        let template = PathTemplate::parse(DEFAULT_SERVER_TEMPLATE).unwrap();
        let hook: ParamHook = Arc::new(|draft: &mut ParamDraft| {
            draft.path = format!("{}/v2", draft.path);
        });
        let param = ConfigParam::render(
            "",
            "paymentSvc",
            Category::Limit,
            "/cfg",
            &template,
            Some(&hook),
        )
        .unwrap();
        assert_eq!(param.path(), "/cfg/paymentSvc/limit/v2");
    }
}
