//! Inherited context resolution
//!
//! A node's effective endpoint, headers and query parameters come from the
//! chain of enclosing suites. Raw entries are merged root to node, deeper
//! entries replacing shallower ones, and only then are dependent values
//! awaited.

use std::collections::BTreeMap;
use std::sync::Arc;

use netsuite_domain::{RequestSpec, SpecError, ValueStatus};

use crate::dependency::DependencyCoordinator;
use crate::tree::{Spec, Suite, ValueSource};

/// A suite whose context has been resolved, linked to its enclosing scope.
#[derive(Debug)]
pub struct Scope {
    parent: Option<Arc<Scope>>,
    suite: Arc<Suite>,
    base_path: String,
}

impl Scope {
    /// Creates a scope for `suite` resolved to `base_path`.
    #[must_use]
    pub const fn new(parent: Option<Arc<Self>>, suite: Arc<Suite>, base_path: String) -> Self {
        Self {
            parent,
            suite,
            base_path,
        }
    }

    /// The resolved path of the suite.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Enclosing suites from the root down to this one.
    #[must_use]
    pub fn chain(&self) -> Vec<&Suite> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            chain.push(scope.suite.as_ref());
            current = scope.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Name path from the root down to this suite.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.chain()
            .into_iter()
            .map(|suite| suite.name().to_string())
            .collect()
    }
}

/// The raw, unresolved context a node contributes.
#[derive(Debug, Clone, Copy)]
pub struct NodeEntries<'a> {
    endpoint: &'a ValueSource,
    headers: &'a BTreeMap<String, ValueSource>,
    query: &'a BTreeMap<String, ValueSource>,
}

impl<'a> From<&'a Suite> for NodeEntries<'a> {
    fn from(suite: &'a Suite) -> Self {
        Self {
            endpoint: suite.endpoint(),
            headers: suite.headers(),
            query: suite.query_params(),
        }
    }
}

impl<'a> From<&'a Spec> for NodeEntries<'a> {
    fn from(spec: &'a Spec) -> Self {
        Self {
            endpoint: spec.endpoint(),
            headers: spec.headers(),
            query: spec.query_params(),
        }
    }
}

/// Fully resolved context of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Parent path joined with the node's endpoint segment.
    pub base_path: String,
    /// Merged and resolved headers.
    pub headers: BTreeMap<String, String>,
    /// Merged and resolved query parameters.
    pub query: BTreeMap<String, String>,
}

impl ExecutionContext {
    /// Resolves the context of a node below `scope`, or directly below
    /// `root_path` when there is no enclosing suite.
    ///
    /// Waits until every dependent value involved has left `Waiting`.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::DependencyFailed` naming every key that failed,
    /// across the endpoint, headers and query parameters.
    pub async fn resolve(
        coordinator: &DependencyCoordinator,
        scope: Option<&Scope>,
        root_path: &str,
        node: NodeEntries<'_>,
    ) -> Result<Self, SpecError> {
        let chain = scope.map(Scope::chain).unwrap_or_default();

        let mut raw_headers = BTreeMap::new();
        let mut raw_query = BTreeMap::new();
        let layers = chain
            .iter()
            .map(|suite| NodeEntries::from(*suite))
            .chain(std::iter::once(node));
        for layer in layers {
            for (name, source) in layer.headers {
                raw_headers.retain(|inherited: &&String, _| !inherited.eq_ignore_ascii_case(name));
                raw_headers.insert(name, source);
            }
            raw_query.extend(layer.query.iter());
        }

        let mut failed = Vec::new();
        let endpoint = resolve_source(coordinator, node.endpoint, &mut failed).await;
        let headers = resolve_map(coordinator, raw_headers, &mut failed).await;
        let query = resolve_map(coordinator, raw_query, &mut failed).await;

        if !failed.is_empty() {
            return Err(SpecError::DependencyFailed { keys: failed });
        }

        let parent_path = scope.map_or(root_path, Scope::base_path);
        Ok(Self {
            base_path: RequestSpec::join_path(parent_path, &endpoint.unwrap_or_default()),
            headers,
            query,
        })
    }
}

async fn resolve_map(
    coordinator: &DependencyCoordinator,
    raw: BTreeMap<&String, &ValueSource>,
    failed: &mut Vec<String>,
) -> BTreeMap<String, String> {
    let mut resolved = BTreeMap::new();
    for (name, source) in raw {
        if let Some(value) = resolve_source(coordinator, source, failed).await {
            resolved.insert(name.clone(), value);
        }
    }
    resolved
}

async fn resolve_source(
    coordinator: &DependencyCoordinator,
    source: &ValueSource,
    failed: &mut Vec<String>,
) -> Option<String> {
    match source {
        ValueSource::Literal(value) => Some(value.clone()),
        ValueSource::Dependent(dependent) => {
            let handle =
                coordinator.get_or_create_with(dependent.key(), dependent.translate().cloned());
            if let ValueStatus::Parsed(_) = handle.resolved().await
                && let Ok(value) = coordinator.string(&handle)
            {
                return Some(value);
            }
            if !failed.iter().any(|key| key == dependent.key()) {
                failed.push(dependent.key().to_string());
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;
    use netsuite_domain::{AssertionError, HttpMethod, ValueKey};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const USER_ID: ValueKey<i64> = ValueKey::new("UserId");
    const TOKEN: ValueKey<String> = ValueKey::new("Token");

    fn spec(endpoint: impl Into<ValueSource>) -> Spec {
        Spec::new("spec", endpoint, HttpMethod::Get, |_: &Response<'_>| {
            Ok::<(), AssertionError>(())
        })
    }

    fn scope_for(suites: Vec<Suite>, root: &str) -> Option<Arc<Scope>> {
        let mut scope: Option<Arc<Scope>> = None;
        let mut path = root.to_string();
        for suite in suites {
            if let ValueSource::Literal(segment) = suite.endpoint() {
                path = RequestSpec::join_path(&path, segment);
            }
            scope = Some(Arc::new(Scope::new(scope, Arc::new(suite), path.clone())));
        }
        scope
    }

    #[tokio::test]
    async fn test_child_entries_win_over_ancestors() {
        let coordinator = DependencyCoordinator::new();
        let scope = scope_for(
            vec![
                Suite::new("Root", "api")
                    .header("Accept", "text/plain")
                    .header("X-Root", "1")
                    .query("page", "1"),
                Suite::new("Users", "users").header("Accept", "application/json"),
            ],
            "http://host",
        );
        let spec = spec("42").query("page", "2").header("X-Spec", "yes");

        let context =
            ExecutionContext::resolve(&coordinator, scope.as_deref(), "http://host", (&spec).into())
                .await;

        let expected = ExecutionContext {
            base_path: "http://host/api/users/42".to_string(),
            headers: BTreeMap::from([
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Root".to_string(), "1".to_string()),
                ("X-Spec".to_string(), "yes".to_string()),
            ]),
            query: BTreeMap::from([("page".to_string(), "2".to_string())]),
        };
        assert_eq!(context, Ok(expected));
    }

    #[tokio::test]
    async fn test_header_names_merge_case_insensitively() {
        let coordinator = DependencyCoordinator::new();
        let scope = scope_for(
            vec![Suite::new("Root", "").header("Accept", "text/plain").header("X-Trace", "1")],
            "http://host",
        );
        let spec = spec("").header("accept", "application/json");

        let context =
            ExecutionContext::resolve(&coordinator, scope.as_deref(), "http://host", (&spec).into())
                .await
                .map(|context| context.headers);

        assert_eq!(
            context,
            Ok(BTreeMap::from([
                ("X-Trace".to_string(), "1".to_string()),
                ("accept".to_string(), "application/json".to_string()),
            ]))
        );
    }

    #[tokio::test]
    async fn test_dependent_values_are_awaited_and_translated() {
        let coordinator = Arc::new(DependencyCoordinator::new());
        let spec = spec(USER_ID).header(
            "Authorization",
            ValueSource::dependent_with(TOKEN, |value: &serde_json::Value| {
                format!("Bearer {}", value.as_str().unwrap_or_default())
            }),
        );

        let producer = Arc::clone(&coordinator);
        let resolving = tokio::spawn(async move {
            ExecutionContext::resolve(&coordinator, None, "http://host/users", (&spec).into()).await
        });
        tokio::task::yield_now().await;
        producer.parse(USER_ID, json!(42)).ok();
        producer.parse(TOKEN, json!("abc")).ok();

        let context = resolving.await.ok().and_then(Result::ok);
        let context = context.unwrap_or_default();
        assert_eq!(context.base_path, "http://host/users/42");
        assert_eq!(
            context.headers.get("Authorization").map(String::as_str),
            Some("Bearer abc")
        );
    }

    #[tokio::test]
    async fn test_all_failed_keys_are_reported() {
        let coordinator = DependencyCoordinator::new();
        coordinator.fail_pending("UserId");
        coordinator.fail_pending("Token");
        let spec = spec(USER_ID).header("Authorization", TOKEN).query("id", USER_ID);

        let context =
            ExecutionContext::resolve(&coordinator, None, "http://host", (&spec).into()).await;
        assert_eq!(
            context,
            Err(SpecError::DependencyFailed {
                keys: vec!["UserId".to_string(), "Token".to_string()]
            })
        );
    }

    #[test]
    fn test_scope_names_run_root_to_leaf() {
        let scope = scope_for(
            vec![Suite::new("Root", ""), Suite::new("Users", "users")],
            "http://host",
        );
        assert_eq!(
            scope.map(|s| s.names()),
            Some(vec!["Root".to_string(), "Users".to_string()])
        );
    }
}
