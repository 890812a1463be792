//! Suite and spec nodes

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use netsuite_domain::{AssertionError, HttpMethod, ValueKey};
use serde_json::Value;

use super::source::ValueSource;
use crate::response::Response;

/// The check a spec runs against its response.
pub type Assertion = Arc<dyn Fn(&Response<'_>) -> Result<(), AssertionError> + Send + Sync>;

/// How a suite schedules its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuiteMode {
    /// One child at a time, in declaration order.
    #[default]
    Sequential,
    /// All children at once, joined before the suite completes.
    Concurrent,
}

/// A named group of nodes contributing an endpoint segment, headers and
/// query parameters to every descendant.
#[derive(Debug, Clone)]
pub struct Suite {
    name: String,
    endpoint: ValueSource,
    mode: SuiteMode,
    headers: BTreeMap<String, ValueSource>,
    query: BTreeMap<String, ValueSource>,
    children: Vec<TestNode>,
}

impl Suite {
    /// Creates a sequential suite with no children.
    pub fn new(name: impl Into<String>, endpoint: impl Into<ValueSource>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            mode: SuiteMode::Sequential,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Runs the children concurrently.
    #[must_use]
    pub const fn concurrent(mut self) -> Self {
        self.mode = SuiteMode::Concurrent;
        self
    }

    /// Runs the children one after another (the default).
    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.mode = SuiteMode::Sequential;
        self
    }

    /// Adds a header inherited by every descendant.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<ValueSource>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter inherited by every descendant.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<ValueSource>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn child(mut self, node: impl Into<TestNode>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Name of the suite.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint segment appended to the parent path.
    #[must_use]
    pub const fn endpoint(&self) -> &ValueSource {
        &self.endpoint
    }

    /// Scheduling mode.
    #[must_use]
    pub const fn mode(&self) -> SuiteMode {
        self.mode
    }

    /// Own headers, before inheritance.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, ValueSource> {
        &self.headers
    }

    /// Own query parameters, before inheritance.
    #[must_use]
    pub const fn query_params(&self) -> &BTreeMap<String, ValueSource> {
        &self.query
    }

    /// Children in declaration order.
    #[must_use]
    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    /// Every spec below this suite with its name path relative to the suite.
    pub(crate) fn descendant_specs(&self) -> Vec<(Vec<String>, Arc<Spec>)> {
        let mut found = Vec::new();
        collect_specs(&self.children, &mut Vec::new(), &mut found);
        found
    }

    fn shape(&self) -> Value {
        let children = self.children.iter().map(TestNode::shape).collect();
        let mut object = serde_json::Map::new();
        object.insert(self.name.clone(), Value::Array(children));
        Value::Object(object)
    }
}

fn collect_specs(
    children: &[TestNode],
    prefix: &mut Vec<String>,
    found: &mut Vec<(Vec<String>, Arc<Spec>)>,
) {
    for child in children {
        prefix.push(child.name().to_string());
        match child {
            TestNode::Suite(suite) => collect_specs(&suite.children, prefix, found),
            TestNode::Spec(spec) => found.push((prefix.clone(), Arc::clone(spec))),
        }
        prefix.pop();
    }
}

/// A named leaf issuing one HTTP call and checking its response.
#[derive(Clone)]
pub struct Spec {
    name: String,
    endpoint: ValueSource,
    method: HttpMethod,
    body: Option<Vec<u8>>,
    headers: BTreeMap<String, ValueSource>,
    query: BTreeMap<String, ValueSource>,
    produces: Vec<String>,
    assertion: Assertion,
}

impl Spec {
    /// Creates a spec with no body, headers or query parameters.
    pub fn new<F>(
        name: impl Into<String>,
        endpoint: impl Into<ValueSource>,
        method: HttpMethod,
        assertion: F,
    ) -> Self
    where
        F: Fn(&Response<'_>) -> Result<(), AssertionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            method,
            body: None,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            produces: Vec::new(),
            assertion: Arc::new(assertion),
        }
    }

    /// Sets a raw request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a pretty-printed JSON body and a JSON `Content-Type` header.
    #[must_use]
    pub fn json(mut self, value: &Value) -> Self {
        let body = serde_json::to_vec_pretty(value).unwrap_or_else(|_| value.to_string().into_bytes());
        self.body = Some(body);
        self.header("Content-Type", "application/json")
    }

    /// Adds a header, overriding any inherited one with the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<ValueSource>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter, overriding any inherited one with the same name.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<ValueSource>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Declares that this spec's assertion parses `key`.
    ///
    /// If the key is still unresolved when the spec finishes, it is marked
    /// failed so dependents do not wait forever.
    #[must_use]
    pub fn produces<T>(mut self, key: ValueKey<T>) -> Self {
        self.produces.push(key.name().to_string());
        self
    }

    /// Name of the spec.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint segment appended to the parent path.
    #[must_use]
    pub const fn endpoint(&self) -> &ValueSource {
        &self.endpoint
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Request body, if any.
    #[must_use]
    pub fn request_body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Own headers, before inheritance.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, ValueSource> {
        &self.headers
    }

    /// Own query parameters, before inheritance.
    #[must_use]
    pub const fn query_params(&self) -> &BTreeMap<String, ValueSource> {
        &self.query
    }

    /// Keys this spec declared it produces.
    #[must_use]
    pub fn produced_keys(&self) -> &[String] {
        &self.produces
    }

    /// Runs the assertion against a response.
    ///
    /// # Errors
    ///
    /// Returns whatever the assertion rejects the response with.
    pub fn check(&self, response: &Response<'_>) -> Result<(), AssertionError> {
        (self.assertion)(response)
    }
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spec")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// A node of the test tree.
#[derive(Debug, Clone)]
pub enum TestNode {
    /// A group of nodes.
    Suite(Arc<Suite>),
    /// A leaf issuing one request.
    Spec(Arc<Spec>),
}

impl TestNode {
    /// Name of the node.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Suite(suite) => suite.name(),
            Self::Spec(spec) => spec.name(),
        }
    }

    fn shape(&self) -> Value {
        match self {
            Self::Suite(suite) => suite.shape(),
            Self::Spec(spec) => Value::String(spec.name.clone()),
        }
    }
}

impl From<Suite> for TestNode {
    fn from(suite: Suite) -> Self {
        Self::Suite(Arc::new(suite))
    }
}

impl From<Spec> for TestNode {
    fn from(spec: Spec) -> Self {
        Self::Spec(Arc::new(spec))
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape())
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::String(self.name.clone()))
    }
}

impl fmt::Display for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape())
    }
}
