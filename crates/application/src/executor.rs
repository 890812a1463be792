//! Tree execution
//!
//! The runner walks the tree with one task per concurrent child. Suites
//! resolve their context first and then drive their children according to
//! their mode; specs resolve their context, issue exactly one request and
//! run their assertion. Outcomes go into a shared result tree behind a
//! single lock.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;

use netsuite_domain::{AssertionError, DomainError, Failure, Outcome, RequestSpec, ResultTree, SpecError};
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::context::{ExecutionContext, NodeEntries, Scope};
use crate::dependency::DependencyCoordinator;
use crate::error::{RunError, RunResult};
use crate::ports::HttpClient;
use crate::response::Response;
use crate::tree::{Spec, Suite, SuiteMode, TestNode, validate};

type NodeFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs test trees against an HTTP client.
#[derive(Debug)]
pub struct Runner<C> {
    client: Arc<C>,
}

impl<C> Clone for Runner<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: HttpClient + 'static> Runner<C> {
    /// Creates a runner over the given client.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Runs the tree rooted at `root` against `base_url`.
    ///
    /// Each run gets its own dependency registry and result tree. Spec
    /// failures are recorded in the returned tree; only structural errors
    /// abort the run.
    ///
    /// # Errors
    ///
    /// Returns `RunError::InvalidBaseUrl` for a non-http(s) base URL,
    /// `RunError::Domain` for duplicate names and `RunError::Coordinator`
    /// if a value was resolved twice.
    pub async fn run(&self, root: impl Into<Arc<Suite>>, base_url: &str) -> RunResult<ResultTree> {
        let root = root.into();
        validate(&root)?;
        check_base_url(base_url)?;

        let run_id = Uuid::now_v7();
        let span = info_span!("run", %run_id);
        let execution = Arc::new(Execution {
            client: Arc::clone(&self.client),
            coordinator: DependencyCoordinator::new(),
            results: Mutex::new(ResultTree::new()),
            fatal: Mutex::new(None),
            base_url: base_url.to_string(),
        });

        async {
            info!(suite = root.name(), base_url, "run started");
            run_node(Arc::clone(&execution), None, TestNode::Suite(root)).await;
        }
        .instrument(span.clone())
        .await;

        if let Some(err) = execution.fatal() {
            return Err(err);
        }
        let results = std::mem::take(&mut *execution.results.lock());
        span.in_scope(|| {
            info!(
                passed = results.passed_count(),
                failed = results.failed_count(),
                "run finished"
            );
        });
        Ok(results)
    }

    /// Runs the tree on a fresh multi-threaded runtime, blocking the caller.
    ///
    /// Must not be called from inside an async context.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Runtime` if the runtime cannot be built, otherwise
    /// the same errors as [`run`](Self::run).
    pub fn run_blocking(&self, root: impl Into<Arc<Suite>>, base_url: &str) -> RunResult<ResultTree> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| RunError::Runtime(e.to_string()))?;
        runtime.block_on(self.run(root, base_url))
    }
}

fn check_base_url(base_url: &str) -> RunResult<()> {
    let url = Url::parse(base_url).map_err(|e| RunError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
    if matches!(url.scheme(), "http" | "https") && url.has_host() {
        Ok(())
    } else {
        Err(RunError::InvalidBaseUrl(base_url.to_string()))
    }
}

struct Execution<C> {
    client: Arc<C>,
    coordinator: DependencyCoordinator,
    results: Mutex<ResultTree>,
    fatal: Mutex<Option<RunError>>,
    base_url: String,
}

impl<C: HttpClient + 'static> Execution<C> {
    fn fatal(&self) -> Option<RunError> {
        self.fatal
            .lock()
            .clone()
            .or_else(|| self.coordinator.fatal().map(RunError::from))
    }

    fn aborted(&self) -> bool {
        self.fatal().is_some()
    }

    fn record_fatal(&self, err: RunError) {
        error!(error = %err, "run aborted");
        self.fatal.lock().get_or_insert(err);
    }

    /// Fails the produced keys of a node that will not run.
    fn skip(&self, node: &TestNode) {
        let specs = match node {
            TestNode::Suite(suite) => suite
                .descendant_specs()
                .into_iter()
                .map(|(_, spec)| spec)
                .collect(),
            TestNode::Spec(spec) => vec![Arc::clone(spec)],
        };
        for spec in specs {
            for key in spec.produced_keys() {
                self.coordinator.fail_pending(key);
            }
        }
    }

    /// Inserts a spec outcome, logs the progress line and releases the
    /// spec's unresolved produced keys.
    fn record(&self, path: &[String], spec: &Spec, outcome: Outcome) {
        let line = outcome.progress_line(path);
        if outcome.is_pass() {
            info!("{line}");
        } else {
            warn!("{line}");
        }

        let inserted = self.results.lock().insert(path, outcome);
        if let Err(err) = inserted {
            self.record_fatal(err.into());
        }

        for key in spec.produced_keys() {
            if self.coordinator.fail_pending(key) {
                warn!(key = %key, spec = %path.join(" > "), "spec finished without producing value");
            }
        }
    }

    async fn call(&self, spec: &Spec, context: ExecutionContext) -> Outcome {
        let url = match RequestSpec::build_url(&context.base_path, &context.query) {
            Ok(url) => url,
            Err(DomainError::InvalidUrl(message)) => {
                return Outcome::fail(Failure::new(SpecError::InvalidUrl(message)));
            }
            Err(err) => return Outcome::fail(Failure::new(SpecError::InvalidUrl(err.to_string()))),
        };
        let request = RequestSpec::new(spec.method(), url)
            .with_headers(context.headers)
            .with_body(spec.request_body().map(<[u8]>::to_vec));

        debug!(method = %request.method, url = %request.url, "sending request");
        match self.client.execute(&request).await {
            Err(err) => {
                Outcome::fail(Failure::new(SpecError::Transport(err.to_string())).with_request(request))
            }
            Ok(response) => {
                debug!(status = response.status, "response received");
                let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
                    spec.check(&Response::new(&response, &self.coordinator))
                }))
                .unwrap_or_else(|payload| Err(assertion_panicked(payload.as_ref())));
                match verdict {
                    Ok(()) => Outcome::Pass,
                    Err(err) => Outcome::fail(
                        Failure::new(err.into())
                            .with_request(request)
                            .with_response(response),
                    ),
                }
            }
        }
    }
}

fn assertion_panicked(payload: &(dyn Any + Send)) -> AssertionError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    AssertionError::custom(format!("assertion panicked: {message}"))
}

fn run_node<C: HttpClient + 'static>(
    execution: Arc<Execution<C>>,
    scope: Option<Arc<Scope>>,
    node: TestNode,
) -> NodeFuture {
    Box::pin(async move {
        if execution.aborted() {
            execution.skip(&node);
            return;
        }
        match node {
            TestNode::Suite(suite) => run_suite(execution, scope, suite).await,
            TestNode::Spec(spec) => run_spec(execution, scope, spec).await,
        }
    })
}

async fn run_suite<C: HttpClient + 'static>(
    execution: Arc<Execution<C>>,
    scope: Option<Arc<Scope>>,
    suite: Arc<Suite>,
) {
    let resolved = ExecutionContext::resolve(
        &execution.coordinator,
        scope.as_deref(),
        &execution.base_url,
        NodeEntries::from(&*suite),
    )
    .await;

    let context = match resolved {
        Ok(context) => context,
        Err(err) => {
            let mut prefix = scope.as_deref().map(Scope::names).unwrap_or_default();
            prefix.push(suite.name().to_string());
            for (relative, spec) in suite.descendant_specs() {
                let mut path = prefix.clone();
                path.extend(relative);
                execution.record(&path, &spec, Outcome::fail(Failure::new(err.clone())));
            }
            return;
        }
    };

    debug!(suite = suite.name(), path = %context.base_path, "suite context resolved");
    let scope = Arc::new(Scope::new(scope, Arc::clone(&suite), context.base_path));
    match suite.mode() {
        SuiteMode::Sequential => {
            for child in suite.children() {
                run_node(Arc::clone(&execution), Some(Arc::clone(&scope)), child.clone()).await;
            }
        }
        SuiteMode::Concurrent => {
            let mut tasks = JoinSet::new();
            for child in suite.children() {
                let task = run_node(Arc::clone(&execution), Some(Arc::clone(&scope)), child.clone());
                tasks.spawn(task.in_current_span());
            }
            while let Some(joined) = tasks.join_next().await {
                if let Err(err) = joined {
                    execution.record_fatal(RunError::Runtime(err.to_string()));
                    for child in suite.children() {
                        execution.skip(child);
                    }
                }
            }
        }
    }
}

async fn run_spec<C: HttpClient + 'static>(
    execution: Arc<Execution<C>>,
    scope: Option<Arc<Scope>>,
    spec: Arc<Spec>,
) {
    let mut path = scope.as_deref().map(Scope::names).unwrap_or_default();
    path.push(spec.name().to_string());

    let resolved = ExecutionContext::resolve(
        &execution.coordinator,
        scope.as_deref(),
        &execution.base_url,
        NodeEntries::from(&*spec),
    )
    .await;

    let outcome = match resolved {
        Ok(context) => execution.call(&spec, context).await,
        Err(err) => Outcome::fail(Failure::new(err)),
    };
    execution.record(&path, &spec, outcome);
}
