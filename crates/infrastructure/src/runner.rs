//! Blocking entry point wiring configuration, transport and runner

use std::sync::Arc;

use netsuite_application::{HttpClientError, RunError, Runner, Suite};
use netsuite_domain::ResultTree;
use thiserror::Error;
use tracing::info;

use crate::adapters::ReqwestHttpClient;
use crate::config::{ConfigError, RunnerConfig};

/// Errors from [`execute`].
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] HttpClientError),

    /// The run was aborted.
    #[error(transparent)]
    Run(#[from] RunError),
}

/// Runs `root` against the configured base URL with a reqwest client,
/// blocking until every spec has finished.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the client cannot be
/// built or the run hits a structural error.
pub fn execute(root: impl Into<Arc<Suite>>, config: &RunnerConfig) -> Result<ResultTree, ExecuteError> {
    config.validate()?;
    let client = ReqwestHttpClient::from_config(&config.transport)?;
    let results = Runner::new(client).run_blocking(root, &config.base_url)?;
    info!(
        passed = results.passed_count(),
        failed = results.failed_count(),
        "results ready"
    );
    Ok(results)
}
