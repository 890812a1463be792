//! NetSuite Infrastructure - Adapters and wiring
//!
//! This crate provides the reqwest implementation of the `HttpClient` port,
//! runner configuration, logging setup and a blocking entry point.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod runner;

pub use adapters::ReqwestHttpClient;
pub use config::{ConfigError, RunnerConfig, TransportConfig};
pub use runner::{ExecuteError, execute};
