//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Every request is sent exactly once; retries and cancellation are not
//! attempted here.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use netsuite_application::ports::{HttpClient, HttpClientError};
use netsuite_domain::{HttpMethod, RequestSpec, ResponseSpec};
use reqwest::{Client, Method, Url};
use tracing::debug;

use crate::config::TransportConfig;

/// HTTP client implementation using reqwest.
///
/// Wraps a `reqwest::Client` built from a [`TransportConfig`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    timeout_ms: u64,
    max_redirects: usize,
}

impl ReqwestHttpClient {
    /// Creates a client with the default transport settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        Self::from_config(&TransportConfig::default())
    }

    /// Creates a client from transport settings.
    ///
    /// `accept_invalid_certs` disables certificate verification entirely
    /// and is meant for test servers with self-signed certificates.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn from_config(config: &TransportConfig) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: config.timeout_ms,
            max_redirects: config.max_redirects,
        })
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to the port's `HttpClientError`.
    fn map_error(&self, error: &reqwest::Error) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: self.timeout_ms,
            };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return HttpClientError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lowered.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return HttpClientError::TooManyRedirects {
                max: self.max_redirects,
            };
        }

        HttpClientError::Other(error.to_string())
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
        let method = request.method;
        let url = request.url.clone();
        let headers = request.headers.clone();
        let body = request.body.clone();

        async move {
            let parsed_url =
                Url::parse(&url).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {url}")))?;

            let start = Instant::now();

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(method), parsed_url);
            for (name, value) in &headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(|e| self.map_error(&e))?;

            let duration = start.elapsed();
            let status = response.status().as_u16();
            debug!(%method, %url, status, ?duration, "response received");

            let response_headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();

            let body_bytes = response
                .bytes()
                .await
                .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?
                .to_vec();

            Ok(ResponseSpec::new(status, response_headers, body_bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_reqwest_method() {
        let expected = [
            (HttpMethod::Get, Method::GET),
            (HttpMethod::Post, Method::POST),
            (HttpMethod::Put, Method::PUT),
            (HttpMethod::Patch, Method::PATCH),
            (HttpMethod::Delete, Method::DELETE),
            (HttpMethod::Head, Method::HEAD),
            (HttpMethod::Options, Method::OPTIONS),
        ];
        for (method, reqwest_method) in expected {
            assert_eq!(ReqwestHttpClient::to_reqwest_method(method), reqwest_method);
        }
    }

    #[test]
    fn test_client_creation() {
        assert!(ReqwestHttpClient::new().is_ok());
    }

    #[test]
    fn test_client_from_config() {
        let config = TransportConfig {
            timeout_ms: 500,
            max_redirects: 2,
            accept_invalid_certs: true,
            ..TransportConfig::default()
        };
        let client = ReqwestHttpClient::from_config(&config).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(client.timeout_ms, 500);
        assert_eq!(client.max_redirects, 2);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let client = ReqwestHttpClient::new().unwrap_or_else(|e| panic!("{e}"));
        let request = RequestSpec::new(HttpMethod::Get, "not a url");
        let result = client.execute(&request).await;
        assert!(matches!(result, Err(HttpClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_connection_failure_maps_to_transport_error() {
        let config = TransportConfig {
            timeout_ms: 2_000,
            ..TransportConfig::default()
        };
        let client = ReqwestHttpClient::from_config(&config).unwrap_or_else(|e| panic!("{e}"));
        let request = RequestSpec::new(HttpMethod::Get, "http://127.0.0.1:9/");
        let result = client.execute(&request).await;
        assert!(matches!(
            result,
            Err(HttpClientError::ConnectionRefused { .. }
                | HttpClientError::ConnectionFailed(_)
                | HttpClientError::Timeout { .. })
        ));
    }
}
