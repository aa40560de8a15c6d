//! Thin HTTP client for the Vultr v1 API.
//!
//! Reads are `GET {endpoint}/v1/{path}`; mutations are form-encoded `POST`
//! requests. Some mutating endpoints return an empty body on success, which
//! is surfaced as [`Value::Null`]. Transport and API errors are not retried
//! at this layer; they propagate and abort the current run.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::config::VultrConfig;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised by the API client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the request could not be sent or the response not read.
    #[error("transport error for {path}: {message}")]
    Transport {
        /// Request path relative to the API root.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("api returned status {status} for {path}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request path relative to the API root.
        path: String,
        /// Response body, decoded lossily.
        message: String,
    },
    /// Raised when a response body is not valid JSON.
    #[error("failed to parse response for {path}: {message}")]
    Parse {
        /// Request path relative to the API root.
        path: String,
        /// Parser error message.
        message: String,
    },
}

/// Future returned by API client operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Minimal interface to the provider API: one read shape, one write shape.
pub trait ApiClient: Send + Sync {
    /// Issues a read request. Query parameters are carried in `path`.
    fn query<'a>(&'a self, path: &'a str) -> ApiFuture<'a, Value>;

    /// Issues a mutating request with a form-encoded body.
    fn mutate<'a>(&'a self, path: &'a str, form: &'a [(String, String)]) -> ApiFuture<'a, Value>;
}

/// API client backed by `reqwest`, authenticating with an `API-Key` header.
#[derive(Clone, Debug)]
pub struct HttpApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpApiClient {
    /// Constructs a client from configuration.
    #[must_use]
    pub fn new(config: &VultrConfig) -> Self {
        let timeout = config
            .api_timeout_secs
            .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: config.api_endpoint.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.endpoint)
    }

    async fn read_body(
        path: &str,
        response: reqwest::Response,
    ) -> Result<Value, ApiError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport {
                path: path.to_owned(),
                message: err.to_string(),
            })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_owned(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|err| ApiError::Parse {
            path: path.to_owned(),
            message: err.to_string(),
        })
    }
}

impl ApiClient for HttpApiClient {
    fn query<'a>(&'a self, path: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url_for(path))
                .header("API-Key", &self.api_key)
                .send()
                .await
                .map_err(|err| ApiError::Transport {
                    path: path.to_owned(),
                    message: err.to_string(),
                })?;
            Self::read_body(path, response).await
        })
    }

    fn mutate<'a>(&'a self, path: &'a str, form: &'a [(String, String)]) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url_for(path))
                .header("API-Key", &self.api_key)
                .form(form)
                .send()
                .await
                .map_err(|err| ApiError::Transport {
                    path: path.to_owned(),
                    message: err.to_string(),
                })?;
            Self::read_body(path, response).await
        })
    }
}
