//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::vultr::api::{ApiClient, ApiError, ApiFuture};

/// Records a single call made through [`ScriptedApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiCall {
    /// Request path relative to the API root.
    pub path: String,
    /// Form body for mutating calls; `None` for reads.
    pub form: Option<Vec<(String, String)>>,
}

impl ApiCall {
    /// Returns whether this call was a mutation.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        self.form.is_some()
    }

    /// Returns a form field by name, for assertions.
    #[must_use]
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form.as_ref().and_then(|fields| {
            fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        })
    }
}

/// Scripted API client that returns pre-seeded responses in FIFO order.
///
/// Used to drive deterministic convergence outcomes without a network.
#[derive(Clone, Debug, Default)]
pub struct ScriptedApi {
    responses: Arc<Mutex<VecDeque<Result<Value, ApiError>>>>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
}

impl ScriptedApi {
    /// Creates a new client with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful JSON response.
    pub fn push_response(&self, value: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Ok(value));
        }
    }

    /// Queues an error response.
    pub fn push_error(&self, error: ApiError) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(error));
        }
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Returns only the mutating calls recorded so far.
    #[must_use]
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(ApiCall::is_mutation)
            .collect()
    }

    fn record_and_pop(&self, call: ApiCall) -> Result<Value, ApiError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .unwrap_or_else(|| {
                Err(ApiError::Transport {
                    path: call.path,
                    message: String::from("no scripted response available"),
                })
            })
    }
}

impl ApiClient for ScriptedApi {
    fn query<'a>(&'a self, path: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            self.record_and_pop(ApiCall {
                path: path.to_owned(),
                form: None,
            })
        })
    }

    fn mutate<'a>(&'a self, path: &'a str, form: &'a [(String, String)]) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            self.record_and_pop(ApiCall {
                path: path.to_owned(),
                form: Some(form.to_vec()),
            })
        })
    }
}
