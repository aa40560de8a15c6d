//! Provider-agnostic server lifecycle convergence.
//!
//! A concrete resource module implements [`ServerModule`] (fetch, create,
//! update, destroy); the convergence and wait helpers in this module drive it
//! from a declared intent to the matching remote state. Every convergence run
//! starts from scratch: the remote API is the sole source of truth and no
//! state persists across runs.

mod converge;
mod error;
mod wait;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

pub use converge::{Intent, Outcome, converge};
pub use error::LifecycleError;
pub use wait::{wait_for_state, wait_until_destroyed};

const SETTLE_DELAY: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const STATE_POLLS: usize = 500;
const DESTROY_POLLS: usize = 60;

/// Provider identifier for a server, normalized to a string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerId(String);

impl ServerId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for ServerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ServerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The remote provider's view of one server.
///
/// A record either exists (and has an identifier) or the server is absent;
/// there is no partial state. `raw` keeps the full API record so waits can
/// watch arbitrary fields and reporting can shape the output.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerRecord {
    /// Provider identifier.
    pub id: ServerId,
    /// Display label, the module's matching key.
    pub label: String,
    /// Full record as returned by the API.
    pub raw: Value,
}

impl ServerRecord {
    /// Builds a record from a raw API value; `None` when the identifier is
    /// missing, which callers treat as absent.
    #[must_use]
    pub fn from_raw(raw: Value) -> Option<Self> {
        let id = match raw.get("SUBID") {
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            Some(Value::Number(number)) => number.to_string(),
            _ => return None,
        };
        let label = raw
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Some(Self {
            id: ServerId::from(id),
            label,
            raw,
        })
    }

    /// Returns a named field of the raw record.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Returns a named field as a string slice.
    #[must_use]
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Returns the server's status field.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.field_str("status")
    }
}

/// Polling parameters for wait loops.
///
/// Timeouts are iteration counts against a fixed sleep interval, not
/// wall-clock bounds; the worst-case elapsed time approximates
/// `settle_delay + polls × poll_interval` plus per-request latency.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WaitPolicy {
    /// Delay before the first check, allowing remote-side propagation.
    pub settle_delay: Duration,
    /// Sleep between poll iterations.
    pub poll_interval: Duration,
    /// Maximum poll iterations while waiting for a field state.
    pub state_polls: usize,
    /// Maximum poll iterations while waiting for a destroyed server to
    /// disappear.
    pub destroy_polls: usize,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            poll_interval: POLL_INTERVAL,
            state_polls: STATE_POLLS,
            destroy_polls: DESTROY_POLLS,
        }
    }
}

impl WaitPolicy {
    /// Overrides the settle delay and poll interval.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_intervals(mut self, settle_delay: Duration, poll_interval: Duration) -> Self {
        self.settle_delay = settle_delay;
        self.poll_interval = poll_interval;
        self
    }

    /// Overrides the state-wait iteration budget.
    #[must_use]
    pub const fn with_state_polls(mut self, polls: usize) -> Self {
        self.state_polls = polls;
        self
    }

    /// Overrides the destroy-wait iteration budget.
    #[must_use]
    pub const fn with_destroy_polls(mut self, polls: usize) -> Self {
        self.destroy_polls = polls;
        self
    }
}

/// Result of an update pass over an existing server.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateOutcome {
    /// The server record after the update pass.
    pub record: ServerRecord,
    /// Whether any field drifted and an update call was (or, in check mode,
    /// would be) issued.
    pub changed: bool,
}

/// Future returned by module operations.
pub type ModuleFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LifecycleError>> + Send + 'a>>;

/// Capability methods a concrete resource module must provide.
///
/// The convergence functions own the state machine; a module only knows how
/// to read and mutate its own resource type.
pub trait ServerModule: Send {
    /// Display name used in messages, typically the spec label.
    fn display_name(&self) -> &str;

    /// Whether mutating calls are suppressed for this run.
    fn check_mode(&self) -> bool;

    /// Returns the current remote record, or `None` when absent.
    ///
    /// With `refresh` unset the module may reuse a record fetched earlier in
    /// the same call chain; with it set, a fresh remote query must be issued.
    fn fetch_server(&mut self, refresh: bool) -> ModuleFuture<'_, Option<ServerRecord>>;

    /// Creates the server from the spec and waits until it is ready.
    ///
    /// Returns `None` in check mode, where no mutating call is issued.
    fn create_server(&mut self) -> ModuleFuture<'_, Option<ServerRecord>>;

    /// Diffs the spec against the current record and applies drifted fields.
    ///
    /// `start_server` requests a power-on after successful updates.
    fn update_server(&mut self, start_server: bool) -> ModuleFuture<'_, UpdateOutcome>;

    /// Issues the destroy call for the given server.
    fn destroy_server<'a>(&'a mut self, id: &'a ServerId) -> ModuleFuture<'a, ()>;
}

#[cfg(test)]
mod tests;
