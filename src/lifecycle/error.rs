//! Error types for lifecycle convergence.

use thiserror::Error;

use crate::user_data::UserDataError;
use crate::vultr::api::ApiError;
use crate::vultr::catalog::CatalogError;

/// Errors raised while converging a server.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LifecycleError {
    /// Raised when a waited-for field never reached the expected value
    /// within the iteration budget.
    #[error("wait for '{key}'{} timed out", target_suffix(.state.as_deref()))]
    WaitTimeout {
        /// Record field being watched.
        key: String,
        /// Expected state, when one was named.
        state: Option<String>,
    },
    /// Raised when a destroyed server is still present after the poll
    /// budget.
    #[error("wait for server '{label}' to get deleted timed out")]
    DestroyTimeout {
        /// Display label of the server.
        label: String,
    },
    /// Raised when a remote record is missing required fields.
    #[error("invalid server record: {message}")]
    InvalidRecord {
        /// Description of the defect.
        message: String,
    },
    /// Raised when the spec is missing a field an operation needs.
    #[error("invalid server spec: {0}")]
    Validation(String),
    /// Raised when a catalog reference fails to resolve.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Raised when an API call fails.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Raised when a user-data payload cannot be decoded.
    #[error(transparent)]
    UserData(#[from] UserDataError),
}

fn target_suffix(state: Option<&str>) -> String {
    state.map_or_else(String::new, |expected| {
        format!(" to get into state '{expected}'")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_timeout_names_field_and_state() {
        let err = LifecycleError::WaitTimeout {
            key: String::from("status"),
            state: Some(String::from("active")),
        };
        assert_eq!(
            err.to_string(),
            "wait for 'status' to get into state 'active' timed out"
        );
    }

    #[test]
    fn wait_timeout_without_state_names_field_only() {
        let err = LifecycleError::WaitTimeout {
            key: String::from("main_ip"),
            state: None,
        };
        assert_eq!(err.to_string(), "wait for 'main_ip' timed out");
    }
}
