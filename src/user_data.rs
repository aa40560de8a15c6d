//! User-data resolution and transport encoding.
//!
//! User-data can be provided either inline or via a file path. This module
//! centralises the branching and file loading logic, and carries the base64
//! transport encoding the provider API expects: the payload is encoded before
//! transmission and decoded by the remote side, so round-trip fidelity for
//! arbitrary byte content is a hard requirement.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

/// Errors raised while resolving or decoding user-data.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum UserDataError {
    /// Raised when both inline and file sources are provided.
    #[error("user-data cannot be provided both inline and via file")]
    BothProvided,
    /// Raised when an inline payload is empty or only whitespace.
    #[error("user-data must not be empty")]
    InlineEmpty,
    /// Raised when a file path is empty or only whitespace.
    #[error("user-data file path must not be empty")]
    FilePathEmpty,
    /// Raised when a file resolves to empty or only whitespace.
    #[error("user-data file must not be empty")]
    FileEmpty,
    /// Raised when reading the file source fails.
    #[error("failed to read user-data file `{path}`: {message}")]
    FileRead {
        /// Expanded path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when a remote payload is not valid base64.
    #[error("failed to decode user-data: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

/// Encodes a user-data payload for transmission to the provider API.
#[must_use]
pub fn encode(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

/// Decodes a payload previously produced by [`encode`] (or returned by the
/// provider's get-user-data endpoint).
///
/// # Errors
///
/// Returns [`UserDataError::Decode`] when the input is not valid base64.
pub fn decode(encoded: &str) -> Result<Vec<u8>, UserDataError> {
    STANDARD
        .decode(encoded)
        .map_err(|err| UserDataError::Decode {
            message: err.to_string(),
        })
}

/// Resolves user-data from either an inline value or a file.
///
/// Inline and file sources are mutually exclusive. Both values are trimmed
/// for emptiness checks, but the returned payload preserves the original
/// content.
///
/// # Errors
///
/// Returns [`UserDataError`] when the inputs are invalid or the file cannot
/// be read.
pub fn resolve_user_data(
    inline: Option<&str>,
    file: Option<&str>,
) -> Result<Option<String>, UserDataError> {
    if inline.is_some() && file.is_some() {
        return Err(UserDataError::BothProvided);
    }

    if let Some(payload) = inline {
        validate_payload(payload)?;
        return Ok(Some(payload.to_owned()));
    }

    let Some(path) = file else {
        return Ok(None);
    };

    if path.trim().is_empty() {
        return Err(UserDataError::FilePathEmpty);
    }

    let expanded = expand_tilde(path);
    let content = read_to_string_ambient(&expanded).map_err(|message| UserDataError::FileRead {
        path: expanded.clone(),
        message,
    })?;

    validate_payload(&content).map_err(|err| match err {
        UserDataError::InlineEmpty => UserDataError::FileEmpty,
        other => other,
    })?;

    Ok(Some(content))
}

/// Validates that a user-data payload is not empty/whitespace.
fn validate_payload(payload: &str) -> Result<(), UserDataError> {
    if payload.trim().is_empty() {
        return Err(UserDataError::InlineEmpty);
    }
    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

fn read_to_string_ambient(path: &str) -> Result<String, String> {
    let path_buf = Utf8Path::new(path);

    let (dir_path, file_path) = if path_buf.is_absolute() {
        let parent = path_buf
            .parent()
            .ok_or_else(|| format!("path has no parent directory: {path_buf}"))?;
        let file_name = path_buf
            .file_name()
            .ok_or_else(|| format!("path has no file name: {path_buf}"))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path_buf)
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}
