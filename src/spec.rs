//! Declarative description of a desired server.
//!
//! A [`ServerSpec`] captures everything the caller wants to be true about a
//! single server: its label, the catalog references it should be built from,
//! and the user-data payload it should boot with. The spec is immutable for
//! the duration of one convergence run.

use thiserror::Error;

use crate::lifecycle::Intent;

/// Desired configuration for a single server.
///
/// Catalog references (`region`, `os`, `plan`, SSH keys, startup script) are
/// human-readable names; the concrete module resolves them to provider
/// identifiers before issuing any mutating call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerSpec {
    /// Label used as the server's identity when matching remote records.
    pub name: String,
    /// Region name (for example `New Jersey`).
    pub region: String,
    /// Operating system name (for example `Ubuntu 24.04 x64`).
    pub os: String,
    /// Plan name describing the server size.
    pub plan: String,
    /// Names of SSH keys to install. May be empty.
    pub ssh_keys: Vec<String>,
    /// Optional startup script name.
    pub startup_script: Option<String>,
    /// Optional tag applied to the server.
    pub tag: Option<String>,
    /// Optional user-data payload, stored as the raw (unencoded) text.
    pub user_data: Option<String>,
}

impl ServerSpec {
    /// Starts a builder for a [`ServerSpec`].
    #[must_use]
    pub fn builder() -> ServerSpecBuilder {
        ServerSpecBuilder::new()
    }

    /// Validates the spec for a given convergence intent.
    ///
    /// The label is always required. Catalog references are only required
    /// when the intent is `present`; deleting a server needs nothing beyond
    /// its identity.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingField`] naming the first empty field.
    pub fn validate_for(&self, intent: Intent) -> Result<(), SpecError> {
        if self.name.is_empty() {
            return Err(SpecError::MissingField("name".to_owned()));
        }
        if intent == Intent::Absent {
            return Ok(());
        }
        if self.region.is_empty() {
            return Err(SpecError::MissingField("region".to_owned()));
        }
        if self.os.is_empty() {
            return Err(SpecError::MissingField("os".to_owned()));
        }
        if self.plan.is_empty() {
            return Err(SpecError::MissingField("plan".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`ServerSpec`] that trims string inputs on build.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServerSpecBuilder {
    name: String,
    region: String,
    os: String,
    plan: String,
    ssh_keys: Vec<String>,
    startup_script: Option<String>,
    tag: Option<String>,
    user_data: Option<String>,
}

impl ServerSpecBuilder {
    /// Creates an empty builder; `name` must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server label.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = value.into();
        self
    }

    /// Sets the region name.
    #[must_use]
    pub fn region(mut self, value: impl Into<String>) -> Self {
        self.region = value.into();
        self
    }

    /// Sets the operating system name.
    #[must_use]
    pub fn os(mut self, value: impl Into<String>) -> Self {
        self.os = value.into();
        self
    }

    /// Sets the plan name.
    #[must_use]
    pub fn plan(mut self, value: impl Into<String>) -> Self {
        self.plan = value.into();
        self
    }

    /// Sets the SSH key names.
    #[must_use]
    pub fn ssh_keys(mut self, value: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ssh_keys = value.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the optional startup script name.
    #[must_use]
    pub fn startup_script(mut self, value: Option<String>) -> Self {
        self.startup_script = value;
        self
    }

    /// Sets the optional tag.
    #[must_use]
    pub fn tag(mut self, value: Option<String>) -> Self {
        self.tag = value;
        self
    }

    /// Sets the optional user-data payload (raw text, not yet encoded).
    #[must_use]
    pub fn user_data(mut self, value: Option<String>) -> Self {
        self.user_data = value;
        self
    }

    /// Builds the [`ServerSpec`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingField`] when the label is empty.
    pub fn build(self) -> Result<ServerSpec, SpecError> {
        let spec = ServerSpec {
            name: self.name.trim().to_owned(),
            region: self.region.trim().to_owned(),
            os: self.os.trim().to_owned(),
            plan: self.plan.trim().to_owned(),
            ssh_keys: self
                .ssh_keys
                .into_iter()
                .map(|key| key.trim().to_owned())
                .filter(|key| !key.is_empty())
                .collect(),
            startup_script: self.startup_script.map(|value| value.trim().to_owned()),
            tag: self.tag.map(|value| value.trim().to_owned()),
            user_data: self.user_data,
        };
        if spec.name.is_empty() {
            return Err(SpecError::MissingField("name".to_owned()));
        }
        Ok(spec)
    }
}

/// Errors raised while validating a [`ServerSpec`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SpecError {
    /// Raised when a required field is missing or empty.
    #[error("missing or empty field: {0}")]
    MissingField(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_builder() -> ServerSpecBuilder {
        ServerSpec::builder()
            .name(" web1 ")
            .region("New Jersey")
            .os("Ubuntu 24.04 x64")
            .plan("1024 MB RAM,25 GB SSD")
    }

    #[test]
    fn build_trims_inputs_and_drops_blank_ssh_keys() {
        let spec = full_builder()
            .ssh_keys(vec!["alpha ", "", "  "])
            .build()
            .unwrap_or_else(|err| panic!("spec should build: {err}"));
        assert_eq!(spec.name, "web1");
        assert_eq!(spec.ssh_keys, vec![String::from("alpha")]);
    }

    #[test]
    fn build_rejects_empty_name() {
        let err = ServerSpec::builder().build().expect_err("name is required");
        assert_eq!(err, SpecError::MissingField("name".to_owned()));
    }

    #[test]
    fn absent_intent_only_requires_name() {
        let spec = ServerSpec::builder()
            .name("web1")
            .build()
            .unwrap_or_else(|err| panic!("spec should build: {err}"));
        assert!(spec.validate_for(Intent::Absent).is_ok());
        assert_eq!(
            spec.validate_for(Intent::Present),
            Err(SpecError::MissingField("region".to_owned()))
        );
    }

    #[test]
    fn present_intent_requires_catalog_references() {
        let spec = full_builder()
            .build()
            .unwrap_or_else(|err| panic!("spec should build: {err}"));
        assert!(spec.validate_for(Intent::Present).is_ok());
    }
}
