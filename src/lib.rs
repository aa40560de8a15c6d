//! Core library for the Skiff server convergence tool.
//!
//! The crate exposes a provider-agnostic server lifecycle (resolve catalog
//! references → converge to the declared state → wait for stability) and a
//! Vultr implementation that powers the `skiff` binary.

pub mod config;
pub mod lifecycle;
pub mod report;
pub mod spec;
pub mod test_support;
pub mod user_data;
pub mod vultr;

pub use config::{ConfigError, VultrConfig};
pub use lifecycle::{
    Intent, LifecycleError, Outcome, ServerId, ServerModule, ServerRecord, UpdateOutcome,
    WaitPolicy, converge, wait_for_state, wait_until_destroyed,
};
pub use report::{ConvergeReport, Diff};
pub use spec::{ServerSpec, ServerSpecBuilder, SpecError};
pub use user_data::{UserDataError, resolve_user_data};
pub use vultr::{
    ApiClient, ApiError, CatalogEntry, CatalogError, CatalogKind, HttpApiClient, LookupCache,
    VultrServer,
};
