//! Vultr implementation of the server lifecycle.
//!
//! The provider's v1 API is a flat HTTPS surface: reads are `GET` requests
//! returning JSON, mutations are form-encoded `POST` requests, and both are
//! authenticated with an `API-Key` header. This module carries the thin HTTP
//! client, catalog lookups, the return-field mapping table, and the concrete
//! [`ServerModule`](crate::lifecycle::ServerModule) implementation.

pub mod api;
pub mod catalog;
pub mod fields;
mod server;

pub use api::{ApiClient, ApiError, HttpApiClient};
pub use catalog::{CatalogEntry, CatalogError, CatalogKind, LookupCache};
pub use server::VultrServer;
