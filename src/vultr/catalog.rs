//! Catalog reference resolution.
//!
//! Servers are specified with human-readable names (region, OS image, SSH
//! key, startup script, plan); the provider wants numeric identifiers. Each
//! catalog is a JSON object keyed by identifier, with the display name inside
//! the record. Catalogs marked cacheable are immutable reference data, so
//! repeated lookups within one convergence run reuse the first fetch via an
//! explicit [`LookupCache`] scoped to that run.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::api::{ApiClient, ApiError};

/// Errors raised while resolving catalog references.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CatalogError {
    /// Raised when a non-empty name has no matching catalog entry.
    #[error("could not find {kind} with name '{name}'")]
    NotFound {
        /// Catalog kind, for example `region`.
        kind: &'static str,
        /// Name that failed to resolve.
        name: String,
    },
    /// Raised when a catalog listing is not the expected JSON object.
    #[error("unexpected {kind} catalog shape: {message}")]
    Malformed {
        /// Catalog kind, for example `region`.
        kind: &'static str,
        /// Description of the shape mismatch.
        message: String,
    },
    /// Raised when the underlying API call fails.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Provider catalogs that can be resolved by name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CatalogKind {
    /// Datacenter regions.
    Region,
    /// Operating system images.
    Os,
    /// Account SSH keys.
    SshKey,
    /// Account startup scripts.
    StartupScript,
    /// Server plans (sizes).
    Plan,
}

impl CatalogKind {
    /// API path listing this catalog.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Region => "regions/list",
            Self::Os => "os/list",
            Self::SshKey => "sshkey/list",
            Self::StartupScript => "startupscript/list",
            Self::Plan => "plans/list",
        }
    }

    /// Field carrying the provider identifier inside a catalog record.
    #[must_use]
    pub const fn id_key(self) -> &'static str {
        match self {
            Self::Region => "DCID",
            Self::Os => "OSID",
            Self::SshKey => "SSHKEYID",
            Self::StartupScript => "SCRIPTID",
            Self::Plan => "VPSPLANID",
        }
    }

    /// Human-readable kind used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Os => "os",
            Self::SshKey => "ssh key",
            Self::StartupScript => "startup script",
            Self::Plan => "plan",
        }
    }
}

/// A resolved catalog entry: the provider identifier plus the full record.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    /// Provider identifier, normalized to a string.
    pub id: String,
    /// Full catalog record as returned by the API.
    pub record: Value,
}

/// Per-invocation cache of fetched catalog listings.
///
/// The cache lives from invocation start to invocation end and is passed by
/// reference into the resolver; there is no process-wide singleton.
#[derive(Debug, Default)]
pub struct LookupCache {
    listings: HashMap<CatalogKind, Value>,
}

impl LookupCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, kind: CatalogKind) -> Option<&Value> {
        self.listings.get(&kind)
    }

    fn insert(&mut self, kind: CatalogKind, listing: Value) {
        self.listings.insert(kind, listing);
    }
}

/// Resolves a named reference against a provider catalog.
///
/// An empty or whitespace-only name returns `Ok(None)` without a remote
/// call. When `use_cache` is set, the catalog listing fetched for the first
/// lookup is reused for later lookups of the same kind.
///
/// # Errors
///
/// Returns [`CatalogError::NotFound`] when a non-empty name has no matching
/// entry, and propagates API and shape errors.
pub async fn resolve_reference<C: ApiClient + ?Sized>(
    api: &C,
    cache: &mut LookupCache,
    kind: CatalogKind,
    name: &str,
    use_cache: bool,
) -> Result<Option<CatalogEntry>, CatalogError> {
    let wanted = name.trim();
    if wanted.is_empty() {
        return Ok(None);
    }

    let listing = fetch_listing(api, cache, kind, use_cache).await?;
    let entry = find_by_name(&listing, kind, wanted)?;
    entry.map_or_else(
        || {
            Err(CatalogError::NotFound {
                kind: kind.label(),
                name: wanted.to_owned(),
            })
        },
        |found| Ok(Some(found)),
    )
}

/// Resolves a list of SSH key names.
///
/// An empty name list yields an empty collection rather than an error; a
/// server may legitimately have zero keys. Individual blank entries are
/// skipped. Lookups share the cache, so several keys cost one listing fetch.
///
/// # Errors
///
/// Returns [`CatalogError::NotFound`] for any non-empty name without a
/// matching key.
pub async fn resolve_ssh_keys<C: ApiClient + ?Sized>(
    api: &C,
    cache: &mut LookupCache,
    names: &[String],
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        if let Some(entry) =
            resolve_reference(api, cache, CatalogKind::SshKey, name, true).await?
        {
            entries.push(entry);
        }
    }
    Ok(entries)
}

async fn fetch_listing<C: ApiClient + ?Sized>(
    api: &C,
    cache: &mut LookupCache,
    kind: CatalogKind,
    use_cache: bool,
) -> Result<Value, CatalogError> {
    if use_cache && let Some(cached) = cache.get(kind) {
        return Ok(cached.clone());
    }

    debug!(catalog = kind.label(), "fetching catalog listing");
    let listing = api.query(kind.path()).await?;
    if use_cache {
        cache.insert(kind, listing.clone());
    }
    Ok(listing)
}

fn find_by_name(
    listing: &Value,
    kind: CatalogKind,
    wanted: &str,
) -> Result<Option<CatalogEntry>, CatalogError> {
    // An account with no entries comes back as an empty array, not an object.
    if matches!(listing, Value::Array(items) if items.is_empty()) {
        return Ok(None);
    }

    let records = listing
        .as_object()
        .ok_or_else(|| CatalogError::Malformed {
            kind: kind.label(),
            message: String::from("listing is not a JSON object"),
        })?;

    for (key, record) in records {
        if record.get("name").and_then(Value::as_str) == Some(wanted) {
            let id = record
                .get(kind.id_key())
                .map_or_else(|| key.clone(), identifier_text);
            return Ok(Some(CatalogEntry {
                id,
                record: record.clone(),
            }));
        }
    }
    Ok(None)
}

fn identifier_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_support::ScriptedApi;

    use super::*;

    fn region_listing() -> Value {
        json!({
            "1": {"DCID": "1", "name": "New Jersey", "country": "US"},
            "9": {"DCID": "9", "name": "Frankfurt", "country": "DE"},
        })
    }

    #[tokio::test]
    async fn empty_name_short_circuits_without_remote_call() {
        let api = ScriptedApi::new();
        let mut cache = LookupCache::new();
        let entry = resolve_reference(&api, &mut cache, CatalogKind::Region, "  ", true)
            .await
            .unwrap_or_else(|err| panic!("empty name should resolve: {err}"));
        assert_eq!(entry, None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn resolves_region_by_name() {
        let api = ScriptedApi::new();
        api.push_response(region_listing());
        let mut cache = LookupCache::new();

        let entry = resolve_reference(&api, &mut cache, CatalogKind::Region, "Frankfurt", true)
            .await
            .unwrap_or_else(|err| panic!("region should resolve: {err}"))
            .unwrap_or_else(|| panic!("region should be found"));
        assert_eq!(entry.id, "9");
    }

    #[tokio::test]
    async fn cached_lookup_fetches_listing_once() {
        let api = ScriptedApi::new();
        api.push_response(region_listing());
        let mut cache = LookupCache::new();

        for name in ["New Jersey", "Frankfurt"] {
            resolve_reference(&api, &mut cache, CatalogKind::Region, name, true)
                .await
                .unwrap_or_else(|err| panic!("{name} should resolve: {err}"));
        }
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn unknown_name_is_not_found() {
        let api = ScriptedApi::new();
        api.push_response(json!({"127": {"OSID": 127, "name": "Ubuntu 24.04 x64"}}));
        let mut cache = LookupCache::new();

        let err = resolve_reference(&api, &mut cache, CatalogKind::Os, "Plan 9", false)
            .await
            .expect_err("missing os should fail");
        assert_eq!(
            err,
            CatalogError::NotFound {
                kind: "os",
                name: String::from("Plan 9"),
            }
        );
    }

    #[tokio::test]
    async fn numeric_identifier_is_normalized_to_text() {
        let api = ScriptedApi::new();
        api.push_response(json!({"127": {"OSID": 127, "name": "Ubuntu 24.04 x64"}}));
        let mut cache = LookupCache::new();

        let entry = resolve_reference(&api, &mut cache, CatalogKind::Os, "Ubuntu 24.04 x64", false)
            .await
            .unwrap_or_else(|err| panic!("os should resolve: {err}"))
            .unwrap_or_else(|| panic!("os should be found"));
        assert_eq!(entry.id, "127");
    }

    #[tokio::test]
    async fn no_ssh_key_names_yields_empty_collection() {
        let api = ScriptedApi::new();
        let mut cache = LookupCache::new();
        let keys = resolve_ssh_keys(&api, &mut cache, &[])
            .await
            .unwrap_or_else(|err| panic!("no names should resolve: {err}"));
        assert!(keys.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn ssh_keys_resolve_through_shared_cache() {
        let api = ScriptedApi::new();
        api.push_response(json!({
            "KEY-1": {"SSHKEYID": "KEY-1", "name": "alpha"},
            "KEY-2": {"SSHKEYID": "KEY-2", "name": "beta"},
        }));
        let mut cache = LookupCache::new();

        let names = vec![String::from("alpha"), String::from("beta")];
        let keys = resolve_ssh_keys(&api, &mut cache, &names)
            .await
            .unwrap_or_else(|err| panic!("keys should resolve: {err}"));
        assert_eq!(keys.len(), 2);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_ssh_key_surfaces_not_found() {
        let api = ScriptedApi::new();
        api.push_response(json!({"KEY-1": {"SSHKEYID": "KEY-1", "name": "alpha"}}));
        let mut cache = LookupCache::new();

        let names = vec![String::from("gamma")];
        let err = resolve_ssh_keys(&api, &mut cache, &names)
            .await
            .expect_err("unknown key should fail");
        assert!(matches!(err, CatalogError::NotFound { kind: "ssh key", .. }));
    }

    #[tokio::test]
    async fn empty_array_listing_is_treated_as_no_entries() {
        let api = ScriptedApi::new();
        api.push_response(json!([]));
        let mut cache = LookupCache::new();

        let err = resolve_reference(&api, &mut cache, CatalogKind::StartupScript, "boot", false)
            .await
            .expect_err("no scripts should fail lookup");
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }
}
