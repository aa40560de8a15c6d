//! Concrete server module for the provider's `server` resource.
//!
//! Identity is the spec label: the module lists servers and matches on
//! `label`. The create path resolves every catalog reference up front, so
//! unknown names fail before any mutating call, including in check mode.

use serde_json::Value;
use tracing::debug;

use crate::lifecycle::{
    LifecycleError, ModuleFuture, ServerId, ServerModule, ServerRecord, UpdateOutcome, WaitPolicy,
    wait_for_state,
};
use crate::spec::ServerSpec;
use crate::user_data;

use super::api::ApiClient;
use super::catalog::{self, CatalogEntry, CatalogKind, LookupCache};

const BASE_PATH: &str = "server";

/// Server module bound to one spec for one convergence run.
#[derive(Debug)]
pub struct VultrServer<C: ApiClient> {
    api: C,
    spec: ServerSpec,
    check_mode: bool,
    policy: WaitPolicy,
    cache: LookupCache,
    current: Option<ServerRecord>,
}

impl<C: ApiClient> VultrServer<C> {
    /// Creates a module for the given spec.
    #[must_use]
    pub fn new(api: C, spec: ServerSpec, check_mode: bool) -> Self {
        Self {
            api,
            spec,
            check_mode,
            policy: WaitPolicy::default(),
            cache: LookupCache::new(),
            current: None,
        }
    }

    /// Overrides the wait policy.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn fetch(&mut self, refresh: bool) -> Result<Option<ServerRecord>, LifecycleError> {
        if !refresh && self.current.is_some() {
            return Ok(self.current.clone());
        }

        let listing = self.api.query(&format!("{BASE_PATH}/list")).await?;
        let found = match listing {
            Value::Object(entries) => entries
                .into_values()
                .filter_map(ServerRecord::from_raw)
                .find(|record| record.label == self.spec.name),
            _ => None,
        };
        self.current = found.clone();
        Ok(found)
    }

    async fn resolve_required(
        &mut self,
        kind: CatalogKind,
        name: &str,
    ) -> Result<CatalogEntry, LifecycleError> {
        let entry = catalog::resolve_reference(&self.api, &mut self.cache, kind, name, true).await?;
        entry.ok_or_else(|| {
            LifecycleError::Validation(format!("spec is missing a {}", kind.label()))
        })
    }

    async fn build_create_form(&mut self) -> Result<Vec<(String, String)>, LifecycleError> {
        let region_name = self.spec.region.clone();
        let os_name = self.spec.os.clone();
        let plan_name = self.spec.plan.clone();
        let region = self.resolve_required(CatalogKind::Region, &region_name).await?;
        let os = self.resolve_required(CatalogKind::Os, &os_name).await?;
        let plan = self.resolve_required(CatalogKind::Plan, &plan_name).await?;

        let mut form = vec![
            (String::from("DCID"), region.id),
            (String::from("VPSPLANID"), plan.id),
            (String::from("OSID"), os.id),
            (String::from("label"), self.spec.name.clone()),
        ];

        if let Some(script) = self.spec.startup_script.clone() {
            let entry = self
                .resolve_required(CatalogKind::StartupScript, &script)
                .await?;
            form.push((String::from("SCRIPTID"), entry.id));
        }

        let key_names = self.spec.ssh_keys.clone();
        let keys = catalog::resolve_ssh_keys(&self.api, &mut self.cache, &key_names).await?;
        if !keys.is_empty() {
            let joined = keys
                .iter()
                .map(|key| key.id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            form.push((String::from("SSHKEYID"), joined));
        }

        if let Some(tag) = &self.spec.tag {
            form.push((String::from("tag"), tag.clone()));
        }

        if let Some(payload) = &self.spec.user_data {
            form.push((String::from("userdata"), user_data::encode(payload.as_bytes())));
        }

        Ok(form)
    }

    async fn create(&mut self) -> Result<Option<ServerRecord>, LifecycleError> {
        // References are resolved before the check-mode gate so unknown
        // names fail a dry run the same way they fail a real one.
        let form = self.build_create_form().await?;
        if self.check_mode {
            return Ok(None);
        }

        debug!(server = self.spec.name.as_str(), "issuing create call");
        self.api
            .mutate(&format!("{BASE_PATH}/create"), &form)
            .await?;

        let policy = self.policy.clone();
        wait_for_state(&mut *self, &policy, "status", Some("active")).await?;
        let record = wait_for_state(&mut *self, &policy, "main_ip", None).await?;
        Ok(Some(record))
    }

    async fn update(&mut self, start_server: bool) -> Result<UpdateOutcome, LifecycleError> {
        let record = self.fetch(false).await?.ok_or_else(|| {
            LifecycleError::InvalidRecord {
                message: String::from("update requested for an absent server"),
            }
        })?;

        let mut changed = false;
        changed |= self.apply_tag(&record).await?;
        changed |= self.apply_plan(&record).await?;
        changed |= self.apply_user_data(&record).await?;

        if !changed || self.check_mode {
            return Ok(UpdateOutcome { record, changed });
        }

        if start_server {
            self.post_action("start", &record.id, Vec::new()).await?;
            let policy = self.policy.clone();
            wait_for_state(&mut *self, &policy, "power_status", Some("running")).await?;
        }

        let refreshed = self.fetch(true).await?.ok_or_else(|| {
            LifecycleError::InvalidRecord {
                message: String::from("server disappeared during update"),
            }
        })?;
        Ok(UpdateOutcome {
            record: refreshed,
            changed,
        })
    }

    async fn apply_tag(&mut self, record: &ServerRecord) -> Result<bool, LifecycleError> {
        let Some(tag) = self.spec.tag.clone() else {
            return Ok(false);
        };
        if record.field_str("tag").unwrap_or_default() == tag {
            return Ok(false);
        }

        if !self.check_mode {
            self.post_action("tag_set", &record.id, vec![(String::from("tag"), tag)])
                .await?;
        }
        Ok(true)
    }

    async fn apply_plan(&mut self, record: &ServerRecord) -> Result<bool, LifecycleError> {
        if self.spec.plan.is_empty() {
            return Ok(false);
        }

        let plan_name = self.spec.plan.clone();
        let plan = self.resolve_required(CatalogKind::Plan, &plan_name).await?;
        if record.field(CatalogKind::Plan.id_key()).map(field_text) == Some(plan.id.clone()) {
            return Ok(false);
        }

        if !self.check_mode {
            self.post_action(
                "upgrade_plan",
                &record.id,
                vec![(String::from("VPSPLANID"), plan.id)],
            )
            .await?;
        }
        Ok(true)
    }

    async fn apply_user_data(&mut self, record: &ServerRecord) -> Result<bool, LifecycleError> {
        let Some(payload) = self.spec.user_data.clone() else {
            return Ok(false);
        };
        let remote = self.remote_user_data(&record.id).await?;
        if remote.as_deref() == Some(payload.as_bytes()) {
            return Ok(false);
        }

        if !self.check_mode {
            self.post_action(
                "set_user_data",
                &record.id,
                vec![(
                    String::from("userdata"),
                    user_data::encode(payload.as_bytes()),
                )],
            )
            .await?;
        }
        Ok(true)
    }

    async fn remote_user_data(&self, id: &ServerId) -> Result<Option<Vec<u8>>, LifecycleError> {
        let response = self
            .api
            .query(&format!("{BASE_PATH}/get_user_data?SUBID={id}"))
            .await?;
        let Some(encoded) = response.get("userdata").and_then(Value::as_str) else {
            return Ok(None);
        };
        Ok(Some(user_data::decode(encoded)?))
    }

    async fn post_action(
        &self,
        action: &str,
        id: &ServerId,
        extra: Vec<(String, String)>,
    ) -> Result<Value, LifecycleError> {
        let mut form = vec![(String::from("SUBID"), id.as_str().to_owned())];
        form.extend(extra);
        Ok(self
            .api
            .mutate(&format!("{BASE_PATH}/{action}"), &form)
            .await?)
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl<C: ApiClient> ServerModule for VultrServer<C> {
    fn display_name(&self) -> &str {
        &self.spec.name
    }

    fn check_mode(&self) -> bool {
        self.check_mode
    }

    fn fetch_server(&mut self, refresh: bool) -> ModuleFuture<'_, Option<ServerRecord>> {
        Box::pin(async move { self.fetch(refresh).await })
    }

    fn create_server(&mut self) -> ModuleFuture<'_, Option<ServerRecord>> {
        Box::pin(async move { self.create().await })
    }

    fn update_server(&mut self, start_server: bool) -> ModuleFuture<'_, UpdateOutcome> {
        Box::pin(async move { self.update(start_server).await })
    }

    fn destroy_server<'a>(&'a mut self, id: &'a ServerId) -> ModuleFuture<'a, ()> {
        Box::pin(async move {
            self.post_action("destroy", id, Vec::new()).await?;
            Ok(())
        })
    }
}
