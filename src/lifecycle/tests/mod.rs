//! Unit tests for lifecycle convergence and waits.

use std::collections::VecDeque;
use std::time::Duration;

use serde_json::json;

use super::{
    LifecycleError, ModuleFuture, ServerId, ServerModule, ServerRecord, UpdateOutcome, WaitPolicy,
};

mod converge;

fn record(id: &str, label: &str, status: &str) -> ServerRecord {
    ServerRecord::from_raw(json!({
        "SUBID": id,
        "label": label,
        "status": status,
    }))
    .unwrap_or_else(|| panic!("fixture record should build"))
}

fn fast_policy() -> WaitPolicy {
    WaitPolicy::default()
        .with_intervals(Duration::from_millis(1), Duration::from_millis(1))
        .with_state_polls(3)
        .with_destroy_polls(2)
}

/// Minimal module double driven by pre-seeded fetch results.
#[derive(Debug, Default)]
struct FakeModule {
    label: String,
    check_mode: bool,
    fetches: VecDeque<Option<ServerRecord>>,
    create_result: Option<ServerRecord>,
    update_result: Option<UpdateOutcome>,
    fetch_refreshes: Vec<bool>,
    create_calls: usize,
    update_calls: Vec<bool>,
    destroy_calls: Vec<ServerId>,
}

impl FakeModule {
    fn named(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            ..Self::default()
        }
    }

    fn push_fetch(&mut self, result: Option<ServerRecord>) {
        self.fetches.push_back(result);
    }
}

impl ServerModule for FakeModule {
    fn display_name(&self) -> &str {
        &self.label
    }

    fn check_mode(&self) -> bool {
        self.check_mode
    }

    fn fetch_server(&mut self, refresh: bool) -> ModuleFuture<'_, Option<ServerRecord>> {
        Box::pin(async move {
            self.fetch_refreshes.push(refresh);
            Ok(self.fetches.pop_front().unwrap_or(None))
        })
    }

    fn create_server(&mut self) -> ModuleFuture<'_, Option<ServerRecord>> {
        Box::pin(async move {
            self.create_calls += 1;
            Ok(self.create_result.clone())
        })
    }

    fn update_server(&mut self, start_server: bool) -> ModuleFuture<'_, UpdateOutcome> {
        Box::pin(async move {
            self.update_calls.push(start_server);
            self.update_result
                .clone()
                .ok_or_else(|| LifecycleError::InvalidRecord {
                    message: String::from("no scripted update outcome"),
                })
        })
    }

    fn destroy_server<'a>(&'a mut self, id: &'a ServerId) -> ModuleFuture<'a, ()> {
        Box::pin(async move {
            self.destroy_calls.push(id.clone());
            Ok(())
        })
    }
}
