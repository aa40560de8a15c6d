//! Tests for the convergence state machine.

use serde_json::Value;

use super::super::{Intent, converge};
use super::{FakeModule, LifecycleError, UpdateOutcome, fast_policy, record};

#[tokio::test]
async fn absent_on_missing_server_is_a_no_op() {
    let mut module = FakeModule::named("web1");
    module.push_fetch(None);

    let outcome = converge(&mut module, &fast_policy(), Intent::Absent, true)
        .await
        .unwrap_or_else(|err| panic!("converge should succeed: {err}"));
    assert!(!outcome.changed);
    assert_eq!(outcome.server, None);
    assert!(module.destroy_calls.is_empty());
    assert_eq!(module.fetch_refreshes, vec![false]);
}

#[tokio::test]
async fn absent_destroys_and_polls_until_gone() {
    let mut module = FakeModule::named("web1");
    module.push_fetch(Some(record("12345", "web1", "active")));
    module.push_fetch(Some(record("12345", "web1", "active")));
    module.push_fetch(None);

    let outcome = converge(&mut module, &fast_policy().with_destroy_polls(5), Intent::Absent, true)
        .await
        .unwrap_or_else(|err| panic!("converge should succeed: {err}"));
    assert!(outcome.changed);
    assert_eq!(
        module
            .destroy_calls
            .iter()
            .map(super::ServerId::as_str)
            .collect::<Vec<_>>(),
        vec!["12345"]
    );
    assert_eq!(
        outcome.diff.before.get("id"),
        Some(&Value::String(String::from("12345")))
    );
    assert_eq!(
        outcome.diff.after.get("id"),
        Some(&Value::String(String::new()))
    );
}

#[tokio::test]
async fn absent_in_check_mode_reports_without_destroying() {
    let mut module = FakeModule::named("web1");
    module.check_mode = true;
    module.push_fetch(Some(record("12345", "web1", "active")));

    let outcome = converge(&mut module, &fast_policy(), Intent::Absent, true)
        .await
        .unwrap_or_else(|err| panic!("converge should succeed: {err}"));
    assert!(outcome.changed);
    assert!(module.destroy_calls.is_empty());
    assert_eq!(module.fetch_refreshes.len(), 1);
    assert_eq!(
        outcome.diff.before.get("id"),
        Some(&Value::String(String::from("12345")))
    );
}

#[tokio::test]
async fn absent_surfaces_destroy_timeout() {
    let mut module = FakeModule::named("web1");
    for _ in 0..5 {
        module.push_fetch(Some(record("12345", "web1", "active")));
    }

    let err = converge(&mut module, &fast_policy(), Intent::Absent, true)
        .await
        .expect_err("residual record should time out");
    assert!(matches!(err, LifecycleError::DestroyTimeout { .. }));
}

#[tokio::test]
async fn present_creates_when_absent() {
    let mut module = FakeModule::named("web1");
    module.push_fetch(None);
    module.create_result = Some(record("99", "web1", "active"));

    let outcome = converge(&mut module, &fast_policy(), Intent::Present, true)
        .await
        .unwrap_or_else(|err| panic!("converge should succeed: {err}"));
    assert!(outcome.changed);
    assert_eq!(module.create_calls, 1);
    assert_eq!(
        outcome.server.as_ref().map(|server| server.id.as_str()),
        Some("99")
    );
}

#[tokio::test]
async fn present_twice_is_idempotent() {
    let mut module = FakeModule::named("web1");
    module.push_fetch(None);
    module.push_fetch(Some(record("99", "web1", "active")));
    module.create_result = Some(record("99", "web1", "active"));
    module.update_result = Some(UpdateOutcome {
        record: record("99", "web1", "active"),
        changed: false,
    });

    let first = converge(&mut module, &fast_policy(), Intent::Present, true)
        .await
        .unwrap_or_else(|err| panic!("first run should succeed: {err}"));
    let second = converge(&mut module, &fast_policy(), Intent::Present, true)
        .await
        .unwrap_or_else(|err| panic!("second run should succeed: {err}"));

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(module.create_calls, 1);
}

#[tokio::test]
async fn present_passes_start_flag_to_update_path() {
    let mut module = FakeModule::named("web1");
    module.push_fetch(Some(record("99", "web1", "active")));
    module.update_result = Some(UpdateOutcome {
        record: record("99", "web1", "active"),
        changed: true,
    });

    let outcome = converge(&mut module, &fast_policy(), Intent::Present, false)
        .await
        .unwrap_or_else(|err| panic!("converge should succeed: {err}"));
    assert!(outcome.changed);
    assert_eq!(module.update_calls, vec![false]);
}
