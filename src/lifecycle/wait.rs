//! Polling wait helpers.
//!
//! The remote API offers no push notification, so readiness and teardown are
//! observed by bounded retry with a fixed interval: sleep once to let the
//! remote side settle, then refresh-and-check up to the policy's iteration
//! budget. Budgets are iteration counts, not wall-clock deadlines.

use serde_json::Value;
use tokio::time::sleep;
use tracing::debug;

use super::{LifecycleError, ServerModule, ServerRecord, WaitPolicy};

/// Blocks until a named field on the refreshed record reaches the expected
/// state.
///
/// With `target` unset the wait succeeds as soon as the field becomes truthy
/// (non-null, non-false, non-zero, non-empty) — used, for example, to wait
/// for an IP address to be assigned. A record that is temporarily absent
/// counts as unsatisfied and polling continues.
///
/// # Errors
///
/// Returns [`LifecycleError::WaitTimeout`] naming the field (and target
/// state, if any) after `policy.state_polls` unsatisfied iterations.
pub async fn wait_for_state<M: ServerModule + ?Sized>(
    module: &mut M,
    policy: &WaitPolicy,
    key: &str,
    target: Option<&str>,
) -> Result<ServerRecord, LifecycleError> {
    sleep(policy.settle_delay).await;
    let mut server = module.fetch_server(true).await?;
    for _ in 0..policy.state_polls {
        if let Some(record) = server.take()
            && state_reached(&record, key, target)
        {
            return Ok(record);
        }
        sleep(policy.poll_interval).await;
        server = module.fetch_server(true).await?;
    }

    debug!(key, ?target, "state wait exhausted its poll budget");
    Err(LifecycleError::WaitTimeout {
        key: key.to_owned(),
        state: target.map(str::to_owned),
    })
}

/// Blocks until a destroyed server disappears from the provider.
///
/// Each iteration sleeps first, then issues a fresh query; the wait succeeds
/// only once the fetch reports the server absent.
///
/// # Errors
///
/// Returns [`LifecycleError::DestroyTimeout`] naming the server after
/// `policy.destroy_polls` iterations with the record still present.
pub async fn wait_until_destroyed<M: ServerModule + ?Sized>(
    module: &mut M,
    policy: &WaitPolicy,
) -> Result<(), LifecycleError> {
    for _ in 0..policy.destroy_polls {
        sleep(policy.poll_interval).await;
        if module.fetch_server(true).await?.is_none() {
            return Ok(());
        }
    }

    Err(LifecycleError::DestroyTimeout {
        label: module.display_name().to_owned(),
    })
}

fn state_reached(record: &ServerRecord, key: &str, target: Option<&str>) -> bool {
    let value = record.field(key);
    match target {
        Some(expected) => value.and_then(Value::as_str) == Some(expected),
        None => value.is_some_and(value_truthy),
    }
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|parsed| parsed != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

#[cfg(test)]
mod truthiness {
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::value_truthy;

    #[rstest]
    #[case(Value::Null, false)]
    #[case(json!(false), false)]
    #[case(json!(true), true)]
    #[case(json!(0), false)]
    #[case(json!(7), true)]
    #[case(json!(""), false)]
    #[case(json!("203.0.113.10"), true)]
    #[case(json!([]), false)]
    #[case(json!(["x"]), true)]
    #[case(json!({}), false)]
    fn matches_expected(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(value_truthy(&value), expected);
    }
}
