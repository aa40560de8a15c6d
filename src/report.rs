//! Result reporting for a convergence run.
//!
//! The host of a convergence run (here, the CLI) expects a result object with
//! at least `changed` and a `before`/`after` diff. The diff is populated with
//! the server identifier on deletion so callers can see what was removed.

use serde::Serialize;
use serde_json::{Map, Value};

/// Before/after view of a convergence run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diff {
    /// State before the run, keyed by normalized field name.
    pub before: Map<String, Value>,
    /// State after the run, keyed by normalized field name.
    pub after: Map<String, Value>,
}

impl Diff {
    /// Records a deletion: `before` carries the server id, `after` is empty.
    #[must_use]
    pub fn for_deletion(id: &str) -> Self {
        let mut diff = Self::default();
        diff.before
            .insert(String::from("id"), Value::String(id.to_owned()));
        diff.after
            .insert(String::from("id"), Value::String(String::new()));
        diff
    }
}

/// Final result emitted after one convergence run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConvergeReport {
    /// Whether any mutating call was (or, in check mode, would be) issued.
    pub changed: bool,
    /// Before/after diff for the run.
    pub diff: Diff,
    /// Normalized view of the final server record, absent when the server
    /// does not exist after the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_diff_carries_identifier() {
        let diff = Diff::for_deletion("12345");
        assert_eq!(diff.before.get("id"), Some(&Value::String("12345".into())));
        assert_eq!(
            diff.after.get("id"),
            Some(&Value::String(String::new()))
        );
    }

    #[test]
    fn report_serializes_without_absent_server() {
        let report = ConvergeReport::default();
        let rendered = serde_json::to_string(&report)
            .unwrap_or_else(|err| panic!("report should serialize: {err}"));
        assert_eq!(rendered, r#"{"changed":false,"diff":{"before":{},"after":{}}}"#);
    }
}
