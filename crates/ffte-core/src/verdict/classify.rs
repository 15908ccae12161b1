//! Rule cascade: outcome → failure kind
//!
//! Rules run in table order and the first one that fires decides the kind.
//! Transport errors are checked before status codes, so an outcome carrying
//! both is never reported as an HTTP failure.

use crate::execution::ExecutionOutcome;

use super::{FailureClassification, FailureKind};

/// A rule returns the failure message when it fires.
type Rule = fn(&ExecutionOutcome) -> Option<String>;

const RULES: &[(FailureKind, Rule)] = &[
    (FailureKind::Timeout, timed_out),
    (FailureKind::Crash, crashed),
    (FailureKind::ServerError, server_error),
    (FailureKind::ClientError, client_error),
    (FailureKind::InvalidJson, invalid_json),
];

const INVALID_JSON_MESSAGE: &str = "Response claimed JSON but body is not valid JSON";

/// Classify one outcome. Total and side-effect free.
#[must_use]
pub fn classify(outcome: &ExecutionOutcome) -> FailureClassification {
    RULES
        .iter()
        .find_map(|(kind, rule)| rule(outcome).map(|message| FailureClassification::new(*kind, message)))
        .unwrap_or_else(FailureClassification::none)
}

fn timed_out(outcome: &ExecutionOutcome) -> Option<String> {
    let error = outcome.error.as_deref()?;
    let lower = error.to_lowercase();
    (lower.contains("timeout") || lower.contains("timed out")).then(|| error.to_string())
}

fn crashed(outcome: &ExecutionOutcome) -> Option<String> {
    outcome.error.clone()
}

fn status_in(outcome: &ExecutionOutcome, range: std::ops::Range<u16>) -> Option<String> {
    let status = outcome.status_code?;
    range.contains(&status).then(|| format!("HTTP {status}"))
}

fn server_error(outcome: &ExecutionOutcome) -> Option<String> {
    status_in(outcome, 500..600)
}

fn client_error(outcome: &ExecutionOutcome) -> Option<String> {
    status_in(outcome, 400..500)
}

fn invalid_json(outcome: &ExecutionOutcome) -> Option<String> {
    outcome.status_code?;
    let content_type = outcome.header("content-type")?;
    if !content_type.to_ascii_lowercase().contains("application/json") {
        return None;
    }
    let parses = outcome
        .body
        .as_deref()
        .is_some_and(|body| serde_json::from_str::<serde_json::Value>(body).is_ok());
    (!parses).then(|| INVALID_JSON_MESSAGE.to_string())
}
