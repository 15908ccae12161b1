//! Failure aggregation
//!
//! Classifies executions, groups the failing ones by kind and renders each as a
//! curl command. Grouping keeps the input order within a kind; kinds with no
//! failing execution never appear.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::execution::ExecutionRecord;
use crate::reproduce::to_curl;
use crate::verdict::{FailureKind, classify};

/// Failure kind → reproduction commands, one per failing execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Report {
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub failures: BTreeMap<FailureKind, Vec<String>>,
}

impl Report {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Commands recorded for `kind`, empty if none.
    #[must_use]
    pub fn commands(&self, kind: FailureKind) -> &[String] {
        self.failures.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total failing executions across kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    /// Kinds present, ordered by name.
    #[must_use]
    pub fn kinds(&self) -> Vec<FailureKind> {
        let mut kinds: Vec<FailureKind> = self.failures.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

/// Failing records grouped by kind. `None` outcomes are dropped.
#[must_use]
pub fn group_failures_by_kind(
    records: &[ExecutionRecord],
) -> BTreeMap<FailureKind, Vec<&ExecutionRecord>> {
    let mut grouped: BTreeMap<FailureKind, Vec<&ExecutionRecord>> = BTreeMap::new();
    for record in records {
        let classification = classify(&record.outcome);
        if classification.is_failure() {
            grouped.entry(classification.kind).or_default().push(record);
        }
    }
    grouped
}

/// Build the report for `records`.
#[must_use]
pub fn aggregate(records: &[ExecutionRecord]) -> Report {
    let failures = group_failures_by_kind(records)
        .into_iter()
        .map(|(kind, failed)| (kind, failed.into_iter().map(|r| to_curl(&r.request)).collect()))
        .collect();
    Report { failures }
}

/// Render as text, sections sorted by kind name. Empty for an empty report.
#[must_use]
pub fn format_report(report: &Report) -> String {
    let mut lines: Vec<String> = Vec::new();
    for kind in report.kinds() {
        let commands = report.commands(kind);
        lines.push(format!("## {kind} ({} occurrence(s))", commands.len()));
        lines.push(String::new());
        for (idx, cmd) in commands.iter().enumerate() {
            lines.push(format!("### Example {}", idx + 1));
            lines.push(cmd.clone());
            lines.push(String::new());
        }
        lines.push(String::new());
    }
    lines.join("\n").trim().to_string()
}
