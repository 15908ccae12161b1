//! Verdict policy - determines how failures are filtered and judged

use crate::report::Report;

use super::{FailureKind, Severity};

/// Policy for filtering and judging a report
#[derive(Debug, Clone)]
pub struct VerdictPolicy {
    /// Strict mode: client errors fail the run
    pub strict: bool,
    /// Failure kinds to drop from the report
    pub ignore_kinds: Vec<FailureKind>,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self {
            strict: true,
            ignore_kinds: vec![],
        }
    }
}

impl VerdictPolicy {
    /// Create a lenient policy (client errors don't fail)
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_ignored(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.ignore_kinds.extend(kinds);
        self
    }

    /// Drop ignored kinds from `report`
    #[must_use]
    pub fn filter(&self, mut report: Report) -> Report {
        report
            .failures
            .retain(|kind, _| !self.ignore_kinds.contains(kind));
        report
    }

    /// Highest exit code among the kinds present, 0 if none
    #[must_use]
    pub fn exit_code(&self, report: &Report) -> i32 {
        report
            .failures
            .keys()
            .map(|k| k.default_severity().exit_code(self.strict))
            .max()
            .unwrap_or(0)
    }

    /// Verdict for a run that sent `total` requests and produced `report`.
    #[must_use]
    pub fn verdict(&self, report: &Report, total: usize) -> Verdict {
        let exit_code = self.exit_code(report);

        let status = if exit_code == 0 && total > 0 {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let reason = if total == 0 {
            "No requests were made".to_string()
        } else if report.is_empty() {
            "No failures detected".to_string()
        } else {
            let count = |severity: Severity| -> usize {
                report
                    .failures
                    .iter()
                    .filter(|(kind, _)| kind.default_severity() == severity)
                    .map(|(_, commands)| commands.len())
                    .sum()
            };
            format!(
                "{} failures in {total} requests ({} critical, {} error, {} warning)",
                report.total(),
                count(Severity::Critical),
                count(Severity::Error),
                count(Severity::Warning),
            )
        };

        Verdict {
            status,
            exit_code,
            reason,
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn report(kinds: &[(FailureKind, usize)]) -> Report {
        let failures: BTreeMap<_, _> = kinds
            .iter()
            .map(|(k, n)| (*k, vec!["curl -X GET \"http://h/\"".to_string(); *n]))
            .collect();
        Report { failures }
    }

    #[test]
    fn default_policy_is_strict() {
        assert!(VerdictPolicy::default().strict);
    }

    #[test]
    fn exit_code_empty_report() {
        assert_eq!(VerdictPolicy::default().exit_code(&Report::default()), 0);
    }

    #[test]
    fn exit_code_critical_kinds() {
        let policy = VerdictPolicy::default();
        for kind in [FailureKind::Crash, FailureKind::Timeout, FailureKind::ServerError] {
            assert_eq!(policy.exit_code(&report(&[(kind, 1)])), 2);
        }
    }

    #[test]
    fn exit_code_client_error_depends_on_strict() {
        let r = report(&[(FailureKind::ClientError, 3)]);
        assert_eq!(VerdictPolicy::default().exit_code(&r), 1);
        assert_eq!(VerdictPolicy::lenient().exit_code(&r), 0);
    }

    #[test]
    fn exit_code_invalid_json_always_one() {
        let r = report(&[(FailureKind::InvalidJson, 1)]);
        assert_eq!(VerdictPolicy::lenient().exit_code(&r), 1);
    }

    #[test]
    fn exit_code_highest_severity_wins() {
        let r = report(&[
            (FailureKind::ClientError, 1),
            (FailureKind::InvalidJson, 1),
            (FailureKind::ServerError, 1),
        ]);
        assert_eq!(VerdictPolicy::default().exit_code(&r), 2);
    }

    #[test]
    fn filter_drops_ignored_kinds() {
        let policy = VerdictPolicy::default().with_ignored([FailureKind::ClientError]);
        let filtered = policy.filter(report(&[
            (FailureKind::ClientError, 2),
            (FailureKind::Timeout, 1),
        ]));
        assert_eq!(filtered.kinds(), vec![FailureKind::Timeout]);
    }

    #[test]
    fn verdict_no_failures_is_pass() {
        let v = VerdictPolicy::default().verdict(&Report::default(), 12);
        assert_eq!(v.status, VerdictStatus::Pass);
        assert_eq!(v.exit_code, 0);
        assert_eq!(v.reason, "No failures detected");
    }

    #[test]
    fn verdict_zero_requests_is_fail() {
        let v = VerdictPolicy::default().verdict(&Report::default(), 0);
        assert_eq!(v.status, VerdictStatus::Fail);
        assert_eq!(v.reason, "No requests were made");
    }

    #[test]
    fn verdict_lenient_client_errors_pass() {
        let r = report(&[(FailureKind::ClientError, 4)]);
        let v = VerdictPolicy::lenient().verdict(&r, 10);
        assert_eq!(v.status, VerdictStatus::Pass);
        assert!(v.reason.contains("4 failures in 10 requests"));
        assert!(v.reason.contains("4 warning"));
    }

    #[test]
    fn verdict_reason_counts_by_severity() {
        let r = report(&[(FailureKind::ServerError, 2), (FailureKind::InvalidJson, 1)]);
        let v = VerdictPolicy::default().verdict(&r, 20);
        assert_eq!(v.status, VerdictStatus::Fail);
        assert_eq!(v.exit_code, 2);
        assert_eq!(
            v.reason,
            "3 failures in 20 requests (2 critical, 1 error, 0 warning)"
        );
    }
}
