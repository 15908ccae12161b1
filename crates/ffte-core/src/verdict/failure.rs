//! Failure kinds and classification results

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Severity;

/// Outcome category of one execution
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Nothing wrong
    None,
    /// No HTTP response at all (connection refused, DNS, TLS, ...)
    Crash,
    /// 5xx
    ServerError,
    /// 4xx
    ClientError,
    /// Transport gave up waiting
    Timeout,
    /// Response claims JSON but the body does not parse
    InvalidJson,
}

impl FailureKind {
    /// Every failing kind, in classification priority order
    pub const FAILURES: [Self; 5] = [
        Self::Timeout,
        Self::Crash,
        Self::ServerError,
        Self::ClientError,
        Self::InvalidJson,
    ];

    /// Name used as report key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Crash => "crash",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::Timeout => "timeout",
            Self::InvalidJson => "invalid_json",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::None]
            .into_iter()
            .chain(Self::FAILURES)
            .find(|k| k.as_str() == name)
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Default severity for this kind
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        Severity::of(self)
    }

    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::None => "No failure",
            Self::Crash => "Request never produced an HTTP response",
            Self::ServerError => "Server returned 5xx error",
            Self::ClientError => "Server rejected the request with 4xx",
            Self::Timeout => "Request timed out",
            Self::InvalidJson => "Response claimed JSON but body is not valid JSON",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule fired. At most one flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailureFlags {
    pub crash: bool,
    pub server_error: bool,
    pub client_error: bool,
    pub timeout: bool,
    pub invalid_json: bool,
}

impl FailureFlags {
    /// Flags with only `kind` set (none for [`FailureKind::None`]).
    #[must_use]
    pub fn only(kind: FailureKind) -> Self {
        let mut flags = Self::default();
        match kind {
            FailureKind::None => {}
            FailureKind::Crash => flags.crash = true,
            FailureKind::ServerError => flags.server_error = true,
            FailureKind::ClientError => flags.client_error = true,
            FailureKind::Timeout => flags.timeout = true,
            FailureKind::InvalidJson => flags.invalid_json = true,
        }
        flags
    }

    #[must_use]
    pub const fn get(&self, kind: FailureKind) -> bool {
        match kind {
            FailureKind::None => false,
            FailureKind::Crash => self.crash,
            FailureKind::ServerError => self.server_error,
            FailureKind::ClientError => self.client_error,
            FailureKind::Timeout => self.timeout,
            FailureKind::InvalidJson => self.invalid_json,
        }
    }

    /// Number of flags set
    #[must_use]
    pub fn count(&self) -> usize {
        FailureKind::FAILURES
            .iter()
            .filter(|k| self.get(**k))
            .count()
    }
}

/// Result of classifying one outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailureClassification {
    pub kind: FailureKind,
    /// Empty for [`FailureKind::None`]
    pub message: String,
    pub flags: FailureFlags,
}

impl FailureClassification {
    #[must_use]
    pub fn none() -> Self {
        Self {
            kind: FailureKind::None,
            message: String::new(),
            flags: FailureFlags::default(),
        }
    }

    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            flags: FailureFlags::only(kind),
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.kind.is_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for kind in FailureKind::FAILURES {
            assert_eq!(FailureKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(FailureKind::from_name("none"), Some(FailureKind::None));
        assert_eq!(FailureKind::from_name("schema_violation"), None);
    }

    #[test]
    fn serialization_matches_names() {
        let json = serde_json::to_string(&FailureKind::InvalidJson).unwrap();
        assert_eq!(json, "\"invalid_json\"");
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(FailureKind::Crash.default_severity(), Severity::Critical);
        assert_eq!(FailureKind::Timeout.default_severity(), Severity::Critical);
        assert_eq!(FailureKind::ServerError.default_severity(), Severity::Critical);
        assert_eq!(FailureKind::InvalidJson.default_severity(), Severity::Error);
        assert_eq!(FailureKind::ClientError.default_severity(), Severity::Warning);
    }

    #[test]
    fn flags_only_sets_one() {
        for kind in FailureKind::FAILURES {
            let flags = FailureFlags::only(kind);
            assert!(flags.get(kind));
            assert_eq!(flags.count(), 1);
        }
        assert_eq!(FailureFlags::only(FailureKind::None).count(), 0);
    }
}
