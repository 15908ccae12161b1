//! How bad each failure kind is, and what that means for the exit code

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::FailureKind;

/// Ordered from harmless to worst; the worst kind in a report sets the exit code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// `none`
    Info,
    /// `client_error`: the API rejected the probe, which may be correct
    Warning,
    /// `invalid_json`
    Error,
    /// `crash`, `timeout`, `server_error`
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn of(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Crash | FailureKind::ServerError | FailureKind::Timeout => Self::Critical,
            FailureKind::InvalidJson => Self::Error,
            FailureKind::ClientError => Self::Warning,
            FailureKind::None => Self::Info,
        }
    }

    /// Warnings only fail strict runs.
    #[must_use]
    pub const fn fails_run(self, strict: bool) -> bool {
        match self {
            Self::Info => false,
            Self::Warning => strict,
            Self::Error | Self::Critical => true,
        }
    }

    /// 2 for critical, 1 for any other failing severity, else 0.
    #[must_use]
    pub const fn exit_code(self, strict: bool) -> i32 {
        match self {
            Self::Critical => 2,
            _ if self.fails_run(strict) => 1,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
