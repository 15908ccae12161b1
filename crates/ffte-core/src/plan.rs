//! Dry run plan types and config validation
//!
//! Describes what a scan *would* send without sending anything.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;

// ── Plan types ──

/// Complete dry run plan: operations, request counts, and config checks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DryRunPlan {
    /// Base URL requests would go to
    pub base_url: String,
    /// Per-operation plan
    pub operations: Vec<OperationPlan>,
    /// Total requests that would be sent
    pub total_requests: u64,
    /// Config/spec validation results
    pub validations: Vec<Validation>,
}

/// Plan for a single operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OperationPlan {
    /// Operation label, e.g. "POST /api/users"
    pub operation: String,
    pub method: String,
    /// Path template
    pub path: String,
    /// Requests for this operation
    pub total: u64,
    /// Parameter names with their location, e.g. "user_id (path)"
    pub parameters: Vec<String>,
    /// Leaf body fields probed, with the number of requests each
    pub body_fields: Vec<FieldPlan>,
}

/// Requests planned for one body field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldPlan {
    pub path: String,
    pub requests: u64,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: String) -> Self {
        Self {
            check: check.to_string(),
            status,
            message,
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "replace-me",
    "REPLACE_ME",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    if config.spec_is_remote() {
        checks.push(Validation::new(
            "spec",
            ValidationStatus::Ok,
            format!("spec: {} (remote)", config.spec),
        ));
    } else if std::path::Path::new(&config.spec).exists() {
        checks.push(Validation::new(
            "spec",
            ValidationStatus::Ok,
            format!("spec: {} (exists)", config.spec),
        ));
    } else {
        checks.push(Validation::new(
            "spec",
            ValidationStatus::Error,
            format!("spec: {} (not found)", config.spec),
        ));
    }

    match config.resolved_base_url() {
        Some(base) if base.starts_with("http://") || base.starts_with("https://") => {
            checks.push(Validation::new(
                "base_url",
                ValidationStatus::Ok,
                format!("base_url: {base}"),
            ));
        }
        Some(base) => checks.push(Validation::new(
            "base_url",
            ValidationStatus::Warning,
            format!("base_url: {base} (missing http:// or https:// prefix)"),
        )),
        None => checks.push(Validation::new(
            "base_url",
            ValidationStatus::Error,
            "base_url: not set and the spec is not a URL".to_string(),
        )),
    }

    for (key, value) in &config.headers {
        let placeholder = (value.contains('<') && value.contains('>'))
            || PLACEHOLDER_PATTERNS.iter().any(|p| value.contains(p));
        if placeholder {
            checks.push(Validation::new(
                "headers",
                ValidationStatus::Warning,
                format!("{key}: looks like a placeholder value"),
            ));
        }
    }
    if !checks.iter().any(|c| c.check == "headers") {
        checks.push(Validation::new(
            "headers",
            ValidationStatus::Ok,
            format!("headers: {} configured", config.headers.len()),
        ));
    }

    if config.timeout_secs <= 0.0 || !config.timeout_secs.is_finite() {
        checks.push(Validation::new(
            "timeout_secs",
            ValidationStatus::Error,
            format!("timeout_secs: {} (must be a positive number)", config.timeout_secs),
        ));
    }
    if config.concurrency == 0 {
        checks.push(Validation::new(
            "concurrency",
            ValidationStatus::Warning,
            "concurrency: 0 (treated as 1)".to_string(),
        ));
    }
    if config.max_candidates_per_field == 0 {
        checks.push(Validation::new(
            "max_candidates_per_field",
            ValidationStatus::Warning,
            "max_candidates_per_field: 0 (body fields will not be probed)".to_string(),
        ));
    }

    checks
}

// ── Display helpers ──

impl DryRunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} operations, {} requests planned against {}\n",
            self.operations.len(),
            self.total_requests,
            self.base_url,
        ));

        for op in &self.operations {
            lines.push(format!("{} ({} requests):", op.operation, op.total));
            if !op.parameters.is_empty() {
                lines.push(format!("  Parameters: {}", op.parameters.join(", ")));
            }
            if op.body_fields.is_empty() {
                lines.push("  No body fields (sent once)".to_string());
            } else {
                let fields: Vec<String> = op
                    .body_fields
                    .iter()
                    .map(|f| format!("{} x{}", f.path, f.requests))
                    .collect();
                lines.push(format!("  Body fields: {}", fields.join(", ")));
            }
            lines.push(String::new());
        }

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
