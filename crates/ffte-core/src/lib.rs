//! ffte-core: edge-case generation, failure classification and reporting
//!
//! Pure engines (no I/O) for probing HTTP APIs:
//!
//! - [`generator`] turns a JSON Schema node into adversarial candidate values
//! - [`walker`] flattens a request body schema into field path → candidates
//! - [`synth`] builds request bodies with one field overridden
//! - [`verdict`] classifies outcomes and maps them to exit codes
//! - [`report`] groups failures and renders them as curl commands
//!
//! plus the config, execution log and dry-run plan types shared with the
//! runner and the CLI.

pub mod candidate;
pub mod catalog;
pub mod config;
pub mod execution;
pub mod export;
pub mod generator;
pub mod log;
pub mod plan;
pub mod report;
pub mod reproduce;
pub mod schema;
pub mod synth;
pub mod verdict;
pub mod walker;

pub use candidate::{Candidate, CandidateMap, CandidateSet};
pub use catalog::EdgeCatalog;
pub use config::{Config, ConfigError};
pub use execution::{ExecutionOutcome, ExecutionRecord, HttpRequest, Pairs, RequestBody};
pub use export::{OutputSchema, generate_schema};
pub use generator::{CandidateGenerator, GenerationLimits, candidates};
pub use log::{LogEntry, LogError, load_log, write_log};
pub use plan::DryRunPlan;
pub use report::{Report, aggregate, format_report, group_failures_by_kind};
pub use reproduce::to_curl;
pub use schema::{ResolvedType, SchemaKind, resolve_type};
pub use synth::{Overrides, sample, sample_fields};
pub use verdict::{
    FailureClassification, FailureFlags, FailureKind, Severity, Verdict, VerdictPolicy,
    VerdictStatus, classify,
};
pub use walker::{FieldCandidates, FieldPath, SchemaWalker, leaves_only, walk};
