//! JSON Schema of the machine-readable outputs

use schemars::schema_for;

use crate::log::LogEntry;
use crate::plan::DryRunPlan;
use crate::report::Report;

/// Output formats with a published schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    /// `scan --output json` / `report --output json`
    Report,
    /// One line of the execution log
    LogEntry,
    /// `scan --dry-run --output json`
    DryRunPlan,
}

/// Generate the JSON Schema for `which`, pretty-printed.
///
/// # Errors
///
/// Returns error if the schema cannot be serialized.
pub fn generate_schema(which: OutputSchema) -> Result<String, serde_json::Error> {
    let schema = match which {
        OutputSchema::Report => schema_for!(Report),
        OutputSchema::LogEntry => schema_for!(LogEntry),
        OutputSchema::DryRunPlan => schema_for!(DryRunPlan),
    };
    serde_json::to_string_pretty(&schema)
}
