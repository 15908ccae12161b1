//! Execution log: every request of a scan with its outcome, one JSON object
//! per line.
//!
//! ```text
//! {"method":"POST","url":"http://localhost:8000/users","headers":{},"params":{},
//!  "json":{"name":""},"result":{"status_code":500,"response_body":"boom",...}}
//! ```
//!
//! A body holding NaN or ±Infinity is logged as `null` in `json` (plain JSON
//! cannot carry it) and verbatim in `json_text`, which wins on load.
//!
//! Loading also accepts a JSON array of the same objects, `json_body` as an
//! alias of `json`, and `data` holding a structured value.

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::candidate::Candidate;
use crate::execution::{ExecutionOutcome, ExecutionRecord, HttpRequest, Pairs, RequestBody};

/// Headers that should be masked in logs for security.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Mask value for redacted headers.
const MASK: &str = "***";

/// One log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogEntry {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, with = "pairs_map")]
    #[schemars(with = "BTreeMap<String, String>")]
    pub headers: Pairs,
    #[serde(default, with = "pairs_map")]
    #[schemars(with = "BTreeMap<String, String>")]
    pub params: Pairs,
    /// JSON request body
    #[serde(default, alias = "json_body", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Value>")]
    pub json: Option<Candidate>,
    /// Exact body text, only when `json` cannot represent the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_text: Option<String>,
    /// Raw request body
    #[serde(
        default,
        deserialize_with = "text_or_json",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<Value>")]
    pub data: Option<String>,
    /// Entries without a result are skipped when loading records
    #[serde(default)]
    pub result: Option<LogResult>,
}

/// Outcome part of a log line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogResult {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default, deserialize_with = "text_or_json")]
    #[schemars(with = "Option<Value>")]
    pub response_body: Option<String>,
    #[serde(default)]
    pub latency_seconds: Option<f64>,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default, with = "pairs_map")]
    #[schemars(with = "BTreeMap<String, String>")]
    pub headers: Pairs,
    #[serde(default)]
    pub success: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

impl From<&ExecutionRecord> for LogEntry {
    fn from(record: &ExecutionRecord) -> Self {
        let request = &record.request;
        let outcome = &record.outcome;
        let (json, json_text, data) = match &request.body {
            Some(RequestBody::Json(value)) => (
                Some(value.clone()),
                value.has_non_finite().then(|| value.to_json_text()),
                None,
            ),
            Some(RequestBody::Text(text)) => (None, None, Some(text.clone())),
            None => (None, None, None),
        };
        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            params: request.params.clone(),
            json,
            json_text,
            data,
            result: Some(LogResult {
                status_code: outcome.status_code,
                response_body: outcome.body.clone(),
                latency_seconds: Some(outcome.elapsed_secs),
                exception: outcome.error.clone(),
                headers: outcome.headers.clone(),
                success: outcome.succeeded,
            }),
        }
    }
}

impl LogEntry {
    /// Rebuild the record, `None` if the entry carries no result.
    #[must_use]
    pub fn into_record(self) -> Option<ExecutionRecord> {
        let result = self.result?;
        let exact = self
            .json_text
            .and_then(|text| Candidate::parse_json_text(&text).ok());
        let body = match (exact.or(self.json), self.data) {
            (Some(value), _) => Some(RequestBody::Json(value)),
            (None, Some(text)) => Some(RequestBody::Text(text)),
            (None, None) => None,
        };
        let request = HttpRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            params: self.params,
            body,
        };
        let outcome = ExecutionOutcome {
            status_code: result.status_code,
            body: result.response_body,
            elapsed_secs: result.latency_seconds.unwrap_or(0.0),
            error: result.exception,
            headers: result.headers,
            succeeded: result.success,
        };
        Some(ExecutionRecord::new(request, outcome))
    }

    fn masked(mut self) -> Self {
        mask_pairs(&mut self.headers);
        if let Some(result) = self.result.as_mut() {
            mask_pairs(&mut result.headers);
        }
        self
    }
}

/// Write `records` as JSONL to `path`, replacing the file.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Returns error if the file cannot be created or written.
pub fn write_log(
    records: &[ExecutionRecord],
    path: &Path,
    mask_headers: bool,
) -> Result<usize, LogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| LogError::Io(format!("create {}: {e}", parent.display())))?;
    }
    let file = std::fs::File::create(path)
        .map_err(|e| LogError::Io(format!("create {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    write_entries(records, &mut writer, mask_headers)
        .map_err(|e| e.with_context(&path.display().to_string()))?;
    writer
        .flush()
        .map_err(|e| LogError::Io(format!("flush {}: {e}", path.display())))?;
    Ok(records.len())
}

/// Write `records` as JSONL to any writer.
///
/// # Errors
///
/// Returns error on serialization or write failure.
pub fn write_entries<W: Write>(
    records: &[ExecutionRecord],
    writer: &mut W,
    mask_headers: bool,
) -> Result<(), LogError> {
    for record in records {
        let mut entry = LogEntry::from(record);
        if mask_headers {
            entry = entry.masked();
        }
        let line = serde_json::to_string(&entry).map_err(|e| LogError::Serialize(e.to_string()))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|e| LogError::Io(format!("write: {e}")))?;
    }
    Ok(())
}

/// Load records from a JSONL log or a JSON array of entries.
///
/// # Errors
///
/// Returns error if the file cannot be read or an entry does not parse.
pub fn load_log(path: &Path) -> Result<Vec<ExecutionRecord>, LogError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| LogError::Io(format!("read {}: {e}", path.display())))?;
    parse_log(&content)
}

/// Parse log text, see [`load_log`].
///
/// # Errors
///
/// Returns error if an entry does not parse.
pub fn parse_log(content: &str) -> Result<Vec<ExecutionRecord>, LogError> {
    let trimmed = content.trim_start();
    let entries: Vec<LogEntry> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| LogError::Parse {
            line: e.line(),
            message: e.to_string(),
        })?
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| LogError::Parse {
                    line: idx + 1,
                    message: e.to_string(),
                })
            })
            .collect::<Result<_, _>>()?
    };
    Ok(entries.into_iter().filter_map(LogEntry::into_record).collect())
}

/// Returns true if the header name matches a known sensitive header (case-insensitive).
fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

fn mask_pairs(pairs: &mut Pairs) {
    for (name, value) in pairs.iter_mut() {
        if is_sensitive_header(name) {
            *value = MASK.to_string();
        }
    }
}

/// Strings stay as they are; structured values become compact JSON text.
fn text_or_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.map(|value| match value {
        Value::String(s) => s,
        other => other.to_string(),
    }))
}

/// `Pairs` as a JSON object; `null` reads as empty and non-string values are stringified.
mod pairs_map {
    use super::{Deserialize, Deserializer, Pairs, Serializer, Value};

    pub fn serialize<S: Serializer>(pairs: &Pairs, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(pairs.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pairs, D::Error> {
        let map = Option::<serde_json::Map<String, Value>>::deserialize(deserializer)?;
        Ok(map
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl LogError {
    fn with_context(self, context: &str) -> Self {
        match self {
            Self::Io(msg) => Self::Io(format!("{context}: {msg}")),
            other => other,
        }
    }
}
