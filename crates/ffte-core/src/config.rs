//! Project configuration for edge-case scans

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::verdict::FailureKind;

/// Project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OpenAPI document: local path or http(s) URL
    pub spec: String,

    /// Server to probe. Derived from the spec URL's origin when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP headers sent with every request (auth, API keys, ...)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Path parameter values (entity IDs, ...); placeholders fill the rest
    #[serde(default)]
    pub path_params: BTreeMap<String, String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Candidates per body field turned into requests
    #[serde(default = "default_max_candidates")]
    pub max_candidates_per_field: usize,

    /// Probe only the first N operations
    #[serde(default)]
    pub limit_endpoints: Option<usize>,

    /// Requests in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Failure kinds left out of the report
    #[serde(default)]
    pub ignore: Vec<FailureKind>,

    /// Write the text report here as well
    #[serde(default)]
    pub report_file: Option<PathBuf>,

    /// Write every execution as JSONL here
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Mask auth headers in the execution log
    #[serde(default = "default_mask_headers")]
    pub mask_headers: bool,
}

const fn default_timeout_secs() -> f64 {
    10.0
}

const fn default_max_candidates() -> usize {
    3
}

const fn default_concurrency() -> usize {
    1
}

const fn default_mask_headers() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: "openapi.json".to_string(),
            base_url: None,
            headers: BTreeMap::new(),
            path_params: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            max_candidates_per_field: default_max_candidates(),
            limit_endpoints: None,
            concurrency: default_concurrency(),
            ignore: Vec::new(),
            report_file: None,
            log_file: None,
            mask_headers: default_mask_headers(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from the first default location that exists, or defaults
    ///
    /// # Errors
    ///
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Like [`Config::load_default`], relative to `dir`
    ///
    /// # Errors
    ///
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>, ConfigError> {
        for name in DEFAULT_FILES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// True if `spec` is an http(s) URL rather than a local path
    #[must_use]
    pub fn spec_is_remote(&self) -> bool {
        self.spec.starts_with("http://") || self.spec.starts_with("https://")
    }

    /// Configured base URL, else the origin of a remote spec
    #[must_use]
    pub fn resolved_base_url(&self) -> Option<String> {
        if let Some(base) = &self.base_url {
            return Some(base.clone());
        }
        if !self.spec_is_remote() {
            return None;
        }
        let parsed = url::Url::parse(&self.spec).ok()?;
        let origin = parsed.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# ffte configuration

# OpenAPI document (local path or http(s) URL)
spec = "openapi.json"

# Server to probe (defaults to the origin of a remote spec)
base_url = "http://localhost:8000"

# Per-request timeout in seconds
timeout_secs = 10.0

# Edge-case candidates per body field that become requests
max_candidates_per_field = 3

# Requests in flight at once
concurrency = 1

# Probe only the first N operations
# limit_endpoints = 10

# Failure kinds left out of the report
# ignore = ["client_error"]

# Outputs
# report_file = "ffte-report.md"
# log_file = ".ffte/executions.jsonl"
# mask_headers = true

# HTTP headers (auth, api keys)
[headers]
# Authorization = "Bearer your-token-here"

# Path parameters (entity IDs); others get placeholder values
[path_params]
# user_id = "1"
"#
    }
}

/// Config files tried by [`Config::load_default`], in order
pub const DEFAULT_FILES: [&str; 3] = [".ffte.toml", ".ffte.json", "ffte.toml"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
