//! Scan loop: turn operations into probe requests, send them, collect records
//!
//! Every operation with a JSON body is probed field by field: for each leaf of
//! the body schema the first few edge-case candidates are substituted into an
//! otherwise default payload, one request each. Operations without a body are
//! sent once, and so are operations whose body schema is empty (`{}`). An
//! array body is probed as a whole with the array candidates. Path and query parameters get placeholder values unless a path
//! parameter value is configured.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use ffte_core::plan::{FieldPlan, OperationPlan, Validation, ValidationStatus, validate_config};
use ffte_core::{
    CandidateSet, Config, DryRunPlan, ExecutionOutcome, ExecutionRecord, FieldPath, HttpRequest,
    Overrides, Report, SchemaKind, aggregate, leaves_only, resolve_type, sample_fields, walk,
};
use serde_json::Value;

use crate::ScanError;
use crate::discovery::{Operation, ParamLocation};
use crate::transport::Transport;

/// Records of a finished scan and the failure report built from them.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub records: Vec<ExecutionRecord>,
    pub report: Report,
}

impl ScanOutput {
    /// Requests sent
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// Requests for one operation, plus how they split across body fields.
struct OperationRequests {
    requests: Vec<HttpRequest>,
    fields: Vec<FieldPlan>,
}

/// Probes the operations of one API.
#[derive(Debug, Clone)]
pub struct Scanner {
    base_url: Option<String>,
    headers: BTreeMap<String, String>,
    path_params: BTreeMap<String, String>,
    max_candidates: usize,
    limit_endpoints: Option<usize>,
    concurrency: usize,
}

impl Scanner {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            headers: BTreeMap::new(),
            path_params: BTreeMap::new(),
            max_candidates: 3,
            limit_endpoints: None,
            concurrency: 1,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.resolved_base_url(),
            headers: config.headers.clone(),
            path_params: config.path_params.clone(),
            max_candidates: config.max_candidates_per_field,
            limit_endpoints: config.limit_endpoints,
            concurrency: config.concurrency,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub const fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    #[must_use]
    pub const fn with_limit_endpoints(mut self, limit: Option<usize>) -> Self {
        self.limit_endpoints = limit;
        self
    }

    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Operations that will be probed, after `limit_endpoints`.
    fn selected<'a>(&self, operations: &'a [Operation]) -> &'a [Operation] {
        match self.limit_endpoints {
            Some(limit) => &operations[..limit.min(operations.len())],
            None => operations,
        }
    }

    /// Describe what [`Scanner::run`] would send. No HTTP requests are made.
    #[must_use]
    pub fn plan(&self, operations: &[Operation], config: &Config) -> DryRunPlan {
        let base_url = self.base_url.clone().unwrap_or_default();
        let mut plans = Vec::new();
        let mut total_requests: u64 = 0;

        for op in self.selected(operations) {
            let built = self.build_requests(op, &base_url);
            let total = built.requests.len() as u64;
            total_requests += total;
            plans.push(OperationPlan {
                operation: op.label(),
                method: op.method.clone(),
                path: op.path.clone(),
                total,
                parameters: op
                    .parameters
                    .iter()
                    .map(|p| format!("{} ({})", p.name, p.location.as_str()))
                    .collect(),
                body_fields: built.fields,
            });
        }

        let mut validations = validate_config(config);
        validations.push(Validation {
            check: "spec_parse".into(),
            status: if operations.is_empty() {
                ValidationStatus::Error
            } else {
                ValidationStatus::Ok
            },
            message: format!("spec parsed: {} operations found", operations.len()),
        });

        DryRunPlan {
            base_url,
            operations: plans,
            total_requests,
            validations,
        }
    }

    /// Probe every selected operation through `transport`.
    ///
    /// # Errors
    ///
    /// Returns error if there is nothing to probe or no usable base URL.
    pub fn run<T: Transport + ?Sized>(
        &self,
        operations: &[Operation],
        transport: &T,
    ) -> Result<ScanOutput, ScanError> {
        if operations.is_empty() {
            return Err(ScanError::NoOperations);
        }
        let base_url = self.base_url.as_deref().ok_or(ScanError::MissingBaseUrl)?;
        url::Url::parse(base_url).map_err(|e| ScanError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;

        let selected = self.selected(operations);
        tracing::info!(
            operations = selected.len(),
            base_url,
            concurrency = self.concurrency.max(1),
            "starting scan"
        );

        let mut records = Vec::new();
        for op in selected {
            let label = op.label();
            let requests = self.build_requests(op, base_url).requests;
            tracing::info!(operation = %label, requests = requests.len(), "probing operation");

            let done = self.execute(requests, transport);
            let failures = aggregate(&done).total();
            tracing::info!(operation = %label, requests = done.len(), failures, "operation finished");
            records.extend(done);
        }

        let report = aggregate(&records);
        Ok(ScanOutput { records, report })
    }

    fn build_requests(&self, op: &Operation, base_url: &str) -> OperationRequests {
        let mut path = op.path.clone();
        for param in op.parameters_in(ParamLocation::Path) {
            let value = self
                .path_params
                .get(&param.name)
                .map_or(param.placeholder(), String::as_str);
            path = path.replace(&format!("{{{}}}", param.name), value);
        }
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut base = HttpRequest::new(op.method.clone(), url);
        for (name, value) in &self.headers {
            base = base.with_header(name.clone(), value.clone());
        }
        for param in op.parameters_in(ParamLocation::Query) {
            base = base.with_param(param.name.clone(), param.placeholder());
        }

        let Some(schema) = op.request_body_schema.as_ref().filter(|s| !is_blank_schema(s)) else {
            return OperationRequests {
                requests: vec![base],
                fields: Vec::new(),
            };
        };

        let fields = walk(schema);
        let targets: Vec<(FieldPath, CandidateSet)> =
            if resolve_type(schema, None).kind == SchemaKind::Array {
                let root = FieldPath::root();
                fields
                    .get(&root)
                    .map(|set| vec![(root, set.clone())])
                    .unwrap_or_default()
            } else {
                leaves_only(&fields)
                    .iter()
                    .map(|(path, set)| (path.clone(), set.clone()))
                    .collect()
            };
        if targets.is_empty() {
            // nothing typed to probe: send the default payload once
            return OperationRequests {
                requests: vec![base.with_json(sample_fields(&fields, &Overrides::new()))],
                fields: Vec::new(),
            };
        }

        let mut requests = Vec::new();
        let mut plans = Vec::new();
        for (path, set) in &targets {
            let probes = &set[..set.len().min(self.max_candidates)];
            for value in probes {
                let body = if path.is_root() {
                    value.clone()
                } else {
                    sample_fields(&fields, &Overrides::single(path.clone(), value.clone()))
                };
                requests.push(base.clone().with_json(body));
            }
            plans.push(FieldPlan {
                path: path.to_string(),
                requests: probes.len() as u64,
            });
        }

        OperationRequests {
            requests,
            fields: plans,
        }
    }

    /// Send `requests` with up to `concurrency` in flight. Records keep the
    /// order of `requests`.
    fn execute<T: Transport + ?Sized>(
        &self,
        requests: Vec<HttpRequest>,
        transport: &T,
    ) -> Vec<ExecutionRecord> {
        let workers = self.concurrency.max(1).min(requests.len());
        if workers <= 1 {
            return requests
                .into_iter()
                .map(|request| {
                    let outcome = send_logged(transport, &request);
                    ExecutionRecord::new(request, outcome)
                })
                .collect();
        }

        let next = AtomicUsize::new(0);
        let mut outcomes: Vec<Option<ExecutionOutcome>> = vec![None; requests.len()];

        std::thread::scope(|scope| {
            let cursor = &next;
            let queue = &requests;
            let handles: Vec<_> = (0..workers)
                .map(move |_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let idx = cursor.fetch_add(1, Ordering::Relaxed);
                            let Some(request) = queue.get(idx) else {
                                break;
                            };
                            done.push((idx, send_logged(transport, request)));
                        }
                        done
                    })
                })
                .collect();

            for handle in handles {
                if let Ok(done) = handle.join() {
                    for (idx, outcome) in done {
                        outcomes[idx] = Some(outcome);
                    }
                }
            }
        });

        requests
            .into_iter()
            .zip(outcomes)
            .map(|(request, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    ExecutionOutcome::failed("RequestError: worker thread panicked", 0.0)
                });
                ExecutionRecord::new(request, outcome)
            })
            .collect()
    }
}

/// `null`, `false` and `{}` declare a body with nothing in it.
fn is_blank_schema(schema: &Value) -> bool {
    match schema {
        Value::Null | Value::Bool(false) => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn send_logged<T: Transport + ?Sized>(transport: &T, request: &HttpRequest) -> ExecutionOutcome {
    let outcome = transport.send(request);
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        status = ?outcome.status_code,
        elapsed = outcome.elapsed_secs,
        "probe sent"
    );
    outcome
}
