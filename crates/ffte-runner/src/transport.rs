//! Sending probe requests

use std::time::{Duration, Instant};

use ffte_core::{ExecutionOutcome, HttpRequest, Pairs, RequestBody};

use crate::ScanError;

/// Sends one request and reports what came back. Never fails: transport
/// problems end up in [`ExecutionOutcome::error`].
pub trait Transport: Sync {
    fn send(&self, request: &HttpRequest) -> ExecutionOutcome;
}

/// Blocking reqwest client with a per-request timeout.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn describe(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("Timeout ({:?}s): {error}", self.timeout.as_secs_f64())
        } else if error.is_connect() {
            format!("ConnectionError: {error}")
        } else {
            format!("RequestError: {error}")
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> ExecutionOutcome {
        let start = Instant::now();

        let Ok(method) = reqwest::Method::from_bytes(request.method.to_uppercase().as_bytes())
        else {
            return ExecutionOutcome::failed(
                format!("RequestError: invalid HTTP method '{}'", request.method),
                0.0,
            );
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in sendable_headers(request) {
            builder = builder.header(name, value);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            if matches!(body, RequestBody::Json(_)) && request.header("content-type").is_none() {
                builder = builder.header("Content-Type", "application/json");
            }
            builder = builder.body(body.to_text());
        }

        let response = match builder.send() {
            Ok(response) => response,
            Err(e) => {
                let outcome =
                    ExecutionOutcome::failed(self.describe(&e), start.elapsed().as_secs_f64());
                tracing::warn!(method = %request.method, url = %request.url, error = ?outcome.error, "request failed");
                return outcome;
            }
        };

        let status = response.status().as_u16();
        let headers: Pairs = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();

        match response.text() {
            Ok(text) => ExecutionOutcome::response(
                status,
                headers,
                Some(text),
                start.elapsed().as_secs_f64(),
            ),
            Err(e) => {
                let mut outcome =
                    ExecutionOutcome::failed(self.describe(&e), start.elapsed().as_secs_f64());
                outcome.headers = headers;
                tracing::warn!(url = %request.url, status, error = %e, "reading response body failed");
                outcome
            }
        }
    }
}

/// Headers reqwest accepts. The rest (control characters in the value, bad
/// names) are dropped with a warning, so the curl reproduction of such a
/// request shows a header the server never saw.
fn sendable_headers(request: &HttpRequest) -> Vec<(&str, &str)> {
    request
        .headers
        .iter()
        .filter(|(name, value)| {
            let valid = reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_ok()
                && reqwest::header::HeaderValue::from_str(value).is_ok();
            if !valid {
                tracing::warn!(url = %request.url, header = %name, "dropping header reqwest cannot send");
            }
            valid
        })
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}
