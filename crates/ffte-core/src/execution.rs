//! Request/outcome records shared by the transport, classifier and reporter

use crate::candidate::Candidate;

/// Ordered name/value pairs (headers, query parameters).
pub type Pairs = Vec<(String, String)>;

/// Body of a probe request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as compact JSON, non-finite numbers included
    Json(Candidate),
    /// Sent verbatim
    Text(String),
}

impl RequestBody {
    /// Wire text of the body.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Json(value) => value.to_json_text(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// One request as handed to the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Pairs,
    pub params: Pairs,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_json(mut self, body: Candidate) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    #[must_use]
    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// What came back for one request. A transport failure leaves `status_code`
/// empty and fills `error`; `succeeded` only says an HTTP exchange completed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionOutcome {
    pub status_code: Option<u16>,
    pub body: Option<String>,
    pub elapsed_secs: f64,
    pub error: Option<String>,
    pub headers: Pairs,
    pub succeeded: bool,
}

impl ExecutionOutcome {
    /// An HTTP response was received, whatever its status.
    #[must_use]
    pub fn response(status_code: u16, headers: Pairs, body: Option<String>, elapsed_secs: f64) -> Self {
        Self {
            status_code: Some(status_code),
            body,
            elapsed_secs,
            error: None,
            headers,
            succeeded: true,
        }
    }

    /// No response: the transport reported `error`.
    #[must_use]
    pub fn failed(error: impl Into<String>, elapsed_secs: f64) -> Self {
        Self {
            error: Some(error.into()),
            elapsed_secs,
            ..Self::default()
        }
    }

    /// Case-insensitive response header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A request paired with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    pub request: HttpRequest,
    pub outcome: ExecutionOutcome,
}

impl ExecutionRecord {
    #[must_use]
    pub const fn new(request: HttpRequest, outcome: ExecutionOutcome) -> Self {
        Self { request, outcome }
    }
}

fn find_header<'a>(headers: &'a Pairs, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_success_flag() {
        assert!(ExecutionOutcome::response(204, vec![], None, 0.1).succeeded);
        assert!(ExecutionOutcome::response(500, vec![], None, 0.1).succeeded);
        assert!(!ExecutionOutcome::failed("ConnectionError: refused", 0.0).succeeded);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let outcome = ExecutionOutcome::response(
            200,
            vec![("content-type".into(), "application/json".into())],
            None,
            0.0,
        );
        assert_eq!(outcome.header("Content-Type"), Some("application/json"));
        assert_eq!(outcome.header("X-Missing"), None);
    }

    #[test]
    fn json_body_text_keeps_specials() {
        let req = HttpRequest::new("POST", "http://h/x")
            .with_json(Candidate::Array(vec![Candidate::Float(f64::NAN)]));
        assert_eq!(req.body.unwrap().to_text(), "[NaN]");
    }
}
