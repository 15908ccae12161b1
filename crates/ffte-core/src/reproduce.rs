//! Replayable curl commands for executed requests

use url::form_urlencoded;

use crate::execution::{HttpRequest, RequestBody};

/// Render `request` as a single-line curl command.
///
/// ```text
/// curl -X POST -H "X-Trace: 1" "http://h/d?q=a+b" -d '{"a":1}' -H "Content-Type: application/json"
/// ```
///
/// Double-quoted parts escape `\`, `"`, `$` and backticks; the body is
/// single-quoted with `'` written as `'\''`.
#[must_use]
pub fn to_curl(request: &HttpRequest) -> String {
    let mut parts = vec![
        "curl".to_string(),
        "-X".to_string(),
        request.method.to_uppercase(),
    ];

    for (name, value) in &request.headers {
        parts.push(format!("-H {}", double_quoted(&format!("{name}: {value}"))));
    }

    parts.push(double_quoted(&url_with_params(request)));

    match &request.body {
        Some(RequestBody::Json(value)) => {
            parts.push(format!("-d {}", single_quoted(&value.to_json_text())));
            if request.header("content-type").is_none() {
                parts.push("-H \"Content-Type: application/json\"".to_string());
            }
        }
        Some(RequestBody::Text(text)) => {
            parts.push(format!("-d {}", single_quoted(text)));
        }
        None => {}
    }

    parts.join(" ")
}

fn url_with_params(request: &HttpRequest) -> String {
    if request.params.is_empty() {
        return request.url.clone();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&request.params)
        .finish();
    let sep = if request.url.contains('?') { '&' } else { '?' };
    format!("{}{sep}{query}", request.url)
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

fn single_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use serde_json::json;

    #[test]
    fn get_without_body() {
        let req = HttpRequest::new("get", "http://localhost:8000/health");
        assert_eq!(to_curl(&req), r#"curl -X GET "http://localhost:8000/health""#);
    }

    #[test]
    fn json_body_adds_content_type() {
        let req = HttpRequest::new("POST", "http://h/d")
            .with_json(Candidate::from(json!({"a": 1, "b": 0})));
        assert_eq!(
            to_curl(&req),
            r#"curl -X POST "http://h/d" -d '{"a":1,"b":0}' -H "Content-Type: application/json""#
        );
    }

    #[test]
    fn explicit_content_type_is_not_repeated() {
        let req = HttpRequest::new("PUT", "http://h/d")
            .with_header("content-type", "application/json")
            .with_json(Candidate::Int(1));
        let cmd = to_curl(&req);
        assert_eq!(cmd.matches("ontent-").count(), 1);
    }

    #[test]
    fn text_body_has_no_content_type() {
        let req = HttpRequest::new("POST", "http://h/d").with_text("plain");
        assert_eq!(to_curl(&req), r#"curl -X POST "http://h/d" -d 'plain'"#);
    }

    #[test]
    fn single_quotes_in_body_are_escaped() {
        let req = HttpRequest::new("POST", "http://h/d")
            .with_json(Candidate::from("sql' OR '1'='1"));
        assert!(to_curl(&req).contains(r#"-d '"sql'\'' OR '\''1'\''='\''1"'"#));
    }

    #[test]
    fn header_quotes_and_expansions_are_escaped() {
        let req = HttpRequest::new("GET", "http://h/").with_header("X-Note", r#"say "hi" $HOME `id` \o/"#);
        assert!(to_curl(&req).contains(r#"-H "X-Note: say \"hi\" \$HOME \`id\` \\o/""#));
    }

    #[test]
    fn params_are_form_encoded() {
        let req = HttpRequest::new("GET", "http://h/search")
            .with_param("q", "a b&c")
            .with_param("page", "1");
        assert!(to_curl(&req).ends_with(r#""http://h/search?q=a+b%26c&page=1""#));
    }

    #[test]
    fn params_append_to_existing_query() {
        let req = HttpRequest::new("GET", "http://h/s?x=1").with_param("y", "2");
        assert!(to_curl(&req).contains(r#""http://h/s?x=1&y=2""#));
    }

    #[test]
    fn non_finite_numbers_reach_the_body() {
        let req = HttpRequest::new("POST", "http://h/d")
            .with_json(Candidate::from(json!({"n": 0})));
        let mut body = Candidate::from(json!({}));
        if let Candidate::Object(map) = &mut body {
            map.insert("n", Candidate::Float(f64::NEG_INFINITY));
        }
        let req = HttpRequest { body: Some(RequestBody::Json(body)), ..req };
        assert!(to_curl(&req).contains(r#"-d '{"n":-Infinity}'"#));
    }
}
