//! OpenAPI surface discovery: load a document, extract operations

use std::path::Path;
use std::time::Duration;

use serde_json::Value;

/// Methods probed, in the order they are listed per path.
const METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

/// `$ref` chains deeper than this are left unresolved.
const MAX_REF_DEPTH: usize = 20;

/// One API operation found in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Upper-case HTTP method
    pub method: String,
    /// Path template, e.g. `/users/{user_id}`
    pub path: String,
    pub parameters: Vec<Parameter>,
    /// JSON request body schema, references resolved
    pub request_body_schema: Option<Value>,
}

impl Operation {
    /// `"POST /users"`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn parameters_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    /// `schema.type` when it is a plain string
    pub schema_type: Option<String>,
    pub required: bool,
    pub schema: Option<Value>,
}

impl Parameter {
    /// Value sent when nothing is configured: `"1"` for numeric types,
    /// `"test"` otherwise.
    #[must_use]
    pub fn placeholder(&self) -> &'static str {
        match self.schema_type.as_deref() {
            Some("integer" | "number") => "1",
            _ => "test",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// Load operations from a local file or an http(s) URL.
///
/// # Errors
///
/// Returns error if the document cannot be read, fetched or parsed.
pub fn load_operations(source: &str, timeout: Duration) -> Result<Vec<Operation>, DiscoveryError> {
    let document = load_document(source, timeout)?;
    Ok(extract_operations(&document))
}

/// Load the raw OpenAPI document.
///
/// # Errors
///
/// Returns error if the document cannot be read, fetched or parsed.
pub fn load_document(source: &str, timeout: Duration) -> Result<Value, DiscoveryError> {
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        fetch(source, timeout)?
    } else {
        std::fs::read_to_string(source).map_err(|e| DiscoveryError::Io(format!("{source}: {e}")))?
    };
    parse_document(source, &content)
}

fn fetch(url: &str, timeout: Duration) -> Result<String, DiscoveryError> {
    let fetch_error = |e: reqwest::Error| DiscoveryError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fetch_error)?;
    client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::text)
        .map_err(fetch_error)
}

/// Parse an OpenAPI document from JSON or YAML.
///
/// The extension of `name` decides (`.yaml`/`.yml`, `.json`); otherwise
/// content starting with `{` is JSON and anything else YAML.
///
/// # Errors
///
/// Returns error if the content is not valid in the detected format.
pub fn parse_document(name: &str, content: &str) -> Result<Value, DiscoveryError> {
    let ext = Path::new(name.split(['?', '#']).next().unwrap_or(name))
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let as_json = match ext.as_str() {
        "yaml" | "yml" => false,
        "json" => true,
        _ => content.trim_start().starts_with('{'),
    };
    if as_json {
        serde_json::from_str(content).map_err(|e| DiscoveryError::Parse(format!("Invalid JSON: {e}")))
    } else {
        serde_yml::from_str(content).map_err(|e| DiscoveryError::Parse(format!("Invalid YAML: {e}")))
    }
}

/// Every operation under `paths`, in document order.
#[must_use]
pub fn extract_operations(document: &Value) -> Vec<Operation> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut operations = Vec::new();
    for (path, item) in paths {
        let item = follow(item, document);
        for method in METHODS {
            let Some(operation) = item.get(method).map(|op| follow(op, document)) else {
                continue;
            };
            let parameters = [item.get("parameters"), operation.get("parameters")]
                .into_iter()
                .flatten()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(|param| parse_parameter(&resolve_refs(param, document)))
                .collect();

            operations.push(Operation {
                method: method.to_uppercase(),
                path: path.clone(),
                parameters,
                request_body_schema: json_body_schema(operation, document)
                    .map(|schema| resolve_refs(schema, document)),
            });
        }
    }
    operations
}

fn parse_parameter(param: &Value) -> Option<Parameter> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = ParamLocation::parse(param.get("in")?.as_str()?)?;
    let schema = param.get("schema").cloned();
    let schema_type = schema
        .as_ref()
        .and_then(|s| s.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let required = param
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Some(Parameter {
        name,
        location,
        schema_type,
        required,
        schema,
    })
}

/// `application/json` wins; any other JSON-ish media type is the fallback.
fn json_body_schema<'a>(operation: &'a Value, document: &'a Value) -> Option<&'a Value> {
    let content = follow(operation.get("requestBody")?, document)
        .get("content")?
        .as_object()?;
    content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media, _)| media.contains("json"))
                .map(|(_, v)| v)
        })?
        .get("schema")
}

/// One `$ref` hop for wrappers (path items, request bodies), not schemas.
fn follow<'a>(node: &'a Value, document: &'a Value) -> &'a Value {
    node.get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| lookup(reference, document))
        .unwrap_or(node)
}

/// Inline local `$ref`s (`#/...` JSON pointers into `document`).
///
/// Only `$ref` hops count toward [`MAX_REF_DEPTH`]; plain nesting does not.
/// A reference that is already being expanded further up (a cycle), or that
/// would go past the limit, is kept as is.
#[must_use]
pub fn resolve_refs(schema: &Value, document: &Value) -> Value {
    resolve_inner(schema, document, &mut Vec::new())
}

fn resolve_inner(schema: &Value, document: &Value, chain: &mut Vec<String>) -> Value {
    match schema {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                let expandable =
                    chain.len() < MAX_REF_DEPTH && !chain.iter().any(|seen| seen == reference);
                let Some(target) = lookup(reference, document).filter(|_| expandable) else {
                    return schema.clone();
                };
                chain.push(reference.to_string());
                let resolved = resolve_inner(target, document, chain);
                chain.pop();
                return resolved;
            }
            Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), resolve_inner(v, document, chain)))
                    .collect(),
            )
        }
        Value::Array(items) => items
            .iter()
            .map(|v| resolve_inner(v, document, chain))
            .collect(),
        _ => schema.clone(),
    }
}

fn lookup<'a>(reference: &str, document: &'a Value) -> Option<&'a Value> {
    document.pointer(reference.strip_prefix('#')?)
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Failed to fetch OpenAPI document from {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "openapi": "3.0.0",
            "paths": {
                "/users": {
                    "get": {
                        "parameters": [
                            {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                        ]
                    },
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/User"}
                                }
                            }
                        }
                    }
                },
                "/users/{user_id}": {
                    "parameters": [
                        {"name": "user_id", "in": "path", "required": true, "schema": {"type": "integer"}}
                    ],
                    "summary": "not an operation",
                    "delete": {},
                    "patch": {
                        "parameters": [{"name": "X-Trace", "in": "header"}],
                        "requestBody": {
                            "content": {
                                "application/merge-patch+json": {"schema": {"type": "object"}}
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "address": {"$ref": "#/components/schemas/Address"}
                        }
                    },
                    "Address": {"type": "object", "properties": {"city": {"type": "string"}}}
                }
            }
        })
    }

    #[test]
    fn extracts_operations_in_order() {
        let ops = extract_operations(&document());
        let labels: Vec<String> = ops.iter().map(Operation::label).collect();
        assert_eq!(
            labels,
            vec!["GET /users", "POST /users", "DELETE /users/{user_id}", "PATCH /users/{user_id}"]
        );
    }

    #[test]
    fn body_schema_refs_are_inlined() {
        let ops = extract_operations(&document());
        let body = ops[1].request_body_schema.as_ref().unwrap();
        assert_eq!(body["properties"]["address"]["properties"]["city"]["type"], "string");
    }

    #[test]
    fn path_level_parameters_are_merged() {
        let ops = extract_operations(&document());
        let patch = &ops[3];
        let names: Vec<&str> = patch.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["user_id", "X-Trace"]);
        assert_eq!(patch.parameters_in(ParamLocation::Path).count(), 1);
        assert!(patch.parameters[0].required);
        assert_eq!(patch.parameters[1].schema_type, None);
    }

    #[test]
    fn json_like_media_type_is_accepted() {
        let ops = extract_operations(&document());
        assert_eq!(ops[3].request_body_schema, Some(json!({"type": "object"})));
        assert_eq!(ops[2].request_body_schema, None);
    }

    #[test]
    fn placeholders_follow_parameter_type() {
        let ops = extract_operations(&document());
        assert_eq!(ops[0].parameters[0].placeholder(), "1");
        assert_eq!(ops[3].parameters[1].placeholder(), "test");
    }

    #[test]
    fn circular_refs_terminate() {
        let doc = json!({
            "components": {"schemas": {"Node": {
                "type": "object",
                "properties": {"next": {"$ref": "#/components/schemas/Node"}}
            }}}
        });
        let resolved = resolve_refs(&json!({"$ref": "#/components/schemas/Node"}), &doc);
        assert_eq!(resolved["type"], "object");
        assert!(resolved.to_string().contains("$ref"));
    }

    #[test]
    fn long_ref_chains_resolve_to_the_end() {
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        let mut schemas = serde_json::Map::new();
        for pair in names.windows(2) {
            schemas.insert(
                pair[0].to_string(),
                json!({
                    "type": "object",
                    "properties": {"child": {"$ref": format!("#/components/schemas/{}", pair[1])}}
                }),
            );
        }
        schemas.insert(
            "G".into(),
            json!({"type": "object", "properties": {"leaf": {"type": "string"}}}),
        );
        let doc = json!({
            "paths": {"/deep": {"post": {"requestBody": {"content": {"application/json": {
                "schema": {"$ref": "#/components/schemas/A"}
            }}}}}},
            "components": {"schemas": schemas}
        });

        let ops = extract_operations(&doc);
        let body = ops[0].request_body_schema.as_ref().unwrap();
        assert!(!body.to_string().contains("$ref"));
        let leaves: Vec<String> = ffte_core::leaves_only(&ffte_core::walk(body))
            .paths()
            .map(ToString::to_string)
            .collect();
        assert_eq!(leaves, vec!["child.child.child.child.child.child.leaf"]);
    }

    #[test]
    fn shared_refs_are_not_mistaken_for_cycles() {
        let doc = json!({"components": {"schemas": {"Money": {"type": "integer"}}}});
        let schema = json!({"type": "object", "properties": {
            "price": {"$ref": "#/components/schemas/Money"},
            "tax": {"$ref": "#/components/schemas/Money"}
        }});
        let resolved = resolve_refs(&schema, &doc);
        assert_eq!(resolved["properties"]["price"]["type"], "integer");
        assert_eq!(resolved["properties"]["tax"]["type"], "integer");
    }

    #[test]
    fn referenced_bodies_and_parameters() {
        let doc = json!({
            "paths": {"/items/{id}": {"put": {
                "parameters": [{"$ref": "#/components/parameters/Id"}],
                "requestBody": {"$ref": "#/components/requestBodies/Item"}
            }}},
            "components": {
                "parameters": {"Id": {"name": "id", "in": "path", "schema": {"type": "integer"}}},
                "requestBodies": {"Item": {"content": {"application/json": {
                    "schema": {"type": "object", "properties": {"name": {"type": "string"}}}
                }}}}
            }
        });
        let ops = extract_operations(&doc);
        assert_eq!(ops[0].parameters[0].name, "id");
        assert_eq!(ops[0].parameters[0].placeholder(), "1");
        assert_eq!(
            ops[0].request_body_schema.as_ref().unwrap()["properties"]["name"]["type"],
            "string"
        );
    }

    #[test]
    fn unknown_ref_is_kept() {
        let schema = json!({"$ref": "other.json#/Thing"});
        assert_eq!(resolve_refs(&schema, &json!({})), schema);
    }

    #[test]
    fn parse_yaml_and_sniffed_json() {
        let yaml = "openapi: 3.0.0\npaths:\n  /ping:\n    get: {}\n";
        let doc = parse_document("api.yaml", yaml).unwrap();
        assert_eq!(extract_operations(&doc).len(), 1);

        let doc = parse_document("http://h/spec", r#"{"paths": {}}"#).unwrap();
        assert!(extract_operations(&doc).is_empty());

        let doc = parse_document("http://h/openapi.json?v=2", r#"{"paths": {}}"#).unwrap();
        assert!(doc.get("paths").is_some());
    }

    #[test]
    fn parse_errors_name_the_format() {
        let err = parse_document("api.json", "{").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
        let err = parse_document("api.yml", "a: [").unwrap_err();
        assert!(err.to_string().contains("Invalid YAML"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_document("/nonexistent/openapi.json", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DiscoveryError::Io(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.json");
        std::fs::write(&path, document().to_string()).unwrap();
        let ops = load_operations(path.to_str().unwrap(), Duration::from_secs(1)).unwrap();
        assert_eq!(ops.len(), 4);
    }
}
