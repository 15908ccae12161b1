//! Schema node typing
//!
//! Schema nodes stay untyped `serde_json::Value` trees (discovery hands them over
//! as-is). The effective type of a node is resolved once into a closed
//! [`SchemaKind`] tag plus a nullability bit, and all generation branches on that.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Effective JSON Schema type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Number,
    Integer,
    String,
    Boolean,
    Array,
    Object,
    /// Untyped, `"null"`, or a type name we do not know
    Unknown,
}

impl SchemaKind {
    /// Map a JSON Schema `type` name. Unrecognised names map to `Unknown`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" => Self::Number,
            "integer" => Self::Integer,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective type and nullability of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub kind: SchemaKind,
    pub nullable: bool,
}

/// Resolve the effective type of `node`.
///
/// - `type: [..]` → `"null"` member marks nullable, first non-null entry wins
///   (`fallback` if there is none)
/// - `type: "x"` → `x`, nullability from the `nullable` flag
/// - no `type` → `fallback`, nullability from the `nullable` flag
///
/// A `type` that is neither a string nor a list is `Unknown`. Non-object nodes
/// have no keywords, so they resolve like an untyped node.
#[must_use]
pub fn resolve_type(node: &Value, fallback: Option<SchemaKind>) -> ResolvedType {
    let fallback_kind = fallback.unwrap_or(SchemaKind::Unknown);
    let nullable_flag = node.get("nullable").and_then(Value::as_bool).unwrap_or(false);

    match node.get("type") {
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let kind = if nullable {
                names
                    .iter()
                    .find(|t| **t != "null")
                    .map_or(fallback_kind, |t| SchemaKind::from_name(t))
            } else {
                names
                    .first()
                    .map_or(fallback_kind, |t| SchemaKind::from_name(t))
            };
            ResolvedType { kind, nullable }
        }
        Some(Value::String(name)) => ResolvedType {
            kind: SchemaKind::from_name(name),
            nullable: nullable_flag,
        },
        Some(_) => ResolvedType {
            kind: SchemaKind::Unknown,
            nullable: nullable_flag,
        },
        None => ResolvedType {
            kind: fallback_kind,
            nullable: nullable_flag,
        },
    }
}

/// Declared kind of a node, `None` if the node carries no `type` keyword.
///
/// The walker only descends into nodes that declare a type.
#[must_use]
pub fn declared_kind(node: &Value) -> Option<SchemaKind> {
    node.get("type")?;
    Some(resolve_type(node, None).kind)
}

/// True if the node is an unresolved `$ref`.
#[must_use]
pub fn is_reference(node: &Value) -> bool {
    node.get("$ref").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_type() {
        let r = resolve_type(&json!({"type": "integer"}), None);
        assert_eq!(r.kind, SchemaKind::Integer);
        assert!(!r.nullable);
    }

    #[test]
    fn nullable_flag() {
        let r = resolve_type(&json!({"type": "string", "nullable": true}), None);
        assert_eq!(r.kind, SchemaKind::String);
        assert!(r.nullable);
    }

    #[test]
    fn type_list_with_null() {
        let r = resolve_type(&json!({"type": ["null", "number"]}), None);
        assert_eq!(r.kind, SchemaKind::Number);
        assert!(r.nullable);
    }

    #[test]
    fn type_list_without_null_takes_first() {
        let r = resolve_type(&json!({"type": ["boolean", "string"]}), None);
        assert_eq!(r.kind, SchemaKind::Boolean);
        assert!(!r.nullable);
    }

    #[test]
    fn only_null_uses_fallback() {
        let r = resolve_type(&json!({"type": ["null"]}), Some(SchemaKind::String));
        assert_eq!(r.kind, SchemaKind::String);
        assert!(r.nullable);
    }

    #[test]
    fn missing_type_uses_fallback() {
        let r = resolve_type(&json!({}), Some(SchemaKind::Boolean));
        assert_eq!(r.kind, SchemaKind::Boolean);
        assert_eq!(resolve_type(&json!({}), None).kind, SchemaKind::Unknown);
    }

    #[test]
    fn non_object_node_resolves_like_untyped() {
        let r = resolve_type(&json!(42), Some(SchemaKind::Integer));
        assert_eq!(r.kind, SchemaKind::Integer);
        assert_eq!(declared_kind(&json!("string")), None);
    }

    #[test]
    fn declared_kind_requires_type_keyword() {
        assert_eq!(declared_kind(&json!({"properties": {}})), None);
        assert_eq!(
            declared_kind(&json!({"type": "object"})),
            Some(SchemaKind::Object)
        );
    }
}
