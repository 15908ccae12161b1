//! Schema walker: flattens a schema into field path → candidate set.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::candidate::CandidateSet;
use crate::generator::CandidateGenerator;
use crate::schema::{SchemaKind, declared_kind, is_reference};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property
    Key(String),
    /// Array item position (`[]`)
    Items,
}

/// Structural address of a field inside a request body schema.
///
/// Displayed as `user.email`, `tags[]` or `[].id`. The root displays as
/// `value` but never equals a property literally named `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Child path for property `name`.
    #[must_use]
    pub fn key(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(name.to_string()));
        Self(segments)
    }

    /// Child path for the array item position.
    #[must_use]
    pub fn items(&self) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Items);
        Self(segments)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any segment is an array item position.
    #[must_use]
    pub fn is_item_position(&self) -> bool {
        self.0.contains(&PathSegment::Items)
    }

    /// True if `self` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        self.0.len() > ancestor.0.len() && self.0.starts_with(&ancestor.0)
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Property names along the path, skipping item positions.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Items => None,
        })
    }

    /// Parse the display form. `""` is the root; `"value"` is a property.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::root();
        }
        let mut segments = Vec::new();
        for part in text.split('.') {
            let mut rest = part;
            let mut items = 0;
            while let Some(stripped) = rest.strip_suffix("[]") {
                rest = stripped;
                items += 1;
            }
            if !rest.is_empty() {
                segments.push(PathSegment::Key(rest.to_string()));
            }
            segments.extend(std::iter::repeat_n(PathSegment::Items, items));
        }
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("value");
        }
        for (idx, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Items => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathVisitor;

        impl Visitor<'_> for PathVisitor {
            type Value = FieldPath;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a dotted field path")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldPath, E> {
                Ok(FieldPath::parse(v))
            }
        }

        deserializer.deserialize_str(PathVisitor)
    }
}

/// Ordered field path → candidate set mapping.
///
/// Iteration follows insertion order. Re-inserting a path replaces its set
/// without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldCandidates {
    entries: Vec<(FieldPath, CandidateSet)>,
    index: HashMap<FieldPath, usize>,
}

impl FieldCandidates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, path: FieldPath, candidates: CandidateSet) {
        if let Some(&idx) = self.index.get(&path) {
            self.entries[idx].1 = candidates;
        } else {
            self.index.insert(path.clone(), self.entries.len());
            self.entries.push((path, candidates));
        }
    }

    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&CandidateSet> {
        self.index.get(path).map(|&idx| &self.entries[idx].1)
    }

    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.index.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &CandidateSet)> {
        self.entries.iter().map(|(p, c)| (p, c))
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.entries.iter().map(|(p, _)| p)
    }
}

impl FromIterator<(FieldPath, CandidateSet)> for FieldCandidates {
    fn from_iter<I: IntoIterator<Item = (FieldPath, CandidateSet)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (path, candidates) in iter {
            out.insert(path, candidates);
        }
        out
    }
}

impl Serialize for FieldCandidates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, candidates) in &self.entries {
            map.serialize_entry(&path.to_string(), candidates)?;
        }
        map.end()
    }
}

/// Walks object and array schemas, recording a candidate set per field.
#[derive(Debug, Clone, Copy)]
pub struct SchemaWalker<'c> {
    generator: CandidateGenerator<'c>,
}

impl Default for SchemaWalker<'static> {
    fn default() -> Self {
        Self::new(CandidateGenerator::default())
    }
}

impl<'c> SchemaWalker<'c> {
    #[must_use]
    pub const fn new(generator: CandidateGenerator<'c>) -> Self {
        Self { generator }
    }

    #[must_use]
    pub const fn generator(&self) -> &CandidateGenerator<'c> {
        &self.generator
    }

    /// Flatten `schema`. Unresolved `$ref` subtrees contribute nothing.
    #[must_use]
    pub fn walk(&self, schema: &Value) -> FieldCandidates {
        let mut out = FieldCandidates::new();
        self.visit(schema, &FieldPath::root(), 0, &mut out);
        out
    }

    fn visit(&self, node: &Value, path: &FieldPath, depth: u32, out: &mut FieldCandidates) {
        if depth > self.generator.limits().max_depth || is_reference(node) {
            return;
        }
        let Some(kind) = declared_kind(node) else {
            return;
        };

        out.insert(path.clone(), self.generator.candidates_at(node, None, depth));

        match kind {
            SchemaKind::Object => {
                let Some(props) = node.get("properties").and_then(Value::as_object) else {
                    return;
                };
                for (name, prop) in props {
                    let child = path.key(name);
                    if !prop.is_object() {
                        let fallback = self.generator.catalog().property_fallback.clone();
                        out.insert(child, fallback);
                    } else if is_reference(prop) {
                        continue;
                    } else if declared_kind(prop).is_some() {
                        self.visit(prop, &child, depth + 1, out);
                    } else {
                        // untyped: recorded here, not descended into
                        out.insert(child, self.generator.candidates_at(prop, None, depth + 1));
                    }
                }
            }
            SchemaKind::Array => {
                let Some(items) = node.get("items").filter(|i| i.is_object()) else {
                    return;
                };
                if is_reference(items) {
                    return;
                }
                let child = path.items();
                if declared_kind(items).is_some() {
                    self.visit(items, &child, depth + 1, out);
                } else {
                    out.insert(child, self.generator.candidates_at(items, None, depth + 1));
                }
            }
            _ => {}
        }
    }
}

/// Flatten `schema` with the shared catalog and default limits.
#[must_use]
pub fn walk(schema: &Value) -> FieldCandidates {
    SchemaWalker::default().walk(schema)
}

/// Keep only paths with no structural descendant in `fields`, ordered by
/// display string.
#[must_use]
pub fn leaves_only(fields: &FieldCandidates) -> FieldCandidates {
    let mut paths: Vec<&FieldPath> = fields.paths().collect();
    paths.sort_by_cached_key(|p| p.to_string());

    paths
        .into_iter()
        .filter(|p| !fields.paths().any(|other| other.is_descendant_of(p)))
        .filter_map(|p| fields.get(p).map(|c| (p.clone(), c.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use serde_json::json;

    fn displayed(fields: &FieldCandidates) -> Vec<String> {
        fields.paths().map(ToString::to_string).collect()
    }

    #[test]
    fn path_display() {
        let root = FieldPath::root();
        assert_eq!(root.to_string(), "value");
        assert_eq!(root.key("user").key("email").to_string(), "user.email");
        assert_eq!(root.key("tags").items().to_string(), "tags[]");
        assert_eq!(root.items().key("id").to_string(), "[].id");
        assert_eq!(root.key("m").items().items().to_string(), "m[][]");
    }

    #[test]
    fn path_parse_inverts_display() {
        for text in ["user.email", "tags[]", "[].id", "a[].b.c", "m[][]"] {
            assert_eq!(FieldPath::parse(text).to_string(), text);
        }
        assert!(FieldPath::parse("").is_root());
    }

    #[test]
    fn root_differs_from_value_property() {
        let prop = FieldPath::root().key("value");
        assert_eq!(prop.to_string(), FieldPath::root().to_string());
        assert_ne!(prop, FieldPath::root());
        assert_eq!(FieldPath::from("value"), prop);
    }

    #[test]
    fn descendant_is_structural() {
        let a = FieldPath::from("a");
        assert!(FieldPath::from("a.b").is_descendant_of(&a));
        assert!(FieldPath::from("a[]").is_descendant_of(&a));
        assert!(!FieldPath::from("ab.c").is_descendant_of(&a));
        assert!(!a.is_descendant_of(&a));
        assert!(a.is_descendant_of(&FieldPath::root()));
    }

    #[test]
    fn walk_nested_object() {
        let fields = walk(&json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "user": {
                    "type": "object",
                    "properties": {"email": {"type": "string", "format": "email"}}
                }
            }
        }));
        assert_eq!(displayed(&fields), vec!["value", "name", "user", "user.email"]);
        assert_eq!(
            fields.get(&"user.email".into()).unwrap()[20],
            Candidate::from("a@b.com")
        );
    }

    #[test]
    fn walk_array_of_objects() {
        let fields = walk(&json!({
            "type": "array",
            "items": {"type": "object", "properties": {"id": {"type": "integer"}}}
        }));
        assert_eq!(displayed(&fields), vec!["value", "[]", "[].id"]);
    }

    #[test]
    fn non_object_property_gets_fallback() {
        let fields = walk(&json!({"type": "object", "properties": {"odd": true}}));
        let set = fields.get(&"odd".into()).unwrap();
        assert_eq!(set.len(), 7);
        assert!(set[0].is_null());
    }

    #[test]
    fn untyped_property_recorded_but_not_descended() {
        let fields = walk(&json!({
            "type": "object",
            "properties": {"any": {"properties": {"inner": {"type": "string"}}}}
        }));
        assert_eq!(displayed(&fields), vec!["value", "any"]);
        assert_eq!(fields.get(&"any".into()).unwrap().len(), 9);
    }

    #[test]
    fn references_contribute_nothing() {
        assert!(walk(&json!({"$ref": "#/components/schemas/User"})).is_empty());

        let fields = walk(&json!({
            "type": "object",
            "properties": {
                "owner": {"$ref": "#/components/schemas/User"},
                "id": {"type": "integer"}
            }
        }));
        assert_eq!(displayed(&fields), vec!["value", "id"]);
    }

    #[test]
    fn scalar_root_is_single_entry() {
        let fields = walk(&json!({"type": "boolean"}));
        assert_eq!(fields.len(), 1);
        assert!(fields.contains(&FieldPath::root()));
    }

    #[test]
    fn untyped_root_is_empty() {
        assert!(walk(&json!({})).is_empty());
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut fields = FieldCandidates::new();
        fields.insert("a".into(), vec![Candidate::Int(1)]);
        fields.insert("b".into(), vec![]);
        fields.insert("a".into(), vec![Candidate::Int(2)]);
        assert_eq!(displayed(&fields), vec!["a", "b"]);
        assert_eq!(fields.get(&"a".into()), Some(&vec![Candidate::Int(2)]));
    }

    #[test]
    fn leaves_drop_ancestors() {
        let fields = walk(&json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "items": {"type": "string"}},
                "user": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}, "age": {"type": "integer"}}
                },
                "flag": {"type": "boolean"}
            }
        }));
        let leaves = leaves_only(&fields);
        assert_eq!(displayed(&leaves), vec!["flag", "tags[]", "user.age", "user.name"]);
    }

    #[test]
    fn value_property_survives_root_removal() {
        let fields = walk(&json!({
            "type": "object",
            "properties": {"value": {"type": "integer"}}
        }));
        assert_eq!(fields.len(), 2);
        let leaves = leaves_only(&fields);
        assert_eq!(leaves.len(), 1);
        assert!(leaves.contains(&FieldPath::from("value")));
    }

    #[test]
    fn serializes_as_display_keyed_map() {
        let fields = walk(&json!({"type": "object", "properties": {"b": {"type": "boolean"}}}));
        let text = serde_json::to_string(&leaves_only(&fields)).unwrap();
        assert_eq!(text, r#"{"b":[true,false]}"#);
    }
}
