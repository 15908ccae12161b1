//! Probe values
//!
//! A `Candidate` is a JSON-like value that can also carry the IEEE 754 specials
//! (`NaN`, `±Infinity`, `-0.0`) that edge-case catalogs need and `serde_json::Value`
//! cannot represent. Objects keep insertion order.

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One probe value.
#[derive(Debug, Clone)]
pub enum Candidate {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Candidate>),
    Object(CandidateMap),
}

/// Ordered candidate list for one field. Index 0 is the synthesis default.
pub type CandidateSet = Vec<Candidate>;

impl Candidate {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view used for bound checks. `None` for non-numbers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&CandidateMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Lossy conversion to `serde_json::Value`: non-finite floats become `null`.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => items.iter().map(Self::to_json_value).collect(),
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json_value()))
                    .collect(),
            ),
        }
    }

    /// True if a NaN or infinite float sits anywhere inside.
    #[must_use]
    pub fn has_non_finite(&self) -> bool {
        match self {
            Self::Float(f) => !f.is_finite(),
            Self::Array(items) => items.iter().any(Self::has_non_finite),
            Self::Object(map) => map.iter().any(|(_, v)| v.has_non_finite()),
            _ => false,
        }
    }

    /// Parse text written by [`Candidate::to_json_text`]: plain JSON plus bare
    /// `NaN`, `Infinity` and `-Infinity` literals.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not JSON once those literals are accounted for.
    pub fn parse_json_text(text: &str) -> Result<Self, serde_json::Error> {
        let mut marker = String::from("~non-finite~");
        while text.contains(&marker) {
            marker.push('~');
        }
        let value: serde_json::Value = serde_json::from_str(&quote_non_finite(text, &marker))?;
        Ok(unquote_non_finite(value, &marker))
    }

    /// Compact JSON text. Non-finite floats are written as `NaN`, `Infinity`
    /// and `-Infinity` so the probe reaches the server unchanged.
    #[must_use]
    pub fn to_json_text(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    fn write_json(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Int(i) => out.push_str(&i.to_string()),
            Self::Float(f) => write_float(*f, out),
            Self::String(s) => write_json_string(s, out),
            Self::Array(items) => {
                out.push('[');
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
            Self::Object(map) => {
                out.push('{');
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    write_json_string(key, out);
                    out.push(':');
                    value.write_json(out);
                }
                out.push('}');
            }
        }
    }
}

fn write_float(f: f64, out: &mut String) {
    if f.is_nan() {
        out.push_str("NaN");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
    } else if let Some(n) = serde_json::Number::from_f64(f) {
        out.push_str(&n.to_string());
    }
}

const NON_FINITE: [(&str, f64); 3] = [
    ("-Infinity", f64::NEG_INFINITY),
    ("Infinity", f64::INFINITY),
    ("NaN", f64::NAN),
];

/// Turns bare non-finite literals outside strings into `"<marker><literal>"`.
fn quote_non_finite(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut in_string = false;
    let mut escaped = false;
    while let Some(ch) = rest.chars().next() {
        if !in_string {
            if let Some((literal, _)) = NON_FINITE.iter().find(|(lit, _)| rest.starts_with(lit)) {
                out.push('"');
                out.push_str(marker);
                out.push_str(literal);
                out.push('"');
                rest = &rest[literal.len()..];
                continue;
            }
            in_string = ch == '"';
        } else if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            in_string = false;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn unquote_non_finite(value: serde_json::Value, marker: &str) -> Candidate {
    match value {
        serde_json::Value::String(s) => {
            let special = s.strip_prefix(marker).and_then(|literal| {
                NON_FINITE
                    .iter()
                    .find(|(lit, _)| *lit == literal)
                    .map(|(_, f)| *f)
            });
            special.map_or(Candidate::String(s), Candidate::Float)
        }
        serde_json::Value::Array(items) => Candidate::Array(
            items
                .into_iter()
                .map(|v| unquote_non_finite(v, marker))
                .collect(),
        ),
        serde_json::Value::Object(map) => Candidate::Object(
            map.into_iter()
                .map(|(k, v)| (k, unquote_non_finite(v, marker)))
                .collect(),
        ),
        other => Candidate::from(other),
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push_str(&serde_json::Value::from(s).to_string());
}

/// NaN equals NaN here so candidate sets compare structurally in tests and
/// synthesis diffs.
impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_text())
    }
}

impl From<serde_json::Value> for Candidate {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Candidate {
    fn from(value: &serde_json::Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<bool> for Candidate {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Candidate {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Candidate {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Candidate {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl Serialize for Candidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Candidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

/// Insertion-ordered string-keyed map of candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateMap(Vec<(String, Candidate)>);

impl CandidateMap {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k == key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Candidate> {
        self.position(key).map(|idx| &self.0[idx].1)
    }

    /// Insert or replace in place (an existing key keeps its position).
    pub fn insert(&mut self, key: impl Into<String>, value: Candidate) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.0[idx].1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Insert `value` under the key path `keys`, creating intermediate objects.
    /// A non-object value in the way is replaced by an object.
    pub fn insert_nested(&mut self, keys: &[&str], value: Candidate) {
        let [key, rest @ ..] = keys else {
            return;
        };
        if rest.is_empty() {
            self.insert(*key, value);
            return;
        }
        match self.position(key) {
            Some(idx) => match &mut self.0[idx].1 {
                Candidate::Object(child) => child.insert_nested(rest, value),
                slot => {
                    let mut child = CandidateMap::new();
                    child.insert_nested(rest, value);
                    *slot = Candidate::Object(child);
                }
            },
            None => {
                let mut child = CandidateMap::new();
                child.insert_nested(rest, value);
                self.0.push(((*key).to_string(), Candidate::Object(child)));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Candidate)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Candidate)> for CandidateMap {
    fn from_iter<I: IntoIterator<Item = (String, Candidate)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_text_has_no_spaces() {
        let c = Candidate::from(json!({"a": 1, "b": [true, null], "c": "x y"}));
        assert_eq!(c.to_json_text(), r#"{"a":1,"b":[true,null],"c":"x y"}"#);
    }

    #[test]
    fn object_keeps_declaration_order() {
        let c = Candidate::from(json!({"z": 1, "a": 2}));
        let keys: Vec<_> = c.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn non_finite_floats_render_as_js_literals() {
        assert_eq!(Candidate::Float(f64::NAN).to_json_text(), "NaN");
        assert_eq!(Candidate::Float(f64::INFINITY).to_json_text(), "Infinity");
        assert_eq!(
            Candidate::Float(f64::NEG_INFINITY).to_json_text(),
            "-Infinity"
        );
        assert_eq!(Candidate::Float(-0.0).to_json_text(), "-0.0");
    }

    #[test]
    fn non_finite_floats_serialize_as_null() {
        let c = Candidate::Array(vec![Candidate::Float(f64::NAN), Candidate::Int(1)]);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[null,1]");
        assert_eq!(c.to_json_value(), json!([null, 1]));
    }

    #[test]
    fn string_escaping_matches_json() {
        let c = Candidate::from("quote\" nul\0 日本語");
        assert_eq!(c.to_json_text(), "\"quote\\\" nul\\u0000 日本語\"");
    }

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Candidate::Float(f64::NAN), Candidate::Float(f64::NAN));
        assert_ne!(Candidate::Int(0), Candidate::Float(0.0));
    }

    #[test]
    fn insert_nested_replaces_scalar() {
        let mut map = CandidateMap::new();
        map.insert("user", Candidate::Int(3));
        map.insert("id", Candidate::Int(1));
        map.insert_nested(&["user", "email"], Candidate::from("a@b.com"));
        map.insert_nested(&["user", "address", "city"], Candidate::from(""));
        map.insert_nested(&[], Candidate::Null);
        assert_eq!(
            Candidate::Object(map).to_json_text(),
            r#"{"user":{"email":"a@b.com","address":{"city":""}},"id":1}"#
        );
    }

    #[test]
    fn json_text_with_non_finite_parses_back() {
        let c = Candidate::from(json!({"n": 0, "s": "NaN in a string", "list": [1.5, "x"]}));
        let Candidate::Object(mut map) = c else {
            panic!("object expected");
        };
        map.insert("nan", Candidate::Float(f64::NAN));
        map.insert("inf", Candidate::Float(f64::INFINITY));
        map.insert("neg", Candidate::Array(vec![Candidate::Float(f64::NEG_INFINITY)]));
        let original = Candidate::Object(map);

        let text = original.to_json_text();
        assert_eq!(Candidate::parse_json_text(&text).unwrap(), original);
        assert!(original.has_non_finite());

        assert_eq!(
            Candidate::parse_json_text("NaN").unwrap(),
            Candidate::Float(f64::NAN)
        );
        assert_eq!(
            Candidate::parse_json_text(r#""-Infinity \" NaN""#).unwrap(),
            Candidate::from(r#"-Infinity " NaN"#)
        );
        assert!(Candidate::parse_json_text("{oops").is_err());
    }

    #[test]
    fn deserialize_roundtrip_through_json() {
        let c: Candidate = serde_json::from_str(r#"{"k":[1,2.5,"s"]}"#).unwrap();
        assert_eq!(c, Candidate::from(json!({"k": [1, 2.5, "s"]})));
    }
}
