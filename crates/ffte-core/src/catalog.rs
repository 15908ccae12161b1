//! Edge-case value library
//!
//! Immutable tables of adversarial literals per JSON Schema type. A catalog is
//! built once and shared by reference; generators never mutate it.

use std::sync::LazyLock;

use crate::candidate::{Candidate, CandidateMap};

static SHARED: LazyLock<EdgeCatalog> = LazyLock::new(EdgeCatalog::standard);

/// Per-type edge-case tables.
#[derive(Debug, Clone)]
pub struct EdgeCatalog {
    /// `number`: zero, signed zero, units, halves, infinities, NaN, large and tiny magnitudes
    pub number: Vec<Candidate>,
    /// `integer`: zero, units, 32-bit and 64-bit extremes
    pub integer: Vec<i64>,
    /// `string`: whitespace, control characters, quoting, unicode, injection shapes
    pub string: Vec<String>,
    pub boolean: Vec<bool>,
    /// `array` base probes
    pub array: Vec<Candidate>,
    /// `object` base probes
    pub object: Vec<Candidate>,
    /// Untyped or unrecognised schemas
    pub unknown: Vec<Candidate>,
    /// Used by the walker for property schemas that are not schema objects
    pub property_fallback: Vec<Candidate>,
    /// `format` → extra string probes (one valid-looking value, then invalid ones)
    pub formats: Vec<(String, Vec<String>)>,
    /// Character used for `minLength`/`maxLength` filler strings
    pub filler: char,
}

impl EdgeCatalog {
    /// The built-in tables.
    #[must_use]
    pub fn standard() -> Self {
        let number = vec![
            Candidate::Int(0),
            Candidate::Float(-0.0),
            Candidate::Int(1),
            Candidate::Int(-1),
            Candidate::Float(0.5),
            Candidate::Float(-0.5),
            Candidate::Float(f64::INFINITY),
            Candidate::Float(f64::NEG_INFINITY),
            Candidate::Float(f64::NAN),
            Candidate::Float(1e10),
            Candidate::Float(-1e10),
            Candidate::Float(1e-10),
            Candidate::Float(-1e-10),
        ];

        let integer = vec![
            0,
            1,
            -1,
            i64::from(i32::MAX),
            i64::from(i32::MIN),
            i64::MAX,
            i64::MIN,
        ];

        let string = [
            "",
            " ",
            "a",
            "A",
            "0",
            "hello",
            "Hello, World!",
        ]
        .into_iter()
        .map(String::from)
        .chain(std::iter::once("A".repeat(1000)))
        .chain(
            [
                "\0",
                "\n",
                "\t",
                "\\",
                "\"",
                "日本語",
                "emoji: \u{1F600}",
                "sql' OR '1'='1",
                "<script>alert(1)</script>",
                "null",
                "true",
                "false",
            ]
            .into_iter()
            .map(String::from),
        )
        .collect();

        let one_key = |value: Candidate| {
            let mut map = CandidateMap::new();
            map.insert("key", value);
            Candidate::Object(map)
        };

        let array = vec![
            Candidate::Array(vec![]),
            Candidate::Array(vec![Candidate::Null]),
            Candidate::Array(vec![Candidate::Int(0)]),
            Candidate::Array(vec![Candidate::from("")]),
            Candidate::Array(vec![Candidate::Bool(true)]),
        ];

        let object = vec![
            Candidate::Object(CandidateMap::new()),
            one_key(Candidate::Null),
            one_key(Candidate::from("")),
            one_key(Candidate::Int(0)),
        ];

        let unknown = vec![
            Candidate::Null,
            Candidate::Int(0),
            Candidate::Int(1),
            Candidate::from(""),
            Candidate::from(" "),
            Candidate::Bool(true),
            Candidate::Bool(false),
            Candidate::Array(vec![]),
            Candidate::Object(CandidateMap::new()),
        ];

        let property_fallback = vec![
            Candidate::Null,
            Candidate::Int(0),
            Candidate::from(""),
            Candidate::Bool(true),
            Candidate::Bool(false),
            Candidate::Array(vec![]),
            Candidate::Object(CandidateMap::new()),
        ];

        let format = |name: &str, values: &[&str]| {
            (
                name.to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            )
        };
        let formats = vec![
            format("email", &["a@b.com", "invalid", "a@", "@b.com"]),
            format("uuid", &["00000000-0000-0000-0000-000000000000", "invalid"]),
            format("date-time", &["2024-01-01T00:00:00Z", "invalid"]),
            format("date", &["2024-01-01", "invalid"]),
        ];

        Self {
            number,
            integer,
            string,
            boolean: vec![true, false],
            array,
            object,
            unknown,
            property_fallback,
            formats,
            filler: 'x',
        }
    }

    /// Process-wide read-only instance of [`EdgeCatalog::standard`].
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Extra string probes for a `format` keyword, empty if the format is not covered.
    #[must_use]
    pub fn format_probes(&self, format: &str) -> &[String] {
        self.formats
            .iter()
            .find(|(name, _)| name == format)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for EdgeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
