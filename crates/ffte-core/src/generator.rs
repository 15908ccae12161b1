//! Candidate generator: schema node → bounded list of edge-case values
//!
//! Handles the JSON Schema subset that matters for probing: `type` (scalar or
//! list), `nullable`, `enum`, `minimum`/`maximum`, `minLength`/`maxLength`,
//! `minItems`, `format`, `properties`, `items`. `$ref` must be resolved upstream.

use serde_json::{Number, Value};

use crate::candidate::{Candidate, CandidateMap, CandidateSet};
use crate::catalog::EdgeCatalog;
use crate::schema::{SchemaKind, resolve_type};

/// Fixed sampling policy for recursive generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationLimits {
    /// Nesting depth past which a node yields no candidates
    pub max_depth: u32,
    /// Singleton arrays built from the item schema's candidates
    pub array_item_samples: usize,
    /// Declared properties used when synthesizing sample objects
    pub object_sample_properties: usize,
    /// Sample objects appended to an object's candidates
    pub object_samples: usize,
    /// Cap on the `maxLength` filler string
    pub max_length_filler: usize,
    /// Cap on `minLength` filler strings and `minItems` null arrays. Below the
    /// cap the filler has exactly the declared length.
    pub min_length_filler: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_depth: 20,
            array_item_samples: 5,
            object_sample_properties: 5,
            object_samples: 3,
            max_length_filler: 1000,
            min_length_filler: 1 << 20,
        }
    }
}

/// Turns schema nodes into candidate sets using a shared, read-only catalog.
#[derive(Debug, Clone, Copy)]
pub struct CandidateGenerator<'c> {
    catalog: &'c EdgeCatalog,
    limits: GenerationLimits,
}

impl Default for CandidateGenerator<'static> {
    fn default() -> Self {
        Self::new(EdgeCatalog::shared())
    }
}

impl<'c> CandidateGenerator<'c> {
    #[must_use]
    pub fn new(catalog: &'c EdgeCatalog) -> Self {
        Self {
            catalog,
            limits: GenerationLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: GenerationLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn limits(&self) -> &GenerationLimits {
        &self.limits
    }

    #[must_use]
    pub const fn catalog(&self) -> &'c EdgeCatalog {
        self.catalog
    }

    /// Candidate set for `node`. `fallback` is the type assumed when the node
    /// declares none.
    ///
    /// Never fails: malformed fragments degrade to the untyped catalog.
    #[must_use]
    pub fn candidates(&self, node: &Value, fallback: Option<SchemaKind>) -> CandidateSet {
        self.candidates_at(node, fallback, 0)
    }

    pub(crate) fn candidates_at(
        &self,
        node: &Value,
        fallback: Option<SchemaKind>,
        depth: u32,
    ) -> CandidateSet {
        if depth > self.limits.max_depth {
            return Vec::new();
        }
        if !node.is_object() {
            return self.catalog.unknown.clone();
        }

        // enum overrides every type rule, nullability included
        if let Some(values) = node.get("enum").and_then(Value::as_array) {
            return values.iter().map(Candidate::from).collect();
        }

        let resolved = resolve_type(node, fallback);
        let candidates = match resolved.kind {
            SchemaKind::Number => self.number_candidates(node),
            SchemaKind::Integer => self.integer_candidates(node),
            SchemaKind::String => self.string_candidates(node),
            SchemaKind::Boolean => self.catalog.boolean.iter().map(|b| Candidate::Bool(*b)).collect(),
            SchemaKind::Array => self.array_candidates(node, depth),
            SchemaKind::Object => self.object_candidates(node, depth),
            SchemaKind::Unknown => self.catalog.unknown.clone(),
        };

        if resolved.nullable {
            with_leading_null(candidates)
        } else {
            candidates
        }
    }

    fn number_candidates(&self, node: &Value) -> CandidateSet {
        let min = node.get("minimum");
        let max = node.get("maximum");
        if min.is_none() && max.is_none() {
            return self.catalog.number.clone();
        }

        let lo = min.and_then(Value::as_f64).unwrap_or(f64::NEG_INFINITY);
        let hi = max.and_then(Value::as_f64).unwrap_or(f64::INFINITY);
        // NaN compares false both ways, so the range check drops it
        self.catalog
            .number
            .iter()
            .filter(|c| c.as_f64().is_some_and(|v| lo <= v && v <= hi))
            .cloned()
            .collect()
    }

    fn integer_candidates(&self, node: &Value) -> CandidateSet {
        let min = node.get("minimum");
        let max = node.get("maximum");
        if min.is_none() && max.is_none() {
            return self.catalog.integer.iter().map(|i| Candidate::Int(*i)).collect();
        }

        let lo = as_number(min);
        let hi = as_number(max);
        self.catalog
            .integer
            .iter()
            .filter(|v| lo.is_none_or(|b| int_at_least(**v, b)))
            .filter(|v| hi.is_none_or(|b| int_at_most(**v, b)))
            .map(|i| Candidate::Int(*i))
            .collect()
    }

    fn string_candidates(&self, node: &Value) -> CandidateSet {
        let mut out: CandidateSet = self
            .catalog
            .string
            .iter()
            .cloned()
            .map(Candidate::String)
            .collect();

        if let Some(format) = node.get("format").and_then(Value::as_str) {
            out.extend(
                self.catalog
                    .format_probes(format)
                    .iter()
                    .cloned()
                    .map(Candidate::String),
            );
        }
        if let Some(min_len) = node.get("minLength").and_then(Value::as_u64) {
            out.push(self.filler(capped(min_len, self.limits.min_length_filler)));
        }
        if let Some(max_len) = node.get("maxLength").and_then(Value::as_u64) {
            out.push(self.filler(capped(max_len, self.limits.max_length_filler)));
        }
        out
    }

    fn array_candidates(&self, node: &Value, depth: u32) -> CandidateSet {
        let mut out = self.catalog.array.clone();

        if let Some(items) = node.get("items").filter(|i| i.is_object()) {
            out.extend(
                self.candidates_at(items, None, depth + 1)
                    .into_iter()
                    .take(self.limits.array_item_samples)
                    .map(|c| Candidate::Array(vec![c])),
            );
        }
        if let Some(min_items) = node.get("minItems").and_then(Value::as_u64) {
            let n = capped(min_items, self.limits.min_length_filler);
            out.push(Candidate::Array(vec![Candidate::Null; n]));
        }
        out
    }

    fn object_candidates(&self, node: &Value, depth: u32) -> CandidateSet {
        let Some(props) = node
            .get("properties")
            .and_then(Value::as_object)
            .filter(|p| !p.is_empty())
        else {
            return self.catalog.object.clone();
        };

        // One level deep: each sampled property takes its own first candidate
        let mut sample = CandidateMap::new();
        for (name, prop) in props.iter().take(self.limits.object_sample_properties) {
            if let Some(first) = self.candidates_at(prop, None, depth + 1).into_iter().next() {
                sample.insert(name.clone(), first);
            }
        }

        let mut out = self.catalog.object.clone();
        out.extend(std::iter::repeat_n(
            Candidate::Object(sample),
            self.limits.object_samples,
        ));
        out
    }

    fn filler(&self, len: usize) -> Candidate {
        Candidate::String(std::iter::repeat_n(self.catalog.filler, len).collect())
    }
}

/// Candidate set for `node` using the shared catalog and default limits.
#[must_use]
pub fn candidates(node: &Value, fallback: Option<SchemaKind>) -> CandidateSet {
    CandidateGenerator::default().candidates(node, fallback)
}

fn with_leading_null(mut candidates: CandidateSet) -> CandidateSet {
    if !candidates.first().is_some_and(Candidate::is_null) {
        candidates.insert(0, Candidate::Null);
    }
    candidates
}

fn as_number(value: Option<&Value>) -> Option<&Number> {
    match value {
        Some(Value::Number(n)) => Some(n),
        _ => None,
    }
}

fn capped(n: u64, cap: usize) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX).min(cap)
}

#[allow(clippy::cast_precision_loss)]
fn int_at_least(v: i64, bound: &Number) -> bool {
    if let Some(b) = bound.as_i64() {
        v >= b
    } else if bound.as_u64().is_some() {
        // above i64::MAX
        false
    } else {
        bound.as_f64().is_none_or(|b| v as f64 >= b)
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_at_most(v: i64, bound: &Number) -> bool {
    if let Some(b) = bound.as_i64() {
        v <= b
    } else if bound.as_u64().is_some() {
        true
    } else {
        bound.as_f64().is_none_or(|b| v as f64 <= b)
    }
}
