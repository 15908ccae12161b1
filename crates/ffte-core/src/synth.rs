//! Payload synthesizer
//!
//! Builds one request body from a walked schema: every settable field takes its
//! first candidate unless an override names it.

use serde_json::Value;

use crate::candidate::{Candidate, CandidateMap};
use crate::walker::{FieldCandidates, FieldPath, walk};

/// Field values forced into a synthesized payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides(Vec<(FieldPath, Candidate)>);

impl Overrides {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Overrides holding one field.
    #[must_use]
    pub fn single(path: FieldPath, value: Candidate) -> Self {
        Self(vec![(path, value)])
    }

    pub fn insert(&mut self, path: FieldPath, value: Candidate) {
        match self.0.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => slot.1 = value,
            None => self.0.push((path, value)),
        }
    }

    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&Candidate> {
        self.0.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &Candidate)> {
        self.0.iter().map(|(p, v)| (p, v))
    }

    /// True if `path` sits below an overridden field.
    fn shadows(&self, path: &FieldPath) -> bool {
        self.0.iter().any(|(p, _)| path.is_descendant_of(p))
    }
}

impl FromIterator<(FieldPath, Candidate)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (FieldPath, Candidate)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (path, value) in iter {
            out.insert(path, value);
        }
        out
    }
}

/// Synthesize a payload for `schema`. Always returns an object.
#[must_use]
pub fn sample(schema: &Value, overrides: &Overrides) -> Candidate {
    sample_fields(&walk(schema), overrides)
}

/// Synthesize from an already walked schema.
///
/// Root and array-item paths are not settable keys and are skipped. A field
/// with an empty candidate set and no override stays absent.
#[must_use]
pub fn sample_fields(fields: &FieldCandidates, overrides: &Overrides) -> Candidate {
    let mut payload = CandidateMap::new();

    for (path, candidates) in fields.iter() {
        if path.is_root() || path.is_item_position() || overrides.shadows(path) {
            continue;
        }
        let value = match overrides.get(path) {
            Some(forced) => forced.clone(),
            None => match candidates.first() {
                Some(first) => first.clone(),
                None => continue,
            },
        };
        set_nested(&mut payload, path, value);
    }

    Candidate::Object(payload)
}

fn set_nested(payload: &mut CandidateMap, path: &FieldPath, value: Candidate) {
    let keys: Vec<&str> = path.keys().collect();
    payload.insert_nested(&keys, value);
}
