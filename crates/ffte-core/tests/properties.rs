//! Property tests for generation, synthesis and classification.

use ffte_core::{
    Candidate, ExecutionOutcome, FailureKind, Overrides, candidates, classify, leaves_only,
    sample, walk,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn scalar_schema() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!({"type": "integer"})),
        Just(json!({"type": "number"})),
        Just(json!({"type": "string", "format": "email"})),
        Just(json!({"type": "boolean"})),
        Just(json!({"type": ["string", "null"]})),
        Just(json!({})),
    ]
}

fn schema_tree() -> impl Strategy<Value = Value> {
    scalar_schema().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::btree_map("[a-c]{1,2}", inner.clone(), 0..4)
                .prop_map(|props| json!({"type": "object", "properties": props})),
            inner.prop_map(|items| json!({"type": "array", "items": items})),
        ]
    })
}

fn probe_value() -> impl Strategy<Value = Candidate> {
    prop_oneof![
        any::<i64>().prop_map(Candidate::Int),
        ".{0,12}".prop_map(Candidate::String),
        any::<bool>().prop_map(Candidate::Bool),
        Just(Candidate::Null),
        Just(Candidate::Float(f64::NAN)),
    ]
}

proptest! {
    #[test]
    fn bounded_numbers_stay_in_range(lo in -1e12f64..1e12, width in 0f64..1e12) {
        let hi = lo + width;
        for kind in ["number", "integer"] {
            let set = candidates(&json!({"type": kind, "minimum": lo, "maximum": hi}), None);
            for value in &set {
                let v = value.as_f64().unwrap();
                prop_assert!(!v.is_nan());
                prop_assert!(lo <= v && v <= hi, "{} outside [{}, {}]", v, lo, hi);
            }
        }
    }

    #[test]
    fn min_length_string_is_present(n in 0usize..5000) {
        let set = candidates(&json!({"type": "string", "minLength": n}), None);
        prop_assert!(set.iter().any(|c| c.as_str().is_some_and(|s| s.chars().count() == n)));
    }

    #[test]
    fn enum_is_returned_verbatim(
        values in prop::collection::vec(prop_oneof![
            any::<i32>().prop_map(|i| json!(i)),
            "[a-z]{0,5}".prop_map(|s| json!(s)),
            Just(Value::Null),
        ], 1..6),
        kind in prop::sample::select(vec!["integer", "string", "object", "array"]),
    ) {
        let set = candidates(&json!({"type": kind, "nullable": true, "enum": values.clone()}), None);
        let expected: Vec<Candidate> = values.iter().map(Candidate::from).collect();
        prop_assert_eq!(set, expected);
    }

    #[test]
    fn nullable_scalars_start_with_null(
        kind in prop::sample::select(vec!["number", "integer", "string", "boolean"]),
        as_list in any::<bool>(),
    ) {
        let schema = if as_list {
            json!({"type": [kind, "null"]})
        } else {
            json!({"type": kind, "nullable": true})
        };
        let set = candidates(&schema, None);
        prop_assert!(set[0].is_null());
        prop_assert!(!set[1..].iter().any(Candidate::is_null));
    }

    #[test]
    fn leaves_are_prefix_free(schema in schema_tree()) {
        let leaves = leaves_only(&walk(&schema));
        let paths: Vec<_> = leaves.paths().collect();
        for a in &paths {
            for b in &paths {
                prop_assert!(!a.is_descendant_of(b), "{} below {}", a, b);
            }
        }
    }

    #[test]
    fn override_changes_only_its_field(
        props in prop::collection::btree_map("[a-z]{1,6}", scalar_schema(), 1..6),
        pick in any::<prop::sample::Index>(),
        value in probe_value(),
    ) {
        let keys: Vec<String> = props.keys().cloned().collect();
        let target = pick.get(&keys).clone();
        let schema = json!({"type": "object", "properties": props});

        let base = sample(&schema, &Overrides::new());
        let probed = sample(&schema, &Overrides::single(target.as_str().into(), value.clone()));
        let base = base.as_object().unwrap();
        let probed = probed.as_object().unwrap();

        prop_assert_eq!(base.keys().collect::<Vec<_>>(), probed.keys().collect::<Vec<_>>());
        for key in base.keys() {
            if key == target {
                prop_assert_eq!(probed.get(key), Some(&value));
            } else {
                prop_assert_eq!(base.get(key), probed.get(key));
            }
        }
    }
}

fn expected_kind(status: u16, error: Option<&str>, json_type: bool, body_ok: bool) -> FailureKind {
    match error {
        Some(e) if e.to_lowercase().contains("timeout") || e.to_lowercase().contains("timed out") => {
            FailureKind::Timeout
        }
        Some(_) => FailureKind::Crash,
        None if (500..600).contains(&status) => FailureKind::ServerError,
        None if (400..500).contains(&status) => FailureKind::ClientError,
        None if json_type && !body_ok => FailureKind::InvalidJson,
        None => FailureKind::None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10_000))]

    #[test]
    fn classification_is_total_and_ordered(
        status in prop::sample::select(vec![200u16, 201, 400, 404, 500, 503]),
        error in prop::sample::select(vec![None, Some("Timeout after 5s"), Some("ConnectionError: refused")]),
        json_type in any::<bool>(),
        body_ok in any::<bool>(),
    ) {
        let content_type = if json_type { "application/json" } else { "text/plain" };
        let body = if body_ok { r#"{"ok":true}"# } else { "<html>oops" };
        let mut outcome = ExecutionOutcome::response(
            status,
            vec![("Content-Type".to_string(), content_type.to_string())],
            Some(body.to_string()),
            0.01,
        );
        outcome.error = error.map(String::from);

        let classification = classify(&outcome);
        prop_assert_eq!(classification.kind, expected_kind(status, error, json_type, body_ok));
        prop_assert_eq!(classification.flags.count(), usize::from(classification.is_failure()));
        prop_assert!(
            !classification.is_failure() || classification.flags.get(classification.kind)
        );
    }
}
