//! Canonical ordering of JSON value trees so that logically equal artifacts
//! serialize byte for byte identically.

use serde_json::{Map, Value};

/// Returns a canonically ordered copy of `value`:
///
/// * objects: keys sorted ascending, values canonicalized
/// * arrays of objects that all carry a `name` field: stably sorted by name
/// * arrays of strings: sorted ascending
/// * any other array keeps its order; its elements are canonicalized
/// * scalars are returned unchanged
///
/// `canonicalize(&canonicalize(x)) == canonicalize(x)` for every `x`.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonicalize_object(map)),
        Value::Array(items) => Value::Array(canonicalize_array(items)),
        scalar => scalar.clone(),
    }
}

fn canonicalize_object(map: &Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), canonicalize(value)))
        .collect()
}

fn canonicalize_array(items: &[Value]) -> Vec<Value> {
    let mut ordered: Vec<&Value> = items.iter().collect();

    if items.iter().all(is_named_object) {
        // sort_by_key is stable, ties keep input order
        ordered.sort_by_key(|item| name_of(*item));
    } else if items.iter().all(Value::is_string) {
        ordered.sort_by_key(|item| Value::as_str(*item));
    }

    ordered.into_iter().map(canonicalize).collect()
}

fn is_named_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("name"))
}

// Non-string names sort before every string name.
fn name_of(value: &Value) -> Option<&str> {
    value.get("name").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn to_text(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap()
    }

    #[test]
    fn test_object_keys_sorted() {
        let value = json!({"b": 1, "a": {"d": true, "c": null}});
        assert_eq!(
            to_text(&canonicalize(&value)),
            to_text(&json!({"a": {"c": null, "d": true}, "b": 1}))
        );
        let keys: Vec<_> = canonicalize(&value)
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_named_objects_sorted_by_name() {
        let value = json!([{"name": "b"}, {"name": "a"}]);
        assert_eq!(canonicalize(&value), json!([{"name": "a"}, {"name": "b"}]));
    }

    #[test]
    fn test_name_sort_is_stable() {
        let value = json!([
            {"name": "b", "n": 1},
            {"name": "a", "n": 2},
            {"name": "b", "n": 3},
            {"name": "a", "n": 4}
        ]);
        assert_eq!(
            canonicalize(&value),
            json!([
                {"n": 2, "name": "a"},
                {"n": 4, "name": "a"},
                {"n": 1, "name": "b"},
                {"n": 3, "name": "b"}
            ])
        );
    }

    #[test]
    fn test_strings_sorted() {
        let value = json!(["HTTP Server", "Database Client", "HTTP Client"]);
        assert_eq!(
            canonicalize(&value),
            json!(["Database Client", "HTTP Client", "HTTP Server"])
        );
    }

    #[test]
    fn test_mixed_arrays_keep_order() {
        let value = json!([{"name": "z"}, {"span_kind": "CLIENT"}, {"name": "a"}]);
        assert_eq!(canonicalize(&value), value);

        let value = json!(["b", 1, "a"]);
        assert_eq!(canonicalize(&value), value);

        let value = json!([[{"z": 1, "a": 2}], "x"]);
        let canonical = canonicalize(&value);
        assert_eq!(canonical, value);
        let inner_keys: Vec<_> = canonical[0][0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(inner_keys, vec!["a", "z"]);
    }

    #[test]
    fn test_non_string_names_sort_first() {
        let value = json!([{"name": "a"}, {"name": 7}]);
        assert_eq!(canonicalize(&value), json!([{"name": 7}, {"name": "a"}]));
    }

    #[test]
    fn test_scalars_unchanged() {
        for value in [json!(null), json!(true), json!(1.5), json!("x")] {
            assert_eq!(canonicalize(&value), value);
        }
    }

    #[test]
    fn test_idempotent() {
        let value = json!({
            "2.20": [
                {"name": "netty", "semconv": ["HTTP Server", "HTTP Client"], "telemetry": [
                    {"when": "default", "spans": [{"span_kind": "SERVER", "attributes": [
                        {"name": "url.path"}, {"name": "http.route", "semconv": true}
                    ]}]}
                ]},
                {"name": "akka", "tags": [["y", "x"], ["b", "a"]]}
            ],
            "1.0": []
        });

        let once = canonicalize(&value);
        let twice = canonicalize(&once);
        assert_eq!(to_text(&once), to_text(&twice));
        assert_eq!(once["2.20"][0]["name"], json!("akka"));
        assert_eq!(once["2.20"][0]["tags"], json!([["x", "y"], ["a", "b"]]));
    }

    #[test]
    fn test_idempotent_with_duplicate_names_and_mixed_arrays() {
        let value = json!([
            {"name": "b", "items": [
                {"name": "y", "v": [2, "b", "a"]},
                {"name": "y", "v": ["d", "c"]}
            ]},
            {"name": "a", "items": [{"name": "x"}, 3, {"name": "w"}]},
            {"name": "b", "items": [[{"name": "q"}, {"name": "p"}], ["s", "r"], null]},
            {"name": ["z", "y"]},
            {"name": null}
        ]);

        let once = canonicalize(&value);
        assert_eq!(to_text(&canonicalize(&once)), to_text(&once));
        assert_eq!(
            once,
            json!([
                {"name": ["y", "z"]},
                {"name": null},
                {"items": [{"name": "x"}, 3, {"name": "w"}], "name": "a"},
                {"items": [
                    {"name": "y", "v": [2, "b", "a"]},
                    {"name": "y", "v": ["c", "d"]}
                ], "name": "b"},
                {"items": [[{"name": "p"}, {"name": "q"}], ["r", "s"], null], "name": "b"}
            ])
        );
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-c]{0,2}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("name|[a-c]", inner.clone()), 0..6)
                    .prop_map(|fields| Value::Object(fields.into_iter().collect())),
                // named objects with frequent duplicate names
                prop::collection::vec(("[a-c]", inner), 0..6).prop_map(|items| {
                    items
                        .into_iter()
                        .map(|(name, value)| json!({"name": name, "value": value}))
                        .collect::<Value>()
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_idempotent_for_generated_trees(value in arb_value()) {
            let once = canonicalize(&value);
            prop_assert_eq!(to_text(&canonicalize(&once)), to_text(&once));
        }
    }
}
