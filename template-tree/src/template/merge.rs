//! Pure deep merge of parameter values

use serde_json::Value;

/// Merge `source` into `target`, returning the merged value
///
/// Objects merge key by key and recurse when both sides hold a container.
/// Any other source value, including `null`, overwrites. Arrays merge index
/// by index: positions the target lacks take the source element, containers
/// merge recursively, and primitive source elements that do not already
/// appear in the target are appended.
///
/// ```rust
/// use serde_json::json;
/// use template_tree::template::deep_merge;
///
/// let merged = deep_merge(&json!({"a": 0, "b": 2}), &json!({"a": 1}));
/// assert_eq!(merged, json!({"a": 1, "b": 2}));
/// ```
#[must_use]
pub fn deep_merge(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            let mut merged = target.clone();
            for (key, value) in source {
                let next = match merged.get(key) {
                    Some(existing) if is_container(existing) && is_container(value) => {
                        deep_merge(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (Value::Array(target), Value::Array(source)) => {
            let mut merged = target.clone();
            for (index, value) in source.iter().enumerate() {
                match target.get(index) {
                    None => merged.push(value.clone()),
                    Some(existing) if is_container(value) => {
                        merged[index] = deep_merge(existing, value);
                    }
                    Some(_) => {
                        if !target.contains(value) {
                            merged.push(value.clone());
                        }
                    }
                }
            }
            Value::Array(merged)
        }
        _ => source.clone(),
    }
}

const fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_source_overrides_matching_keys() {
        let merged = deep_merge(&json!({"a": 0, "b": 2}), &json!({"a": 1}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let target = json!({"colors": {"bg": "#000", "fg": "#fff"}, "title": "x"});
        let source = json!({"colors": {"bg": "#222"}});
        assert_eq!(
            deep_merge(&target, &source),
            json!({"colors": {"bg": "#222", "fg": "#fff"}, "title": "x"})
        );
    }

    #[test]
    fn test_primitive_replaces_container() {
        let merged = deep_merge(&json!({"a": {"deep": true}}), &json!({"a": 3}));
        assert_eq!(merged, json!({"a": 3}));

        let merged = deep_merge(&json!({"a": 3}), &json!({"a": {"deep": true}}));
        assert_eq!(merged, json!({"a": {"deep": true}}));
    }

    #[test]
    fn test_null_source_overwrites() {
        let merged = deep_merge(&json!({"a": 1}), &json!({"a": null}));
        assert_eq!(merged, json!({"a": null}));
    }

    #[test]
    fn test_arrays_merge_by_index() {
        let target = json!([{"id": "a", "on": false}, 1]);
        let source = json!([{"on": true}, 2, 1]);
        assert_eq!(deep_merge(&target, &source), json!([{"id": "a", "on": true}, 1, 2]));
    }

    #[test]
    fn test_non_object_target_is_replaced() {
        assert_eq!(deep_merge(&Value::Null, &json!({"a": 1})), json!({"a": 1}));
        assert_eq!(deep_merge(&json!({"a": 1}), &json!("x")), json!("x"));
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ]
    }

    fn params() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-d]", inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    fn object() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-d]", params(), 0..5)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn prop_merging_empty_object_is_identity(target in object()) {
            prop_assert_eq!(deep_merge(&target, &json!({})), target);
        }

        #[test]
        fn prop_merging_with_itself_is_identity(value in params()) {
            prop_assert_eq!(deep_merge(&value, &value), value);
        }

        #[test]
        fn prop_scalar_source_keys_win(target in object(), source in object()) {
            let merged = deep_merge(&target, &source);
            for (key, value) in source.as_object().into_iter().flatten() {
                if !is_container(value) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }

        #[test]
        fn prop_target_keys_survive(target in object(), source in object()) {
            let merged = deep_merge(&target, &source);
            for key in target.as_object().into_iter().flat_map(|map| map.keys()) {
                prop_assert!(merged.get(key).is_some());
            }
        }
    }
}
