//! Per-field diff-against-parent-profile save: only keys whose serialized value actually differs
//! from the parent profile's are written back out, recursively through
//! nested objects, so an idempotent second save produces an empty diff.
use serde_json::Value;

/// Returns the subset of `child` that differs from `parent`. Object
/// values are compared key-by-key (recursively); any other value type
/// is compared wholesale. A key present in `child` but absent from
/// `parent` is always kept.
pub fn diff_against_parent(child: &Value, parent: &Value) -> Value {
    match (child, parent) {
        (Value::Object(child_map), Value::Object(parent_map)) => {
            let mut out = serde_json::Map::new();
            for (key, child_value) in child_map {
                match parent_map.get(key) {
                    Some(parent_value) if parent_value == child_value => continue,
                    Some(parent_value) => {
                        let nested = diff_against_parent(child_value, parent_value);
                        if !(nested.is_object() && nested.as_object().unwrap().is_empty()) {
                            out.insert(key.clone(), nested);
                        }
                    }
                    None => {
                        out.insert(key.clone(), child_value.clone());
                    }
                }
            }
            Value::Object(out)
        }
        (child, parent) if child == parent => Value::Object(serde_json::Map::new()),
        (child, _) => child.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_values_diff_to_empty_object() {
        let value = json!({"a": 1, "b": {"c": 2}});
        let diff = diff_against_parent(&value, &value);
        assert_eq!(diff, json!({}));
    }

    #[test]
    fn only_diverging_keys_are_kept() {
        let parent = json!({"a": 1, "b": 2, "c": 3});
        let child = json!({"a": 1, "b": 99, "c": 3});
        let diff = diff_against_parent(&child, &parent);
        assert_eq!(diff, json!({"b": 99}));
    }

    #[test]
    fn nested_objects_diff_recursively() {
        let parent = json!({"outer": {"x": 1, "y": 2}});
        let child = json!({"outer": {"x": 1, "y": 99}});
        let diff = diff_against_parent(&child, &parent);
        assert_eq!(diff, json!({"outer": {"y": 99}}));
    }

    #[test]
    fn keys_absent_from_parent_are_always_kept() {
        let parent = json!({"a": 1});
        let child = json!({"a": 1, "b": 2});
        let diff = diff_against_parent(&child, &parent);
        assert_eq!(diff, json!({"b": 2}));
    }

    #[test]
    fn applying_diff_twice_is_idempotent() {
        let parent = json!({"a": 1, "b": 2});
        let child = json!({"a": 1, "b": 99});
        let first = diff_against_parent(&child, &parent);
        let second = diff_against_parent(&child, &parent);
        assert_eq!(first, second);
    }
}
