//! Storable-value validation.
//!
//! Values failing these checks are not written; callers decide whether
//! that is an error (field names) or a silent skip (field values).

use crate::value::Value;

/// Whether `name` can be used as a top-level field or nested object key.
///
/// Names must be non-empty, must not start with `$` or `_` (reserved for
/// encoding markers and store bookkeeping) and must not contain `.`.
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('$') && !name.starts_with('_') && !name.contains('.')
}

/// Whether `value` can be written to a record.
///
/// Rejects non-finite numbers and objects with invalid keys, recursively.
pub fn is_storable(value: &Value) -> bool {
    match value {
        Value::Null
        | Value::Bool(_)
        | Value::Integer(_)
        | Value::String(_)
        | Value::Date(_)
        | Value::Bytes(_)
        | Value::Pointer(_)
        | Value::Reference(_) => true,
        Value::Number(n) => n.is_finite(),
        Value::Array(items) => items.iter().all(is_storable),
        Value::Object(map) => map
            .iter()
            .all(|(k, v)| is_valid_field_name(k) && is_storable(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_finite_numbers_only() {
        assert!(is_storable(&Value::Number(1.5)));
        assert!(!is_storable(&Value::Number(f64::NAN)));
        assert!(!is_storable(&Value::Number(f64::INFINITY)));
    }

    #[test]
    fn test_nested_values_checked() {
        let bad = Value::Array(vec![Value::Integer(1), Value::Number(f64::NEG_INFINITY)]);
        assert!(!is_storable(&bad));

        let mut map = BTreeMap::new();
        map.insert("$op".to_string(), Value::Integer(1));
        assert!(!is_storable(&Value::Object(map)));
    }

    #[test]
    fn test_field_names() {
        assert!(is_valid_field_name("name"));
        assert!(is_valid_field_name("bestFriend"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("a.b"));
        assert!(!is_valid_field_name("_id"));
        assert!(!is_valid_field_name("$type"));
    }
}
