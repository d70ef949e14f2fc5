//! Dotted-path JSON access.
//!
//! Paths form a small closed grammar: a sequence of steps separated by `.`,
//! where each step is either a field name or a numeric array index
//! (`choices.0.message.content`). Resolution walks the sequence and returns
//! `None` on any missing step rather than raising.

use serde_json::Value;

/// Walk a dotted path into a JSON value.
///
/// Numeric steps index into arrays; all other steps (and numeric steps
/// applied to objects) are object field lookups. An empty path returns the
/// value itself.
#[must_use]
pub fn json_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for step in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(step.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get(step)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Coerce a JSON value to a finite number.
///
/// Accepts numbers and numeric strings; everything else is `None`.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Walk a path and coerce the result to a finite number.
#[must_use]
pub fn get_number(value: &Value, path: &str) -> Option<f64> {
    json_get(value, path).and_then(as_number)
}

/// Walk a path and return a trimmed, non-empty string.
#[must_use]
pub fn get_text(value: &Value, path: &str) -> Option<String> {
    let s = json_get(value, path)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_fields_and_indices() {
        let value = json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(
            json_get(&value, "choices.0.message.content"),
            Some(&json!("hi"))
        );
    }

    #[test]
    fn missing_step_is_none_not_panic() {
        let value = json!({"choices": []});
        assert_eq!(json_get(&value, "choices.0.message"), None);
        assert_eq!(json_get(&value, "nope.deeper"), None);
        assert_eq!(json_get(&json!(42), "field"), None);
    }

    #[test]
    fn numeric_step_on_object_is_field_lookup() {
        let value = json!({"0": "zero"});
        assert_eq!(json_get(&value, "0"), Some(&json!("zero")));
    }

    #[test]
    fn empty_path_returns_value() {
        let value = json!({"a": 1});
        assert_eq!(json_get(&value, ""), Some(&value));
    }

    #[test]
    fn as_number_accepts_numeric_strings() {
        assert_eq!(as_number(&json!(12)), Some(12.0));
        assert_eq!(as_number(&json!("12.5")), Some(12.5));
        assert_eq!(as_number(&json!(" 7 ")), Some(7.0));
        assert_eq!(as_number(&json!("")), None);
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!(true)), None);
        assert_eq!(as_number(&json!(null)), None);
    }

    #[test]
    fn get_text_trims_and_rejects_empty() {
        let value = json!({"msg": "  hello  ", "blank": "   "});
        assert_eq!(get_text(&value, "msg"), Some("hello".to_string()));
        assert_eq!(get_text(&value, "blank"), None);
        assert_eq!(get_text(&value, "missing"), None);
    }
}
