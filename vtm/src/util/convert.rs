//! Primitive converters between `Dynamic` values and JSON
//!
//! A value of the wrong shape is always a `TypeMismatch`; nothing here
//! coerces.

use serde_json::Value;
use tfplug::{Dynamic, TfplugError};

type Result<T> = std::result::Result<T, TfplugError>;

/// Collect the strings of a list (in order) or set (in stored order)
pub fn to_string_array(value: &Dynamic) -> Result<Vec<String>> {
    let items = match value {
        Dynamic::List(items) | Dynamic::Set(items) => items,
        other => {
            return Err(TfplugError::type_mismatch(
                "list or set of strings",
                other.type_name(),
            ))
        }
    };

    items
        .iter()
        .map(|item| match item {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(TfplugError::type_mismatch("string", other.type_name())),
        })
        .collect()
}

fn json_strings(value: &Value) -> Result<Vec<Dynamic>> {
    let items = value
        .as_array()
        .ok_or_else(|| TfplugError::type_mismatch("array", json_type(value)))?;
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(Dynamic::String(s.clone())),
            other => Err(TfplugError::type_mismatch("string", json_type(other))),
        })
        .collect()
}

/// Remote string array as an ordered list
pub fn string_list_value(value: &Value) -> Result<Dynamic> {
    Ok(Dynamic::List(json_strings(value)?))
}

/// Remote string array as a set
pub fn string_set_value(value: &Value) -> Result<Dynamic> {
    Ok(Dynamic::Set(json_strings(value)?))
}

pub fn string_to_json(value: &Dynamic) -> Result<Value> {
    match value {
        Dynamic::String(s) => Ok(Value::String(s.clone())),
        other => Err(TfplugError::type_mismatch("string", other.type_name())),
    }
}

pub fn bool_to_json(value: &Dynamic) -> Result<Value> {
    match value {
        Dynamic::Bool(b) => Ok(Value::Bool(*b)),
        other => Err(TfplugError::type_mismatch("bool", other.type_name())),
    }
}

/// Integers travel as `Number`; anything with a fraction or outside the i64
/// range is rejected
pub fn int_to_json(value: &Dynamic) -> Result<Value> {
    match value {
        Dynamic::Number(n) if !n.is_finite() || n.fract() != 0.0 => Err(
            TfplugError::type_mismatch("whole number", format!("number {}", n)),
        ),
        // i64::MAX as f64 rounds up to 2^63, which does not fit
        Dynamic::Number(n) if n.abs() >= i64::MAX as f64 => Err(TfplugError::type_mismatch(
            "64-bit integer",
            format!("number {}", n),
        )),
        Dynamic::Number(n) => Ok(Value::from(*n as i64)),
        other => Err(TfplugError::type_mismatch("number", other.type_name())),
    }
}

pub fn strings_to_json(value: &Dynamic) -> Result<Value> {
    Ok(Value::Array(
        to_string_array(value)?
            .into_iter()
            .map(Value::String)
            .collect(),
    ))
}

pub fn string_value(value: &Value) -> Result<Dynamic> {
    match value {
        Value::String(s) => Ok(Dynamic::String(s.clone())),
        other => Err(TfplugError::type_mismatch("string", json_type(other))),
    }
}

pub fn bool_value(value: &Value) -> Result<Dynamic> {
    match value {
        Value::Bool(b) => Ok(Dynamic::Bool(*b)),
        other => Err(TfplugError::type_mismatch("bool", json_type(other))),
    }
}

pub fn int_value(value: &Value) -> Result<Dynamic> {
    if let Some(n) = value.as_i64() {
        return Ok(Dynamic::Number(n as f64));
    }
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 => Ok(Dynamic::Number(n)),
        Some(n) => Err(TfplugError::type_mismatch(
            "whole number",
            format!("number {}", n),
        )),
        None => Err(TfplugError::type_mismatch("number", json_type(value))),
    }
}

pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_keeps_order() {
        let value = Dynamic::List(vec![
            Dynamic::String("rule-b".into()),
            Dynamic::String("rule-a".into()),
        ]);
        assert_eq!(to_string_array(&value).unwrap(), vec!["rule-b", "rule-a"]);
    }

    #[test]
    fn set_yields_stored_order() {
        let value = Dynamic::Set(vec![
            Dynamic::String("example.com".into()),
            Dynamic::String("example.org".into()),
        ]);
        let mut out = to_string_array(&value).unwrap();
        out.sort();
        assert_eq!(out, vec!["example.com", "example.org"]);
    }

    #[test]
    fn non_string_element_is_a_type_mismatch() {
        let value = Dynamic::List(vec![Dynamic::String("a".into()), Dynamic::Number(1.0)]);
        let err = to_string_array(&value).unwrap_err();
        assert!(matches!(err, TfplugError::TypeMismatch { .. }));
    }

    #[test]
    fn scalar_is_not_a_string_array() {
        assert!(to_string_array(&Dynamic::String("a".into())).is_err());
        assert!(to_string_array(&Dynamic::Null).is_err());
    }

    #[test]
    fn ints_must_be_whole() {
        assert_eq!(int_to_json(&Dynamic::Number(80.0)).unwrap(), json!(80));
        assert!(int_to_json(&Dynamic::Number(1.5)).is_err());
        assert_eq!(int_value(&json!(9070)).unwrap(), Dynamic::Number(9070.0));
        assert_eq!(int_value(&json!(-1)).unwrap(), Dynamic::Number(-1.0));
        assert!(int_value(&json!(2.5)).is_err());
        assert!(int_value(&json!("80")).is_err());
    }

    #[test]
    fn ints_out_of_range_are_rejected() {
        assert!(matches!(
            int_to_json(&Dynamic::Number(1e19)),
            Err(TfplugError::TypeMismatch { .. })
        ));
        assert!(int_to_json(&Dynamic::Number(-1e19)).is_err());
        assert!(int_to_json(&Dynamic::Number(i64::MAX as f64)).is_err());
        assert!(int_to_json(&Dynamic::Number(f64::INFINITY)).is_err());
        assert_eq!(
            int_to_json(&Dynamic::Number(4294967295.0)).unwrap(),
            json!(4294967295_i64)
        );
    }

    #[test]
    fn remote_arrays_become_lists_or_sets() {
        let remote = json!(["b", "a"]);
        assert_eq!(
            string_list_value(&remote).unwrap(),
            Dynamic::List(vec![Dynamic::String("b".into()), Dynamic::String("a".into())])
        );
        assert_eq!(
            string_set_value(&remote).unwrap(),
            Dynamic::Set(vec![Dynamic::String("a".into()), Dynamic::String("b".into())])
        );
        assert!(string_list_value(&json!([1])).is_err());
        assert!(string_list_value(&json!("a")).is_err());
    }

    #[test]
    fn scalars_are_not_coerced() {
        assert!(bool_value(&json!("true")).is_err());
        assert!(string_value(&json!(1)).is_err());
        assert!(bool_to_json(&Dynamic::String("false".into())).is_err());
        assert!(string_to_json(&Dynamic::Bool(true)).is_err());
    }
}
