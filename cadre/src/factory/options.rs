//! Option maps and declarative data attributes.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Widget options: a JSON object.
pub type Options = Map<String, Value>;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid options for '{widget}': {source}")]
    Invalid {
        widget: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("options for '{0}' must be an object")]
    NotAnObject(String),
}

/// Shallow merge: every key of `other` overwrites the same key in `base`.
pub fn extend(base: &mut Options, other: &Options) {
    for (key, value) in other {
        base.insert(key.clone(), value.clone());
    }
}

/// Interpret an options value that must be an object.
pub fn as_object(widget: &str, value: Value) -> Result<Options, OptionsError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(OptionsError::NotAnObject(widget.to_string())),
    }
}

/// Deserialise a typed view of `options`.
pub fn deserialize<T: DeserializeOwned>(widget: &str, options: &Options) -> Result<T, OptionsError> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|source| OptionsError::Invalid {
        widget: widget.to_string(),
        source,
    })
}

/// Convert data attributes into options.
///
/// Keys go from `kebab-case` to `camelCase`; values are converted with
/// [`parse_data_value`].
pub fn from_data_attributes(data: &HashMap<String, String>) -> Options {
    data.iter()
        .map(|(key, raw)| (camel_case(key), parse_data_value(raw)))
        .collect()
}

/// `throttle-delay` -> `throttleDelay`.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a raw attribute string into a JSON value.
///
/// `true`, `false` and `null` become literals, numbers become numbers when
/// they print back identically (`"300"` but not `"0300"`), strings that look
/// like objects or arrays are parsed as JSON. Anything else stays a string.
pub fn parse_data_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if let Ok(number) = serde_json::from_str::<Number>(raw) {
        if number.to_string() == raw {
            return Value::Number(number);
        }
    }

    let looks_structured = (raw.starts_with('{') && raw.ends_with('}'))
        || (raw.starts_with('[') && raw.ends_with(']'));
    if looks_structured {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return value;
        }
    }

    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("throttle-delay"), "throttleDelay");
        assert_eq!(camel_case("dropdown-handle-selector"), "dropdownHandleSelector");
        assert_eq!(camel_case("addons"), "addons");
    }

    #[test]
    fn test_parse_data_value() {
        assert_eq!(parse_data_value("true"), json!(true));
        assert_eq!(parse_data_value("null"), Value::Null);
        assert_eq!(parse_data_value("300"), json!(300));
        assert_eq!(parse_data_value("1.5"), json!(1.5));
        assert_eq!(parse_data_value("0300"), json!("0300"));
        assert_eq!(parse_data_value(r#"{"on":{}}"#), json!({"on": {}}));
        assert_eq!(parse_data_value("[1,2]"), json!([1, 2]));
        assert_eq!(parse_data_value("{broken"), json!("{broken"));
        assert_eq!(parse_data_value("tooltip analytics"), json!("tooltip analytics"));
    }

    #[test]
    fn test_extend_is_shallow() {
        let mut base = as_object("t", json!({"a": 1, "nested": {"x": 1, "y": 2}})).unwrap();
        let other = as_object("t", json!({"b": 2, "nested": {"x": 9}})).unwrap();
        extend(&mut base, &other);
        assert_eq!(Value::Object(base), json!({"a": 1, "b": 2, "nested": {"x": 9}}));
    }
}
