use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as JsonValue;
use tableschema_core::Value;
use url::Url;

use super::CastResult;
use crate::field::Field;

const DEFAULT_TRUE_VALUES: [&str; 4] = ["true", "True", "TRUE", "1"];
const DEFAULT_FALSE_VALUES: [&str; 4] = ["false", "False", "FALSE", "0"];

pub(super) fn cast_boolean(field: &Field, raw: &JsonValue) -> CastResult {
    let text = match raw {
        JsonValue::Bool(flag) => return Ok(Value::Boolean(*flag)),
        JsonValue::String(text) => text.as_str(),
        _ => return Err("value must be a bool or string".to_string()),
    };

    let descriptor = field.descriptor();
    let is_true = match &descriptor.true_values {
        Some(values) => values.iter().any(|value| value == text),
        None => DEFAULT_TRUE_VALUES.contains(&text),
    };
    if is_true {
        return Ok(Value::Boolean(true));
    }

    let is_false = match &descriptor.false_values {
        Some(values) => values.iter().any(|value| value == text),
        None => DEFAULT_FALSE_VALUES.contains(&text),
    };
    if is_false {
        return Ok(Value::Boolean(false));
    }

    Err("invalid bool value".to_string())
}

pub(super) fn cast_string(format: &str, raw: &JsonValue) -> CastResult {
    let text = match raw {
        JsonValue::String(text) => text.clone(),
        JsonValue::Number(number) => number.to_string(),
        _ => return Err("value must be a string".to_string()),
    };

    match format {
        "email" if !text.contains('@') => Err("value is not a valid email".to_string()),
        "uri" if Url::parse(&text).is_err() => Err("value is not a valid uri".to_string()),
        "binary" if STANDARD.decode(text.as_bytes()).is_err() => {
            Err("value is not valid base64".to_string())
        }
        _ => Ok(Value::String(text)),
    }
}
