use serde_json::Value as JsonValue;
use tableschema_core::Value;

use super::CastResult;

pub(super) fn decode_json(raw: &JsonValue) -> Result<JsonValue, String> {
    match raw {
        JsonValue::String(text) => {
            serde_json::from_str(text).map_err(|err| format!("failed to decode json: {err}"))
        }
        other => Ok(other.clone()),
    }
}

pub(super) fn cast_array(raw: &JsonValue) -> CastResult {
    match decode_json(raw)? {
        JsonValue::Array(items) => Ok(Value::Array(items)),
        _ => Err("value must be an array".to_string()),
    }
}

pub(super) fn cast_object(raw: &JsonValue) -> CastResult {
    match decode_json(raw)? {
        JsonValue::Object(map) => Ok(Value::Object(map)),
        _ => Err("value must be an object".to_string()),
    }
}
