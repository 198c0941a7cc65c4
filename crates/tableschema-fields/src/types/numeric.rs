use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;
use tableschema_core::{FieldDescriptor, Value};

use super::CastResult;
use crate::field::Field;

static NUMERIC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").ok());
static CURRENCY_EDGES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\s\p{Sc}]+|[\s\p{Sc}]+$").ok());
static NON_DIGIT_EDGES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\D+|\D+$").ok());

/// Parse a plain decimal literal. `inf`, `NaN` and hex forms are not numbers here.
pub(super) fn parse_numeric(text: &str) -> Option<f64> {
    let text = text.trim();
    let numeric = NUMERIC.as_ref()?;
    if !numeric.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(super) fn parse_integer(raw: &JsonValue) -> Result<i64, String> {
    let number = match raw {
        JsonValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            number.as_f64()
        }
        JsonValue::String(text) => {
            let text = text.trim();
            if let Ok(int) = text.parse::<i64>() {
                return Ok(int);
            }
            parse_numeric(text)
        }
        _ => None,
    };

    let number = number.ok_or_else(|| "value must be numeric".to_string())?;
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Ok(number as i64)
    } else {
        Err("value must be an integer".to_string())
    }
}

pub(super) fn cast_integer(raw: &JsonValue) -> CastResult {
    parse_integer(raw).map(Value::Integer)
}

pub(super) fn cast_year(raw: &JsonValue) -> CastResult {
    parse_integer(raw)
        .map(Value::Year)
        .map_err(|_| "value must be a year".to_string())
}

pub(super) fn cast_number(field: &Field, raw: &JsonValue) -> CastResult {
    match raw {
        JsonValue::Number(number) => number
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| "value must be numeric".to_string()),
        JsonValue::String(text) => parse_localized(field.descriptor(), text)
            .map(Value::Number)
            .ok_or_else(|| "value must be numeric".to_string()),
        _ => Err("value must be numeric".to_string()),
    }
}

/// Apply the descriptor's currency, percent, group and decimal conventions.
fn parse_localized(descriptor: &FieldDescriptor, text: &str) -> Option<f64> {
    let mut text = text.trim().to_string();

    if descriptor.currency == Some(true) {
        text = CURRENCY_EDGES.as_ref()?.replace_all(&text, "").into_owned();
    }
    if descriptor.bare_number == Some(false) {
        text = NON_DIGIT_EDGES.as_ref()?.replace_all(&text, "").into_owned();
    }

    let mut percent = false;
    if let Some(stripped) = text.strip_suffix('%') {
        text = stripped.trim_end().to_string();
        percent = true;
    }

    if let Some(group) = descriptor.group_char.as_deref().filter(|group| !group.is_empty()) {
        text = text.replace(group, "");
    }
    if let Some(decimal) = descriptor.decimal_char.as_deref() {
        if !decimal.is_empty() && decimal != "." {
            text = text.replace(decimal, ".");
        }
    }

    let value = parse_numeric(&text)?;
    Some(if percent { value / 100.0 } else { value })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_literals_exclude_special_values() {
        assert_eq!(parse_numeric(" 1.5 "), Some(1.5));
        assert_eq!(parse_numeric(".5"), Some(0.5));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("0x10"), None);
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(parse_integer(&json!("1")), Ok(1));
        assert_eq!(parse_integer(&json!(2.0)), Ok(2));
        assert!(parse_integer(&json!("3.14")).is_err());
        assert!(parse_integer(&json!(true)).is_err());
    }
}
