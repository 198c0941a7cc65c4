use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// 2^63; whole numbers inside `[-2^63, 2^63)` convert to `i64` exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// A row as read from a data source: header name to raw value.
pub type RawRow = IndexMap<String, JsonValue>;

/// A row after casting: field name to native value.
pub type Row = IndexMap<String, Value>;

/// Native value produced by casting a raw value through a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Date(NaiveDate),
    /// UTC datetime.
    Datetime(NaiveDateTime),
    Time(NaiveTime),
    Year(i64),
    YearMonth { year: i64, month: u32 },
    Duration(IsoDuration),
    Geopoint(GeoPoint),
    Array(Vec<JsonValue>),
    Object(Map<String, JsonValue>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Datetime(_) => "datetime",
            Value::Time(_) => "time",
            Value::Year(_) => "year",
            Value::YearMonth { .. } => "yearmonth",
            Value::Duration(_) => "duration",
            Value::Geopoint(_) => "geopoint",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Map a JSON value onto the closest native value without interpretation.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(flag) => Value::Boolean(*flag),
            JsonValue::Number(number) => match number.as_i64() {
                Some(int) => Value::Integer(int),
                None => Value::Number(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(text) => Value::String(text.clone()),
            JsonValue::Array(items) => Value::Array(items.clone()),
            JsonValue::Object(map) => Value::Object(map.clone()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(flag) => JsonValue::Bool(*flag),
            Value::Integer(int) | Value::Year(int) => JsonValue::from(*int),
            Value::Number(number) => serde_json::Number::from_f64(*number)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(text) => JsonValue::String(text.clone()),
            Value::Array(items) => JsonValue::Array(items.clone()),
            Value::Object(map) => JsonValue::Object(map.clone()),
            other => JsonValue::String(other.to_string()),
        }
    }

    /// Length for minLength/maxLength, where the value has one.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(text) => Some(text.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Ordering used by minimum/maximum; `None` when the values are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) | (Value::Year(a), Value::Year(b)) => {
                Some(a.cmp(b))
            }
            (Value::Integer(a), Value::Number(b)) => (*a as f64).partial_cmp(b),
            (Value::Number(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Datetime(a), Value::Datetime(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (
                Value::YearMonth { year: ay, month: am },
                Value::YearMonth { year: by, month: bm },
            ) => Some((ay, am).cmp(&(by, bm))),
            (Value::Duration(a), Value::Duration(b)) => {
                a.approximate_seconds().partial_cmp(&b.approximate_seconds())
            }
            _ => None,
        }
    }

    /// Stable textual key used for uniqueness and primary-key bookkeeping.
    pub fn key(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Number(number)
                if number.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(number) =>
            {
                format!("number:{}", *number as i64)
            }
            Value::Number(number) => format!("number:{number:?}"),
            Value::Integer(int) => format!("number:{int}"),
            other => format!("{}:{}", other.type_name(), other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(flag) => write!(f, "{flag}"),
            Value::Integer(int) | Value::Year(int) => write!(f, "{int}"),
            Value::Number(number) => write!(f, "{number}"),
            Value::String(text) => f.write_str(text),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Value::Datetime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.fZ")),
            Value::Time(time) => write!(f, "{}", time.format("%H:%M:%S")),
            Value::YearMonth { year, month } => write!(f, "{year:04}-{month:02}"),
            Value::Duration(duration) => write!(f, "{duration}"),
            Value::Geopoint(point) => write!(f, "{}, {}", point.lon, point.lat),
            Value::Array(items) => {
                write!(f, "{}", JsonValue::Array(items.clone()))
            }
            Value::Object(map) => write!(f, "{}", JsonValue::Object(map.clone())),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

/// ISO 8601 duration split into its components. Weeks are folded into days.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsoDuration {
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: f64,
}

impl IsoDuration {
    /// Seconds assuming 365-day years and 30-day months.
    pub fn approximate_seconds(&self) -> f64 {
        let days = self.years as f64 * 365.0 + self.months as f64 * 30.0 + self.days as f64;
        ((days * 24.0 + self.hours as f64) * 60.0 + self.minutes as f64) * 60.0 + self.seconds
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        let has_time = self.hours > 0 || self.minutes > 0 || self.seconds > 0.0;
        if has_time {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0.0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.years == 0 && self.months == 0 && self.days == 0 {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Compact rendering of a raw value for error messages: strings unquoted, the rest as JSON.
pub fn display_raw(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Composite key over several values, escaped so components cannot collide.
pub fn tuple_key<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    values
        .into_iter()
        .map(|value| escape_key_component(&value.key()))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_key_component(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integers_and_whole_numbers_share_a_key() {
        assert_eq!(Value::Integer(1).key(), Value::Number(1.0).key());
        assert_ne!(Value::Integer(1).key(), Value::String("1".into()).key());
    }

    #[test]
    fn large_whole_numbers_keep_distinct_keys() {
        assert_ne!(Value::Number(1e20).key(), Value::Number(5e20).key());
        assert_ne!(Value::Number(-1e20).key(), Value::Number(-5e20).key());
        assert_ne!(
            Value::Number(1e20).key(),
            Value::Integer(i64::MAX).key()
        );
        assert_eq!(
            Value::Integer(i64::MIN).key(),
            Value::Number(-9_223_372_036_854_775_808.0).key()
        );
    }

    #[test]
    fn huge_durations_compare_without_overflow() {
        let huge = IsoDuration {
            years: u64::MAX,
            ..IsoDuration::default()
        };
        let small = IsoDuration {
            days: 1,
            ..IsoDuration::default()
        };
        assert_eq!(
            Value::Duration(huge).compare(&Value::Duration(small)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn fractional_seconds_survive_datetime_rendering() {
        let datetime = NaiveDate::from_ymd_opt(2014, 1, 1)
            .and_then(|date| date.and_hms_milli_opt(6, 0, 0, 250))
            .expect("datetime");
        assert_eq!(
            Value::Datetime(datetime).to_json(),
            json!("2014-01-01T06:00:00.250Z")
        );
    }

    #[test]
    fn tuple_key_escapes_separators() {
        let a = tuple_key([&Value::from("a|b"), &Value::from("c")]);
        let b = tuple_key([&Value::from("a"), &Value::from("b|c")]);
        assert_ne!(a, b);
    }

    #[test]
    fn compare_crosses_integer_and_number() {
        assert_eq!(
            Value::Integer(2).compare(&Value::Number(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from("a").compare(&Value::Integer(1)), None);
    }

    #[test]
    fn durations_render_in_iso_form() {
        let duration = IsoDuration {
            years: 1,
            months: 10,
            days: 3,
            hours: 5,
            minutes: 11,
            seconds: 7.0,
        };
        assert_eq!(duration.to_string(), "P1Y10M3DT5H11M7S");
        assert_eq!(IsoDuration::default().to_string(), "PT0S");
    }

    #[test]
    fn display_raw_leaves_strings_unquoted() {
        assert_eq!(display_raw(&json!("abc")), "abc");
        assert_eq!(display_raw(&json!([1, 2])), "[1,2]");
        assert_eq!(display_raw(&json!(true)), "true");
    }

    #[test]
    fn temporal_values_serialize_as_strings() {
        let date = NaiveDate::from_ymd_opt(2014, 1, 1).expect("date");
        assert_eq!(Value::Date(date).to_json(), json!("2014-01-01"));
        assert_eq!(
            Value::YearMonth {
                year: 2000,
                month: 5
            }
            .to_json(),
            json!("2000-05")
        );
    }
}
