use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::Value as JsonValue;
use tableschema_core::{IsoDuration, Value};

use super::{CastResult, natural};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

static ISO_DURATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .ok()
});

fn as_text(raw: &JsonValue) -> Result<&str, String> {
    raw.as_str()
        .map(str::trim)
        .ok_or_else(|| "value must be a string".to_string())
}

fn strptime_error(format: &str) -> String {
    format!("couldn't parse date/time according to given strptime format '{format}'")
}

pub(super) fn cast_date(format: &str, raw: &JsonValue) -> CastResult {
    let text = as_text(raw)?;
    match format {
        "any" => natural::parse_date(text)
            .map(Value::Date)
            .ok_or_else(|| "value is not a recognizable date".to_string()),
        "default" => NaiveDate::parse_from_str(text, DEFAULT_DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| strptime_error(DEFAULT_DATE_FORMAT)),
        pattern => NaiveDate::parse_from_str(text, pattern)
            .map(Value::Date)
            .map_err(|_| strptime_error(pattern)),
    }
}

pub(super) fn cast_datetime(format: &str, raw: &JsonValue) -> CastResult {
    let text = as_text(raw)?;
    match format {
        "default" => {
            let Some(stripped) = text.strip_suffix('Z') else {
                return Err("must have trailing Z".to_string());
            };
            NaiveDateTime::parse_from_str(stripped, DEFAULT_DATETIME_FORMAT)
                .map(Value::Datetime)
                .map_err(|err| err.to_string())
        }
        "any" => natural::parse_datetime(text)
            .map(Value::Datetime)
            .ok_or_else(|| "value is not a recognizable datetime".to_string()),
        pattern => NaiveDateTime::parse_from_str(text, pattern)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, pattern)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(Value::Datetime)
            .ok_or_else(|| strptime_error(pattern)),
    }
}

pub(super) fn cast_time(format: &str, raw: &JsonValue) -> CastResult {
    let text = as_text(raw)?;
    match format {
        "default" => {
            let parts: Vec<&str> = text.split(':').collect();
            let [hour, minute, second] = parts.as_slice() else {
                return Err("invalid value".to_string());
            };
            let component = |part: &str| part.parse::<u32>().ok();
            match (component(*hour), component(*minute), component(*second)) {
                (Some(hour), Some(minute), Some(second)) => {
                    NaiveTime::from_hms_opt(hour, minute, second)
                        .map(Value::Time)
                        .ok_or_else(|| "invalid value".to_string())
                }
                _ => Err("invalid value".to_string()),
            }
        }
        "any" => natural::parse_time(text)
            .map(Value::Time)
            .ok_or_else(|| "value is not a recognizable time".to_string()),
        pattern => NaiveTime::parse_from_str(text, pattern)
            .map(Value::Time)
            .map_err(|_| strptime_error(pattern)),
    }
}

pub(super) fn cast_yearmonth(raw: &JsonValue) -> CastResult {
    let (year, month) = match raw {
        JsonValue::Array(items) => match items.as_slice() {
            [year, month] => (json_integer(year), json_integer(month)),
            _ => return Err("invalid value".to_string()),
        },
        JsonValue::String(_) | JsonValue::Number(_) => {
            let text = match raw {
                JsonValue::String(text) => text.clone(),
                other => other.to_string(),
            };
            let parts: Vec<&str> = text.split('-').collect();
            match parts.as_slice() {
                [year, month] if !year.is_empty() && !month.is_empty() => {
                    (year.trim().parse().ok(), month.trim().parse().ok())
                }
                _ => return Err("invalid value".to_string()),
            }
        }
        _ => return Err("invalid value".to_string()),
    };

    match (year, month) {
        (Some(year), Some(month)) if (1..=12).contains(&month) => Ok(Value::YearMonth {
            year,
            month: month as u32,
        }),
        _ => Err("invalid value".to_string()),
    }
}

fn json_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(number) => number.as_i64(),
        JsonValue::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(super) fn cast_duration(raw: &JsonValue) -> CastResult {
    let text = raw
        .as_str()
        .map(str::trim)
        .ok_or_else(|| "must be string".to_string())?;
    parse_duration(text)
        .map(Value::Duration)
        .ok_or_else(|| "value is not a valid ISO 8601 duration".to_string())
}

fn parse_duration(text: &str) -> Option<IsoDuration> {
    let captures = ISO_DURATION.as_ref()?.captures(text)?;
    if captures.iter().skip(1).all(|group| group.is_none()) {
        return None;
    }
    if text.ends_with('T') {
        return None;
    }

    let whole = |index: usize| -> Option<u64> {
        match captures.get(index) {
            Some(group) => group.as_str().parse().ok(),
            None => Some(0),
        }
    };
    let seconds = match captures.get(7) {
        Some(group) => group.as_str().parse().ok()?,
        None => 0.0,
    };

    Some(IsoDuration {
        years: whole(1)?,
        months: whole(2)?,
        days: whole(3)?.checked_mul(7)?.checked_add(whole(4)?)?,
        hours: whole(5)?,
        minutes: whole(6)?,
        seconds,
    })
}
