//! Permissive parsing behind the `any` format of date, datetime and time fields.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

static ORDINAL_SUFFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").ok());
static MERIDIEM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d)\s*([ap])\.?m\.?\b").ok());
static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

const DATE_FORMATS: [&str; 12] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d %b %Y",
    "%d %b, %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%a %d %b %Y",
    "%a, %d %b %Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
];

const TIME_FORMATS: [&str; 7] = [
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%I %p",
    "%I:%M:%S%p",
    "%I:%M%p",
];

/// Strip ordinal suffixes, normalise am/pm markers and collapse whitespace.
fn normalize(text: &str) -> String {
    let mut text = text.trim().to_string();
    if let Some(ordinal) = ORDINAL_SUFFIX.as_ref() {
        text = ordinal.replace_all(&text, "$1").into_owned();
    }
    if let Some(meridiem) = MERIDIEM.as_ref() {
        text = meridiem
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                format!("{} {}M", &caps[1], caps[2].to_uppercase())
            })
            .into_owned();
    }
    if let Some(whitespace) = WHITESPACE.as_ref() {
        text = whitespace.replace_all(&text, " ").into_owned();
    }
    text
}

pub(super) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = normalize(text);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&text, format).ok())
        .or_else(|| parse_normalized_datetime(&text).map(|datetime| datetime.date()))
}

pub(super) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = normalize(text);
    parse_normalized_datetime(&text).or_else(|| {
        DATE_FORMATS.iter().find_map(|format| {
            NaiveDate::parse_from_str(&text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
    })
}

pub(super) fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = normalize(text);
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&text, format).ok())
}

fn parse_normalized_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_utc());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc2822(text) {
        return Some(datetime.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }

    // "<date> <time>" with any known date and time layout.
    DATE_FORMATS.iter().find_map(|date_format| {
        TIME_FORMATS.iter().find_map(|time_format| {
            NaiveDateTime::parse_from_str(text, &format!("{date_format} {time_format}")).ok()
        })
    })
}
