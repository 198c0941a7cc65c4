use std::fmt;

/// Logical field type, as named by the descriptor's `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Any,
    Array,
    Boolean,
    Date,
    Datetime,
    Duration,
    Geojson,
    Geopoint,
    Integer,
    Number,
    Object,
    String,
    Time,
    Year,
    YearMonth,
}

/// Order in which kinds are tried when inferring a type from a sample value.
pub const INFER_ORDER: [FieldKind; 15] = [
    FieldKind::Integer,
    FieldKind::Number,
    FieldKind::String,
    FieldKind::YearMonth,
    FieldKind::Year,
    FieldKind::Time,
    FieldKind::Object,
    FieldKind::Geopoint,
    FieldKind::Geojson,
    FieldKind::Duration,
    FieldKind::Datetime,
    FieldKind::Date,
    FieldKind::Boolean,
    FieldKind::Array,
    FieldKind::Any,
];

impl FieldKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "any" => Self::Any,
            "array" => Self::Array,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            "duration" => Self::Duration,
            "geojson" => Self::Geojson,
            "geopoint" => Self::Geopoint,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "object" => Self::Object,
            "string" => Self::String,
            "time" => Self::Time,
            "year" => Self::Year,
            "yearmonth" => Self::YearMonth,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Array => "array",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Duration => "duration",
            Self::Geojson => "geojson",
            Self::Geopoint => "geopoint",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Object => "object",
            Self::String => "string",
            Self::Time => "time",
            Self::Year => "year",
            Self::YearMonth => "yearmonth",
        }
    }

    /// Kinds whose values support minimum/maximum.
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::Number
                | Self::Date
                | Self::Datetime
                | Self::Time
                | Self::Year
                | Self::YearMonth
                | Self::Duration
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
