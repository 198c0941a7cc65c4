//! Per-kind conversion from raw values. Each caster returns the failure message
//! on its own; the field attaches name and raw value.

mod geo;
mod natural;
mod numeric;
mod structured;
mod temporal;
mod text;

use serde_json::Value as JsonValue;
use tableschema_core::Value;

use crate::field::Field;
use crate::kind::FieldKind;

pub(crate) type CastResult = Result<Value, String>;

pub(crate) fn cast(field: &Field, raw: &JsonValue) -> CastResult {
    match field.kind() {
        FieldKind::Any => Ok(Value::from_json(raw)),
        FieldKind::Array => structured::cast_array(raw),
        FieldKind::Boolean => text::cast_boolean(field, raw),
        FieldKind::Date => temporal::cast_date(field.format(), raw),
        FieldKind::Datetime => temporal::cast_datetime(field.format(), raw),
        FieldKind::Duration => temporal::cast_duration(raw),
        FieldKind::Geojson => geo::cast_geojson(field.format(), raw),
        FieldKind::Geopoint => geo::cast_geopoint(field.format(), raw),
        FieldKind::Integer => numeric::cast_integer(raw),
        FieldKind::Number => numeric::cast_number(field, raw),
        FieldKind::Object => structured::cast_object(raw),
        FieldKind::String => text::cast_string(field.format(), raw),
        FieldKind::Time => temporal::cast_time(field.format(), raw),
        FieldKind::Year => numeric::cast_year(raw),
        FieldKind::YearMonth => temporal::cast_yearmonth(raw),
    }
}
