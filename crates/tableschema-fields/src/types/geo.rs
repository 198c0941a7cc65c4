use serde_json::{Map, Value as JsonValue};
use tableschema_core::{GeoPoint, Value};

use super::CastResult;
use super::numeric::parse_numeric;
use super::structured::decode_json;

const GEOMETRY_TYPES: [&str; 6] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
];

pub(super) fn cast_geopoint(format: &str, raw: &JsonValue) -> CastResult {
    let (lon, lat) = match format {
        "default" => {
            let text = raw.as_str().ok_or_else(|| "value must be a string".to_string())?;
            let parts: Vec<&str> = text.split(',').collect();
            match parts.as_slice() {
                [lon, lat] => (parse_numeric(lon), parse_numeric(lat)),
                _ => return Err("lon,lat array must contain only lon,lat".to_string()),
            }
        }
        "array" => match decode_json(raw)? {
            JsonValue::Array(items) => match items.as_slice() {
                [lon, lat] => (coordinate(lon), coordinate(lat)),
                _ => return Err("lon,lat array must contain only lon,lat".to_string()),
            },
            _ => return Err("value must be an array".to_string()),
        },
        "object" => match decode_json(raw)? {
            JsonValue::Object(map) => match (map.get("lon"), map.get("lat")) {
                (Some(lon), Some(lat)) => (coordinate(lon), coordinate(lat)),
                _ => return Err("object must contain lon and lat attributes".to_string()),
            },
            _ => return Err("value must be an object".to_string()),
        },
        _ => return Err("invalid format".to_string()),
    };

    match (lon, lat) {
        (Some(lon), Some(lat))
            if (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat) =>
        {
            Ok(Value::Geopoint(GeoPoint { lon, lat }))
        }
        _ => Err("invalid lon,lat values".to_string()),
    }
}

fn coordinate(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => parse_numeric(text),
        _ => None,
    }
}

pub(super) fn cast_geojson(format: &str, raw: &JsonValue) -> CastResult {
    let map = match decode_json(raw)? {
        JsonValue::Object(map) => map,
        _ => return Err("must be an object".to_string()),
    };

    match format {
        "topojson" => {
            if !map.get("type").is_some_and(JsonValue::is_string) {
                return Err("topojson object must have a type".to_string());
            }
        }
        _ => check_geojson(&map)?,
    }

    Ok(Value::Object(map))
}

fn check_geojson(map: &Map<String, JsonValue>) -> Result<(), String> {
    let kind = map
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| "geojson object must have a type".to_string())?;

    match kind {
        "Feature" => {
            match map.get("geometry") {
                Some(JsonValue::Null) => {}
                Some(JsonValue::Object(geometry)) => check_geometry(geometry)?,
                _ => return Err("feature must have a geometry".to_string()),
            }
            match map.get("properties") {
                None | Some(JsonValue::Null) | Some(JsonValue::Object(_)) => Ok(()),
                _ => Err("feature properties must be an object".to_string()),
            }
        }
        "FeatureCollection" => match map.get("features") {
            Some(JsonValue::Array(features)) => features.iter().try_for_each(|feature| match feature {
                JsonValue::Object(feature) if feature.get("type") == Some(&JsonValue::from("Feature")) => {
                    check_geojson(feature)
                }
                _ => Err("feature collection must contain features".to_string()),
            }),
            _ => Err("feature collection must have a features array".to_string()),
        },
        _ => check_geometry(map),
    }
}

fn check_geometry(map: &Map<String, JsonValue>) -> Result<(), String> {
    let kind = map
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| "geometry must have a type".to_string())?;

    if kind == "GeometryCollection" {
        return match map.get("geometries") {
            Some(JsonValue::Array(geometries)) => geometries.iter().try_for_each(|geometry| match geometry {
                JsonValue::Object(geometry) => check_geometry(geometry),
                _ => Err("geometry collection must contain geometries".to_string()),
            }),
            _ => Err("geometry collection must have a geometries array".to_string()),
        };
    }

    if !GEOMETRY_TYPES.contains(&kind) {
        return Err(format!("unknown geojson type: {kind}"));
    }

    match map.get("coordinates") {
        Some(JsonValue::Array(_)) => Ok(()),
        _ => Err(format!("{kind} must have a coordinates array")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_geopoint_is_lon_comma_lat() {
        assert_eq!(
            cast_geopoint("default", &json!("180, -90")),
            Ok(Value::Geopoint(GeoPoint { lon: 180.0, lat: -90.0 }))
        );
        assert!(cast_geopoint("default", &json!([180, 90])).is_err());
        assert!(cast_geopoint("default", &json!("181,90")).is_err());
        assert!(cast_geopoint("default", &json!("3.14")).is_err());
    }

    #[test]
    fn array_and_object_geopoints() {
        assert!(cast_geopoint("array", &json!("[180, -90]")).is_ok());
        assert!(cast_geopoint("array", &json!("180,90")).is_err());
        assert!(cast_geopoint("object", &json!({"lon": 180, "lat": 90})).is_ok());
        assert!(cast_geopoint("object", &json!({"lat": 90})).is_err());
    }

    #[test]
    fn geojson_structure_is_checked() {
        assert!(cast_geojson("default", &json!({"type": "Point", "coordinates": [0, 0, 0]})).is_ok());
        assert!(
            cast_geojson(
                "default",
                &json!(r#"{"geometry": null, "type": "Feature", "properties": {"a": "b"}}"#)
            )
            .is_ok()
        );
        assert!(cast_geojson("default", &json!("{}")).is_err());
        assert!(cast_geojson("default", &json!("string")).is_err());
        assert!(cast_geojson("topojson", &json!({"type": "LineString", "arcs": [42]})).is_ok());
        assert!(cast_geojson("topojson", &json!({})).is_err());
    }
}
