//! Value serialization
//!
//! Encodes a typed [`Value`] into a SQL literal for a given field and
//! dialect. Dispatch runs on the field's [`FieldKind`], in this order:
//! NULL, date, datetime, array modifier, text search, bit, blob, numeric,
//! floating, spatial, empty string, generic.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use indexmap::IndexMap;
use quarry_core::{
    DialectProfile, EscapeMap, FieldDescriptor, FieldKind, QuarryError, Result, Value,
};
use serde::Serialize;
use serde_json::Value as Json;
use std::collections::HashMap;

/// Escapes for literals matched with `LIKE`, where `%` is significant too
pub const PATTERN_ESCAPES: EscapeMap = EscapeMap::new(&[
    ('\0', "\\0"),
    ('\u{8}', "\\b"),
    ('\t', "\\t"),
    ('\u{1a}', "\\Z"),
    ('\n', "\\n"),
    ('\r', "\\r"),
    ('\'', "\\'"),
    ('"', "\\\""),
    ('\\', "\\\\"),
    ('%', "\\%"),
]);

/// Escape text that ends up inside a `LIKE` pattern
pub fn escape_pattern_literal(text: &str) -> String {
    PATTERN_ESCAPES.escape(text).into_owned()
}

/// Serialize `value` as a literal for `field` under `profile`
pub fn serialize_value(
    value: &Value,
    field: &FieldDescriptor,
    profile: &DialectProfile,
) -> Result<String> {
    ValueSerializer::new(profile).serialize(value, field)
}

/// Render one row as `INSERT INTO table (cols) VALUES (literals);`.
///
/// Columns without a descriptor in `fields` are serialized as generic values.
pub fn json_to_sql_insert(
    row: &IndexMap<String, Value>,
    fields: &HashMap<String, FieldDescriptor>,
    table: &str,
    profile: &DialectProfile,
) -> Result<String> {
    let serializer = ValueSerializer::new(profile);
    let generic = FieldDescriptor::default();

    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (column, value) in row {
        let field = fields.get(column).unwrap_or(&generic);
        columns.push(profile.quote_identifier(column));
        values.push(serializer.serialize(value, field)?);
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        profile.quote_identifier(table),
        columns.join(", "),
        values.join(", ")
    ))
}

/// Type-directed literal encoder bound to one dialect
pub struct ValueSerializer<'a> {
    profile: &'a DialectProfile,
}

impl<'a> ValueSerializer<'a> {
    pub fn new(profile: &'a DialectProfile) -> Self {
        Self { profile }
    }

    pub fn serialize(&self, value: &Value, field: &FieldDescriptor) -> Result<String> {
        if matches!(value, Value::Null | Value::Json(Json::Null)) {
            return Ok("NULL".to_string());
        }

        match field.kind {
            FieldKind::Date => return Ok(self.date(value)),
            FieldKind::DateTime => return Ok(self.datetime(value, field.date_precision)),
            _ => {}
        }

        if field.is_array {
            return Ok(self.array(value));
        }

        match field.kind {
            FieldKind::TextSearch => Ok(self.text_search(value)),
            FieldKind::Bit => self.bit(value),
            FieldKind::Blob => self.blob(value),
            FieldKind::Numeric => self.numeric(value),
            FieldKind::Floating => self.floating(value),
            FieldKind::Spatial | FieldKind::MultiSpatial => self.spatial(value, field.kind),
            _ => self.generic(value),
        }
    }

    fn quote(&self, text: &str) -> String {
        self.profile.quote_string(text)
    }

    // --- Dates ---

    /// Valid dates become `'YYYY-MM-DD'`; anything else passes through raw so
    /// keywords such as `CURRENT_DATE` keep working
    fn date(&self, value: &Value) -> String {
        let date = match value {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            Value::DateTimeUtc(dt) => Some(dt.date_naive()),
            Value::String(s) => parse_datetime(s).map(|dt| dt.date()),
            _ => None,
        };
        match date {
            Some(date) => self.quote(&date.format("%Y-%m-%d").to_string()),
            None => value.to_text().unwrap_or_default(),
        }
    }

    /// Valid datetimes become `'YYYY-MM-DD HH:MM:SS[.fff]'` with as many
    /// fractional digits as the declared precision; anything else is quoted
    fn datetime(&self, value: &Value, precision: Option<u64>) -> String {
        let datetime = match value {
            Value::DateTime(dt) => Some(*dt),
            Value::DateTimeUtc(dt) => Some(dt.naive_utc()),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            Value::String(s) => parse_datetime(s),
            _ => None,
        };
        match datetime {
            Some(dt) => {
                let mut text = dt.format("%Y-%m-%d %H:%M:%S").to_string();
                let digits = precision.unwrap_or(0).min(9) as usize;
                if digits > 0 {
                    let nanos = format!("{:09}", dt.nanosecond() % 1_000_000_000);
                    text.push('.');
                    text.push_str(&nanos[..digits]);
                }
                self.quote(&text)
            }
            None => self.quote(&value.to_text().unwrap_or_default()),
        }
    }

    // --- Type-specific encodings ---

    /// Array literal in brace syntax: `'{1,2,3}'`
    fn array(&self, value: &Value) -> String {
        let text = match value {
            Value::Array(_) | Value::Json(Json::Array(_)) => value.to_json().to_string(),
            Value::String(s) => s.clone(),
            _ => String::new(),
        };
        self.quote(&text.replace('[', "{").replace(']', "}"))
    }

    fn text_search(&self, value: &Value) -> String {
        let text = value.to_text().unwrap_or_default();
        format!("'{}'", text.replace('\'', "''"))
    }

    fn bit(&self, value: &Value) -> Result<String> {
        let bits = match value {
            Value::Bytes(bytes) => bytes.iter().map(|b| format!("{:08b}", b)).collect(),
            Value::String(s) if !s.is_empty() && s.chars().all(|c| c == '0' || c == '1') => {
                s.clone()
            }
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            other => match other.as_u64() {
                Some(n) => format!("{:b}", n),
                None => {
                    return Err(QuarryError::Serialization(format!(
                        "'{}' is not a bit value",
                        other
                    )));
                }
            },
        };
        Ok(format!("b'{}'", bits))
    }

    fn blob(&self, value: &Value) -> Result<String> {
        let hex = match value {
            Value::Bytes(bytes) => hex::encode_upper(bytes),
            Value::String(s) => hex::encode_upper(s.as_bytes()),
            other => {
                return Err(QuarryError::Serialization(format!(
                    "'{}' is not binary data",
                    other
                )));
            }
        };
        Ok(self.profile.blob_literal.wrap(&hex))
    }

    fn numeric(&self, value: &Value) -> Result<String> {
        match value {
            Value::Int8(_)
            | Value::Int16(_)
            | Value::Int32(_)
            | Value::Int64(_)
            | Value::UInt64(_)
            | Value::Float32(_)
            | Value::Float64(_) => Ok(value.to_string()),
            Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Value::Json(Json::Number(n)) => Ok(n.to_string()),
            Value::Decimal(s) | Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.parse::<f64>().is_ok() {
                    Ok(trimmed.to_string())
                } else {
                    Err(QuarryError::Serialization(format!(
                        "'{}' is not a number",
                        s
                    )))
                }
            }
            other => Err(QuarryError::Serialization(format!(
                "'{}' is not a number",
                other
            ))),
        }
    }

    fn floating(&self, value: &Value) -> Result<String> {
        let number = match value {
            Value::Json(Json::Number(n)) => n.as_f64(),
            other => other.as_f64(),
        };
        match number {
            Some(n) if n.is_finite() => Ok(n.to_string()),
            _ => Err(QuarryError::Serialization(format!(
                "'{}' is not a finite floating point number",
                value
            ))),
        }
    }

    // --- Spatial ---

    fn spatial(&self, value: &Value, kind: FieldKind) -> Result<String> {
        let json = value.to_json();
        let geojson = if kind == FieldKind::MultiSpatial {
            let elements = json.as_array().ok_or_else(|| {
                QuarryError::Serialization("multi geometry value must be an array".into())
            })?;
            let features = elements
                .iter()
                .map(geo_feature)
                .collect::<Result<Vec<_>>>()?;
            serde_json::to_string(&FeatureCollection {
                kind: "FeatureCollection",
                features,
            })?
        } else {
            serde_json::to_string(&geo_feature(&json)?)?
        };
        Ok(format!("ST_GeomFromGeoJSON({})", self.quote(&geojson)))
    }

    // --- Fallback ---

    fn generic(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) if s.is_empty() => Ok(self.profile.empty_string()),
            Value::String(s) | Value::Decimal(s) => Ok(self.quote(s)),
            Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Value::Int8(_)
            | Value::Int16(_)
            | Value::Int32(_)
            | Value::Int64(_)
            | Value::UInt64(_)
            | Value::Float32(_)
            | Value::Float64(_) => Ok(value.to_string()),
            Value::Json(Json::String(s)) if s.is_empty() => Ok(self.profile.empty_string()),
            Value::Json(Json::String(s)) => Ok(self.quote(s)),
            Value::Json(json @ (Json::Number(_) | Json::Bool(_))) => Ok(json.to_string()),
            Value::Json(json) => Ok(self.quote(&json.to_string())),
            Value::Array(_) => Ok(self.quote(&value.to_json().to_string())),
            Value::Bytes(_) => Err(QuarryError::Serialization(
                "binary data needs a binary field type".into(),
            )),
            other => Ok(self.quote(&other.to_string())),
        }
    }
}

/// Parse the date and datetime spellings accepted as input
fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[derive(Serialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Json,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: serde_json::Map<String, Json>,
    geometry: Geometry,
}

#[derive(Serialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature>,
}

fn array_depth(json: &Json) -> usize {
    match json {
        Json::Array(items) => 1 + items.iter().map(array_depth).max().unwrap_or(0),
        _ => 0,
    }
}

fn point_coordinates(json: &Json) -> Result<Json> {
    match (json.get("x"), json.get("y")) {
        (Some(x @ Json::Number(_)), Some(y @ Json::Number(_))) => {
            Ok(Json::Array(vec![x.clone(), y.clone()]))
        }
        _ => Err(QuarryError::Serialization(format!(
            "'{}' is not a point with numeric x and y",
            json
        ))),
    }
}

fn line_coordinates(points: &[Json]) -> Result<Json> {
    points
        .iter()
        .map(point_coordinates)
        .collect::<Result<Vec<_>>>()
        .map(Json::Array)
}

/// A point object becomes a Point feature, an array of points a LineString,
/// an array of point arrays a Polygon
fn geo_feature(json: &Json) -> Result<Feature> {
    let (kind, coordinates) = match json {
        Json::Array(points) if array_depth(json) == 1 => ("LineString", line_coordinates(points)?),
        Json::Array(rings) => {
            let rings = rings
                .iter()
                .map(|ring| match ring {
                    Json::Array(points) => line_coordinates(points),
                    other => point_coordinates(other).map(|p| Json::Array(vec![p])),
                })
                .collect::<Result<Vec<_>>>()?;
            ("Polygon", Json::Array(rings))
        }
        point => ("Point", point_coordinates(point)?),
    };
    Ok(Feature {
        kind: "Feature",
        properties: serde_json::Map::new(),
        geometry: Geometry { kind, coordinates },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_core::{mysql_profile, postgres_profile};
    use serde_json::json;

    fn field(kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor::new("f", "X", kind)
    }

    #[test]
    fn test_null_for_every_kind() {
        let mysql = mysql_profile();
        for kind in [
            FieldKind::Numeric,
            FieldKind::Floating,
            FieldKind::Date,
            FieldKind::DateTime,
            FieldKind::Text,
            FieldKind::TextSearch,
            FieldKind::Bit,
            FieldKind::Blob,
            FieldKind::Spatial,
            FieldKind::MultiSpatial,
            FieldKind::Generic,
        ] {
            assert_eq!(
                serialize_value(&Value::Null, &field(kind), &mysql).unwrap(),
                "NULL"
            );
            assert_eq!(
                serialize_value(&Value::Null, &field(kind).array(), &mysql).unwrap(),
                "NULL"
            );
        }
    }

    #[test]
    fn test_escaped_strings_unescape_to_input() {
        for profile in [mysql_profile(), postgres_profile()] {
            for sample in ["plain", "O'Brien", "tab\there", "back\\slash \"q\"", "nul\0sub\u{1a}"] {
                let literal =
                    serialize_value(&Value::from(sample), &field(FieldKind::Text), &profile)
                        .unwrap();
                assert_eq!(profile.unquote_string(&literal).as_deref(), Some(sample));
            }
        }
    }

    #[test]
    fn test_mysql_and_postgres_escaping_differ() {
        let value = Value::from("it's");
        assert_eq!(
            serialize_value(&value, &field(FieldKind::Text), &mysql_profile()).unwrap(),
            "'it\\'s'"
        );
        assert_eq!(
            serialize_value(&value, &field(FieldKind::Text), &postgres_profile()).unwrap(),
            "'it''s'"
        );
    }

    #[test]
    fn test_dates() {
        let mysql = mysql_profile();
        let date = field(FieldKind::Date);

        assert_eq!(
            serialize_value(&Value::from("2024-02-29"), &date, &mysql).unwrap(),
            "'2024-02-29'"
        );
        assert_eq!(
            serialize_value(&Value::from("2024-03-01T10:20:30Z"), &date, &mysql).unwrap(),
            "'2024-03-01'"
        );
        assert_eq!(
            serialize_value(&Value::from("CURRENT_DATE"), &date, &mysql).unwrap(),
            "CURRENT_DATE"
        );
    }

    #[test]
    fn test_datetime_precision() {
        let mysql = mysql_profile();
        let value = Value::from("2024-01-02 03:04:05.123456");

        assert_eq!(
            serialize_value(&value, &field(FieldKind::DateTime), &mysql).unwrap(),
            "'2024-01-02 03:04:05'"
        );
        assert_eq!(
            serialize_value(
                &value,
                &field(FieldKind::DateTime).with_date_precision(3),
                &mysql
            )
            .unwrap(),
            "'2024-01-02 03:04:05.123'"
        );
        assert_eq!(
            serialize_value(&Value::from("tomorrow's"), &field(FieldKind::DateTime), &mysql)
                .unwrap(),
            "'tomorrow\\'s'"
        );
    }

    #[test]
    fn test_array_modifier() {
        let pg = postgres_profile();
        let ints = field(FieldKind::Numeric).array();

        assert_eq!(
            serialize_value(
                &Value::Array(vec![Value::Int64(1), Value::Int64(2)]),
                &ints,
                &pg
            )
            .unwrap(),
            "'{1,2}'"
        );
        assert_eq!(
            serialize_value(&Value::from("[3,4]"), &ints, &pg).unwrap(),
            "'{3,4}'"
        );
        assert_eq!(
            serialize_value(&Value::Int64(5), &ints, &pg).unwrap(),
            "''"
        );
    }

    #[test]
    fn test_text_search_doubles_quotes_only() {
        let pg = postgres_profile();
        assert_eq!(
            serialize_value(
                &Value::from("'fat' & rat\\"),
                &field(FieldKind::TextSearch),
                &pg
            )
            .unwrap(),
            "'''fat'' & rat\\'"
        );
    }

    #[test]
    fn test_bit_and_blob() {
        let mysql = mysql_profile();
        let pg = postgres_profile();

        assert_eq!(
            serialize_value(&Value::Bytes(vec![0x05]), &field(FieldKind::Bit), &mysql).unwrap(),
            "b'00000101'"
        );
        assert_eq!(
            serialize_value(&Value::from("101"), &field(FieldKind::Bit), &mysql).unwrap(),
            "b'101'"
        );
        assert_eq!(
            serialize_value(&Value::Bytes(vec![0xde, 0xad]), &field(FieldKind::Blob), &mysql)
                .unwrap(),
            "X'DEAD'"
        );
        assert_eq!(
            serialize_value(&Value::Bytes(vec![0xde, 0xad]), &field(FieldKind::Blob), &pg)
                .unwrap(),
            "decode('DEAD', 'hex')"
        );
    }

    #[test]
    fn test_numbers() {
        let mysql = mysql_profile();

        assert_eq!(
            serialize_value(&Value::from(" 42 "), &field(FieldKind::Numeric), &mysql).unwrap(),
            "42"
        );
        assert!(matches!(
            serialize_value(&Value::from("4x2"), &field(FieldKind::Numeric), &mysql),
            Err(QuarryError::Serialization(_))
        ));
        assert_eq!(
            serialize_value(&Value::from("1.50"), &field(FieldKind::Floating), &mysql).unwrap(),
            "1.5"
        );
        assert!(matches!(
            serialize_value(&Value::Float64(f64::NAN), &field(FieldKind::Floating), &mysql),
            Err(QuarryError::Serialization(_))
        ));
    }

    #[test]
    fn test_spatial_point() {
        let literal = serialize_value(
            &Value::Json(json!({"x": 1, "y": 2})),
            &field(FieldKind::Spatial),
            &postgres_profile(),
        )
        .unwrap();
        assert_eq!(
            literal,
            "ST_GeomFromGeoJSON('{\"type\":\"Feature\",\"properties\":{},\
             \"geometry\":{\"type\":\"Point\",\"coordinates\":[1,2]}}')"
        );
    }

    #[test]
    fn test_spatial_line_polygon_and_collection() {
        let pg = postgres_profile();

        let line = serialize_value(
            &Value::Json(json!([{"x": 0, "y": 0}, {"x": 1, "y": 1}])),
            &field(FieldKind::Spatial),
            &pg,
        )
        .unwrap();
        assert!(line.contains("\"LineString\",\"coordinates\":[[0,0],[1,1]]"));

        let polygon = serialize_value(
            &Value::Json(json!([[{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 0, "y": 0}]])),
            &field(FieldKind::Spatial),
            &pg,
        )
        .unwrap();
        assert!(polygon.contains("\"Polygon\",\"coordinates\":[[[0,0],[1,0],[0,0]]]"));

        let collection = serialize_value(
            &Value::Json(json!([{"x": 1, "y": 2}, {"x": 3, "y": 4}])),
            &field(FieldKind::MultiSpatial),
            &pg,
        )
        .unwrap();
        assert!(collection.starts_with("ST_GeomFromGeoJSON('{\"type\":\"FeatureCollection\""));
        assert_eq!(collection.matches("\"Point\"").count(), 2);
    }

    #[test]
    fn test_spatial_literal_is_dialect_quoted() {
        let mysql = mysql_profile();
        let literal = serialize_value(
            &Value::Json(json!({"x": 1, "y": 2})),
            &field(FieldKind::Spatial),
            &mysql,
        )
        .unwrap();
        let inner = literal
            .strip_prefix("ST_GeomFromGeoJSON(")
            .and_then(|l| l.strip_suffix(')'))
            .unwrap();
        let geojson: Json = serde_json::from_str(&mysql.unquote_string(inner).unwrap()).unwrap();
        assert_eq!(geojson["geometry"]["coordinates"], json!([1, 2]));
    }

    #[test]
    fn test_spatial_rejects_non_numeric_coordinates() {
        for point in [
            json!({"x": "1')); DROP TABLE t; -- ", "y": 2}),
            json!({"x": 1, "y": "2\\"}),
            json!({"x": null, "y": 2}),
        ] {
            assert!(matches!(
                serialize_value(&Value::Json(point), &field(FieldKind::Spatial), &mysql_profile()),
                Err(QuarryError::Serialization(_))
            ));
        }
    }

    #[test]
    fn test_array_text_is_dialect_quoted() {
        let mysql = mysql_profile();
        let pg = postgres_profile();
        let texts = field(FieldKind::Text).array();
        let value = Value::Array(vec![Value::from("it's"), Value::from("a\\b")]);

        let literal = serialize_value(&value, &texts, &pg).unwrap();
        assert_eq!(literal, "'{\"it''s\",\"a\\\\b\"}'");

        let literal = serialize_value(&value, &texts, &mysql).unwrap();
        assert_eq!(
            mysql.unquote_string(&literal).as_deref(),
            Some("{\"it's\",\"a\\\\b\"}")
        );
        assert_eq!(
            serialize_value(&Value::from("['x'); DROP TABLE t; --]"), &texts, &pg).unwrap(),
            "'{''x''); DROP TABLE t; --}'"
        );
    }

    #[test]
    fn test_generic_values() {
        let mysql = mysql_profile();
        let generic = FieldDescriptor::default();

        assert_eq!(
            serialize_value(&Value::from(""), &generic, &mysql).unwrap(),
            "''"
        );
        assert_eq!(
            serialize_value(&Value::Int64(7), &generic, &mysql).unwrap(),
            "7"
        );
        assert_eq!(
            serialize_value(&Value::Bool(true), &generic, &mysql).unwrap(),
            "TRUE"
        );
        assert_eq!(
            serialize_value(&Value::Json(json!({"a": "b"})), &generic, &mysql).unwrap(),
            "'{\\\"a\\\":\\\"b\\\"}'"
        );
        assert!(matches!(
            serialize_value(&Value::Bytes(vec![1]), &generic, &mysql),
            Err(QuarryError::Serialization(_))
        ));
    }

    #[test]
    fn test_json_to_sql_insert_postgres() {
        let pg = postgres_profile();
        let mut row = IndexMap::new();
        row.insert("id".to_string(), Value::Int64(1));
        row.insert("name".to_string(), Value::from("O'Brien"));

        assert_eq!(
            json_to_sql_insert(&row, &HashMap::new(), "users", &pg).unwrap(),
            "INSERT INTO \"users\" (\"id\", \"name\") VALUES (1, 'O''Brien');"
        );
    }

    #[test]
    fn test_json_to_sql_insert_uses_field_types() {
        let mysql = mysql_profile();
        let mut row = IndexMap::new();
        row.insert("created".to_string(), Value::from("2024-05-06 07:08:09"));
        row.insert("data".to_string(), Value::Bytes(vec![0x0a]));

        let mut fields = HashMap::new();
        fields.insert("created".to_string(), mysql.field("created", "DATETIME"));
        fields.insert("data".to_string(), mysql.field("data", "BLOB"));

        assert_eq!(
            json_to_sql_insert(&row, &fields, "logs", &mysql).unwrap(),
            "INSERT INTO `logs` (`created`, `data`) VALUES ('2024-05-06 07:08:09', X'0A');"
        );
    }

    #[test]
    fn test_escape_pattern_literal() {
        assert_eq!(escape_pattern_literal("50%_off's"), "50\\%_off\\'s");
    }
}
