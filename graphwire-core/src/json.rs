//! Structural conversion between JSON and Bolt values.
//!
//! The REST transport speaks JSON in both directions: parameters go out as
//! JSON and rows come back as JSON. These two functions are the only bridge,
//! so a row fetched over REST lands in exactly the same `BoltType` shape that
//! a type-specific conversion would otherwise see.

use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType};
use serde_json::{Map, Number, Value as JsonValue};
use crate::error::GraphError;
use crate::traits::FromGraphValue;

/// Convert a JSON value into a Bolt value.
///
/// Numbers that fit in `i64` become `Integer`, every other number `Float`.
pub fn json_to_bolt(value: &JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => BoltType::Boolean(BoltBoolean { value: *b }),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        JsonValue::String(s) => BoltType::String(BoltString { value: s.clone() }),
        JsonValue::Array(xs) => BoltType::List(BoltList {
            value: xs.iter().map(json_to_bolt).collect(),
        }),
        JsonValue::Object(obj) => {
            let mut map = BoltMap::new();
            for (k, v) in obj {
                map.put(BoltString { value: k.clone() }, json_to_bolt(v));
            }
            BoltType::Map(map)
        }
    }
}

/// Convert a Bolt value into the JSON shape the REST API uses in row format.
///
/// Nodes and relationships become their property maps, paths alternate
/// node and relationship property maps, temporal values become ISO-8601
/// strings.
pub fn bolt_to_json(value: &BoltType) -> Result<JsonValue, GraphError> {
    Ok(match value {
        BoltType::Null(_) => JsonValue::Null,
        BoltType::Boolean(b) => JsonValue::Bool(b.value),
        BoltType::Integer(i) => JsonValue::Number(i.value.into()),
        BoltType::Float(f) => Number::from_f64(f.value).map_or(JsonValue::Null, JsonValue::Number),
        BoltType::String(s) => JsonValue::String(s.value.clone()),
        BoltType::Bytes(b) => JsonValue::Array(b.value.iter().map(|x| JsonValue::from(*x)).collect()),
        BoltType::List(xs) => JsonValue::Array(xs.value.iter().map(bolt_to_json).collect::<Result<_, _>>()?),
        BoltType::Map(m) => map_to_json(m)?,
        BoltType::Node(n) => map_to_json(&n.properties)?,
        BoltType::Relation(r) => map_to_json(&r.properties)?,
        BoltType::UnboundedRelation(r) => map_to_json(&r.properties)?,
        BoltType::Path(p) => {
            let nodes = p.nodes();
            let rels = p.rels();
            let mut out = Vec::with_capacity(nodes.len() + rels.len());
            for (i, node) in nodes.iter().enumerate() {
                out.push(map_to_json(&node.properties)?);
                if let Some(rel) = rels.get(i) {
                    out.push(map_to_json(&rel.properties)?);
                }
            }
            JsonValue::Array(out)
        }
        BoltType::Point2D(p) => serde_json::json!({ "srid": p.sr_id.value, "x": p.x.value, "y": p.y.value }),
        BoltType::Point3D(p) => {
            serde_json::json!({ "srid": p.sr_id.value, "x": p.x.value, "y": p.y.value, "z": p.z.value })
        }
        BoltType::Date(_) => {
            JsonValue::String(chrono::NaiveDate::from_value(value.clone())?.to_string())
        }
        BoltType::LocalTime(_) => {
            JsonValue::String(chrono::NaiveTime::from_value(value.clone())?.to_string())
        }
        BoltType::Time(_) => {
            let (time, offset) = <(chrono::NaiveTime, chrono::FixedOffset)>::from_value(value.clone())?;
            JsonValue::String(format!("{time}{offset}"))
        }
        BoltType::LocalDateTime(_) => JsonValue::String(
            chrono::NaiveDateTime::from_value(value.clone())?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        BoltType::DateTime(_) | BoltType::DateTimeZoneId(_) => JsonValue::String(
            chrono::DateTime::<chrono::FixedOffset>::from_value(value.clone())?.to_rfc3339(),
        ),
        BoltType::Duration(_) => {
            let d = std::time::Duration::from_value(value.clone())?;
            JsonValue::String(format!("PT{}S", d.as_secs_f64()))
        }
    })
}

fn map_to_json(map: &BoltMap) -> Result<JsonValue, GraphError> {
    let mut out = Map::with_capacity(map.value.len());
    for (k, v) in &map.value {
        out.insert(k.value.clone(), bolt_to_json(v)?);
    }
    Ok(JsonValue::Object(out))
}
