//! Value conversion from `neo4rs::BoltType` into Rust types.
//!
//! Every conversion tries the type-specific representation first (the Bolt
//! variant the server sends natively) and then a structural fallback for
//! the shape the REST transport delivers: temporal values arrive as ISO-8601
//! strings, floats with an integral value may arrive as integers.

use std::collections::HashMap;
use serde::de::DeserializeOwned;
use crate::error::GraphError;
use crate::record::Record;
use crate::traits::{FromGraphValue, FromRow, GraphNode, GraphRelation, NodeWrapper, RelationWrapper};

/// Returns a human-readable name for a [`neo4rs::BoltType`] variant.
///
/// Used in error messages to describe the actual type received when a
/// conversion fails.
pub fn type_name(v: &neo4rs::BoltType) -> &'static str {
    match v {
        neo4rs::BoltType::Null(_) => "Null",
        neo4rs::BoltType::Boolean(_) => "Boolean",
        neo4rs::BoltType::Integer(_) => "Integer",
        neo4rs::BoltType::Float(_) => "Float",
        neo4rs::BoltType::String(_) => "String",
        neo4rs::BoltType::Bytes(_) => "Bytes",
        neo4rs::BoltType::List(_) => "List",
        neo4rs::BoltType::Map(_) => "Map",
        neo4rs::BoltType::Node(_) => "Node",
        neo4rs::BoltType::Relation(_) => "Relationship",
        neo4rs::BoltType::UnboundedRelation(_) => "UnboundedRelationship",
        neo4rs::BoltType::Path(_) => "Path",
        neo4rs::BoltType::Point2D(_) => "Point2D",
        neo4rs::BoltType::Point3D(_) => "Point3D",
        neo4rs::BoltType::Duration(_) => "Duration",
        neo4rs::BoltType::Date(_) => "Date",
        neo4rs::BoltType::Time(_) => "Time",
        neo4rs::BoltType::LocalTime(_) => "LocalTime",
        neo4rs::BoltType::LocalDateTime(_) => "LocalDateTime",
        neo4rs::BoltType::DateTime(_) => "DateTime",
        neo4rs::BoltType::DateTimeZoneId(_) => "DateTimeZoneId",
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

macro_rules! impl_from_val_int {
    ($t:ty) => {
        impl FromGraphValue for $t {
            fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
                match value {
                    neo4rs::BoltType::Integer(v) => <$t>::try_from(v.value).map_err(|_| {
                        GraphError::Mapping(format!("{} out of range for {}", v.value, stringify!($t)))
                    }),
                    other => Err(GraphError::type_mismatch("Integer", type_name(&other), stringify!($t))),
                }
            }
        }
    };
}

macro_rules! impl_from_val_float {
    ($t:ty) => {
        impl FromGraphValue for $t {
            fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
                match value {
                    neo4rs::BoltType::Float(v) => Ok(v.value as $t),
                    // JSON has a single number type; integral floats come back as integers.
                    neo4rs::BoltType::Integer(v) => Ok(v.value as $t),
                    other => Err(GraphError::type_mismatch("Float", type_name(&other), stringify!($t))),
                }
            }
        }
    };
}

impl FromGraphValue for String {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::String(s) => Ok(s.value),
            other => Err(GraphError::type_mismatch("String", type_name(&other), "String")),
        }
    }
}

impl FromGraphValue for bool {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Boolean(b) => Ok(b.value),
            other => Err(GraphError::type_mismatch("Boolean", type_name(&other), "bool")),
        }
    }
}

impl_from_val_int!(i64);
impl_from_val_int!(i32);
impl_from_val_int!(u64);
impl_from_val_int!(u32);
impl_from_val_int!(i16);
impl_from_val_int!(u16);
impl_from_val_int!(i8);
impl_from_val_int!(u8);
impl_from_val_float!(f64);
impl_from_val_float!(f32);

/// Passthrough: keep the raw value.
impl FromGraphValue for neo4rs::BoltType {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

impl<T: FromGraphValue> FromGraphValue for Vec<T> {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::List(xs) => xs.value.into_iter().map(T::from_value).collect(),
            other => Err(GraphError::type_mismatch("List", type_name(&other), "Vec<T>")),
        }
    }
}

/// - Missing record key is handled in the `FromRow` derive (returns `None`).
/// - Present but `null` maps to `None`.
/// - Otherwise maps to `Some(T)`.
impl<T: FromGraphValue> FromGraphValue for Option<T> {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Null(_) => Ok(None),
            other => Ok(Some(T::from_value(other)?)),
        }
    }
}

/// Converts a `Map` into `HashMap<String, V>`.
impl<V: FromGraphValue> FromGraphValue for HashMap<String, V> {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Map(m) => {
                let mut out = HashMap::with_capacity(m.value.len());
                for (k, v) in m.value {
                    out.insert(k.value, V::from_value(v)?);
                }
                Ok(out)
            }
            other => Err(GraphError::type_mismatch("Map", type_name(&other), "HashMap<String, V>")),
        }
    }
}

impl<A: FromGraphValue, B: FromGraphValue> FromGraphValue for (A, B) {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::List(xs) if xs.value.len() == 2 => {
                let mut it = xs.value.into_iter();
                match (it.next(), it.next()) {
                    (Some(a), Some(b)) => Ok((A::from_value(a)?, B::from_value(b)?)),
                    _ => Err(GraphError::Mapping("list shrank during conversion".into())),
                }
            }
            other => Err(GraphError::type_mismatch("List[2]", type_name(&other), "tuple(A, B)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Node / Relation wrappers
// ---------------------------------------------------------------------------

impl<T: GraphNode> FromGraphValue for NodeWrapper<T> {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Node(n) => Ok(NodeWrapper(T::from_node(&n)?)),
            neo4rs::BoltType::Map(m) => Ok(NodeWrapper(T::from_properties(&m)?)),
            other => Err(GraphError::type_mismatch("Node", type_name(&other), T::LABEL)),
        }
    }
}

impl<T: GraphRelation> FromGraphValue for RelationWrapper<T> {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Relation(r) => Ok(RelationWrapper(T::from_rel(&r)?)),
            neo4rs::BoltType::Map(m) => Ok(RelationWrapper(T::from_properties(&m)?)),
            other => Err(GraphError::type_mismatch("Relationship", type_name(&other), T::TYPE)),
        }
    }
}

// ---------------------------------------------------------------------------
// Temporal types (chrono)
// ---------------------------------------------------------------------------

fn parse_temporal<T: std::str::FromStr>(s: &str, target: &str) -> Result<T, GraphError>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| GraphError::Mapping(format!("'{s}' -> {target}: {e}")))
}

impl FromGraphValue for chrono::NaiveDate {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Date(d) => d.try_into().map_err(|e: neo4rs::Error| {
                GraphError::Mapping(format!("BoltDate -> NaiveDate: {e}"))
            }),
            neo4rs::BoltType::String(s) => parse_temporal(&s.value, "NaiveDate"),
            other => Err(GraphError::type_mismatch("Date", type_name(&other), "NaiveDate")),
        }
    }
}

impl FromGraphValue for chrono::NaiveTime {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::LocalTime(t) => Ok(t.into()),
            neo4rs::BoltType::String(s) => parse_temporal(&s.value, "NaiveTime"),
            other => Err(GraphError::type_mismatch("LocalTime", type_name(&other), "NaiveTime")),
        }
    }
}

/// Converts a `Time` (time-with-offset) into a `(NaiveTime, FixedOffset)` pair.
impl FromGraphValue for (chrono::NaiveTime, chrono::FixedOffset) {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Time(t) => Ok(t.into()),
            other => Err(GraphError::type_mismatch("Time", type_name(&other), "(NaiveTime, FixedOffset)")),
        }
    }
}

impl FromGraphValue for chrono::NaiveDateTime {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::LocalDateTime(dt) => dt.try_into().map_err(|e: neo4rs::Error| {
                GraphError::Mapping(format!("BoltLocalDateTime -> NaiveDateTime: {e}"))
            }),
            neo4rs::BoltType::String(s) => parse_temporal(&s.value, "NaiveDateTime"),
            other => Err(GraphError::type_mismatch("LocalDateTime", type_name(&other), "NaiveDateTime")),
        }
    }
}

/// Accepts `DateTime`, `DateTimeZoneId`, and RFC 3339 strings. A trailing
/// zone id (`2024-01-01T10:00:00+01:00[Europe/Paris]`) is ignored; the offset wins.
impl FromGraphValue for chrono::DateTime<chrono::FixedOffset> {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::DateTime(dt) => dt.try_into().map_err(|e: neo4rs::Error| {
                GraphError::Mapping(format!("BoltDateTime -> DateTime<FixedOffset>: {e}"))
            }),
            neo4rs::BoltType::DateTimeZoneId(dt) => (&dt).try_into().map_err(|e: neo4rs::Error| {
                GraphError::Mapping(format!("BoltDateTimeZoneId -> DateTime<FixedOffset>: {e}"))
            }),
            neo4rs::BoltType::String(s) => {
                let raw = s.value.split('[').next().unwrap_or_default();
                chrono::DateTime::parse_from_rfc3339(raw).map_err(|e| {
                    GraphError::Mapping(format!("'{}' -> DateTime<FixedOffset>: {e}", s.value))
                })
            }
            other => Err(GraphError::type_mismatch("DateTime", type_name(&other), "DateTime<FixedOffset>")),
        }
    }
}

impl FromGraphValue for std::time::Duration {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        match value {
            neo4rs::BoltType::Duration(d) => Ok(d.into()),
            other => Err(GraphError::type_mismatch("Duration", type_name(&other), "std::time::Duration")),
        }
    }
}

// ---------------------------------------------------------------------------
// Structural conversion through serde
// ---------------------------------------------------------------------------

/// Reads any value through its JSON shape into a serde type.
///
/// This is the generic structural converter: enums, nested maps, and any
/// `#[derive(Deserialize)]` type can be read this way.
///
/// ```rust
/// # use graphwire_core::{Json, traits::FromGraphValue};
/// #[derive(serde::Deserialize, Debug, PartialEq)]
/// enum Role { Admin, Member }
///
/// let Json(role) = Json::<Role>::from_value(neo4rs::BoltType::from("Admin")).unwrap();
/// assert_eq!(role, Role::Admin);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> FromGraphValue for Json<T> {
    fn from_value(value: neo4rs::BoltType) -> Result<Self, GraphError> {
        let json = crate::json::bolt_to_json(&value)?;
        Ok(Json(serde_json::from_value(json)?))
    }
}

// ---------------------------------------------------------------------------
// Single-column row projection
// ---------------------------------------------------------------------------

macro_rules! impl_scalar_row {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromRow for $t {
                fn from_record(record: &Record) -> Result<Self, GraphError> {
                    <$t as FromGraphValue>::from_value(record.single()?.clone())
                }
            }
        )*
    };
}

impl_scalar_row!(
    String, bool, i64, i32, u64, u32, i16, u16, i8, u8, f64, f32,
    neo4rs::BoltType,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::FixedOffset>,
    std::time::Duration,
);

impl<T: FromGraphValue> FromRow for Option<T> {
    fn from_record(record: &Record) -> Result<Self, GraphError> {
        Option::<T>::from_value(record.single()?.clone())
    }
}

impl<T: FromGraphValue> FromRow for Vec<T> {
    fn from_record(record: &Record) -> Result<Self, GraphError> {
        Vec::<T>::from_value(record.single()?.clone())
    }
}

impl<V: FromGraphValue> FromRow for HashMap<String, V> {
    fn from_record(record: &Record) -> Result<Self, GraphError> {
        HashMap::<String, V>::from_value(record.single()?.clone())
    }
}

impl<T: DeserializeOwned> FromRow for Json<T> {
    fn from_record(record: &Record) -> Result<Self, GraphError> {
        Json::<T>::from_value(record.single()?.clone())
    }
}

impl<T: GraphNode> FromRow for NodeWrapper<T> {
    fn from_record(record: &Record) -> Result<Self, GraphError> {
        NodeWrapper::<T>::from_value(record.single()?.clone())
    }
}

impl<T: GraphRelation> FromRow for RelationWrapper<T> {
    fn from_record(record: &Record) -> Result<Self, GraphError> {
        RelationWrapper::<T>::from_value(record.single()?.clone())
    }
}

/// The whole record, untouched.
impl FromRow for Record {
    fn from_record(record: &Record) -> Result<Self, GraphError> {
        Ok(record.clone())
    }
}
