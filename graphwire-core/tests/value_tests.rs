use std::collections::HashMap;
use graphwire_core::json::{bolt_to_json, json_to_bolt};
use graphwire_core::traits::{FromGraphValue, FromRow, IntoGraphValue};
use graphwire_core::{GraphError, Json, Record};
use neo4rs::BoltType;
use serde_json::json;

#[test]
fn test_from_value_integer() {
    let val = BoltType::Integer(neo4rs::BoltInteger { value: 42 });
    let res = i64::from_value(val).unwrap();
    assert_eq!(res, 42);
}

#[test]
fn test_from_value_string() {
    let val = BoltType::String(neo4rs::BoltString { value: "hello".to_string() });
    let res = String::from_value(val).unwrap();
    assert_eq!(res, "hello");
}

#[test]
fn test_from_value_list() {
    let val = BoltType::List(neo4rs::BoltList {
        value: vec![
            BoltType::Integer(neo4rs::BoltInteger { value: 1 }),
            BoltType::Integer(neo4rs::BoltInteger { value: 2 }),
        ],
    });
    let res = Vec::<i64>::from_value(val).unwrap();
    assert_eq!(res, vec![1, 2]);
}

#[test]
fn test_from_value_option() {
    let val = BoltType::Null(neo4rs::BoltNull);
    assert_eq!(Option::<i64>::from_value(val).unwrap(), None);

    let val = BoltType::Integer(neo4rs::BoltInteger { value: 42 });
    assert_eq!(Option::<i64>::from_value(val).unwrap(), Some(42));
}

#[test]
fn test_type_mismatch_error() {
    let val = BoltType::String(neo4rs::BoltString { value: "oops".to_string() });
    let err = i64::from_value(val).unwrap_err();
    match &err {
        GraphError::TypeMismatch { expected, got, .. } => {
            assert_eq!(expected, "Integer");
            assert_eq!(got, "String");
        }
        other => panic!("expected TypeMismatch, got: {other}"),
    }
}

#[test]
fn test_integer_out_of_range() {
    let val = BoltType::Integer(neo4rs::BoltInteger { value: 300 });
    assert!(matches!(u8::from_value(val), Err(GraphError::Mapping(_))));
}

#[test]
fn test_float_accepts_integral_integer() {
    let val = BoltType::Integer(neo4rs::BoltInteger { value: 3 });
    assert_eq!(f64::from_value(val).unwrap(), 3.0);
}

#[test]
fn test_hashmap_from_value() {
    let mut map = neo4rs::BoltMap::new();
    map.put(
        neo4rs::BoltString { value: "a".to_string() },
        BoltType::Integer(neo4rs::BoltInteger { value: 1 }),
    );
    map.put(
        neo4rs::BoltString { value: "b".to_string() },
        BoltType::Integer(neo4rs::BoltInteger { value: 2 }),
    );

    let res = HashMap::<String, i64>::from_value(BoltType::Map(map)).unwrap();
    assert_eq!(res.get("a"), Some(&1));
    assert_eq!(res.get("b"), Some(&2));
}

#[test]
fn test_hashmap_type_mismatch() {
    let val = BoltType::Integer(neo4rs::BoltInteger { value: 42 });
    let err = HashMap::<String, i64>::from_value(val).unwrap_err();
    match &err {
        GraphError::TypeMismatch { expected, got, .. } => {
            assert_eq!(expected, "Map");
            assert_eq!(got, "Integer");
        }
        other => panic!("expected TypeMismatch, got: {other}"),
    }
}

// --- Temporal fallbacks ---

#[test]
fn test_date_from_iso_string() {
    let val = BoltType::from("2024-02-29");
    let date = chrono::NaiveDate::from_value(val).unwrap();
    assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
}

#[test]
fn test_native_date_wins_over_string_path() {
    let native = chrono::NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
    let val: BoltType = native.into();
    assert_eq!(chrono::NaiveDate::from_value(val).unwrap(), native);
}

#[test]
fn test_datetime_string_with_zone_id() {
    let val = BoltType::from("2024-01-01T10:00:00+01:00[Europe/Paris]");
    let dt = chrono::DateTime::<chrono::FixedOffset>::from_value(val).unwrap();
    assert_eq!(dt.offset().local_minus_utc(), 3600);
    assert_eq!(dt.to_rfc3339(), "2024-01-01T10:00:00+01:00");
}

#[test]
fn test_bad_temporal_string() {
    let err = chrono::NaiveDate::from_value(BoltType::from("yesterday")).unwrap_err();
    assert!(matches!(err, GraphError::Mapping(_)));
}

// --- Structural converter ---

#[derive(Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Active,
    Suspended,
}

#[derive(Debug, PartialEq, serde::Deserialize)]
struct Settings {
    theme: String,
    limits: Vec<i64>,
}

#[test]
fn test_json_enum() {
    let Json(status) = Json::<Status>::from_value(BoltType::from("suspended")).unwrap();
    assert_eq!(status, Status::Suspended);
}

#[test]
fn test_json_struct_from_map() {
    let val = json_to_bolt(&json!({ "theme": "dark", "limits": [1, 2] }));
    let Json(settings) = Json::<Settings>::from_value(val).unwrap();
    assert_eq!(settings, Settings { theme: "dark".into(), limits: vec![1, 2] });
}

#[test]
fn test_json_round_trip_shapes() {
    let value = json!({ "n": null, "b": true, "i": 7, "f": 1.5, "s": "x", "l": [1, "a"] });
    assert_eq!(bolt_to_json(&json_to_bolt(&value)).unwrap(), value);
}

#[test]
fn test_node_becomes_property_map() {
    let node = neo4rs::BoltNode::new(
        neo4rs::BoltInteger::new(1),
        vec![BoltType::from("User")].into(),
        vec![(neo4rs::BoltString::from("name"), BoltType::from("Ann"))]
            .into_iter()
            .collect(),
    );
    assert_eq!(bolt_to_json(&BoltType::Node(node)).unwrap(), json!({ "name": "Ann" }));
}

// --- Record ---

fn record() -> Record {
    Record::from_pairs([("name", BoltType::from("Ann")), ("Age", BoltType::from(41_i64))])
}

#[test]
fn test_record_lookup_exact_then_case_insensitive() {
    let r = record();
    assert_eq!(r.get("name"), Some(&BoltType::from("Ann")));
    assert_eq!(r.get("age"), Some(&BoltType::from(41_i64)));
    assert_eq!(r.get("missing"), None);
    assert_eq!(r.columns(), ["name".to_string(), "Age".to_string()]);
}

#[test]
fn test_record_new_checks_lengths() {
    let err = Record::new(vec!["a".into()], vec![]).unwrap_err();
    assert!(matches!(err, GraphError::Mapping(_)));
}

#[test]
fn test_scalar_row_needs_single_column() {
    let err = String::from_record(&record()).unwrap_err();
    assert!(matches!(err, GraphError::Mapping(_)));

    let one = Record::from_pairs([("n", BoltType::from("x"))]);
    assert_eq!(String::from_record(&one).unwrap(), "x");
}

// --- Error context chaining ---

#[test]
fn test_error_with_context() {
    let err = GraphError::type_mismatch("Integer", "String", "age");
    let msg = err.with_context("User::age").to_string();
    assert!(msg.contains("User::age"));
    assert!(msg.contains("type mismatch"));
}

#[test]
fn test_error_context_variant() {
    let outer = GraphError::missing_property("name", "User").with_context("parsing User");
    match &outer {
        GraphError::Context { context, source } => {
            assert_eq!(context, "parsing User");
            assert!(matches!(source.as_ref(), GraphError::MissingProperty { .. }));
        }
        other => panic!("expected Context, got: {other}"),
    }
}

#[test]
fn test_row_index_is_reported() {
    let err = GraphError::missing_field("age", "UserRow").at_row(3);
    assert_eq!(err.to_string(), "row 3: missing field 'age' on UserRow");
}

#[test]
fn test_aggregate_unwrap_is_single_cause_only() {
    let err = GraphError::Aggregate(vec![GraphError::Cancelled]).unwrap_aggregate();
    assert!(matches!(err, GraphError::Cancelled));

    let empty = GraphError::Aggregate(vec![]).unwrap_aggregate();
    assert!(matches!(empty, GraphError::Aggregate(ref v) if v.is_empty()));
}

// --- IntoGraphValue ---

#[test]
fn test_into_value_string() {
    match String::from("hello").into_value() {
        BoltType::String(s) => assert_eq!(s.value, "hello"),
        other => panic!("expected String, got: {other:?}"),
    }
}

#[test]
fn test_into_value_i64() {
    match 42_i64.into_value() {
        BoltType::Integer(i) => assert_eq!(i.value, 42),
        other => panic!("expected Integer, got: {other:?}"),
    }
}
