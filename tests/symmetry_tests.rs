//! The same rows must map to the same values whichever path they took.

mod support;

use graphwire::core::neo4rs::{BoltInteger, BoltNode, BoltString, BoltType};
use graphwire::prelude::*;
use serde_json::json;
use support::*;

#[derive(Debug, Clone, PartialEq, GraphNode)]
#[graph(label = "User")]
struct User {
    id: i64,
    name: String,
    #[graph(prop = "email_address")]
    email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
struct Membership {
    u: User,
    #[graph(column = "groupName")]
    group: String,
    score: f64,
}

fn expected() -> Vec<Membership> {
    vec![
        Membership {
            u: User { id: 1, name: "Alice".into(), email: Some("alice@example.com".into()) },
            group: "admins".into(),
            score: 9.5,
        },
        Membership {
            u: User { id: 2, name: "Bob".into(), email: None },
            group: "users".into(),
            score: 3.0,
        },
    ]
}

const QUERY: &str = "MATCH (u:User)-[:IN]->(g) RETURN u, g.name AS groupName, u.score AS score";

fn rest_rows() -> Vec<serde_json::Value> {
    vec![
        json!([{ "id": 1, "name": "Alice", "email_address": "alice@example.com" }, "admins", 9.5]),
        json!([{ "id": 2, "name": "Bob" }, "users", 3.0]),
    ]
}

fn bolt_user(id: i64, name: &str, email: Option<&str>) -> BoltType {
    let mut props = vec![
        (BoltString::from("id"), BoltType::from(id)),
        (BoltString::from("name"), BoltType::from(name)),
    ];
    if let Some(email) = email {
        props.push((BoltString::from("email_address"), BoltType::from(email)));
    }
    BoltType::Node(BoltNode::new(
        BoltInteger::new(id),
        vec![BoltType::from("User")].into(),
        props.into_iter().collect(),
    ))
}

fn bolt_rows() -> ScriptedResult {
    ScriptedResult::rows(vec![
        Record::from_pairs([
            ("u", bolt_user(1, "Alice", Some("alice@example.com"))),
            ("groupName", BoltType::from("admins")),
            ("score", BoltType::from(9.5_f64)),
        ]),
        Record::from_pairs([
            ("u", bolt_user(2, "Bob", None)),
            ("groupName", BoltType::from("users")),
            ("score", BoltType::from(3.0_f64)),
        ]),
    ])
}

#[tokio::test]
async fn rest_autocommit() {
    let (client, http) = rest_client("5.12.0").await;
    http.respond(rows_response(&["u", "groupName", "score"], rest_rows()));
    let rows: Vec<Membership> = client.execute_read(&CallContext::new(), CypherQuery::new(QUERY)).await.unwrap();
    assert_eq!(rows, expected());
}

#[tokio::test]
async fn rest_in_transaction() {
    let (client, http) = rest_client("5.12.0").await;
    http.respond(begin_response());
    let mut ctx = CallContext::new();
    client.begin_transaction(&mut ctx, TransactionOptions::new()).await.unwrap();

    http.respond(rows_response(&["u", "groupName", "score"], rest_rows()));
    let rows: Vec<Membership> = client.execute_read(&ctx, CypherQuery::new(QUERY)).await.unwrap();
    assert_eq!(rows, expected());
}

#[tokio::test]
async fn rest_legacy_endpoint() {
    let (client, http) = rest_client("1.9.9").await;
    http.respond(graphwire::transport::rest::HttpResponse::new(
        200,
        json!({ "columns": ["u", "groupName", "score"], "data": rest_rows() }),
    ));
    let rows: Vec<Membership> = client.execute_read(&CallContext::new(), CypherQuery::new(QUERY)).await.unwrap();
    assert_eq!(rows, expected());
}

#[tokio::test]
async fn bolt_autocommit() {
    let driver = MockBolt::new("5.1.0");
    driver.push(bolt_rows());
    let client = bolt_client(&driver).await;
    let rows: Vec<Membership> = client.execute_read(&CallContext::new(), CypherQuery::new(QUERY)).await.unwrap();
    assert_eq!(rows, expected());
}

#[tokio::test]
async fn bolt_in_transaction() {
    let driver = MockBolt::new("5.1.0");
    driver.push(bolt_rows());
    let client = bolt_client(&driver).await;
    let mut ctx = CallContext::new();
    client.begin_transaction(&mut ctx, TransactionOptions::new()).await.unwrap();
    let rows: Vec<Membership> = client.execute_read(&ctx, CypherQuery::new(QUERY)).await.unwrap();
    assert_eq!(rows, expected());
}

#[tokio::test]
async fn missing_column_names_field_and_row() {
    let (client, http) = rest_client("5.12.0").await;
    http.respond(rows_response(&["u", "groupName"], vec![json!([{ "id": 1, "name": "A" }, "g"])]));
    let err = client
        .execute_read::<Membership>(&CallContext::new(), CypherQuery::new(QUERY))
        .await
        .unwrap_err();
    match err {
        GraphError::Deserialization { row, source } => {
            assert_eq!(row, 0);
            assert!(matches!(*source, GraphError::MissingField { ref field, .. } if field == "score"));
        }
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

#[tokio::test]
async fn column_lookup_ignores_case() {
    let (client, http) = rest_client("5.12.0").await;
    http.respond(rows_response(
        &["U", "GROUPNAME", "Score"],
        vec![json!([{ "id": 2, "name": "Bob" }, "users", 3.0])],
    ));
    let rows: Vec<Membership> = client.execute_read(&CallContext::new(), CypherQuery::new(QUERY)).await.unwrap();
    assert_eq!(rows, expected()[1..].to_vec());
}
