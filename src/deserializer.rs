//! From wire responses to typed rows.
//!
//! REST bodies are parsed in two stages: the envelope first (statement
//! results, error list, bookmarks), then each statement's `data[].row`
//! arrays into [`Record`]s. Bolt rows are already records. From there both
//! transports share [`deserialize`].

use graphwire_core::json::json_to_bolt;
use graphwire_core::{FromRow, GraphError, Record};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::query::{Bookmark, CypherQuery, ResultShape};
use crate::stats::QueryStats;
use crate::transport::RawResult;

/// One entry of a REST `errors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
    #[serde(default, rename = "lastBookmarks")]
    last_bookmarks: Vec<Bookmark>,
    commit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowEntry>,
    stats: Option<QueryStats>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    #[serde(default)]
    row: Vec<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct LegacyResponse {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<JsonValue>>,
}

/// A parsed transactional-endpoint response.
#[derive(Debug)]
pub struct TransactionalResponse {
    pub results: Vec<RawResult>,
    /// The transaction's commit URL, present while it stays open.
    pub commit: Option<String>,
}

fn to_records(columns: &[String], rows: Vec<Vec<JsonValue>>) -> Result<Vec<Record>, GraphError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            Record::new(columns.to_vec(), row.iter().map(json_to_bolt).collect()).map_err(|e| e.at_row(i))
        })
        .collect()
}

/// Fail with the first server-reported error, if any.
pub fn check_errors(errors: &[ServerError]) -> Result<(), GraphError> {
    match errors.first() {
        Some(err) => Err(GraphError::server_reported(&err.code, &err.message)),
        None => Ok(()),
    }
}

/// Parse a response from the transactional endpoint.
///
/// `include_stats` is indexed by statement; stats the caller did not ask
/// for are dropped. Bookmarks are attached to the last statement's result.
pub fn parse_transactional(body: JsonValue, include_stats: &[bool]) -> Result<TransactionalResponse, GraphError> {
    let envelope: Envelope = serde_json::from_value(body)?;
    check_errors(&envelope.errors)?;

    let mut results = envelope
        .results
        .into_iter()
        .enumerate()
        .map(|(i, statement)| {
            let rows = statement.data.into_iter().map(|entry| entry.row).collect();
            Ok(RawResult {
                records: to_records(&statement.columns, rows)?,
                stats: statement.stats.filter(|_| include_stats.get(i).copied().unwrap_or(false)),
                bookmarks: Vec::new(),
            })
        })
        .collect::<Result<Vec<_>, GraphError>>()?;

    if let Some(last) = results.last_mut() {
        last.bookmarks = envelope.last_bookmarks;
    }
    Ok(TransactionalResponse { results, commit: envelope.commit })
}

/// Bookmarks and errors of a commit response.
pub fn parse_commit(body: JsonValue) -> Result<Vec<Bookmark>, GraphError> {
    let envelope: Envelope = serde_json::from_value(body)?;
    check_errors(&envelope.errors)?;
    Ok(envelope.last_bookmarks)
}

/// Parse a response from the pre-transactional `cypher` endpoint.
pub fn parse_legacy(body: JsonValue) -> Result<RawResult, GraphError> {
    let response: LegacyResponse = serde_json::from_value(body)?;
    Ok(RawResult {
        records: to_records(&response.columns, response.data)?,
        stats: None,
        bookmarks: Vec::new(),
    })
}

/// Map records into `T`, preserving order.
///
/// A failure names the index of the row that could not be mapped.
pub fn deserialize<T: FromRow>(query: &CypherQuery, records: &[Record]) -> Result<Vec<T>, GraphError> {
    let shape = query.result_shape();
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            check_shape(shape, record).map_err(|e| e.at_row(i))?;
            T::from_record(record).map_err(|e| e.at_row(i))
        })
        .collect()
}

/// Reject records the requested shape cannot be read from.
///
/// Projections match columns to fields ignoring ASCII case, so two columns
/// differing only in case would be ambiguous.
fn check_shape(shape: ResultShape, record: &Record) -> Result<(), GraphError> {
    match shape {
        ResultShape::SingleColumn if record.len() != 1 => Err(GraphError::Mapping(format!(
            "single-column result has {} columns",
            record.len()
        ))),
        ResultShape::Projection => {
            let columns = record.columns();
            for (i, column) in columns.iter().enumerate() {
                if columns[..i].iter().any(|c| c.eq_ignore_ascii_case(column)) {
                    return Err(GraphError::Mapping(format!("projection has ambiguous column '{column}'")));
                }
            }
            Ok(())
        }
        ResultShape::SingleColumn | ResultShape::MultipleColumns => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_splits_statements_in_order() {
        let body = json!({
            "results": [
                { "columns": ["a"], "data": [{ "row": [1] }, { "row": [2] }] },
                { "columns": ["b"], "data": [{ "row": ["x"] }], "stats": { "nodes_created": 1 } }
            ],
            "errors": [],
            "lastBookmarks": ["bm:7"],
            "commit": "http://localhost:7474/db/neo4j/tx/3/commit"
        });
        let parsed = parse_transactional(body, &[false, true]).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].records.len(), 2);
        assert!(parsed.results[0].stats.is_none());
        assert_eq!(parsed.results[1].stats.as_ref().unwrap().nodes_created, 1);
        assert_eq!(parsed.results[1].bookmarks, vec!["bm:7".to_string()]);
        assert!(parsed.commit.unwrap().ends_with("/commit"));
    }

    #[test]
    fn first_server_error_wins() {
        let body = json!({
            "results": [],
            "errors": [
                { "code": "Neo.ClientError.Statement.SyntaxError", "message": "bad" },
                { "code": "Neo.ClientError.Other", "message": "ignored" }
            ]
        });
        match parse_transactional(body, &[]) {
            Err(GraphError::ServerReported { code, message }) => {
                assert_eq!(code, "Neo.ClientError.Statement.SyntaxError");
                assert_eq!(message, "bad");
            }
            other => panic!("expected ServerReported, got {other:?}"),
        }
    }

    #[test]
    fn legacy_rows_become_records() {
        let raw = parse_legacy(json!({ "columns": ["n.name"], "data": [["Alice"], ["Bob"]] })).unwrap();
        let names = deserialize::<String>(&CypherQuery::new("MATCH (n) RETURN n.name"), &raw.records).unwrap();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn single_column_shape_is_checked_before_conversion() {
        let record = Record::from_pairs([("a", 1_i64.into()), ("b", 2_i64.into())]);
        let query = CypherQuery::new("RETURN 1 AS a, 2 AS b").shape(ResultShape::SingleColumn);
        let err = deserialize::<graphwire_core::Record>(&query, &[record]).unwrap_err();
        assert!(matches!(err, GraphError::Deserialization { row: 0, .. }));
    }

    #[test]
    fn projection_rejects_columns_differing_only_in_case() {
        let query = CypherQuery::new("RETURN 1 AS name, 2 AS Name").shape(ResultShape::Projection);
        let record = Record::from_pairs([("name", 1_i64.into()), ("Name", 2_i64.into())]);
        let err = deserialize::<graphwire_core::Record>(&query, &[record]).unwrap_err();
        match err {
            GraphError::Deserialization { row: 0, source } => {
                assert!(source.to_string().contains("ambiguous column 'Name'"), "{source}");
            }
            other => panic!("expected Deserialization, got {other:?}"),
        }

        let distinct = Record::from_pairs([("name", 1_i64.into()), ("age", 2_i64.into())]);
        assert_eq!(deserialize::<graphwire_core::Record>(&query, &[distinct]).unwrap().len(), 1);
    }

    #[test]
    fn multiple_columns_shape_takes_any_width() {
        let query = CypherQuery::new("RETURN 1 AS a, 2 AS b").shape(ResultShape::MultipleColumns);
        let record = Record::from_pairs([("a", 1_i64.into()), ("b", 2_i64.into())]);
        assert_eq!(deserialize::<graphwire_core::Record>(&query, &[record]).unwrap().len(), 1);
    }
}
