//! REST transport over an [`HttpTransport`].
//!
//! Servers before 2.0 only offer the legacy `cypher` endpoint and cannot
//! hold a transaction open; later servers take statement lists on the
//! transactional endpoint, where a transaction lives at its own URL until
//! committed (`POST {tx}/commit`) or rolled back (`DELETE {tx}`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use graphwire_core::GraphError;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::trace;

use super::{QueryRunner, RawResult, TransactionChannel};
use crate::capabilities::ServerVersion;
use crate::deserializer::{parse_commit, parse_legacy, parse_transactional};
use crate::policy::{ExecutionPolicy, TransportKind};
use crate::query::{Bookmark, CypherQuery, ResultFormat};

/// Header carrying the per-query execution limit, in milliseconds.
pub const MAX_EXECUTION_TIME_HEADER: &str = "max-execution-time";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// A request relative to the server's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Relative path (`db/neo4j/tx/commit`) or an absolute URL handed out by
    /// the server (a transaction location).
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: JsonValue,
}

impl HttpResponse {
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, headers: BTreeMap::new(), body }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends HTTP requests to the server. Authentication and connection reuse
/// are the implementation's business.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GraphError>;
}

#[derive(Serialize)]
struct LegacyBody<'a> {
    query: &'a str,
    params: JsonValue,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Statement<'a> {
    statement: &'a str,
    parameters: JsonValue,
    result_data_contents: &'static [&'static str],
    include_stats: bool,
}

#[derive(Serialize)]
struct Statements<'a> {
    statements: Vec<Statement<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bookmarks: Vec<Bookmark>,
}

const ROW: &[&str] = &["row"];
const ROW_AND_GRAPH: &[&str] = &["row", "graph"];

fn statements<'a>(queries: &'a [CypherQuery], bookmarks: &[Bookmark]) -> Result<Statements<'a>, GraphError> {
    let statements = queries
        .iter()
        .map(|q| {
            Ok(Statement {
                statement: q.text(),
                parameters: q.params_json()?,
                result_data_contents: match q.result_format() {
                    ResultFormat::Row => ROW,
                    ResultFormat::Graph | ResultFormat::DependsOnEnvironment => ROW_AND_GRAPH,
                },
                include_stats: q.includes_stats(),
            })
        })
        .collect::<Result<Vec<_>, GraphError>>()?;
    Ok(Statements { statements, bookmarks: bookmarks.to_vec() })
}

/// Shared request plumbing for the runner and its transaction channels.
#[derive(Clone)]
struct RestClient {
    http: Arc<dyn HttpTransport>,
    default_headers: BTreeMap<String, String>,
}

impl RestClient {
    /// Client defaults, then per-query headers, then the execution limit.
    fn headers(&self, queries: &[CypherQuery]) -> BTreeMap<String, String> {
        let mut headers = self.default_headers.clone();
        for query in queries {
            headers.extend(query.custom_headers().iter().map(|(k, v)| (k.clone(), v.clone())));
            if let Some(limit) = query.execution_time_limit() {
                headers.insert(MAX_EXECUTION_TIME_HEADER.to_string(), limit.as_millis().to_string());
            }
        }
        headers
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: String,
        headers: BTreeMap<String, String>,
        body: Option<JsonValue>,
        expected: &[u16],
    ) -> Result<HttpResponse, GraphError> {
        trace!(?method, %path, "rest request");
        let response = self.http.send(HttpRequest { method, path, headers, body }).await?;
        if !expected.contains(&response.status) {
            return Err(GraphError::UnexpectedStatus {
                expected: expected.to_vec(),
                actual: response.status,
            });
        }
        Ok(response)
    }
}

/// [`QueryRunner`] over HTTP.
pub struct RestRunner {
    client: RestClient,
}

impl RestRunner {
    pub fn new(http: Arc<dyn HttpTransport>, default_headers: BTreeMap<String, String>) -> Self {
        Self { client: RestClient { http, default_headers } }
    }
}

#[async_trait]
impl QueryRunner for RestRunner {
    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }

    async fn server_version(&self) -> Result<ServerVersion, GraphError> {
        let headers = self.client.headers(&[]);
        for path in ["", "db/data/"] {
            let response = self
                .client
                .send(HttpMethod::Get, path.to_string(), headers.clone(), None, &[200])
                .await?;
            if let Some(version) = response.body.get("neo4j_version").and_then(JsonValue::as_str) {
                return version.parse();
            }
        }
        Err(GraphError::Mapping("server did not report neo4j_version".into()))
    }

    async fn run_autocommit(
        &self,
        query: &CypherQuery,
        policy: &ExecutionPolicy,
        database: &str,
    ) -> Result<RawResult, GraphError> {
        let headers = self.client.headers(std::slice::from_ref(query));
        let path = policy.rest_endpoint(database, true);

        if policy.uses_legacy_endpoint() {
            let body = serde_json::to_value(LegacyBody { query: query.text(), params: query.params_json()? })?;
            let response = self.client.send(HttpMethod::Post, path, headers, Some(body), &[200]).await?;
            return parse_legacy(response.body);
        }

        let body = serde_json::to_value(statements(std::slice::from_ref(query), query.required_bookmarks())?)?;
        let response = self.client.send(HttpMethod::Post, path, headers, Some(body), &[200, 201]).await?;
        parse_transactional(response.body, &[query.includes_stats()])?
            .results
            .pop()
            .ok_or_else(|| GraphError::Mapping("server returned no result for the statement".into()))
    }

    async fn begin(
        &self,
        policy: &ExecutionPolicy,
        database: &str,
        bookmarks: &[Bookmark],
    ) -> Result<Box<dyn TransactionChannel>, GraphError> {
        policy.check_transactions_supported()?;
        let path = policy.rest_endpoint(database, false);
        let body = serde_json::to_value(statements(&[], bookmarks)?)?;
        let response = self
            .client
            .send(HttpMethod::Post, path, self.client.headers(&[]), Some(body), &[201])
            .await?;

        let location = response.header("location").map(str::to_string);
        let parsed = parse_transactional(response.body, &[])?;
        let endpoint = location
            .or_else(|| parsed.commit.map(|c| c.trim_end_matches("/commit").to_string()))
            .ok_or_else(|| GraphError::Mapping("transaction begin returned no location".into()))?;

        Ok(Box::new(RestTransactionChannel { client: self.client.clone(), endpoint }))
    }
}

/// An open REST transaction, addressed by its endpoint URL.
struct RestTransactionChannel {
    client: RestClient,
    endpoint: String,
}

#[async_trait]
impl TransactionChannel for RestTransactionChannel {
    fn id(&self) -> &str {
        &self.endpoint
    }

    async fn run_batch(&mut self, queries: &[CypherQuery]) -> Result<Vec<RawResult>, GraphError> {
        let body = serde_json::to_value(statements(queries, &[])?)?;
        let include_stats: Vec<bool> = queries.iter().map(CypherQuery::includes_stats).collect();
        let response = self
            .client
            .send(HttpMethod::Post, self.endpoint.clone(), self.client.headers(queries), Some(body), &[200, 201])
            .await?;
        let results = parse_transactional(response.body, &include_stats)?.results;
        if results.len() != queries.len() {
            return Err(GraphError::Mapping(format!(
                "sent {} statements, server returned {} results",
                queries.len(),
                results.len()
            )));
        }
        Ok(results)
    }

    async fn commit(self: Box<Self>) -> Result<Vec<Bookmark>, GraphError> {
        let response = self
            .client
            .send(
                HttpMethod::Post,
                format!("{}/commit", self.endpoint),
                self.client.headers(&[]),
                Some(json!({ "statements": [] })),
                &[200],
            )
            .await?;
        parse_commit(response.body)
    }

    /// A 404 means the server already discarded the transaction, which it
    /// does on its own after a statement error.
    async fn rollback(self: Box<Self>) -> Result<(), GraphError> {
        let response = self
            .client
            .send(HttpMethod::Delete, self.endpoint.clone(), self.client.headers(&[]), None, &[200, 404])
            .await?;
        if response.status == 404 {
            trace!(transaction = %self.endpoint, "transaction already rolled back by the server");
        }
        Ok(())
    }
}
