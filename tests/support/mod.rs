//! Scripted in-memory transports shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use graphwire::config::ClientConfig;
use graphwire::events::OperationCompletedEvent;
use graphwire::query::Bookmark;
use graphwire::stats::QueryStats;
use graphwire::transport::bolt::{BoltDriver, BoltSession, BoltTransaction, RecordCursor, SessionConfig};
use graphwire::transport::rest::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use graphwire::{CypherQuery, GraphClient, GraphError, Record};
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};

// --- REST ---

enum Scripted {
    Reply(Result<HttpResponse, GraphError>),
    /// Never answers.
    Hang,
}

#[derive(Default)]
pub struct MockHttp {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: HttpResponse) {
        self.responses.lock().push_back(Scripted::Reply(Ok(response)));
    }

    pub fn fail(&self, error: GraphError) {
        self.responses.lock().push_back(Scripted::Reply(Err(error)));
    }

    /// The next request is accepted but never answered.
    pub fn hang(&self) {
        self.responses.lock().push_back(Scripted::Hang);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().last().cloned().expect("no request sent")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GraphError> {
        self.requests.lock().push(request);
        let next = self.responses.lock().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => reply,
            Some(Scripted::Hang) => futures::future::pending().await,
            None => Err(GraphError::Transport("no scripted response".into())),
        }
    }
}

/// Discovery response carrying `version`.
pub fn version_response(version: &str) -> HttpResponse {
    HttpResponse::new(200, json!({ "neo4j_version": version }))
}

/// A transactional-endpoint response with one statement result.
pub fn rows_response(columns: &[&str], rows: Vec<JsonValue>) -> HttpResponse {
    HttpResponse::new(200, json!({ "results": [statement_result(columns, rows)], "errors": [] }))
}

pub fn statement_result(columns: &[&str], rows: Vec<JsonValue>) -> JsonValue {
    let data: Vec<JsonValue> = rows.into_iter().map(|row| json!({ "row": row })).collect();
    json!({ "columns": columns, "data": data })
}

pub fn error_response(code: &str, message: &str) -> HttpResponse {
    HttpResponse::new(200, json!({ "results": [], "errors": [{ "code": code, "message": message }] }))
}

pub const TX_URL: &str = "http://localhost:7474/db/neo4j/tx/9";

/// Response to a transaction begin.
pub fn begin_response() -> HttpResponse {
    HttpResponse::new(201, json!({ "results": [], "errors": [], "commit": format!("{TX_URL}/commit") }))
        .with_header("Location", TX_URL)
}

pub fn commit_response(bookmarks: &[&str]) -> HttpResponse {
    HttpResponse::new(200, json!({ "results": [], "errors": [], "lastBookmarks": bookmarks }))
}

pub fn rest_config() -> ClientConfig {
    ClientConfig::builder().address("http://localhost:7474").build().unwrap()
}

/// A REST client connected to a server reporting `version`.
pub async fn rest_client(version: &str) -> (GraphClient, Arc<MockHttp>) {
    rest_client_with(version, rest_config(), None).await
}

pub async fn rest_client_with(
    version: &str,
    config: ClientConfig,
    events: Option<EventLog>,
) -> (GraphClient, Arc<MockHttp>) {
    let http = MockHttp::new();
    http.respond(version_response(version));
    let mut builder = GraphClient::builder(config).rest(http.clone());
    if let Some(log) = events {
        builder = builder.listener(log.listener());
    }
    let client = builder.build().unwrap();
    client.connect().await.unwrap();
    (client, http)
}

/// Statement texts of a request body, in order.
pub fn statements(request: &HttpRequest) -> Vec<String> {
    request
        .body
        .as_ref()
        .and_then(|b| b["statements"].as_array().cloned())
        .unwrap_or_default()
        .iter()
        .map(|s| s["statement"].as_str().unwrap_or_default().to_string())
        .collect()
}

pub fn is_post_to(request: &HttpRequest, path: &str) -> bool {
    request.method == HttpMethod::Post && request.path == path
}

// --- Bolt ---

pub struct ScriptedResult {
    pub records: Vec<Record>,
    pub stats: Option<QueryStats>,
}

impl ScriptedResult {
    pub fn rows(records: Vec<Record>) -> Self {
        Self { records, stats: None }
    }
}

#[derive(Default)]
struct BoltState {
    version: String,
    results: Mutex<VecDeque<Result<ScriptedResult, GraphError>>>,
    log: Mutex<Vec<String>>,
    sessions: Mutex<Vec<SessionConfig>>,
    commit_bookmarks: Mutex<Vec<Bookmark>>,
    session_bookmarks: Mutex<Vec<Bookmark>>,
    close_error: Mutex<Option<GraphError>>,
}

impl BoltState {
    fn record(&self, entry: impl Into<String>) {
        self.log.lock().push(entry.into());
    }

    fn next_result(&self) -> Result<ScriptedResult, GraphError> {
        self.results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ScriptedResult::rows(Vec::new())))
    }
}

#[derive(Clone)]
pub struct MockBolt {
    state: Arc<BoltState>,
}

impl MockBolt {
    pub fn new(version: &str) -> Self {
        Self {
            state: Arc::new(BoltState { version: version.to_string(), ..Default::default() }),
        }
    }

    pub fn push(&self, result: ScriptedResult) {
        self.state.results.lock().push_back(Ok(result));
    }

    pub fn push_error(&self, error: GraphError) {
        self.state.results.lock().push_back(Err(error));
    }

    pub fn commit_bookmarks(&self, bookmarks: &[&str]) {
        *self.state.commit_bookmarks.lock() = bookmarks.iter().map(|b| b.to_string()).collect();
    }

    pub fn session_bookmarks(&self, bookmarks: &[&str]) {
        *self.state.session_bookmarks.lock() = bookmarks.iter().map(|b| b.to_string()).collect();
    }

    pub fn fail_close(&self, error: GraphError) {
        *self.state.close_error.lock() = Some(error);
    }

    pub fn log(&self) -> Vec<String> {
        self.state.log.lock().clone()
    }

    pub fn sessions(&self) -> Vec<SessionConfig> {
        self.state.sessions.lock().clone()
    }
}

#[async_trait]
impl BoltDriver for MockBolt {
    async fn server_version(&self) -> Result<String, GraphError> {
        Ok(self.state.version.clone())
    }

    async fn open_session(&self, config: SessionConfig) -> Result<Box<dyn BoltSession>, GraphError> {
        self.state.record("open");
        self.state.sessions.lock().push(config);
        Ok(Box::new(MockSession { state: Arc::clone(&self.state) }))
    }
}

struct MockSession {
    state: Arc<BoltState>,
}

#[async_trait]
impl BoltSession for MockSession {
    async fn run<'s>(&'s mut self, query: &CypherQuery) -> Result<Box<dyn RecordCursor + 's>, GraphError> {
        self.state.record(format!("run {}", query.text()));
        let result = self.state.next_result()?;
        Ok(Box::new(MockCursor { records: result.records.into(), stats: result.stats }))
    }

    async fn begin_transaction(self: Box<Self>) -> Result<Box<dyn BoltTransaction>, GraphError> {
        self.state.record("begin");
        Ok(Box::new(MockTransaction { state: Arc::clone(&self.state) }))
    }

    fn last_bookmarks(&self) -> Vec<Bookmark> {
        self.state.session_bookmarks.lock().clone()
    }

    async fn close(self: Box<Self>) -> Result<(), GraphError> {
        self.state.record("close");
        match self.state.close_error.lock().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct MockTransaction {
    state: Arc<BoltState>,
}

#[async_trait]
impl BoltTransaction for MockTransaction {
    async fn run<'t>(&'t mut self, query: &CypherQuery) -> Result<Box<dyn RecordCursor + 't>, GraphError> {
        self.state.record(format!("tx run {}", query.text()));
        let result = self.state.next_result()?;
        Ok(Box::new(MockCursor { records: result.records.into(), stats: result.stats }))
    }

    async fn commit(self: Box<Self>) -> Result<Vec<Bookmark>, GraphError> {
        self.state.record("commit");
        Ok(self.state.commit_bookmarks.lock().clone())
    }

    async fn rollback(self: Box<Self>) -> Result<(), GraphError> {
        self.state.record("rollback");
        Ok(())
    }
}

struct MockCursor {
    records: VecDeque<Record>,
    stats: Option<QueryStats>,
}

#[async_trait]
impl RecordCursor for MockCursor {
    async fn next(&mut self) -> Result<Option<Record>, GraphError> {
        Ok(self.records.pop_front())
    }

    async fn consume(self: Box<Self>) -> Result<Option<QueryStats>, GraphError> {
        Ok(self.stats)
    }
}

/// A Bolt client connected to `driver`.
pub async fn bolt_client(driver: &MockBolt) -> GraphClient {
    let client = GraphClient::builder(ClientConfig::default())
        .bolt(Arc::new(driver.clone()))
        .build()
        .unwrap();
    client.connect().await.unwrap();
    client
}

// --- Events ---

/// What a listener saw, copied out of the borrowed event.
#[derive(Debug, Clone)]
pub struct SeenEvent {
    pub query_text: String,
    pub identifier: Option<String>,
    pub results_count: i64,
    pub error: Option<String>,
    pub nodes_created: Option<i64>,
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SeenEvent>>>,
}

impl EventLog {
    pub fn listener(&self) -> impl Fn(&OperationCompletedEvent<'_>) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event: &OperationCompletedEvent<'_>| {
            events.lock().push(SeenEvent {
                query_text: event.query_text.clone(),
                identifier: event.identifier.map(str::to_string),
                results_count: event.results_count,
                error: event.error.map(ToString::to_string),
                nodes_created: event.stats.map(|s| s.nodes_created),
                bookmarks: event.last_bookmarks.to_vec(),
            });
        }
    }

    pub fn events(&self) -> Vec<SeenEvent> {
        self.events.lock().clone()
    }
}
