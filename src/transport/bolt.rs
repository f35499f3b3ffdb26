//! Bolt transport: sessions, explicit transactions, and record cursors.
//!
//! The driver itself sits behind [`BoltDriver`]; [`Neo4jDriver`](super::neo4j::Neo4jDriver)
//! is the `neo4rs` implementation. [`SessionRunner`] turns those primitives
//! into the runner contract the coordinator uses.

use std::sync::Arc;

use async_trait::async_trait;
use graphwire_core::{GraphError, Record};
use tracing::warn;
use uuid::Uuid;

use super::{QueryRunner, RawResult, TransactionChannel};
use crate::capabilities::ServerVersion;
use crate::policy::{ExecutionPolicy, TransportKind};
use crate::query::{AccessMode, Bookmark, CypherQuery};
use crate::stats::QueryStats;

/// Parameters a session is opened with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Target database; `None` on servers that host a single database.
    pub database: Option<String>,
    pub access_mode: AccessMode,
    pub bookmarks: Vec<Bookmark>,
    pub server_version: ServerVersion,
    pub fetch_size: usize,
}

#[async_trait]
pub trait BoltDriver: Send + Sync {
    /// Raw version string of the server, e.g. `"5.12.0"`.
    async fn server_version(&self) -> Result<String, GraphError>;

    async fn open_session(&self, config: SessionConfig) -> Result<Box<dyn BoltSession>, GraphError>;
}

#[async_trait]
pub trait BoltSession: Send {
    /// Run a query in an implicit transaction.
    async fn run<'s>(&'s mut self, query: &CypherQuery) -> Result<Box<dyn RecordCursor + 's>, GraphError>;

    async fn begin_transaction(self: Box<Self>) -> Result<Box<dyn BoltTransaction>, GraphError>;

    /// Bookmarks of the last transaction this session committed.
    fn last_bookmarks(&self) -> Vec<Bookmark>;

    async fn close(self: Box<Self>) -> Result<(), GraphError>;
}

#[async_trait]
pub trait BoltTransaction: Send {
    async fn run<'t>(&'t mut self, query: &CypherQuery) -> Result<Box<dyn RecordCursor + 't>, GraphError>;

    /// Returns the bookmarks of the committed transaction.
    async fn commit(self: Box<Self>) -> Result<Vec<Bookmark>, GraphError>;

    async fn rollback(self: Box<Self>) -> Result<(), GraphError>;
}

/// Rows of one running query, then its summary.
#[async_trait]
pub trait RecordCursor: Send {
    async fn next(&mut self) -> Result<Option<Record>, GraphError>;

    /// Discard any remaining rows and return the write counters, if the
    /// driver reports them.
    async fn consume(self: Box<Self>) -> Result<Option<QueryStats>, GraphError>;
}

/// Drain a cursor. Stats are kept only when the query asked for them.
async fn collect(mut cursor: Box<dyn RecordCursor + '_>, include_stats: bool) -> Result<RawResult, GraphError> {
    let mut records = Vec::new();
    while let Some(record) = cursor.next().await? {
        records.push(record);
    }
    let stats = cursor.consume().await?;
    Ok(RawResult {
        records,
        stats: if include_stats { stats } else { None },
        bookmarks: Vec::new(),
    })
}

/// [`QueryRunner`] over a [`BoltDriver`]: one session per autocommit call.
pub struct SessionRunner {
    driver: Arc<dyn BoltDriver>,
    fetch_size: usize,
}

impl SessionRunner {
    pub fn new(driver: Arc<dyn BoltDriver>, fetch_size: usize) -> Self {
        Self { driver, fetch_size }
    }
}

#[async_trait]
impl QueryRunner for SessionRunner {
    fn kind(&self) -> TransportKind {
        TransportKind::Bolt
    }

    async fn server_version(&self) -> Result<ServerVersion, GraphError> {
        self.driver.server_version().await?.parse()
    }

    async fn run_autocommit(
        &self,
        query: &CypherQuery,
        policy: &ExecutionPolicy,
        database: &str,
    ) -> Result<RawResult, GraphError> {
        let config = policy.session_config(database, query.mode(), query.required_bookmarks(), self.fetch_size);
        let mut session = self.driver.open_session(config).await?;

        let outcome = match session.run(query).await {
            Ok(cursor) => collect(cursor, query.includes_stats()).await,
            Err(e) => Err(e),
        };
        let bookmarks = session.last_bookmarks();

        match (outcome, session.close().await) {
            (Ok(mut raw), Ok(())) => {
                raw.bookmarks = bookmarks;
                Ok(raw)
            }
            (Ok(_), Err(close)) => {
                warn!(error = %close, "closing bolt session failed");
                Err(close)
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close)) => {
                warn!(error = %close, "closing bolt session failed after query error");
                Err(GraphError::Aggregate(vec![e, close]))
            }
        }
    }

    async fn begin(
        &self,
        policy: &ExecutionPolicy,
        database: &str,
        bookmarks: &[Bookmark],
    ) -> Result<Box<dyn TransactionChannel>, GraphError> {
        policy.check_transactions_supported()?;
        let config = policy.session_config(database, AccessMode::Write, bookmarks, self.fetch_size);
        let session = self.driver.open_session(config).await?;
        let tx = session.begin_transaction().await?;
        Ok(Box::new(BoltTransactionChannel {
            id: Uuid::new_v4().to_string(),
            tx,
        }))
    }
}

/// Statements go out one at a time, in call order, on the open transaction.
struct BoltTransactionChannel {
    id: String,
    tx: Box<dyn BoltTransaction>,
}

#[async_trait]
impl TransactionChannel for BoltTransactionChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run_batch(&mut self, queries: &[CypherQuery]) -> Result<Vec<RawResult>, GraphError> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let cursor = self.tx.run(query).await?;
            results.push(collect(cursor, query.includes_stats()).await?);
        }
        Ok(results)
    }

    async fn commit(self: Box<Self>) -> Result<Vec<Bookmark>, GraphError> {
        self.tx.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), GraphError> {
        self.tx.rollback().await
    }
}
