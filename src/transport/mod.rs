//! The two backends behind one contract.
//!
//! The coordinator only ever sees [`QueryRunner`] and [`TransactionChannel`];
//! [`RestRunner`](rest::RestRunner) and [`SessionRunner`](bolt::SessionRunner)
//! implement them over their respective wire abstractions.

pub mod bolt;
pub mod neo4j;
pub mod rest;

use async_trait::async_trait;
use graphwire_core::{GraphError, Record};

use crate::capabilities::ServerVersion;
use crate::policy::{ExecutionPolicy, TransportKind};
use crate::query::{Bookmark, CypherQuery};
use crate::stats::QueryStats;

/// What one statement produced on the wire, before deserialization.
#[derive(Debug, Clone, Default)]
pub struct RawResult {
    pub records: Vec<Record>,
    pub stats: Option<QueryStats>,
    /// Bookmarks the server handed back; empty when it sent none.
    pub bookmarks: Vec<Bookmark>,
}

/// Executes queries over one backend.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Ask the server which version it runs.
    async fn server_version(&self) -> Result<ServerVersion, GraphError>;

    /// Run one query in its own implicit transaction, scoped to this call.
    async fn run_autocommit(
        &self,
        query: &CypherQuery,
        policy: &ExecutionPolicy,
        database: &str,
    ) -> Result<RawResult, GraphError>;

    /// Open an explicit transaction on `database`.
    async fn begin(
        &self,
        policy: &ExecutionPolicy,
        database: &str,
        bookmarks: &[Bookmark],
    ) -> Result<Box<dyn TransactionChannel>, GraphError>;
}

/// The wire side of one open transaction.
///
/// Statements sent through one channel reach the server in call order.
#[async_trait]
pub trait TransactionChannel: Send {
    /// Transaction id (REST: the transaction endpoint).
    fn id(&self) -> &str;

    /// Send statements; one result per statement, in order.
    async fn run_batch(&mut self, queries: &[CypherQuery]) -> Result<Vec<RawResult>, GraphError>;

    /// Commit; returns the bookmarks of the committed transaction.
    async fn commit(self: Box<Self>) -> Result<Vec<Bookmark>, GraphError>;

    async fn rollback(self: Box<Self>) -> Result<(), GraphError>;
}
