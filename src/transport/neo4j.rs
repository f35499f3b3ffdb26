//! [`BoltDriver`] backed by a pooled `neo4rs::Graph`.
//!
//! `neo4rs` 0.8 exposes neither result summaries nor bookmarks, so cursors
//! from this driver report no stats and sessions report no bookmarks.
//! Autocommit results are buffered in the session before the cursor hands
//! them out. Access mode is carried in [`SessionConfig`] but the pool routes every
//! statement to the configured address.

use async_trait::async_trait;
use graphwire_core::{GraphError, Record};
use neo4rs::{Graph, RowStream, Txn};
use tracing::debug;

use super::bolt::{BoltDriver, BoltSession, BoltTransaction, RecordCursor, SessionConfig};
use crate::config::ClientConfig;
use crate::query::{Bookmark, CypherQuery};
use crate::stats::QueryStats;

const VERSION_QUERY: &str = "CALL dbms.components() YIELD versions RETURN versions[0] AS version";

pub struct Neo4jDriver {
    graph: Graph,
}

impl Neo4jDriver {
    /// Open a connection pool for `config`'s first address.
    pub async fn connect(config: &ClientConfig) -> Result<Self, GraphError> {
        config.validate()?;
        let neo = neo4rs::ConfigBuilder::default()
            .uri(config.primary_address()?)
            .user(config.user.as_str())
            .password(config.password.as_str())
            .db(config.default_database.as_str())
            .fetch_size(config.fetch_size)
            .max_connections(config.max_connections)
            .build()?;
        let graph = Graph::connect(neo).await?;
        Ok(Self { graph })
    }

    /// Wrap a pool the application already owns.
    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }
}

fn to_neo4rs(query: &CypherQuery) -> neo4rs::Query {
    query
        .params()
        .iter()
        .fold(neo4rs::query(query.text()), |q, (key, value)| q.param(key, value.clone()))
}

#[async_trait]
impl BoltDriver for Neo4jDriver {
    async fn server_version(&self) -> Result<String, GraphError> {
        let mut stream = self.graph.execute(neo4rs::query(VERSION_QUERY)).await?;
        let row = stream
            .next()
            .await?
            .ok_or_else(|| GraphError::Mapping("dbms.components() returned no rows".into()))?;
        row.get::<String>("version")
            .map_err(|e| GraphError::Mapping(format!("server version: {e}")))
    }

    async fn open_session(&self, config: SessionConfig) -> Result<Box<dyn BoltSession>, GraphError> {
        debug!(database = ?config.database, access_mode = ?config.access_mode, "opening neo4rs session");
        Ok(Box::new(Neo4jSession {
            graph: self.graph.clone(),
            database: config.database,
        }))
    }
}

struct Neo4jSession {
    graph: Graph,
    database: Option<String>,
}

#[async_trait]
impl BoltSession for Neo4jSession {
    async fn run<'s>(&'s mut self, query: &CypherQuery) -> Result<Box<dyn RecordCursor + 's>, GraphError> {
        let q = to_neo4rs(query);
        let mut stream = match &self.database {
            Some(db) => self.graph.execute_on(db.as_str(), q).await?,
            None => self.graph.execute(q).await?,
        };
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            records.push(Record::from_neo4j_row(&row)?);
        }
        Ok(Box::new(BufferedCursor { records: records.into_iter() }))
    }

    async fn begin_transaction(self: Box<Self>) -> Result<Box<dyn BoltTransaction>, GraphError> {
        let txn = match &self.database {
            Some(db) => self.graph.start_txn_on(db.as_str()).await?,
            None => self.graph.start_txn().await?,
        };
        Ok(Box::new(Neo4jTransaction { txn }))
    }

    fn last_bookmarks(&self) -> Vec<Bookmark> {
        Vec::new()
    }

    async fn close(self: Box<Self>) -> Result<(), GraphError> {
        Ok(())
    }
}

struct Neo4jTransaction {
    txn: Txn,
}

#[async_trait]
impl BoltTransaction for Neo4jTransaction {
    async fn run<'t>(&'t mut self, query: &CypherQuery) -> Result<Box<dyn RecordCursor + 't>, GraphError> {
        let stream = self.txn.execute(to_neo4rs(query)).await?;
        Ok(Box::new(TxnCursor { stream, txn: &mut self.txn }))
    }

    async fn commit(self: Box<Self>) -> Result<Vec<Bookmark>, GraphError> {
        self.txn.commit().await?;
        Ok(Vec::new())
    }

    async fn rollback(self: Box<Self>) -> Result<(), GraphError> {
        self.txn.rollback().await?;
        Ok(())
    }
}

struct BufferedCursor {
    records: std::vec::IntoIter<Record>,
}

#[async_trait]
impl RecordCursor for BufferedCursor {
    async fn next(&mut self) -> Result<Option<Record>, GraphError> {
        Ok(self.records.next())
    }

    async fn consume(self: Box<Self>) -> Result<Option<QueryStats>, GraphError> {
        Ok(None)
    }
}

/// Rows of a statement inside an explicit transaction, pulled through the
/// transaction's connection handle.
struct TxnCursor<'t> {
    stream: RowStream,
    txn: &'t mut Txn,
}

#[async_trait]
impl RecordCursor for TxnCursor<'_> {
    async fn next(&mut self) -> Result<Option<Record>, GraphError> {
        match self.stream.next(self.txn.handle()).await? {
            Some(row) => Record::from_neo4j_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn consume(self: Box<Self>) -> Result<Option<QueryStats>, GraphError> {
        Ok(None)
    }
}
