//! Query execution: policy check, dispatch, deserialization, and the
//! completion event, for every query the client runs.

use std::time::Instant;

use futures::future::{AbortRegistration, Abortable};
use graphwire_core::{FromRow, GraphError, Record};
use tracing::debug;

use crate::client::GraphClient;
use crate::deserializer::deserialize;
use crate::events::Completion;
use crate::policy::{ExecutionPolicy, OperationCategory};
use crate::query::{AccessMode, Bookmark, CypherQuery};
use crate::stats::QueryStats;
use crate::transaction::CallContext;
use crate::transport::RawResult;

/// Rows of one query together with what the server reported alongside.
#[derive(Debug, Clone)]
pub struct QueryOutput<T> {
    pub rows: Vec<T>,
    /// Present when the query asked for stats and the transport reports them.
    pub stats: Option<QueryStats>,
    pub bookmarks: Vec<Bookmark>,
}

fn describe(query: &CypherQuery) -> String {
    match query.correlation_id() {
        Some(id) => format!("cypher query '{id}'"),
        None => "cypher query".to_string(),
    }
}

impl GraphClient {
    /// Run a read query and map every row into `T`.
    pub async fn execute_read<T: FromRow>(&self, ctx: &CallContext, query: CypherQuery) -> Result<Vec<T>, GraphError> {
        self.run_query(ctx, query.access_mode(AccessMode::Read), None)
            .await
            .map(|out| out.rows)
    }

    /// Run a write query and map every row into `T`.
    pub async fn execute_write<T: FromRow>(&self, ctx: &CallContext, query: CypherQuery) -> Result<Vec<T>, GraphError> {
        self.run_query(ctx, query.write(), None).await.map(|out| out.rows)
    }

    /// [`execute_read`](Self::execute_read), abandoned when `cancel` fires.
    ///
    /// Cancellation is observed while the request is on the wire; no rows
    /// are returned from a cancelled call.
    pub async fn execute_read_cancellable<T: FromRow>(
        &self,
        ctx: &CallContext,
        query: CypherQuery,
        cancel: AbortRegistration,
    ) -> Result<Vec<T>, GraphError> {
        self.run_query(ctx, query.access_mode(AccessMode::Read), Some(cancel))
            .await
            .map(|out| out.rows)
    }

    pub async fn execute_write_cancellable<T: FromRow>(
        &self,
        ctx: &CallContext,
        query: CypherQuery,
        cancel: AbortRegistration,
    ) -> Result<Vec<T>, GraphError> {
        self.run_query(ctx, query.write(), Some(cancel)).await.map(|out| out.rows)
    }

    /// Run a query with its own access mode and return rows, stats, and
    /// bookmarks.
    pub async fn execute_query<T: FromRow>(
        &self,
        ctx: &CallContext,
        query: CypherQuery,
    ) -> Result<QueryOutput<T>, GraphError> {
        self.run_query(ctx, query, None).await
    }

    /// Run a query whose rows are not needed.
    pub async fn execute(&self, ctx: &CallContext, query: CypherQuery) -> Result<(), GraphError> {
        self.run_query::<Record>(ctx, query, None).await.map(|_| ())
    }

    /// Send several statements to the current transaction in one flush.
    ///
    /// Fails with a policy violation outside a transaction. Each query gets
    /// its own completion event.
    pub async fn execute_batch(
        &self,
        ctx: &CallContext,
        queries: Vec<CypherQuery>,
    ) -> Result<Vec<QueryOutput<Record>>, GraphError> {
        let started = Instant::now();
        let outcome = self.dispatch_batch(ctx, &queries).await.map_err(GraphError::unwrap_aggregate);
        let elapsed = started.elapsed();

        match &outcome {
            Ok(outputs) => {
                for (query, out) in queries.iter().zip(outputs) {
                    self.listeners.complete(
                        query,
                        Completion {
                            elapsed,
                            rows: Some(out.rows.len()),
                            bookmarks: &out.bookmarks,
                            error: None,
                            stats: out.stats.as_ref(),
                        },
                    );
                }
            }
            Err(e) => {
                for query in &queries {
                    self.listeners.complete(
                        query,
                        Completion { elapsed, rows: None, bookmarks: &[], error: Some(e), stats: None },
                    );
                }
            }
        }
        outcome
    }

    async fn dispatch_batch(
        &self,
        ctx: &CallContext,
        queries: &[CypherQuery],
    ) -> Result<Vec<QueryOutput<Record>>, GraphError> {
        let conn = self.connection()?;
        let policy = ExecutionPolicy::for_operation(OperationCategory::StatementBatch, conn.capabilities, self.runner.kind());
        policy.check_environment(ctx.in_transaction())?;
        for query in queries {
            let category = OperationCategory::for_query(query);
            ExecutionPolicy::for_operation(category, conn.capabilities, self.runner.kind())
                .check_environment(true)?;
        }

        debug!(statements = queries.len(), "dispatching statement batch");
        let raw = conn
            .transactions
            .enqueue_batch("statement batch", ctx, queries)
            .await?;

        queries
            .iter()
            .zip(raw)
            .map(|(query, raw)| {
                Ok(QueryOutput {
                    rows: deserialize(query, &raw.records)?,
                    stats: raw.stats,
                    bookmarks: raw.bookmarks,
                })
            })
            .collect()
    }

    /// The single path every query takes: dispatch, map rows, notify.
    async fn run_query<T: FromRow>(
        &self,
        ctx: &CallContext,
        query: CypherQuery,
        cancel: Option<AbortRegistration>,
    ) -> Result<QueryOutput<T>, GraphError> {
        let started = Instant::now();
        let outcome = match self.dispatch(ctx, &query, cancel).await {
            Ok(raw) => deserialize(&query, &raw.records).map(|rows| QueryOutput {
                rows,
                stats: raw.stats,
                bookmarks: raw.bookmarks,
            }),
            Err(e) => Err(e),
        }
        .map_err(GraphError::unwrap_aggregate);
        let elapsed = started.elapsed();

        let completion = match &outcome {
            Ok(out) => Completion {
                elapsed,
                rows: Some(out.rows.len()),
                bookmarks: &out.bookmarks,
                error: None,
                stats: out.stats.as_ref(),
            },
            Err(e) => Completion { elapsed, rows: None, bookmarks: &[], error: Some(e), stats: None },
        };
        self.listeners.complete(&query, completion);
        outcome
    }

    /// Check the policy, then send the query on the current transaction or
    /// as an autocommit call.
    async fn dispatch(
        &self,
        ctx: &CallContext,
        query: &CypherQuery,
        cancel: Option<AbortRegistration>,
    ) -> Result<RawResult, GraphError> {
        let conn = self.connection()?;
        let category = OperationCategory::for_query(query);
        let policy = ExecutionPolicy::for_operation(category, conn.capabilities, self.runner.kind());
        policy.check_environment(ctx.in_transaction())?;

        debug!(
            identifier = query.correlation_id(),
            database = query.target_database(),
            access_mode = ?query.mode(),
            in_transaction = ctx.in_transaction(),
            "dispatching {category}"
        );

        let network = async {
            if ctx.in_transaction() {
                conn.transactions.enqueue_cypher_request(&describe(query), ctx, query).await
            } else {
                policy.check_bookmarks(query.required_bookmarks())?;
                let database = policy.resolve_database(query.target_database(), &self.config.default_database)?;
                self.runner.run_autocommit(query, &policy, &database).await
            }
        };

        match cancel {
            Some(registration) => Abortable::new(network, registration)
                .await
                .map_err(|_| GraphError::Cancelled)?,
            None => network.await,
        }
    }
}
