//! The client handle: construction, connection, and the transaction API.
//!
//! Query execution lives in [`executor`](crate::executor).

use std::sync::Arc;

use futures::future::BoxFuture;
use graphwire_core::GraphError;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::capabilities::CypherCapabilities;
use crate::config::ClientConfig;
use crate::events::{Listeners, OperationListener};
use crate::transaction::{CallContext, Transaction, TransactionManager, TransactionOptions};
use crate::transport::bolt::{BoltDriver, SessionRunner};
use crate::transport::neo4j::Neo4jDriver;
use crate::transport::rest::{HttpTransport, RestRunner};
use crate::transport::QueryRunner;

/// State fixed by a successful [`GraphClient::connect`].
#[derive(Clone)]
pub(crate) struct Connection {
    pub(crate) capabilities: CypherCapabilities,
    pub(crate) transactions: Arc<TransactionManager>,
}

/// A graph database client over one transport.
///
/// ```rust,no_run
/// # use graphwire::prelude::*;
/// # async fn example() -> Result<(), GraphError> {
/// let config = ClientConfig::builder()
///     .address("bolt://localhost:7687")
///     .user("neo4j")
///     .password("secret")
///     .build()?;
/// let client = GraphClient::connect_bolt(config).await?;
///
/// let ctx = CallContext::new();
/// let names: Vec<String> = client
///     .execute_read(&ctx, CypherQuery::new("MATCH (u:User) RETURN u.name"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct GraphClient {
    pub(crate) config: ClientConfig,
    pub(crate) runner: Arc<dyn QueryRunner>,
    pub(crate) listeners: Listeners,
    connection: RwLock<Option<Connection>>,
}

impl GraphClient {
    pub fn builder(config: ClientConfig) -> GraphClientBuilder {
        GraphClientBuilder {
            config,
            runner: None,
            listeners: Listeners::default(),
        }
    }

    /// Connect over Bolt with a `neo4rs` pool built from `config`.
    pub async fn connect_bolt(config: ClientConfig) -> Result<Self, GraphError> {
        let driver = Neo4jDriver::connect(&config).await?;
        let client = Self::builder(config).bolt(Arc::new(driver)).build()?;
        client.connect().await?;
        Ok(client)
    }

    /// Read the server version and fix the capabilities every later call
    /// is checked against.
    pub async fn connect(&self) -> Result<CypherCapabilities, GraphError> {
        self.config.validate()?;
        let version = self.runner.server_version().await?;
        let capabilities = CypherCapabilities::new(version);

        if self.config.use_native_temporal && !capabilities.supports_native_temporal() {
            return Err(GraphError::UnsupportedServer {
                feature: "native temporal values".into(),
                required: "3.4".into(),
                actual: version.to_string(),
            });
        }

        info!(%version, tier = ?capabilities.tier, transport = ?self.runner.kind(), "connected");
        let transactions = Arc::new(TransactionManager::new(
            Arc::clone(&self.runner),
            capabilities,
            self.config.default_database.clone(),
        ));
        *self.connection.write() = Some(Connection { capabilities, transactions });
        Ok(capabilities)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }

    /// Capabilities of the connected server; `None` before `connect`.
    pub fn capabilities(&self) -> Option<CypherCapabilities> {
        self.connection.read().as_ref().map(|c| c.capabilities)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn connection(&self) -> Result<Connection, GraphError> {
        self.connection.read().clone().ok_or(GraphError::NotConnected)
    }

    /// Open a transaction scope on `ctx`.
    ///
    /// Returns the transaction queries in this scope run in, or `None` for a
    /// [`Suppress`](crate::transaction::TransactionScopeOption::Suppress) scope.
    pub async fn begin_transaction(
        &self,
        ctx: &mut CallContext,
        options: TransactionOptions,
    ) -> Result<Option<Arc<Transaction>>, GraphError> {
        self.connection()?.transactions.begin(ctx, options).await
    }

    /// Close the innermost scope on `ctx`, committing or rolling back the
    /// transaction if the scope opened it.
    pub async fn end_transaction(&self, ctx: &mut CallContext) -> Result<(), GraphError> {
        self.connection()?.transactions.end(ctx).await
    }

    pub fn in_transaction(&self, ctx: &CallContext) -> bool {
        ctx.in_transaction()
    }

    pub fn current_transaction(&self, ctx: &CallContext) -> Option<Arc<Transaction>> {
        ctx.current_transaction().cloned()
    }

    /// Run `work` inside a transaction scope and end the scope exactly once.
    ///
    /// An error from `work` rolls the transaction back and is returned; on
    /// success the transaction commits and a commit failure is returned.
    ///
    /// ```rust,no_run
    /// # use graphwire::prelude::*;
    /// # async fn example(client: &GraphClient) -> Result<(), GraphError> {
    /// let mut ctx = CallContext::new();
    /// let created = client
    ///     .run_in_transaction(&mut ctx, TransactionOptions::new(), |client, ctx| {
    ///         Box::pin(async move {
    ///             client.execute(ctx, CypherQuery::new("CREATE (:User {name: 'Ann'})")).await?;
    ///             client
    ///                 .execute_write::<i64>(ctx, CypherQuery::new("MATCH (u:User) RETURN count(u)"))
    ///                 .await
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_in_transaction<R, F>(
        &self,
        ctx: &mut CallContext,
        options: TransactionOptions,
        work: F,
    ) -> Result<R, GraphError>
    where
        R: Send,
        F: for<'c> FnOnce(&'c GraphClient, &'c mut CallContext) -> BoxFuture<'c, Result<R, GraphError>>,
    {
        let transactions = self.connection()?.transactions;
        transactions.begin(ctx, options).await?;

        let outcome = work(self, ctx).await;
        if outcome.is_err() {
            transactions.fail_current(ctx);
        }

        match (outcome, transactions.end(ctx).await) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(end)) => Err(end),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(end)) => {
                warn!(error = %end, "ending transaction failed after work error");
                Err(GraphError::Aggregate(vec![e, end]))
            }
        }
    }
}

/// Builder for [`GraphClient`]: one transport plus any number of listeners.
pub struct GraphClientBuilder {
    config: ClientConfig,
    runner: Option<Arc<dyn QueryRunner>>,
    listeners: Listeners,
}

impl GraphClientBuilder {
    /// Use the REST transport.
    pub fn rest(mut self, http: Arc<dyn HttpTransport>) -> Self {
        let headers = self.config.default_headers.clone();
        self.runner = Some(Arc::new(RestRunner::new(http, headers)));
        self
    }

    /// Use the Bolt transport.
    pub fn bolt(mut self, driver: Arc<dyn BoltDriver>) -> Self {
        self.runner = Some(Arc::new(SessionRunner::new(driver, self.config.fetch_size)));
        self
    }

    pub fn listener(mut self, listener: impl OperationListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn build(self) -> Result<GraphClient, GraphError> {
        self.config.validate()?;
        let runner = self
            .runner
            .ok_or_else(|| GraphError::Config("no transport configured: call rest() or bolt()".into()))?;
        Ok(GraphClient {
            config: self.config,
            runner,
            listeners: self.listeners,
            connection: RwLock::new(None),
        })
    }
}
