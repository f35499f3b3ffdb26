//! Explicit transactions and the call context that carries them.
//!
//! A [`CallContext`] belongs to one logical flow of calls. Each
//! `begin_transaction` pushes a scope onto it and each `end_transaction` pops
//! one; the innermost scope decides which transaction, if any, queries run
//! in. Only the scope that opened a transaction terminates it.

use std::fmt;
use std::sync::Arc;

use futures::lock::Mutex as AsyncMutex;
use graphwire_core::GraphError;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::capabilities::CypherCapabilities;
use crate::policy::{ExecutionPolicy, OperationCategory};
use crate::query::{Bookmark, CypherQuery};
use crate::transport::{QueryRunner, RawResult, TransactionChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    RolledBack,
    /// An enlisted query failed; the transaction rolls back when its scope ends.
    Failed,
}

/// How a new scope relates to the transaction already in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionScopeOption {
    /// Reuse the current transaction, or open one if there is none.
    #[default]
    Join,
    /// Always open an independent transaction.
    New,
    /// Run without any transaction until the scope ends.
    Suppress,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    pub scope: TransactionScopeOption,
    /// Bookmarks a new transaction must observe.
    pub bookmarks: Vec<Bookmark>,
    /// Database for a new transaction; the client default when `None`.
    pub database: Option<String>,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: TransactionScopeOption) -> Self {
        self.scope = scope;
        self
    }

    pub fn bookmarks<I, B>(mut self, bookmarks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bookmark>,
    {
        self.bookmarks.extend(bookmarks.into_iter().map(Into::into));
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

/// An open unit of work on one database.
pub struct Transaction {
    id: String,
    database: String,
    status: Mutex<TransactionStatus>,
    bookmarks: Mutex<Vec<Bookmark>>,
    channel: AsyncMutex<Option<Box<dyn TransactionChannel>>>,
}

impl Transaction {
    fn new(channel: Box<dyn TransactionChannel>, database: String, bookmarks: Vec<Bookmark>) -> Self {
        Self {
            id: channel.id().to_string(),
            database,
            status: Mutex::new(TransactionStatus::Active),
            bookmarks: Mutex::new(bookmarks),
            channel: AsyncMutex::new(Some(channel)),
        }
    }

    /// REST: the transaction endpoint. Bolt: a generated UUID.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn status(&self) -> TransactionStatus {
        *self.status.lock()
    }

    pub fn is_active(&self) -> bool {
        self.status() == TransactionStatus::Active
    }

    /// The latest bookmarks the server returned for this transaction, or the
    /// ones it was seeded with.
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.bookmarks.lock().clone()
    }

    fn set_status(&self, status: TransactionStatus) {
        *self.status.lock() = status;
    }

    fn replace_bookmarks(&self, bookmarks: &[Bookmark]) {
        if !bookmarks.is_empty() {
            *self.bookmarks.lock() = bookmarks.to_vec();
        }
    }

    fn mark_failed(&self) {
        let mut status = self.status.lock();
        if *status == TransactionStatus::Active {
            *status = TransactionStatus::Failed;
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("database", &self.database)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Marks its transaction failed unless disarmed first.
struct FailOnDrop<'a> {
    tx: &'a Transaction,
    armed: bool,
}

impl FailOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FailOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(transaction = self.tx.id(), "statement abandoned in flight; transaction marked failed");
            self.tx.mark_failed();
        }
    }
}

#[derive(Debug, Clone)]
enum Scope {
    Owned(Arc<Transaction>),
    Joined(Arc<Transaction>),
    Suppressed,
}

impl Scope {
    fn transaction(&self) -> Option<&Arc<Transaction>> {
        match self {
            Scope::Owned(tx) | Scope::Joined(tx) => Some(tx),
            Scope::Suppressed => None,
        }
    }
}

/// Transaction scopes of one logical flow of calls.
///
/// Pass the same context to every call that should see the same
/// transaction; concurrent flows each use their own.
#[derive(Debug, Default)]
pub struct CallContext {
    scopes: Vec<Scope>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The transaction queries issued with this context run in.
    pub fn current_transaction(&self) -> Option<&Arc<Transaction>> {
        self.scopes.last().and_then(Scope::transaction)
    }

    pub fn in_transaction(&self) -> bool {
        self.current_transaction().is_some()
    }

    /// Number of open scopes, suppressed ones included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

/// Opens, feeds, and terminates transactions for one connected client.
pub struct TransactionManager {
    runner: Arc<dyn QueryRunner>,
    capabilities: CypherCapabilities,
    default_database: String,
}

impl TransactionManager {
    pub fn new(runner: Arc<dyn QueryRunner>, capabilities: CypherCapabilities, default_database: String) -> Self {
        Self { runner, capabilities, default_database }
    }

    fn policy(&self, category: OperationCategory) -> ExecutionPolicy {
        ExecutionPolicy::for_operation(category, self.capabilities, self.runner.kind())
    }

    /// Push a scope onto `ctx` according to `options.scope`.
    ///
    /// Returns the transaction the scope runs in: the current one when
    /// joining, a fresh one when opening, `None` when suppressed.
    pub async fn begin(
        &self,
        ctx: &mut CallContext,
        options: TransactionOptions,
    ) -> Result<Option<Arc<Transaction>>, GraphError> {
        match (options.scope, ctx.current_transaction().cloned()) {
            (TransactionScopeOption::Suppress, _) => {
                ctx.scopes.push(Scope::Suppressed);
                return Ok(None);
            }
            (TransactionScopeOption::Join, Some(tx)) => {
                trace!(transaction = tx.id(), "joining ambient transaction");
                ctx.scopes.push(Scope::Joined(Arc::clone(&tx)));
                return Ok(Some(tx));
            }
            _ => {}
        }

        let policy = self.policy(OperationCategory::TransactionControl);
        policy.check_transactions_supported()?;
        policy.check_bookmarks(&options.bookmarks)?;
        let database = policy.resolve_database(options.database.as_deref(), &self.default_database)?;
        let channel = self.runner.begin(&policy, &database, &options.bookmarks).await?;
        let tx = Arc::new(Transaction::new(channel, database, options.bookmarks));
        debug!(transaction = tx.id(), database = tx.database(), "transaction opened");
        ctx.scopes.push(Scope::Owned(Arc::clone(&tx)));
        Ok(Some(tx))
    }

    /// Run one query on the context's current transaction.
    pub async fn enqueue_cypher_request(
        &self,
        description: &str,
        ctx: &CallContext,
        query: &CypherQuery,
    ) -> Result<RawResult, GraphError> {
        self.enqueue_batch(description, ctx, std::slice::from_ref(query))
            .await?
            .pop()
            .ok_or_else(|| GraphError::Mapping("server returned no result for the statement".into()))
    }

    /// Run several queries on the context's current transaction as one flush.
    ///
    /// Results come back in the order the queries were given. Any failure
    /// marks the transaction [`Failed`](TransactionStatus::Failed).
    pub async fn enqueue_batch(
        &self,
        description: &str,
        ctx: &CallContext,
        queries: &[CypherQuery],
    ) -> Result<Vec<RawResult>, GraphError> {
        let tx = ctx
            .current_transaction()
            .ok_or_else(|| GraphError::InvalidOperation(format!("{description}: no current transaction")))?;
        if !tx.is_active() {
            return Err(GraphError::InvalidOperation(format!(
                "{description}: transaction {} is {:?}",
                tx.id(),
                tx.status()
            )));
        }

        trace!(transaction = tx.id(), statements = queries.len(), "{description}");
        let mut slot = tx.channel.lock().await;
        let channel = slot
            .as_mut()
            .ok_or_else(|| GraphError::InvalidOperation(format!("{description}: transaction already ended")))?;

        // Dropped before the server answers (cancellation): the statements
        // may have run, so the transaction can no longer commit.
        let guard = FailOnDrop { tx, armed: true };
        let outcome = channel.run_batch(queries).await;
        guard.disarm();

        match outcome {
            Ok(results) => {
                if let Some(latest) = results.iter().rev().find(|r| !r.bookmarks.is_empty()) {
                    tx.replace_bookmarks(&latest.bookmarks);
                }
                Ok(results)
            }
            Err(e) => {
                tx.mark_failed();
                Err(e)
            }
        }
    }

    /// Mark the context's current transaction as failed, so that ending its
    /// owning scope rolls it back.
    pub fn fail_current(&self, ctx: &CallContext) {
        if let Some(tx) = ctx.current_transaction() {
            tx.mark_failed();
        }
    }

    /// Pop the innermost scope, terminating its transaction if it owns one.
    ///
    /// A failed transaction is rolled back; an active one is committed.
    pub async fn end(&self, ctx: &mut CallContext) -> Result<(), GraphError> {
        let policy = self.policy(OperationCategory::TransactionControl);
        policy.check_environment(ctx.depth() > 0)?;
        let tx = match ctx.scopes.pop() {
            Some(Scope::Owned(tx)) => tx,
            _ => return Ok(()),
        };

        let channel = tx
            .channel
            .lock()
            .await
            .take()
            .ok_or_else(|| GraphError::InvalidOperation(format!("transaction {} already ended", tx.id())))?;

        match tx.status() {
            TransactionStatus::Active => match channel.commit().await {
                Ok(bookmarks) => {
                    tx.replace_bookmarks(&bookmarks);
                    tx.set_status(TransactionStatus::Committed);
                    debug!(transaction = tx.id(), "transaction committed");
                    Ok(())
                }
                Err(e) => {
                    tx.set_status(TransactionStatus::Failed);
                    Err(e)
                }
            },
            TransactionStatus::Failed => {
                warn!(transaction = tx.id(), "rolling back failed transaction");
                channel.rollback().await?;
                tx.set_status(TransactionStatus::RolledBack);
                Ok(())
            }
            status => Err(GraphError::InvalidOperation(format!(
                "transaction {} is already {status:?}",
                tx.id()
            ))),
        }
    }
}
