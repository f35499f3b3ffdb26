//! Execution policies: whether an operation needs, forbids, or tolerates a
//! transaction, and where it goes on the wire.

use std::fmt;

use graphwire_core::GraphError;

use crate::capabilities::CypherCapabilities;
use crate::query::{AccessMode, Bookmark, CypherQuery};
use crate::transport::bolt::SessionConfig;

/// The kind of operation being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationCategory {
    /// An ordinary Cypher statement.
    Cypher,
    /// A statement the server only accepts in an implicit transaction
    /// (`USING PERIODIC COMMIT`, `CALL { ... } IN TRANSACTIONS`).
    AutoCommitOnly,
    /// Several statements flushed together into the current transaction.
    StatementBatch,
    /// Begin, commit, rollback.
    TransactionControl,
}

impl OperationCategory {
    /// Classify a query by its text.
    pub fn for_query(query: &CypherQuery) -> Self {
        let text = query.text().to_ascii_uppercase();
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.contains("PERIODIC COMMIT") || normalized.contains(" IN TRANSACTIONS") {
            OperationCategory::AutoCommitOnly
        } else {
            OperationCategory::Cypher
        }
    }
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationCategory::Cypher => "Cypher execution",
            OperationCategory::AutoCommitOnly => "auto-commit-only Cypher",
            OperationCategory::StatementBatch => "statement batch",
            OperationCategory::TransactionControl => "transaction control",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRequirement {
    Required,
    Denied,
    Optional,
}

impl fmt::Display for TransactionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionRequirement::Required => "requires a transaction",
            TransactionRequirement::Denied => "must not run inside a transaction",
            TransactionRequirement::Optional => "may run with or without a transaction",
        })
    }
}

/// Which of the two backends a client is connected through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Rest,
    Bolt,
}

/// The policy for one operation against one connected server.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionPolicy {
    category: OperationCategory,
    requirement: TransactionRequirement,
    capabilities: CypherCapabilities,
    transport: TransportKind,
}

impl ExecutionPolicy {
    pub fn for_operation(
        category: OperationCategory,
        capabilities: CypherCapabilities,
        transport: TransportKind,
    ) -> Self {
        let requirement = match category {
            OperationCategory::Cypher => TransactionRequirement::Optional,
            OperationCategory::AutoCommitOnly => TransactionRequirement::Denied,
            OperationCategory::StatementBatch => TransactionRequirement::Required,
            OperationCategory::TransactionControl => TransactionRequirement::Required,
        };
        Self { category, requirement, capabilities, transport }
    }

    /// Fail when the caller's transaction state contradicts the policy.
    pub fn check_environment(&self, in_transaction: bool) -> Result<(), GraphError> {
        let violated = match self.requirement {
            TransactionRequirement::Required => !in_transaction,
            TransactionRequirement::Denied => in_transaction,
            TransactionRequirement::Optional => false,
        };
        if violated {
            return Err(GraphError::TransactionPolicyViolation {
                operation: self.category.to_string(),
                requirement: self.requirement.to_string(),
                in_transaction,
            });
        }
        Ok(())
    }

    /// Fail when the server cannot run explicit transactions at all.
    pub fn check_transactions_supported(&self) -> Result<(), GraphError> {
        if self.capabilities.supports_transactions() {
            Ok(())
        } else {
            Err(GraphError::UnsupportedOperation(format!(
                "explicit transactions need server 2.0 or later, connected to {}",
                self.capabilities.version
            )))
        }
    }

    /// Fail when `bookmarks` cannot be passed on.
    ///
    /// Bolt sessions always take bookmarks; the HTTP API accepts them from
    /// 5.0 on.
    pub fn check_bookmarks(&self, bookmarks: &[Bookmark]) -> Result<(), GraphError> {
        if bookmarks.is_empty()
            || self.transport == TransportKind::Bolt
            || self.capabilities.supports_http_bookmarks()
        {
            return Ok(());
        }
        Err(GraphError::UnsupportedOperation(format!(
            "bookmarks over HTTP need server 5.0 or later, connected to {}",
            self.capabilities.version
        )))
    }

    /// The database an operation targets.
    ///
    /// Servers before 4.0 host a single database, so naming any other than
    /// the default is rejected.
    pub fn resolve_database(&self, requested: Option<&str>, default: &str) -> Result<String, GraphError> {
        match requested {
            Some(db) if db != default && !self.capabilities.supports_multiple_databases() => {
                Err(GraphError::UnsupportedOperation(format!(
                    "database '{db}' requested, but server {} hosts a single database",
                    self.capabilities.version
                )))
            }
            Some(db) => Ok(db.to_string()),
            None => Ok(default.to_string()),
        }
    }

    /// Whether REST queries use the pre-transactional `cypher` endpoint.
    pub fn uses_legacy_endpoint(&self) -> bool {
        !self.capabilities.supports_transactions()
    }

    /// REST path for this operation.
    ///
    /// `autocommit` selects the single-request commit endpoint rather than
    /// the endpoint that opens a transaction.
    pub fn rest_endpoint(&self, database: &str, autocommit: bool) -> String {
        if self.uses_legacy_endpoint() {
            return "db/data/cypher".to_string();
        }
        let base = if self.capabilities.supports_multiple_databases() {
            format!("db/{database}/tx")
        } else {
            "db/data/transaction".to_string()
        };
        if autocommit {
            format!("{base}/commit")
        } else {
            base
        }
    }

    /// Bolt session parameters for this operation.
    pub fn session_config(
        &self,
        database: &str,
        access_mode: AccessMode,
        bookmarks: &[Bookmark],
        fetch_size: usize,
    ) -> SessionConfig {
        SessionConfig {
            database: self
                .capabilities
                .supports_multiple_databases()
                .then(|| database.to_string()),
            access_mode,
            bookmarks: bookmarks.to_vec(),
            server_version: self.capabilities.version,
            fetch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::ServerVersion;

    fn policy(category: OperationCategory, version: (u32, u32)) -> ExecutionPolicy {
        let caps = CypherCapabilities::new(ServerVersion::new(version.0, version.1, 0));
        ExecutionPolicy::for_operation(category, caps, TransportKind::Rest)
    }

    #[test]
    fn requirement_table() {
        let cypher = policy(OperationCategory::Cypher, (5, 0));
        assert!(cypher.check_environment(true).is_ok());
        assert!(cypher.check_environment(false).is_ok());

        let control = policy(OperationCategory::TransactionControl, (5, 0));
        assert!(matches!(
            control.check_environment(false),
            Err(GraphError::TransactionPolicyViolation { in_transaction: false, .. })
        ));

        let autocommit = policy(OperationCategory::AutoCommitOnly, (5, 0));
        assert!(matches!(
            autocommit.check_environment(true),
            Err(GraphError::TransactionPolicyViolation { in_transaction: true, .. })
        ));
    }

    #[test]
    fn classifies_implicit_only_statements() {
        let q = CypherQuery::new("LOAD CSV FROM 'f' AS l CALL { WITH l CREATE (:N) }\n  IN   TRANSACTIONS OF 10 ROWS");
        assert_eq!(OperationCategory::for_query(&q), OperationCategory::AutoCommitOnly);
        let q = CypherQuery::new("USING PERIODIC COMMIT LOAD CSV FROM 'f' AS l CREATE (:N)");
        assert_eq!(OperationCategory::for_query(&q), OperationCategory::AutoCommitOnly);
        let q = CypherQuery::new("MATCH (n) RETURN n");
        assert_eq!(OperationCategory::for_query(&q), OperationCategory::Cypher);
    }

    #[test]
    fn bookmarks_over_http_need_5_0() {
        let bookmarks = vec!["bm:1".to_string()];
        assert!(policy(OperationCategory::Cypher, (5, 0)).check_bookmarks(&bookmarks).is_ok());
        assert!(policy(OperationCategory::Cypher, (4, 4)).check_bookmarks(&[]).is_ok());
        assert!(matches!(
            policy(OperationCategory::Cypher, (4, 4)).check_bookmarks(&bookmarks),
            Err(GraphError::UnsupportedOperation(_))
        ));

        let caps = CypherCapabilities::new(ServerVersion::new(4, 4, 0));
        let bolt = ExecutionPolicy::for_operation(OperationCategory::Cypher, caps, TransportKind::Bolt);
        assert!(bolt.check_bookmarks(&bookmarks).is_ok());
    }

    #[test]
    fn rest_endpoints_follow_tier() {
        assert_eq!(policy(OperationCategory::Cypher, (1, 9)).rest_endpoint("neo4j", true), "db/data/cypher");
        assert_eq!(
            policy(OperationCategory::Cypher, (3, 5)).rest_endpoint("neo4j", true),
            "db/data/transaction/commit"
        );
        assert_eq!(policy(OperationCategory::Cypher, (5, 1)).rest_endpoint("crm", false), "db/crm/tx");
        assert_eq!(policy(OperationCategory::Cypher, (5, 1)).rest_endpoint("crm", true), "db/crm/tx/commit");
    }

    #[test]
    fn single_database_servers_reject_other_databases() {
        let old = policy(OperationCategory::Cypher, (3, 5));
        assert_eq!(old.resolve_database(None, "neo4j").unwrap(), "neo4j");
        assert!(matches!(old.resolve_database(Some("crm"), "neo4j"), Err(GraphError::UnsupportedOperation(_))));
        let new = policy(OperationCategory::Cypher, (4, 0));
        assert_eq!(new.resolve_database(Some("crm"), "neo4j").unwrap(), "crm");
    }

    #[test]
    fn session_config_omits_database_before_four() {
        let old = policy(OperationCategory::Cypher, (3, 5));
        assert_eq!(old.session_config("neo4j", AccessMode::Write, &[], 100).database, None);
        let new = policy(OperationCategory::Cypher, (4, 4));
        let cfg = new.session_config("crm", AccessMode::Read, &["bm".to_string()], 100);
        assert_eq!(cfg.database.as_deref(), Some("crm"));
        assert_eq!(cfg.bookmarks, vec!["bm".to_string()]);
    }
}
