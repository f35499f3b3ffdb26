//! Write counters reported by the server.

use serde::{Deserialize, Serialize};

/// Counters returned after a statement that asked for statistics.
///
/// Field names match the REST `stats` object; the Bolt transport fills the
/// same fields from the result summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryStats {
    pub contains_updates: bool,
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub properties_set: i64,
    pub relationships_created: i64,
    #[serde(alias = "relationship_deleted")]
    pub relationships_deleted: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub indexes_added: i64,
    pub indexes_removed: i64,
    pub constraints_added: i64,
    pub constraints_removed: i64,
    pub contains_system_updates: bool,
    pub system_updates: i64,
}
