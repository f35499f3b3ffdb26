//! Convenience re-exports for common graphwire usage.
//!
//! ```rust
//! use graphwire::prelude::*;
//! ```
//!
//! This imports the derive macros, the core mapping traits (renamed where
//! they share a name with a derive), the client, query, and transaction
//! types, and the error type.

pub use crate::{FromRow, GraphNode, GraphRelation, ToParams};
pub use graphwire_core::traits::{
    FromGraphValue, FromRow as FromRowTrait, GraphNode as GraphNodeTrait,
    GraphRelation as GraphRelationTrait, IntoGraphValue, NodeWrapper, RelationWrapper,
    ToParams as ToParamsTrait,
};
pub use graphwire_core::{GraphError, Json, Record};

pub use crate::client::GraphClient;
pub use crate::config::ClientConfig;
pub use crate::executor::QueryOutput;
pub use crate::query::{AccessMode, CypherQuery, ResultFormat, ResultShape};
pub use crate::transaction::{CallContext, TransactionOptions, TransactionScopeOption, TransactionStatus};
