//! Error types shared by every graphwire crate.

use thiserror::Error;

/// Unified error type for query execution, transactions, and row mapping.
///
/// Mapping failures produced by the derive macros are wrapped with
/// [`Context`](GraphError::Context) via [`with_context`](GraphError::with_context),
/// and the result deserializer wraps them once more with the row index:
///
/// ```text
/// row 3: UserRow::age: type mismatch: expected Integer, got String (i64)
/// ```
#[derive(Error, Debug)]
pub enum GraphError {
    /// A query was issued before `connect` completed.
    #[error("not connected: call connect() before executing queries")]
    NotConnected,

    /// The operation's transaction requirement does not match the caller's context.
    #[error("{operation} {requirement}, but the call context is {state}",
        state = if *in_transaction { "inside a transaction" } else { "outside any transaction" })]
    TransactionPolicyViolation {
        operation: String,
        requirement: String,
        in_transaction: bool,
    },

    /// The connected server lacks a capability the operation needs.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A configured feature needs a newer server than the one detected.
    #[error("{feature} requires server {required} or later, connected to {actual}")]
    UnsupportedServer {
        feature: String,
        required: String,
        actual: String,
    },

    /// The server answered with an error list; the first entry is kept verbatim.
    #[error("{code}: {message}")]
    ServerReported { code: String, message: String },

    /// A result row could not be mapped into the requested shape.
    #[error("row {row}: {source}")]
    Deserialization {
        row: usize,
        source: Box<GraphError>,
    },

    /// Several failures reported together.
    #[error("{} errors occurred: {}", .0.len(), join_messages(.0))]
    Aggregate(Vec<GraphError>),

    /// The operation is not valid in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The REST endpoint answered with a status the operation does not accept.
    #[error("unexpected HTTP status {actual}, expected one of {expected:?}")]
    UnexpectedStatus { expected: Vec<u16>, actual: u16 },

    /// A transport-level failure outside the driver's own error type.
    #[error("transport error: {0}")]
    Transport(String),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A general mapping error with a freeform message.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// A required property was not found on a node or relationship.
    #[error("missing property '{property}' on {label}")]
    MissingProperty { property: String, label: String },

    /// A required column was not found in a [`Record`](crate::Record).
    #[error("missing field '{field}' on {struct_name}")]
    MissingField { field: String, struct_name: String },

    /// A `BoltType` variant did not match the expected Rust type.
    #[error("type mismatch: expected {expected}, got {got} ({context})")]
    TypeMismatch {
        expected: String,
        got: String,
        context: String,
    },

    /// Wraps an inner error with additional context (struct name, field, property).
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<GraphError>,
    },

    /// A `neo4rs::Error` from the Bolt driver.
    #[error("neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    /// Malformed JSON from, or for, the REST transport.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_messages(errors: &[GraphError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl GraphError {
    /// Create a [`TypeMismatch`](GraphError::TypeMismatch) error.
    pub fn type_mismatch(expected: &str, got: &str, context: &str) -> Self {
        GraphError::TypeMismatch {
            expected: expected.to_owned(),
            got: got.to_owned(),
            context: context.to_owned(),
        }
    }

    /// Create a [`MissingProperty`](GraphError::MissingProperty) error.
    pub fn missing_property(property: &str, label: &str) -> Self {
        GraphError::MissingProperty {
            property: property.to_owned(),
            label: label.to_owned(),
        }
    }

    /// Create a [`MissingField`](GraphError::MissingField) error.
    pub fn missing_field(field: &str, struct_name: &str) -> Self {
        GraphError::MissingField {
            field: field.to_owned(),
            struct_name: struct_name.to_owned(),
        }
    }

    /// Create a [`ServerReported`](GraphError::ServerReported) error.
    pub fn server_reported(code: impl Into<String>, message: impl Into<String>) -> Self {
        GraphError::ServerReported {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Attach the index of the row that failed to map.
    pub fn at_row(self, row: usize) -> Self {
        GraphError::Deserialization {
            row,
            source: Box::new(self),
        }
    }

    /// Wrap this error with additional context, producing a [`Context`](GraphError::Context) variant.
    ///
    /// ```rust
    /// # use graphwire_core::GraphError;
    /// let err = GraphError::type_mismatch("Integer", "String", "i64");
    /// let wrapped = err.with_context("User::age (prop 'age')");
    /// assert!(wrapped.to_string().contains("User::age"));
    /// ```
    pub fn with_context(self, ctx: impl Into<String>) -> Self {
        GraphError::Context {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Collapse an aggregate holding exactly one cause into that cause.
    ///
    /// Aggregates with zero or several causes, and every other variant, are
    /// returned unchanged.
    ///
    /// ```rust
    /// # use graphwire_core::GraphError;
    /// let single = GraphError::Aggregate(vec![GraphError::NotConnected]);
    /// assert!(matches!(single.unwrap_aggregate(), GraphError::NotConnected));
    ///
    /// let many = GraphError::Aggregate(vec![GraphError::NotConnected, GraphError::Cancelled]);
    /// assert!(matches!(many.unwrap_aggregate(), GraphError::Aggregate(v) if v.len() == 2));
    /// ```
    pub fn unwrap_aggregate(self) -> Self {
        match self {
            GraphError::Aggregate(mut causes) if causes.len() == 1 => causes.remove(0),
            other => other,
        }
    }
}
