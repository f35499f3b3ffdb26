//! Core traits for mapping between graph values and Rust types.

use neo4rs::{BoltMap, BoltType as Value};
use crate::error::GraphError;
use crate::record::Record;

/// Maps a graph node to a Rust struct.
///
/// Automatically implemented by `#[derive(GraphNode)]`. The derive also
/// generates [`FromGraphValue`] and [`FromRow`] impls so the struct can be
/// read from a `BoltType::Node` (Bolt transport), from a property map (REST
/// row format), or straight from a single-column result.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(GraphNode)]
/// #[graph(label = "User")]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// assert_eq!(User::LABEL, "User");
/// ```
pub trait GraphNode: Sized {
    /// The node label (e.g. `"User"`).
    const LABEL: &'static str;

    /// Hydrate `Self` from a property map.
    fn from_properties(props: &BoltMap) -> Result<Self, GraphError>;

    /// Deserialize a [`BoltNode`](neo4rs::BoltNode) into `Self`.
    fn from_node(node: &neo4rs::BoltNode) -> Result<Self, GraphError> {
        Self::from_properties(&node.properties)
    }
}

/// Maps a graph relationship to a Rust struct.
///
/// Automatically implemented by `#[derive(GraphRelation)]`, which also
/// generates [`FromGraphValue`] and [`FromRow`] impls.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(GraphRelation)]
/// #[graph(type = "FOLLOWS", from = "User", to = "User")]
/// struct Follows {
///     since: i64,
/// }
///
/// assert_eq!(Follows::TYPE, "FOLLOWS");
/// ```
pub trait GraphRelation: Sized {
    /// The relationship type (e.g. `"FOLLOWS"`).
    const TYPE: &'static str;

    /// Optional label of the start node, for documentation.
    const FROM_LABEL: Option<&'static str> = None;
    /// Optional label of the end node, for documentation.
    const TO_LABEL: Option<&'static str> = None;

    /// Hydrate `Self` from a property map.
    fn from_properties(props: &BoltMap) -> Result<Self, GraphError>;

    /// Deserialize a [`BoltRelation`](neo4rs::BoltRelation) into `Self`.
    fn from_rel(rel: &neo4rs::BoltRelation) -> Result<Self, GraphError> {
        Self::from_properties(&rel.properties)
    }
}

/// Maps one result [`Record`] into a Rust value.
///
/// Three kinds of implementation exist:
///
/// - scalars (`String`, numbers, `bool`, temporal types, `Option<T>`,
///   `Vec<T>`, maps, [`Json<T>`](crate::Json)) read the record's only column;
/// - `#[derive(FromRow)]` structs read one column per field, matched by
///   name (exact, then case-insensitive);
/// - `#[derive(GraphNode)]` / `#[derive(GraphRelation)]` structs read the
///   node or relationship held in the record's only column.
///
/// # Field attributes (`#[derive(FromRow)]`)
///
/// - **`Option<T>`** fields tolerate missing columns (become `None`).
/// - **`#[graph(flatten)]`** delegates to the inner type's `FromRow` impl,
///   passing the same record.
/// - **`#[graph(column = "...")]`** reads a differently named column.
pub trait FromRow: Sized {
    /// Deserialize a [`Record`] into `Self`.
    fn from_record(record: &Record) -> Result<Self, GraphError>;
}

/// Converts a single `neo4rs::BoltType` value into a Rust type.
///
/// This is the core conversion primitive. Implementations exist for
/// primitives, collections, temporal types, and wrapper types.
pub trait FromGraphValue: Sized {
    /// Convert a [`BoltType`](neo4rs::BoltType) into `Self`.
    fn from_value(value: Value) -> Result<Self, GraphError>;
}

/// Converts a Rust value into a `neo4rs::BoltType` for use as a query parameter.
///
/// A blanket implementation covers all types that already implement
/// `Into<BoltType>` (e.g. `String`, `i64`, `f64`, `bool`, chrono types).
pub trait IntoGraphValue {
    /// Convert `self` into a [`BoltType`](neo4rs::BoltType).
    fn into_value(self) -> Value;
}

impl<T: Into<Value>> IntoGraphValue for T {
    fn into_value(self) -> Value {
        self.into()
    }
}

/// Converts a struct into named query parameters.
///
/// Automatically implemented by `#[derive(ToParams)]`.
///
/// ```rust,ignore
/// #[derive(ToParams)]
/// struct CreateUser {
///     name: String,
///     age: i64,
/// }
///
/// let query = CypherQuery::new("CREATE (u:User {name: $name, age: $age})")
///     .params_from(CreateUser { name: "Alice".into(), age: 30 });
/// ```
pub trait ToParams {
    /// Convert `self` into a map of parameter name to value.
    fn to_params(self) -> std::collections::HashMap<String, Value>;
}

/// Newtype wrapper for embedding a [`GraphNode`] inside a [`FromRow`] struct
/// when the node type has no derived `FromGraphValue` impl.
///
/// ```rust,ignore
/// #[derive(FromRow)]
/// struct UserRow {
///     u: NodeWrapper<User>,
/// }
/// ```
pub struct NodeWrapper<T>(pub T);

/// Newtype wrapper for embedding a [`GraphRelation`] inside a [`FromRow`] struct.
pub struct RelationWrapper<T>(pub T);
