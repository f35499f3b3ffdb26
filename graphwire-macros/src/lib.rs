//! Procedural macros for graphwire.
//!
//! This crate is not meant to be used directly; use the [`graphwire`] facade
//! crate which re-exports all macros.

extern crate proc_macro;

use proc_macro::TokenStream;

mod attrs;
mod hydrate;
mod node;
mod relation;
mod from_row;
mod to_params;

/// Derive `GraphNode`, `FromGraphValue`, and `FromRow` for a struct.
///
/// Maps a graph node to a Rust struct. Each struct field is read from a
/// node property via `FromGraphValue`. The value may be a Bolt node or, for
/// the REST transport in row format, the node's property map.
///
/// # Attributes
///
/// **Struct-level:**
/// - `#[graph(label = "...")]`: set the label. Defaults to the struct name.
///
/// **Field-level:**
/// - `#[graph(prop = "...")]`: override the property name (default: field name).
/// - `#[graph(id)]`: marker for the identity field (documentation only).
///
/// `Option<T>` fields accept a missing property as `None`.
///
/// # Example
///
/// ```rust,ignore
/// use graphwire::prelude::*;
///
/// #[derive(Debug, GraphNode)]
/// #[graph(label = "User")]
/// struct User {
///     #[graph(id)]
///     id: i64,
///     name: String,
///     #[graph(prop = "email_address")]
///     email: Option<String>,
/// }
/// ```
#[proc_macro_derive(GraphNode, attributes(graph))]
pub fn graph_node(input: TokenStream) -> TokenStream {
    node::expand(input)
}

/// Derive `GraphRelation`, `FromGraphValue`, and `FromRow` for a struct.
///
/// # Attributes
///
/// **Struct-level:**
/// - `#[graph(type = "...")]`: set the relationship type. Defaults to the struct name.
/// - `#[graph(from = "...")]` / `#[graph(to = "...")]`: optional end labels (documentation).
///
/// **Field-level:**
/// - `#[graph(prop = "...")]`: override the property name.
///
/// ```rust,ignore
/// #[derive(Debug, GraphRelation)]
/// #[graph(type = "FOLLOWS", from = "User", to = "User")]
/// struct Follows {
///     since: i64,
/// }
/// ```
#[proc_macro_derive(GraphRelation, attributes(graph))]
pub fn graph_relation(input: TokenStream) -> TokenStream {
    relation::expand(input)
}

/// Derive `FromRow` for a projection struct.
///
/// Each field is read from the column of the same name; when no column
/// matches exactly, a case-insensitive match is used.
///
/// # Attributes
///
/// **Field-level:**
/// - `#[graph(flatten)]`: delegate to the inner type's `FromRow` with the same record.
/// - `#[graph(column = "...")]`: read a differently named column.
///
/// `Option<T>` fields accept a missing column or `null` as `None`.
///
/// ```rust,ignore
/// #[derive(FromRow)]
/// struct UserRow {
///     u: User,
///     score: Option<f64>,
///     #[graph(column = "n.name")]
///     name: String,
/// }
/// ```
#[proc_macro_derive(FromRow, attributes(graph))]
pub fn from_row(input: TokenStream) -> TokenStream {
    from_row::expand(input)
}

/// Derive `ToParams` for a struct.
///
/// Converts each field into a named query parameter via `IntoGraphValue`.
///
/// **Field-level:**
/// - `#[graph(skip)]` or `#[graph(id)]`: exclude the field.
/// - `#[graph(prop = "...")]`: override the parameter name.
#[proc_macro_derive(ToParams, attributes(graph))]
pub fn to_params(input: TokenStream) -> TokenStream {
    to_params::expand(input)
}
