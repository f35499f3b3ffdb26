//! Centralized property access for nodes, relationships, and property maps.
//!
//! Derive-macro generated code only depends on this module, never on the
//! `neo4rs` property API directly.

use neo4rs::{BoltMap, BoltType as Value};

/// Read a property from a property map by key.
///
/// Bolt nodes and relationships expose their properties as a [`BoltMap`];
/// over REST in row format they arrive as a plain map. Hydration of both
/// goes through this function.
pub fn map_prop(props: &BoltMap, key: &str) -> Option<Value> {
    props.get::<Value>(key).ok()
}
