//! Core traits, error types, and value conversions for graphwire.
//!
//! This crate is not meant to be used directly; use the [`graphwire`] facade
//! crate instead, which re-exports everything you need.

pub mod traits;
pub mod error;

pub mod value;
pub mod record;
pub mod props;
pub mod json;

pub use error::GraphError;
pub use record::Record;
pub use value::Json;
pub use traits::{FromGraphValue, FromRow, IntoGraphValue, ToParams};
pub use neo4rs;
