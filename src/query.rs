use std::collections::BTreeMap;
use std::time::Duration;

use neo4rs::BoltType as Value;
use serde_json::Value as JsonValue;
use graphwire_core::json::bolt_to_json;
use graphwire_core::traits::{IntoGraphValue, ToParams};
use graphwire_core::GraphError;

/// Opaque causal-ordering token returned by the server after a write.
pub type Bookmark = String;

/// Read/write routing for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    Read,
    Write,
}

/// Expected shape of each result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultShape {
    /// Every row has exactly one column; checked before conversion.
    SingleColumn,
    #[default]
    MultipleColumns,
    /// Columns are projected into the fields of a type.
    Projection,
}

/// How the server should render rows (REST `resultDataContents`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    #[default]
    Row,
    Graph,
    /// Row format, plus graph format when the query returns graph entities.
    DependsOnEnvironment,
}

/// An immutable, wire-ready Cypher query.
///
/// Built with consuming setters, then handed by value to one of the
/// [`GraphClient`](crate::GraphClient) execute methods.
///
/// # Examples
///
/// ```rust
/// # use graphwire::query::CypherQuery;
/// let query = CypherQuery::new("MATCH (u:User {name: $name}) RETURN u")
///     .param("name", "Alice")
///     .database("social")
///     .identifier("find-alice");
/// assert_eq!(query.debug_text(), r#"MATCH (u:User {name: "Alice"}) RETURN u"#);
/// ```
#[derive(Debug, Clone)]
pub struct CypherQuery {
    text: String,
    params: BTreeMap<String, Value>,
    shape: ResultShape,
    format: ResultFormat,
    database: Option<String>,
    access_mode: AccessMode,
    include_stats: bool,
    headers: BTreeMap<String, String>,
    max_execution_time: Option<Duration>,
    identifier: Option<String>,
    bookmarks: Vec<Bookmark>,
}

impl CypherQuery {
    /// Create a new query from a Cypher string.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
            shape: ResultShape::default(),
            format: ResultFormat::default(),
            database: None,
            access_mode: AccessMode::default(),
            include_stats: false,
            headers: BTreeMap::new(),
            max_execution_time: None,
            identifier: None,
            bookmarks: Vec::new(),
        }
    }

    /// Bind a named parameter.
    ///
    /// ```rust
    /// # use graphwire::query::CypherQuery;
    /// let q = CypherQuery::new("MATCH (u:User {age: $age}) RETURN u")
    ///     .param("age", 30_i64);
    /// assert_eq!(q.params().len(), 1);
    /// ```
    pub fn param(mut self, key: impl Into<String>, value: impl IntoGraphValue) -> Self {
        self.params.insert(key.into(), value.into_value());
        self
    }

    /// Bind all fields from a [`ToParams`] struct as named parameters.
    pub fn params_from(mut self, source: impl ToParams) -> Self {
        self.params.extend(source.to_params());
        self
    }

    /// Run against a specific database instead of the client default.
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Shorthand for `access_mode(AccessMode::Write)`.
    pub fn write(self) -> Self {
        self.access_mode(AccessMode::Write)
    }

    /// Ask the server for write counters.
    pub fn with_stats(mut self) -> Self {
        self.include_stats = true;
        self
    }

    /// Add a custom header sent with this query (REST transport).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn max_execution_time(mut self, limit: Duration) -> Self {
        self.max_execution_time = Some(limit);
        self
    }

    /// Correlation identifier surfaced in the completion event.
    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = Some(id.into());
        self
    }

    /// Bookmarks the server must have applied before running this query.
    pub fn bookmarks<I, B>(mut self, bookmarks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bookmark>,
    {
        self.bookmarks.extend(bookmarks.into_iter().map(Into::into));
        self
    }

    pub fn shape(mut self, shape: ResultShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn format(mut self, format: ResultFormat) -> Self {
        self.format = format;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    pub fn result_shape(&self) -> ResultShape {
        self.shape
    }

    pub fn result_format(&self) -> ResultFormat {
        self.format
    }

    pub fn target_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn is_write(&self) -> bool {
        self.access_mode == AccessMode::Write
    }

    pub fn includes_stats(&self) -> bool {
        self.include_stats
    }

    pub fn custom_headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn execution_time_limit(&self) -> Option<Duration> {
        self.max_execution_time
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn required_bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Parameters as a JSON object, for the REST transport.
    pub fn params_json(&self) -> Result<JsonValue, GraphError> {
        let mut out = serde_json::Map::with_capacity(self.params.len());
        for (k, v) in &self.params {
            out.insert(k.clone(), bolt_to_json(v)?);
        }
        Ok(JsonValue::Object(out))
    }

    /// Query text with every `$name` parameter inlined as a JSON literal.
    ///
    /// Meant for logs and completion events only; never sent to the server.
    /// Names match whole identifiers, and inlined literals are not scanned
    /// again.
    pub fn debug_text(&self) -> String {
        let mut text = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(pos) = rest.find('$') {
            text.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let end = after
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..end];
            match self.params.get(name).map(bolt_to_json) {
                Some(Ok(literal)) => text.push_str(&literal.to_string()),
                _ => {
                    text.push('$');
                    text.push_str(name);
                }
            }
            rest = &after[end..];
        }
        text.push_str(rest);
        text
    }
}

/// Shorthand for [`CypherQuery::new`].
pub fn query(text: impl Into<String>) -> CypherQuery {
    CypherQuery::new(text)
}
