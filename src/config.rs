//! Client configuration.

use std::collections::BTreeMap;

use serde::Deserialize;
use graphwire_core::GraphError;

pub const DEFAULT_DATABASE: &str = "neo4j";
pub const DEFAULT_FETCH_SIZE: usize = 200;
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// Settings shared by both transports.
///
/// Deserializable (every field defaults) so it can live in an application's
/// own config file; [`ClientConfig::builder`] is the programmatic route.
///
/// ```rust
/// # use graphwire::config::ClientConfig;
/// let config = ClientConfig::builder()
///     .address("neo4j://db-1:7687")
///     .address("neo4j://db-2:7687")
///     .user("neo4j")
///     .password("secret")
///     .database("social")
///     .build()
///     .unwrap();
/// assert_eq!(config.default_database, "social");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server addresses. More than one needs the routing `neo4j://` scheme.
    pub addresses: Vec<String>,
    pub user: String,
    pub password: String,
    /// Database used when a query or transaction names none.
    pub default_database: String,
    pub fetch_size: usize,
    pub max_connections: usize,
    /// Send and receive temporal values natively (server 3.4+).
    pub use_native_temporal: bool,
    /// Headers added to every REST request.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addresses: vec!["bolt://localhost:7687".to_string()],
            user: String::new(),
            password: String::new(),
            default_database: DEFAULT_DATABASE.to_string(),
            fetch_size: DEFAULT_FETCH_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            use_native_temporal: false,
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// The first configured address.
    pub fn primary_address(&self) -> Result<&str, GraphError> {
        self.addresses
            .first()
            .map(String::as_str)
            .ok_or_else(|| GraphError::Config("no server address configured".into()))
    }

    /// Check the settings that can be checked without a server.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.primary_address()?;
        if self.addresses.len() > 1 {
            if let Some(addr) = self.addresses.iter().find(|a| !a.starts_with("neo4j")) {
                return Err(GraphError::UnsupportedOperation(format!(
                    "resolving several addresses needs the neo4j:// routing scheme, got '{addr}'"
                )));
            }
        }
        if self.fetch_size == 0 {
            return Err(GraphError::Config("fetch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`], in the style of `neo4rs::ConfigBuilder`.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    addresses: Vec<String>,
    user: Option<String>,
    password: Option<String>,
    database: Option<String>,
    fetch_size: Option<usize>,
    max_connections: Option<usize>,
    use_native_temporal: bool,
    headers: BTreeMap<String, String>,
}

impl ClientConfigBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }

    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    pub fn use_native_temporal(mut self, enabled: bool) -> Self {
        self.use_native_temporal = enabled;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig, GraphError> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            addresses: if self.addresses.is_empty() { defaults.addresses } else { self.addresses },
            user: self.user.unwrap_or(defaults.user),
            password: self.password.unwrap_or(defaults.password),
            default_database: self.database.unwrap_or(defaults.default_database),
            fetch_size: self.fetch_size.unwrap_or(defaults.fetch_size),
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
            use_native_temporal: self.use_native_temporal,
            default_headers: self.headers,
        };
        config.validate()?;
        Ok(config)
    }
}
