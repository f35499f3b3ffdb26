//! Server version parsing and the Cypher capability tier derived from it.

use std::fmt;
use std::str::FromStr;

use graphwire_core::GraphError;

/// A server version as reported at connect time (`"5.12.0"`,
/// `"3.5.35-enterprise"`, `"4.4"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = s
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .split(|c: char| c == '-' || c == '+' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        let mut parts = core.split('.').map(|p| p.parse::<u32>());
        let invalid = || GraphError::Mapping(format!("unrecognised server version '{s}'"));
        let major = parts.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
        let minor = parts.next().transpose().map_err(|_| invalid())?.unwrap_or(0);
        let patch = parts.next().transpose().map_err(|_| invalid())?.unwrap_or(0);
        Ok(Self { major, minor, patch })
    }
}

/// Discrete level of Cypher language and runtime features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapabilityTier {
    Cypher19,
    Cypher20,
    Cypher22,
    Cypher23,
    Cypher30,
    Cypher34,
    Cypher40,
    Cypher44,
    Cypher50,
}

impl CapabilityTier {
    pub fn for_version(v: ServerVersion) -> Self {
        match (v.major, v.minor) {
            (0 | 1, _) => CapabilityTier::Cypher19,
            (2, 0 | 1) => CapabilityTier::Cypher20,
            (2, 2) => CapabilityTier::Cypher22,
            (2, _) => CapabilityTier::Cypher23,
            (3, 0..=3) => CapabilityTier::Cypher30,
            (3, _) => CapabilityTier::Cypher34,
            (4, 0..=3) => CapabilityTier::Cypher40,
            (4, _) => CapabilityTier::Cypher44,
            _ => CapabilityTier::Cypher50,
        }
    }
}

/// What the connected server supports, fixed at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CypherCapabilities {
    pub version: ServerVersion,
    pub tier: CapabilityTier,
}

impl CypherCapabilities {
    pub fn new(version: ServerVersion) -> Self {
        Self { version, tier: CapabilityTier::for_version(version) }
    }

    /// Explicit, multi-request transactions.
    pub fn supports_transactions(&self) -> bool {
        self.tier >= CapabilityTier::Cypher20
    }

    /// `CYPHER planner=...` hints.
    pub fn supports_planner(&self) -> bool {
        self.tier >= CapabilityTier::Cypher22
    }

    pub fn supports_starts_with(&self) -> bool {
        self.tier >= CapabilityTier::Cypher23
    }

    pub fn supports_stored_procedures(&self) -> bool {
        self.tier >= CapabilityTier::Cypher30
    }

    /// Date, time, and duration values stored natively rather than as strings.
    pub fn supports_native_temporal(&self) -> bool {
        self.tier >= CapabilityTier::Cypher34
    }

    /// More than one database per server; queries may name their target.
    pub fn supports_multiple_databases(&self) -> bool {
        self.tier >= CapabilityTier::Cypher40
    }

    pub fn supports_show(&self) -> bool {
        self.tier >= CapabilityTier::Cypher40
    }

    /// Bookmarks in HTTP request bodies.
    pub fn supports_http_bookmarks(&self) -> bool {
        self.tier >= CapabilityTier::Cypher50
    }

    /// `CALL { ... } IN TRANSACTIONS`.
    pub fn supports_in_transactions(&self) -> bool {
        self.tier >= CapabilityTier::Cypher44
    }
}
