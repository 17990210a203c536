//! Token store backend selection

use serde::{Deserialize, Serialize};

/// Backend used for the durable token store and the session cache
///
/// Resolved once at startup into concrete implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// MySQL token store with a Redis session cache
    #[default]
    Mysql,
    /// Process-local store and session cache (development and tests)
    Memory,
}

impl DatabaseType {
    /// Whether the backend needs network connections
    pub fn is_networked(&self) -> bool {
        matches!(self, DatabaseType::Mysql)
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::Mysql => write!(f, "mysql"),
            DatabaseType::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(DatabaseType::Mysql),
            "memory" | "mem" => Ok(DatabaseType::Memory),
            _ => Err(format!("Invalid database type: {}", s)),
        }
    }
}

/// Token store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Which backend to build
    #[serde(default)]
    pub database_type: DatabaseType,

    /// Create the token tables at startup if they are missing
    #[serde(default = "default_ensure_schema")]
    pub ensure_schema: bool,

    /// How often expired blacklist rows are purged, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_type: DatabaseType::default(),
            ensure_schema: default_ensure_schema(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

fn default_ensure_schema() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_parsing() {
        assert_eq!("mysql".parse::<DatabaseType>().unwrap(), DatabaseType::Mysql);
        assert_eq!("MEMORY".parse::<DatabaseType>().unwrap(), DatabaseType::Memory);
        assert!("sqlite".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_database_type_serde() {
        let ty: DatabaseType = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(ty, DatabaseType::Memory);
        assert!(!ty.is_networked());
        assert_eq!(serde_json::to_string(&DatabaseType::Mysql).unwrap(), "\"mysql\"");
    }
}
