//! Storage strategies
//!
//! One strategy per database backend knows the physical column type for the
//! translations column, the migration hint shown when it is missing, and how
//! to turn a translation search into a predicate in that backend's JSON
//! dialect. Strategies are shared: [`StrategyRegistry`] hands out a single
//! instance per backend configuration.

pub mod core;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod text;

pub use self::core::*;
pub use mysql::MySqlStrategy;
pub use postgres::PostgresStrategy;
pub use sqlite::SqliteJsonStrategy;
pub use text::PlainTextStrategy;

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::config::TranslatableConfig;
use crate::error::{TranslatableError, TranslatableResult};

/// Database backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackendType {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl DatabaseBackendType {
    /// Resolve a host adapter name such as `PostgreSQL`, `mysql2` or `sqlite3`
    pub fn detect(adapter_name: &str) -> TranslatableResult<Self> {
        let adapter = adapter_name.to_lowercase();
        if adapter.contains("postgres") {
            Ok(Self::PostgreSQL)
        } else if adapter.contains("mysql") || adapter.contains("trilogy") {
            Ok(Self::MySQL)
        } else if adapter.contains("sqlite") {
            Ok(Self::SQLite)
        } else {
            Err(TranslatableError::UnsupportedBackend(adapter_name.to_string()))
        }
    }

    /// Quote character for identifiers in this dialect
    pub fn identifier_quote(&self) -> char {
        match self {
            Self::PostgreSQL | Self::SQLite => '"',
            Self::MySQL => '`',
        }
    }

    /// Parameter placeholder for the zero-based bind `index`
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index + 1),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostgreSQL => write!(f, "postgresql"),
            Self::MySQL => write!(f, "mysql"),
            Self::SQLite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = TranslatableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::detect(s)
    }
}

static GLOBAL_STRATEGIES: Lazy<Arc<StrategyRegistry>> = Lazy::new(|| Arc::new(StrategyRegistry::new()));

/// Shared strategy instances keyed by backend configuration
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: DashMap<String, Arc<dyn StorageStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: DashMap::new(),
        }
    }

    /// Process-wide registry
    pub fn global() -> Arc<StrategyRegistry> {
        GLOBAL_STRATEGIES.clone()
    }

    /// Resolve the strategy for `adapter_name`, creating it on first use
    pub fn for_adapter(
        &self,
        adapter_name: &str,
        config: &TranslatableConfig,
    ) -> TranslatableResult<Arc<dyn StorageStrategy>> {
        let backend = DatabaseBackendType::detect(adapter_name)?;
        let key = match backend {
            DatabaseBackendType::PostgreSQL | DatabaseBackendType::MySQL => {
                format!("{}:{}", backend, config.containment_mode)
            }
            DatabaseBackendType::SQLite => format!("{}:{}", backend, config.sqlite_mode),
        };

        if let Some(existing) = self.strategies.get(&key) {
            return Ok(existing.clone());
        }

        let strategy = self
            .strategies
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!("Creating {} storage strategy for adapter '{}'", backend, adapter_name);
                let strategy: Arc<dyn StorageStrategy> = match (backend, config.sqlite_mode) {
                    (DatabaseBackendType::PostgreSQL, _) => Arc::new(PostgresStrategy::new(config.containment_mode)),
                    (DatabaseBackendType::MySQL, _) => Arc::new(MySqlStrategy::new(config.containment_mode)),
                    (DatabaseBackendType::SQLite, SqliteMode::Json) => Arc::new(SqliteJsonStrategy::new()),
                    (DatabaseBackendType::SQLite, SqliteMode::PlainText) => Arc::new(PlainTextStrategy::new()),
                };
                strategy
            })
            .clone();

        Ok(strategy)
    }

    /// Number of distinct strategy instances created so far
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_adapter_names() {
        assert_eq!(DatabaseBackendType::detect("PostgreSQL").unwrap(), DatabaseBackendType::PostgreSQL);
        assert_eq!(DatabaseBackendType::detect("Mysql2").unwrap(), DatabaseBackendType::MySQL);
        assert_eq!(DatabaseBackendType::detect("trilogy").unwrap(), DatabaseBackendType::MySQL);
        assert_eq!(DatabaseBackendType::detect("SQLite3").unwrap(), DatabaseBackendType::SQLite);
    }

    #[test]
    fn test_unsupported_adapter_is_named() {
        let err = DatabaseBackendType::detect("oracle_enhanced").unwrap_err();
        assert!(matches!(err, TranslatableError::UnsupportedBackend(ref name) if name == "oracle_enhanced"));
        assert_eq!(err.to_string(), "Unsupported database adapter: oracle_enhanced");
        assert!(DatabaseBackendType::detect("postgis").is_err());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(DatabaseBackendType::PostgreSQL.parameter_placeholder(0), "$1");
        assert_eq!(DatabaseBackendType::MySQL.parameter_placeholder(3), "?");
    }

    #[test]
    fn test_registry_shares_instances() {
        let registry = StrategyRegistry::new();
        let config = TranslatableConfig::default();

        let first = registry.for_adapter("postgresql", &config).unwrap();
        let second = registry.for_adapter("PostgreSQL", &config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        registry.for_adapter("mysql2", &config).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.for_adapter("mssql", &config).is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_sqlite_mode_selects_variant() {
        let registry = StrategyRegistry::new();
        let json = registry.for_adapter("sqlite3", &TranslatableConfig::default()).unwrap();
        assert!(json.capabilities().structured_query);

        let plain_config = TranslatableConfig {
            sqlite_mode: SqliteMode::PlainText,
            ..TranslatableConfig::default()
        };
        let plain = registry.for_adapter("sqlite3", &plain_config).unwrap();
        assert!(!plain.capabilities().structured_query);
        assert_eq!(plain.column_type(), "text");
        assert!(!Arc::ptr_eq(&json, &plain));
    }
}
