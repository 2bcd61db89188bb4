//! Flat text fallback without structured query support

use super::core::{StorageStrategy, StrategyCapabilities};
use super::DatabaseBackendType;
use crate::error::{TranslatableError, TranslatableResult};
use crate::query::Predicate;

/// Translations serialized into a plain `text` column (SQLite without JSON)
#[derive(Debug, Default)]
pub struct PlainTextStrategy;

impl PlainTextStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl StorageStrategy for PlainTextStrategy {
    fn name(&self) -> &'static str {
        "sqlite (plain text)"
    }

    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::SQLite
    }

    fn column_type(&self) -> &'static str {
        "text"
    }

    fn migration_example(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {table} ADD COLUMN {column} text NOT NULL DEFAULT '{{}}';")
    }

    fn capabilities(&self) -> StrategyCapabilities {
        StrategyCapabilities {
            structured_query: false,
            containment: false,
        }
    }

    fn build_predicate(
        &self,
        _column: &str,
        _attributes: &[(String, String)],
        _locales: &[String],
        _case_sensitive: bool,
    ) -> TranslatableResult<Predicate> {
        Err(TranslatableError::unsupported_capability(self.name(), "where_translations"))
    }
}
