//! SQLite storage strategy backed by the JSON1 functions

use super::core::{json_path, StorageStrategy, StrategyCapabilities};
use super::DatabaseBackendType;
use crate::error::TranslatableResult;
use crate::query::{Disjunction, Predicate};

/// `json` column searched with `json_extract`; no containment operator
#[derive(Debug, Default)]
pub struct SqliteJsonStrategy;

impl SqliteJsonStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl StorageStrategy for SqliteJsonStrategy {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::SQLite
    }

    fn column_type(&self) -> &'static str {
        "json"
    }

    fn migration_example(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {table} ADD COLUMN {column} json NOT NULL DEFAULT '{{}}';")
    }

    fn capabilities(&self) -> StrategyCapabilities {
        StrategyCapabilities {
            structured_query: true,
            containment: false,
        }
    }

    fn build_predicate(
        &self,
        column: &str,
        attributes: &[(String, String)],
        locales: &[String],
        case_sensitive: bool,
    ) -> TranslatableResult<Predicate> {
        let column = self.quote_column(column);
        let condition = if case_sensitive {
            format!("json_extract({column}, ?) = ?")
        } else {
            format!("json_extract({column}, ?) LIKE ? COLLATE NOCASE")
        };

        let mut disjunction = Disjunction::new();
        for locale in locales {
            for (field, value) in attributes {
                disjunction.push(condition.clone(), [json_path(locale, field), value.clone()]);
            }
        }

        Ok(disjunction.into_predicate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(case_sensitive: bool) -> Predicate {
        SqliteJsonStrategy::new()
            .build_predicate(
                "translations",
                &[("title".to_string(), "hello".to_string())],
                &["en".to_string(), "fr".to_string()],
                case_sensitive,
            )
            .unwrap()
    }

    #[test]
    fn test_case_insensitive_uses_nocase_collation() {
        let predicate = search(false);
        assert_eq!(
            predicate.sql,
            "(json_extract(\"translations\", ?) LIKE ? COLLATE NOCASE OR json_extract(\"translations\", ?) LIKE ? COLLATE NOCASE)"
        );
        assert_eq!(predicate.binds, vec!["$.en.title", "hello", "$.fr.title", "hello"]);
    }

    #[test]
    fn test_case_sensitive_uses_equality() {
        let predicate = search(true);
        assert!(predicate.sql.starts_with("(json_extract(\"translations\", ?) = ?"));
        assert!(!predicate.sql.contains("COLLATE"));
        assert_eq!(predicate.binds.len(), 4);
    }

    #[test]
    fn test_no_containment_capability() {
        let capabilities = SqliteJsonStrategy::new().capabilities();
        assert!(capabilities.structured_query);
        assert!(!capabilities.containment);
    }
}
