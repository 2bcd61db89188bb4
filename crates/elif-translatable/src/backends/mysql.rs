//! MySQL storage strategy (`json`)

use super::core::{
    containment_payloads, json_path, AdvisoryFlag, ContainmentMode, StorageStrategy,
    StrategyCapabilities,
};
use super::DatabaseBackendType;
use crate::error::TranslatableResult;
use crate::query::{Disjunction, Predicate};
use crate::schema::{SchemaDescriptor, SchemaIntrospection};

/// `json` column searched with `JSON_EXTRACT` and `JSON_CONTAINS`
#[derive(Debug, Default)]
pub struct MySqlStrategy {
    containment_mode: ContainmentMode,
    index_warning_issued: AdvisoryFlag,
}

impl MySqlStrategy {
    pub fn new(containment_mode: ContainmentMode) -> Self {
        Self {
            containment_mode,
            index_warning_issued: AdvisoryFlag::new(),
        }
    }

    pub fn advisory_issued(&self) -> bool {
        self.index_warning_issued.is_claimed()
    }
}

impl StorageStrategy for MySqlStrategy {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::MySQL
    }

    fn column_type(&self) -> &'static str {
        "json"
    }

    fn migration_example(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {table} ADD COLUMN {column} JSON NOT NULL;")
    }

    fn capabilities(&self) -> StrategyCapabilities {
        StrategyCapabilities {
            structured_query: true,
            containment: true,
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
        let mut disjunction = Disjunction::new();

        if case_sensitive {
            for payload in containment_payloads(attributes, locales, self.containment_mode) {
                disjunction.push(format!("JSON_CONTAINS({column}, ?)"), [payload]);
            }
        } else {
            for locale in locales {
                for (field, value) in attributes {
                    disjunction.push(
                        format!("UPPER(JSON_UNQUOTE(JSON_EXTRACT({column}, ?))) LIKE UPPER(?)"),
                        [json_path(locale, field), value.clone()],
                    );
                }
            }
        }

        Ok(disjunction.into_predicate())
    }

    fn validate_index_recommendation(
        &self,
        schema: &SchemaDescriptor,
        _introspection: &dyn SchemaIntrospection,
    ) {
        if !self.index_warning_issued.claim() {
            return;
        }

        tracing::warn!(
            model = schema.model(),
            column = schema.column(),
            "Model {} is using MySQL with JSON column '{}'. Consider adding functional indexes for frequently queried translation fields for better performance.",
            schema.model(),
            schema.column(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_binds_json_path() {
        let strategy = MySqlStrategy::default();
        let predicate = strategy
            .build_predicate(
                "translations",
                &[("title".to_string(), "hello".to_string())],
                &["en".to_string()],
                false,
            )
            .unwrap();

        assert_eq!(
            predicate.sql,
            "(UPPER(JSON_UNQUOTE(JSON_EXTRACT(`translations`, ?))) LIKE UPPER(?))"
        );
        assert_eq!(predicate.binds, vec!["$.en.title", "hello"]);
    }

    #[test]
    fn test_case_sensitive_uses_json_contains() {
        let strategy = MySqlStrategy::default();
        let predicate = strategy
            .build_predicate(
                "translations",
                &[("title".to_string(), "Hello".to_string())],
                &["en".to_string(), "de".to_string()],
                true,
            )
            .unwrap();

        assert_eq!(
            predicate.sql,
            "(JSON_CONTAINS(`translations`, ?) OR JSON_CONTAINS(`translations`, ?))"
        );
        assert_eq!(
            predicate.binds,
            vec![r#"{"en":{"title":"Hello"}}"#, r#"{"de":{"title":"Hello"}}"#]
        );
    }
}
