//! PostgreSQL storage strategy (`jsonb`)

use super::core::{
    containment_payloads, AdvisoryFlag, ContainmentMode, StorageStrategy, StrategyCapabilities,
};
use super::DatabaseBackendType;
use crate::error::TranslatableResult;
use crate::query::{Disjunction, Predicate};
use crate::schema::{SchemaDescriptor, SchemaIntrospection};

/// `jsonb` column searched with `->`/`->>` extraction and `@>` containment
#[derive(Debug, Default)]
pub struct PostgresStrategy {
    containment_mode: ContainmentMode,
    gin_index_warning_issued: AdvisoryFlag,
}

impl PostgresStrategy {
    pub fn new(containment_mode: ContainmentMode) -> Self {
        Self {
            containment_mode,
            gin_index_warning_issued: AdvisoryFlag::new(),
        }
    }

    pub fn containment_mode(&self) -> ContainmentMode {
        self.containment_mode
    }

    /// Whether the GIN index check has already run
    pub fn advisory_issued(&self) -> bool {
        self.gin_index_warning_issued.is_claimed()
    }
}

impl StorageStrategy for PostgresStrategy {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::PostgreSQL
    }

    fn column_type(&self) -> &'static str {
        "jsonb"
    }

    fn migration_example(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {table} ADD COLUMN {column} jsonb NOT NULL DEFAULT '{{}}'::jsonb;")
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
                disjunction.push(format!("{column} @> CAST(? AS jsonb)"), [payload]);
            }
        } else {
            for locale in locales {
                for (field, value) in attributes {
                    disjunction.push(
                        format!("({column} -> ? ->> ?) ILIKE ?"),
                        [locale.as_str(), field.as_str(), value.as_str()],
                    );
                }
            }
        }

        Ok(disjunction.into_predicate())
    }

    fn validate_index_recommendation(
        &self,
        schema: &SchemaDescriptor,
        introspection: &dyn SchemaIntrospection,
    ) {
        if !self.gin_index_warning_issued.claim() {
            return;
        }

        let has_gin_index = introspection.indexes(schema.table()).iter().any(|index| {
            index.columns.len() == 1
                && index.columns[0] == schema.column()
                && index.using.as_deref().map_or(false, |using| using.eq_ignore_ascii_case("gin"))
        });

        if !has_gin_index {
            tracing::warn!(
                model = schema.model(),
                column = schema.column(),
                "Model {} is using the '{}' JSONB column without a GIN index. For optimal query performance, consider adding:\nCREATE INDEX index_{}_on_{} ON {} USING gin ({} jsonb_path_ops);",
                schema.model(),
                schema.column(),
                schema.table(),
                schema.column(),
                schema.table(),
                schema.column(),
            );
        }
    }
}
