//! Model registration and the per-model translation facade

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use elif_validation::{ValidationErrors, ValidationResult};
use serde_json::Value;

use crate::backends::{StorageStrategy, StrategyRegistry};
use crate::column::{normalize, TranslationColumn};
use crate::config::{self, TranslatableConfig};
use crate::error::{TranslatableError, TranslatableResult};
use crate::query::WhereTranslations;
use crate::schema::{PermitList, SchemaDescriptor, SchemaIntrospection, SchemaRegistry};
use crate::security::{validate_identifier, validate_path_segment};
use crate::validation::{validate_fields, validate_structure, CustomPredicate, RuleOptions, TranslationRule};
use crate::view::{TranslationView, ViewGenerator, ViewShape};

/// Host record access to the translations column
pub trait TranslationAttributes: Send + Sync + 'static {
    /// Model name used for registration and messages, e.g. `Post`
    fn model_name() -> &'static str;

    fn table_name() -> &'static str;

    /// Current column value; `None` reads as an empty mapping
    fn translations(&self, column: &str) -> Option<&TranslationColumn>;

    fn write_translations(&mut self, column: &str, translations: TranslationColumn);
}

type PendingRule<M> = (String, RuleOptions, Option<CustomPredicate<M>>);

/// Declaration of a translatable model, checked by [`register`](Self::register)
pub struct TranslatableBuilder<M> {
    fields: Vec<String>,
    locales: Option<Vec<String>>,
    column: Option<String>,
    config: Option<Arc<TranslatableConfig>>,
    schemas: Option<Arc<SchemaRegistry>>,
    strategies: Option<Arc<StrategyRegistry>>,
    views: Option<Arc<ViewGenerator>>,
    rules: Vec<PendingRule<M>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: TranslationAttributes> TranslatableBuilder<M> {
    fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            locales: None,
            column: None,
            config: None,
            schemas: None,
            strategies: None,
            views: None,
            rules: Vec::new(),
            _model: PhantomData,
        }
    }

    /// Supported locales; defaults to the locale provider's list
    pub fn locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = Some(locales.into_iter().map(Into::into).collect());
        self
    }

    /// Column name; defaults to the configured `default_column_name`
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn config(mut self, config: Arc<TranslatableConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn registry(mut self, schemas: Arc<SchemaRegistry>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    pub fn strategies(mut self, strategies: Arc<StrategyRegistry>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn views(mut self, views: Arc<ViewGenerator>) -> Self {
        self.views = Some(views);
        self
    }

    /// Declare a rule for each field; compiled at registration
    pub fn validates_translation<I, S>(mut self, fields: I, options: RuleOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.rules.push((field.into(), options.clone(), None));
        }
        self
    }

    pub fn validates_translation_with<I, S>(mut self, fields: I, options: RuleOptions, custom: CustomPredicate<M>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.rules.push((field.into(), options.clone(), Some(custom.clone())));
        }
        self
    }

    /// Check the declaration against the database schema and register it
    pub fn register(self, introspection: &dyn SchemaIntrospection) -> TranslatableResult<TranslatableModel<M>> {
        let model = M::model_name();
        let table = M::table_name();

        let config = self.config.unwrap_or_else(config::current);
        config.validate()?;

        let column = self.column.unwrap_or_else(|| config.default_column_name.clone());
        validate_identifier(&column)?;

        if self.fields.is_empty() {
            return Err(TranslatableError::UndefinedTranslatableFields {
                model: model.to_string(),
                example: format!(
                    "TranslatableModel::<{}>::builder([\"title\", \"content\"]).register(&schema)",
                    model
                ),
            });
        }

        let locales = self
            .locales
            .unwrap_or_else(|| config.locale_provider.available_locales());
        if locales.is_empty() {
            return Err(TranslatableError::Configuration(format!(
                "Model {} must declare at least one locale",
                model
            )));
        }

        for segment in self.fields.iter().chain(locales.iter()) {
            validate_path_segment(segment)?;
        }

        let strategies = self.strategies.unwrap_or_else(StrategyRegistry::global);
        let strategy = strategies.for_adapter(introspection.adapter_name(), &config)?;

        check_column(model, table, &column, strategy.as_ref(), introspection)?;

        let columns = introspection.column_names(table);
        let conflicts: Vec<String> = self
            .fields
            .iter()
            .filter(|field| columns.contains(field))
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            return Err(TranslatableError::DatabaseColumnConflict {
                model: model.to_string(),
                columns: conflicts,
            });
        }

        let descriptor = SchemaDescriptor::new(model, table, self.fields, locales, column);
        let rules = self
            .rules
            .into_iter()
            .map(|(field, options, custom)| TranslationRule::compile(&field, options, custom, &descriptor))
            .collect::<TranslatableResult<Vec<_>>>()?;

        let schemas = self.schemas.unwrap_or_else(SchemaRegistry::global);
        let schema = schemas.register(descriptor)?;

        strategy.validate_index_recommendation(&schema, introspection);

        tracing::debug!(
            model,
            strategy = strategy.name(),
            "Registered translatable model {} ({} fields, locales: {})",
            model,
            schema.fields().len(),
            schema.locales().join(", ")
        );

        Ok(TranslatableModel {
            schema,
            strategy,
            config,
            views: self.views.unwrap_or_else(ViewGenerator::global),
            rules,
            _model: PhantomData,
        })
    }
}

fn check_column(
    model: &str,
    table: &str,
    column: &str,
    strategy: &dyn StorageStrategy,
    introspection: &dyn SchemaIntrospection,
) -> TranslatableResult<()> {
    let expected = strategy.expected_column_type();
    let matches = introspection
        .column_type(table, column)
        .map_or(false, |actual| actual.trim().eq_ignore_ascii_case(expected));

    if matches {
        Ok(())
    } else {
        Err(TranslatableError::MissingTranslationsColumn {
            model: model.to_string(),
            column: column.to_string(),
            column_type: strategy.column_type().to_string(),
            migration: strategy.migration_example(table, column),
        })
    }
}

/// A registered translatable model
pub struct TranslatableModel<M> {
    schema: Arc<SchemaDescriptor>,
    strategy: Arc<dyn StorageStrategy>,
    config: Arc<TranslatableConfig>,
    views: Arc<ViewGenerator>,
    rules: Vec<TranslationRule<M>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: TranslationAttributes> TranslatableModel<M> {
    pub fn builder<I, S>(fields: I) -> TranslatableBuilder<M>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TranslatableBuilder::new(fields.into_iter().map(Into::into).collect())
    }

    /// Registered descriptor for `M`, or `NotRegistered`
    pub fn lookup(registry: &SchemaRegistry) -> TranslatableResult<Arc<SchemaDescriptor>> {
        registry.require(M::model_name())
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn strategy(&self) -> &dyn StorageStrategy {
        self.strategy.as_ref()
    }

    pub fn config(&self) -> &TranslatableConfig {
        &self.config
    }

    pub fn column(&self) -> &str {
        self.schema.column()
    }

    pub fn rules(&self) -> &[TranslationRule<M>] {
        &self.rules
    }

    /// Add rules for `fields`; fails without adding anything if any field is undeclared
    pub fn validates_translation<I, S>(&mut self, fields: I, options: RuleOptions) -> TranslatableResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_rules(fields, options, None)
    }

    pub fn validates_translation_with<I, S>(
        &mut self,
        fields: I,
        options: RuleOptions,
        custom: CustomPredicate<M>,
    ) -> TranslatableResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_rules(fields, options, Some(custom))
    }

    /// Rules from JSON options, e.g. loaded from a settings file
    pub fn validates_translation_json<I, S>(&mut self, fields: I, options: &Value) -> TranslatableResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = RuleOptions::from_json(options)?;
        self.add_rules(fields, options, None)
    }

    fn add_rules<I, S>(
        &mut self,
        fields: I,
        options: RuleOptions,
        custom: Option<CustomPredicate<M>>,
    ) -> TranslatableResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let compiled = fields
            .into_iter()
            .map(|field| {
                let field: String = field.into();
                TranslationRule::compile(&field, options.clone(), custom.clone(), &self.schema)
            })
            .collect::<TranslatableResult<Vec<_>>>()?;
        self.rules.extend(compiled);
        Ok(self)
    }

    /// The record's column with every declared locale and field present
    pub fn normalized(&self, record: &M) -> TranslationColumn {
        normalize(record.translations(self.column()).cloned(), &self.schema)
    }

    /// Normalize the record's column in place
    pub fn materialize(&self, record: &mut M) {
        let normalized = self.normalized(record);
        record.write_translations(self.schema.column(), normalized);
    }

    /// Run the structural checks and every declared rule
    pub fn validate(&self, record: &M) -> ValidationResult<()> {
        let column = self.normalized(record);
        let mut errors = ValidationErrors::new();

        validate_structure(&column, &self.schema, &mut errors);
        validate_fields(&self.rules, record, &column, self.schema.column(), &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// View in the provider's default locale
    pub fn translate(&self, record: &M) -> TranslationView {
        let locale = self.config.locale_provider.default_locale();
        self.translate_for(record, &locale)
    }

    pub fn translate_for(&self, record: &M, locale: &str) -> TranslationView {
        let empty = TranslationColumn::new();
        let column = record.translations(self.schema.column()).unwrap_or(&empty);
        self.views.view(&self.schema, column, locale)
    }

    pub fn view_shape(&self) -> Arc<ViewShape> {
        self.views.shape_for(&self.schema)
    }

    /// Start a translation search; see [`WhereTranslations`]
    pub fn where_translations<I, K, V>(&self, attributes: I) -> WhereTranslations<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        WhereTranslations::new(&self.schema, self.strategy.as_ref(), attributes)
    }

    pub fn permit_list(&self) -> PermitList {
        self.schema.permit_list()
    }
}

impl<M> fmt::Debug for TranslatableModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatableModel")
            .field("schema", &self.schema)
            .field("strategy", &self.strategy.name())
            .field("rules", &self.rules)
            .finish()
    }
}
