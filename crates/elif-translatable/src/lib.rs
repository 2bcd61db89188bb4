//! # elif-translatable: translated fields in one JSON column
//!
//! A model declares a fixed set of translatable fields and locales, and keeps
//! every translation in a single structured column shaped
//! `{locale: {field: string | null}}`. This crate normalizes that column,
//! validates it, projects per-locale read views, and builds search predicates
//! in the JSON dialect of PostgreSQL, MySQL or SQLite.
//!
//! ```ignore
//! let posts = TranslatableModel::<Post>::builder(["title", "content"])
//!     .locales(["en", "fr"])
//!     .validates_translation(["title"], RuleOptions::new().presence().locales(["en"]))
//!     .register(&schema)?;
//!
//! let scope = posts.where_translations([("title", "hello")]).locale("en").build()?;
//! let (sql, binds) = scope.to_sql_with_params();
//! ```

pub mod backends;
pub mod column;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod schema;
pub mod security;
pub mod validation;
pub mod view;

pub use backends::{
    ContainmentMode, DatabaseBackendType, MySqlStrategy, PlainTextStrategy, PostgresStrategy,
    SqliteJsonStrategy, SqliteMode, StorageStrategy, StrategyCapabilities, StrategyRegistry,
};
pub use column::{normalize, TranslationColumn};
pub use config::{LocaleProvider, StaticLocales, TranslatableConfig};
pub use error::{TranslatableError, TranslatableResult};
pub use model::{TranslatableBuilder, TranslatableModel, TranslationAttributes};
pub use query::{Predicate, TranslationScope, WhereTranslations};
pub use schema::{
    ColumnDefinition, IndexDefinition, PermitList, SchemaDescriptor, SchemaIntrospection,
    SchemaRegistry, StaticSchema,
};
pub use validation::{CustomPredicate, RuleOptions, TranslationRule};
pub use view::{TranslationView, ViewGenerator, ViewShape};

pub use elif_validation::{ValidationError, ValidationErrors};
