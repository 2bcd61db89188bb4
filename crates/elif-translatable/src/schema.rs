//! Per-model translation schema and the host's schema introspection surface

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{TranslatableError, TranslatableResult};

/// Declared fields, locales and column for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    model: String,
    table: String,
    fields: Vec<String>,
    locales: Vec<String>,
    column: String,
}

impl SchemaDescriptor {
    /// Build a descriptor; duplicate fields and locales are dropped, keeping first occurrence
    pub fn new<F, L, S, T>(
        model: impl Into<String>,
        table: impl Into<String>,
        fields: F,
        locales: L,
        column: impl Into<String>,
    ) -> Self
    where
        F: IntoIterator<Item = S>,
        S: Into<String>,
        L: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            model: model.into(),
            table: table.into(),
            fields: dedup(fields.into_iter().map(Into::into)),
            locales: dedup(locales.into_iter().map(Into::into)),
            column: column.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    /// Nested parameter shape accepted for the translations column
    pub fn permit_list(&self) -> PermitList {
        PermitList {
            column: self.column.clone(),
            locales: self
                .locales
                .iter()
                .map(|locale| (locale.clone(), self.fields.clone()))
                .collect(),
        }
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// `{column: {locale: [fields]}}`, for upstream parameter allowlisting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitList {
    pub column: String,
    pub locales: Vec<(String, Vec<String>)>,
}

impl PermitList {
    pub fn allows(&self, locale: &str, field: &str) -> bool {
        self.locales
            .iter()
            .any(|(l, fields)| l == locale && fields.iter().any(|f| f == field))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let locales: serde_json::Map<String, serde_json::Value> = self
            .locales
            .iter()
            .map(|(locale, fields)| (locale.clone(), serde_json::json!(fields)))
            .collect();
        serde_json::json!({ self.column.clone(): locales })
    }
}

impl Serialize for PermitList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Locales<'a>(&'a [(String, Vec<String>)]);

        impl Serialize for Locales<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (locale, fields) in self.0 {
                    map.serialize_entry(locale, fields)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.column, &Locales(&self.locales))?;
        map.end()
    }
}

/// A physical column as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// An index as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    /// Access method, e.g. `btree` or `gin`
    pub using: Option<String>,
}

impl IndexDefinition {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            using: None,
        }
    }

    pub fn using(mut self, method: impl Into<String>) -> Self {
        self.using = Some(method.into());
        self
    }
}

/// Schema metadata provided by the host persistence layer
pub trait SchemaIntrospection: Send + Sync {
    /// Adapter name used to pick a storage strategy, e.g. `PostgreSQL`
    fn adapter_name(&self) -> &str;

    fn columns(&self, table: &str) -> Vec<ColumnDefinition>;

    fn indexes(&self, _table: &str) -> Vec<IndexDefinition> {
        Vec::new()
    }

    fn column_names(&self, table: &str) -> Vec<String> {
        self.columns(table).into_iter().map(|c| c.name).collect()
    }

    fn column_type(&self, table: &str, column: &str) -> Option<String> {
        self.columns(table)
            .into_iter()
            .find(|c| c.name == column)
            .map(|c| c.sql_type)
    }
}

/// Fixed in-memory schema, for hosts with static metadata and for tests
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    adapter: String,
    columns: HashMap<String, Vec<ColumnDefinition>>,
    indexes: HashMap<String, Vec<IndexDefinition>>,
}

impl StaticSchema {
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            ..Self::default()
        }
    }

    pub fn column(mut self, table: &str, name: &str, sql_type: &str) -> Self {
        self.columns
            .entry(table.to_string())
            .or_default()
            .push(ColumnDefinition::new(name, sql_type));
        self
    }

    pub fn index(mut self, table: &str, index: IndexDefinition) -> Self {
        self.indexes.entry(table.to_string()).or_default().push(index);
        self
    }
}

impl SchemaIntrospection for StaticSchema {
    fn adapter_name(&self) -> &str {
        &self.adapter
    }

    fn columns(&self, table: &str) -> Vec<ColumnDefinition> {
        self.columns.get(table).cloned().unwrap_or_default()
    }

    fn indexes(&self, table: &str) -> Vec<IndexDefinition> {
        self.indexes.get(table).cloned().unwrap_or_default()
    }
}

static GLOBAL_SCHEMAS: Lazy<Arc<SchemaRegistry>> = Lazy::new(|| Arc::new(SchemaRegistry::new()));

/// Registered translation schemas keyed by model name
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, Arc<SchemaDescriptor>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new(),
        }
    }

    /// Process-wide registry
    pub fn global() -> Arc<SchemaRegistry> {
        GLOBAL_SCHEMAS.clone()
    }

    /// Register a descriptor; each model can be registered once
    pub fn register(&self, descriptor: SchemaDescriptor) -> TranslatableResult<Arc<SchemaDescriptor>> {
        match self.schemas.entry(descriptor.model().to_string()) {
            Entry::Occupied(_) => Err(TranslatableError::AlreadyRegistered(descriptor.model().to_string())),
            Entry::Vacant(vacant) => {
                let descriptor = Arc::new(descriptor);
                vacant.insert(descriptor.clone());
                Ok(descriptor)
            }
        }
    }

    pub fn get(&self, model: &str) -> Option<Arc<SchemaDescriptor>> {
        self.schemas.get(model).map(|entry| entry.value().clone())
    }

    /// Like [`get`](Self::get) but a missing model is an error
    pub fn require(&self, model: &str) -> TranslatableResult<Arc<SchemaDescriptor>> {
        self.get(model)
            .ok_or_else(|| TranslatableError::NotRegistered(model.to_string()))
    }

    pub fn is_registered(&self, model: &str) -> bool {
        self.schemas.contains_key(model)
    }

    pub fn model_names(&self) -> Vec<String> {
        self.schemas.iter().map(|entry| entry.key().clone()).collect()
    }
}
