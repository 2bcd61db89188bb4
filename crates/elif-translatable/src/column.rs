//! The structured translations column and its normalizer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::SchemaDescriptor;

/// Locale code -> field name -> string or null, as stored in one JSON column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationColumn(Map<String, Value>);

impl TranslationColumn {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a raw column value; SQL NULL reads as an empty mapping
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::new()),
            other => serde_json::from_value(other),
        }
    }

    /// Parse the text representation used by `json`/`text` columns
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw value stored for a locale (normally an object of fields)
    pub fn locale(&self, locale: &str) -> Option<&Value> {
        self.0.get(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Raw value at `[locale][field]`
    pub fn value(&self, locale: &str, field: &str) -> Option<&Value> {
        self.0.get(locale)?.as_object()?.get(field)
    }

    /// String value at `[locale][field]`; null and non-string values read as `None`
    pub fn get(&self, locale: &str, field: &str) -> Option<&str> {
        self.value(locale, field)?.as_str()
    }

    /// Write `[locale][field]`, creating the locale object if needed.
    /// A non-object locale entry is replaced.
    pub fn set(&mut self, locale: &str, field: &str, value: Option<impl Into<String>>) {
        let entry = self
            .0
            .entry(locale.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(fields) = entry {
            let value = value.map_or(Value::Null, |v| Value::String(v.into()));
            fields.insert(field.to_string(), value);
        }
    }

    /// Apply the normalizer for `schema`
    pub fn normalized(self, schema: &SchemaDescriptor) -> Self {
        normalize(Some(self), schema)
    }
}

impl From<Map<String, Value>> for TranslationColumn {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Ensure every declared locale and every declared field under it is present.
///
/// Missing or null locales become objects, missing fields become null.
/// Existing values and undeclared keys are left alone, and a locale holding a
/// non-object value is not touched; both are reported by the structural
/// validator instead.
pub fn normalize(column: Option<TranslationColumn>, schema: &SchemaDescriptor) -> TranslationColumn {
    normalize_with(column, schema.locales(), schema.fields())
}

pub(crate) fn normalize_with(
    column: Option<TranslationColumn>,
    locales: &[String],
    fields: &[String],
) -> TranslationColumn {
    let mut column = column.unwrap_or_default();

    for locale in locales {
        let entry = column
            .0
            .entry(locale.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }

        if let Value::Object(values) = entry {
            for field in fields {
                values.entry(field.clone()).or_insert(Value::Null);
            }
        }
    }

    column
}
