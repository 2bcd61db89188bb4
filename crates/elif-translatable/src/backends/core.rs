//! Core storage strategy trait and shared helpers

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Map, Value};

use super::DatabaseBackendType;
use crate::error::{TranslatableError, TranslatableResult};
use crate::query::Predicate;
use crate::schema::{SchemaDescriptor, SchemaIntrospection};
use crate::security::quote_identifier;

/// What a strategy can do with the embedded structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyCapabilities {
    /// Predicates can look inside the JSON document
    pub structured_query: bool,
    /// Case-sensitive searches use a native containment operator
    pub containment: bool,
}

/// Granularity of case-sensitive containment searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainmentMode {
    /// One disjunct per locale containing every searched attribute
    #[default]
    WholeMapping,
    /// One disjunct per locale and attribute
    PerField,
}

impl fmt::Display for ContainmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WholeMapping => write!(f, "whole_mapping"),
            Self::PerField => write!(f, "per_field"),
        }
    }
}

impl FromStr for ContainmentMode {
    type Err = TranslatableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whole_mapping" | "whole" | "mapping" => Ok(Self::WholeMapping),
            "per_field" | "field" => Ok(Self::PerField),
            other => Err(TranslatableError::Configuration(format!(
                "invalid containment mode '{}', expected whole_mapping or per_field",
                other
            ))),
        }
    }
}

/// How SQLite stores the translations column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteMode {
    /// JSON column queried through the JSON1 functions
    #[default]
    Json,
    /// Opaque text column with no structured query support
    PlainText,
}

impl fmt::Display for SqliteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::PlainText => write!(f, "plain_text"),
        }
    }
}

impl FromStr for SqliteMode {
    type Err = TranslatableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "json1" => Ok(Self::Json),
            "text" | "plain_text" | "plain" => Ok(Self::PlainText),
            other => Err(TranslatableError::Configuration(format!(
                "invalid sqlite mode '{}', expected json or plain_text",
                other
            ))),
        }
    }
}

/// Backend-specific knowledge of the translations column
pub trait StorageStrategy: Send + Sync + fmt::Debug {
    /// Human-readable strategy name used in messages
    fn name(&self) -> &'static str;

    fn backend_type(&self) -> DatabaseBackendType;

    /// Column type to declare in a migration
    fn column_type(&self) -> &'static str;

    /// Column type schema introspection is expected to report
    fn expected_column_type(&self) -> &'static str {
        self.column_type()
    }

    /// Migration snippet shown when the column is missing
    fn migration_example(&self, table: &str, column: &str) -> String;

    fn capabilities(&self) -> StrategyCapabilities;

    /// Build an OR of per-locale conditions matching `attributes`.
    ///
    /// `column` is the raw column name; implementations quote it.
    fn build_predicate(
        &self,
        column: &str,
        attributes: &[(String, String)],
        locales: &[String],
        case_sensitive: bool,
    ) -> TranslatableResult<Predicate>;

    /// One-time advisory about indexing; never fails
    fn validate_index_recommendation(
        &self,
        _schema: &SchemaDescriptor,
        _introspection: &dyn SchemaIntrospection,
    ) {
    }

    fn quote_column(&self, column: &str) -> String {
        quote_identifier(column, self.backend_type().identifier_quote())
    }
}

/// Set-once flag guarding a strategy's advisory
#[derive(Debug, Default)]
pub struct AdvisoryFlag(AtomicBool);

impl AdvisoryFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns true for exactly one caller
    pub fn claim(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// JSON path for `[locale][field]`, e.g. `$.en.title` or `$."pt-BR".title`
pub fn json_path(locale: &str, field: &str) -> String {
    format!("$.{}.{}", path_segment(locale), path_segment(field))
}

fn path_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    let plain = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        segment.to_string()
    } else {
        format!("\"{}\"", segment)
    }
}

/// JSON documents for containment searches, one per disjunct
pub fn containment_payloads(
    attributes: &[(String, String)],
    locales: &[String],
    mode: ContainmentMode,
) -> Vec<String> {
    match mode {
        ContainmentMode::WholeMapping => locales
            .iter()
            .map(|locale| containment_document(locale, attributes))
            .collect(),
        ContainmentMode::PerField => locales
            .iter()
            .flat_map(|locale| {
                attributes
                    .iter()
                    .map(move |attribute| containment_document(locale, std::slice::from_ref(attribute)))
            })
            .collect(),
    }
}

fn containment_document(locale: &str, attributes: &[(String, String)]) -> String {
    let fields: Map<String, Value> = attributes
        .iter()
        .map(|(field, value)| (field.clone(), Value::String(value.clone())))
        .collect();
    let mut root = Map::new();
    root.insert(locale.to_string(), Value::Object(fields));
    Value::Object(root).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_json_path() {
        assert_eq!(json_path("en", "title"), "$.en.title");
        assert_eq!(json_path("pt-BR", "title"), "$.\"pt-BR\".title");
        assert_eq!(json_path("en", "2nd_title"), "$.en.\"2nd_title\"");
    }

    #[test]
    fn test_whole_mapping_payloads() {
        let payloads = containment_payloads(
            &attrs(&[("title", "Hello"), ("content", "World")]),
            &["en".to_string(), "fr".to_string()],
            ContainmentMode::WholeMapping,
        );
        assert_eq!(
            payloads,
            vec![
                r#"{"en":{"content":"World","title":"Hello"}}"#.to_string(),
                r#"{"fr":{"content":"World","title":"Hello"}}"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_per_field_payloads() {
        let payloads = containment_payloads(
            &attrs(&[("title", "Hello"), ("content", "World")]),
            &["en".to_string()],
            ContainmentMode::PerField,
        );
        assert_eq!(
            payloads,
            vec![
                r#"{"en":{"title":"Hello"}}"#.to_string(),
                r#"{"en":{"content":"World"}}"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_advisory_flag_claims_once() {
        let flag = AdvisoryFlag::new();
        assert!(!flag.is_claimed());
        assert!(flag.claim());
        assert!(!flag.claim());
        assert!(flag.is_claimed());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("per_field".parse::<ContainmentMode>().unwrap(), ContainmentMode::PerField);
        assert_eq!("WHOLE_MAPPING".parse::<ContainmentMode>().unwrap(), ContainmentMode::WholeMapping);
        assert!("fuzzy".parse::<ContainmentMode>().is_err());
        assert_eq!("plain_text".parse::<SqliteMode>().unwrap(), SqliteMode::PlainText);
        assert_eq!("json1".parse::<SqliteMode>().unwrap(), SqliteMode::Json);
    }
}
