//! Translation search predicates

use serde_json::Value;

use crate::backends::StorageStrategy;
use crate::error::TranslatableResult;
use crate::schema::SchemaDescriptor;
use crate::security::validate_path_segment;

/// SQL fragment with `?` placeholders and its positional bind values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub sql: String,
    pub binds: Vec<String>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, binds: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }

    /// A predicate that matches no rows
    pub fn none() -> Self {
        Self::new("1 = 0", Vec::new())
    }

    /// Rewrite `?` placeholders as `$n`, numbering from `offset + 1`
    pub fn numbered(&self, offset: usize) -> String {
        let mut sql = String::with_capacity(self.sql.len() + self.binds.len() * 2);
        let mut index = offset;
        for c in self.sql.chars() {
            if c == '?' {
                index += 1;
                sql.push('$');
                sql.push_str(&index.to_string());
            } else {
                sql.push(c);
            }
        }
        sql
    }

    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }

    /// Generate SQL with parameters, matching the query builder's output shape
    pub fn to_sql_with_params(&self) -> (String, Vec<String>) {
        (self.sql.clone(), self.binds.clone())
    }
}

/// Accumulates OR-ed conditions for a strategy
#[derive(Debug, Default)]
pub struct Disjunction {
    conditions: Vec<String>,
    binds: Vec<String>,
}

impl Disjunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<I, S>(&mut self, condition: impl Into<String>, binds: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.push(condition.into());
        self.binds.extend(binds.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn into_predicate(self) -> Predicate {
        if self.conditions.is_empty() {
            return Predicate::none();
        }
        Predicate::new(format!("({})", self.conditions.join(" OR ")), self.binds)
    }
}

/// Result of a translation search, ready to be AND-ed into a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationScope {
    /// Nothing can match; hosts may skip the query entirely
    None,
    Where(Predicate),
}

impl TranslationScope {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            Self::None => None,
            Self::Where(predicate) => Some(predicate),
        }
    }

    pub fn to_sql_with_params(&self) -> (String, Vec<String>) {
        match self {
            Self::None => Predicate::none().to_sql_with_params(),
            Self::Where(predicate) => predicate.to_sql_with_params(),
        }
    }
}

/// Builder for `where_translations` searches
#[derive(Debug)]
pub struct WhereTranslations<'a> {
    schema: &'a SchemaDescriptor,
    strategy: &'a dyn StorageStrategy,
    attributes: Vec<(String, String)>,
    locales: Vec<String>,
    case_sensitive: bool,
}

impl<'a> WhereTranslations<'a> {
    pub fn new<I, K, V>(schema: &'a SchemaDescriptor, strategy: &'a dyn StorageStrategy, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            schema,
            strategy,
            attributes: attributes
                .into_iter()
                .map(|(field, value)| (field.into(), bind_text(value.into())))
                .collect(),
            locales: Vec::new(),
            case_sensitive: false,
        }
    }

    /// Restrict the search to these locales; an empty list searches all declared locales
    pub fn locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.locales([locale.into()])
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn build(self) -> TranslatableResult<TranslationScope> {
        if self.attributes.is_empty() {
            return Ok(TranslationScope::None);
        }

        let locales = if self.locales.is_empty() {
            self.schema.locales().to_vec()
        } else {
            self.locales
        };

        for segment in locales.iter().chain(self.attributes.iter().map(|(field, _)| field)) {
            validate_path_segment(segment)?;
        }

        let predicate = self.strategy.build_predicate(
            self.schema.column(),
            &self.attributes,
            &locales,
            self.case_sensitive,
        )?;

        Ok(TranslationScope::Where(predicate))
    }
}

/// Text bound for a search value; null binds as the empty string
fn bind_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
