//! Validation error types and collection

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// Error codes shared by the built-in rules
pub mod codes {
    pub const BLANK: &str = "blank";
    pub const TOO_SHORT: &str = "too_short";
    pub const TOO_LONG: &str = "too_long";
    pub const INVALID: &str = "invalid";
    pub const INVALID_TYPE: &str = "invalid_type";
    pub const INVALID_LOCALE: &str = "invalid_locale";
    pub const INVALID_FIELD: &str = "invalid_field";
}

/// A single failure recorded against an attribute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// The attribute that failed validation (the translations column)
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Nested message key, e.g. `translations.en.title`
    pub translation_key: Option<String>,
    /// Extra interpolation values such as `{"count": 3}`
    pub context: Option<serde_json::Value>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: "validation_failed".to_string(),
            translation_key: None,
            context: None,
        }
    }

    /// Create a validation error with a specific code
    pub fn with_code(field: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
            translation_key: None,
            context: None,
        }
    }

    /// Attach the nested translation key
    pub fn translation_key(mut self, key: impl Into<String>) -> Self {
        self.translation_key = Some(key.into());
        self
    }

    /// Set additional context
    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// The `count` interpolation value, when present
    pub fn count(&self) -> Option<u64> {
        self.context.as_ref()?.get("count")?.as_u64()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.translation_key {
            Some(key) => write!(f, "{} {}", key, self.message),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

/// Errors collected during one validation pass, grouped by attribute
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub struct ValidationErrors {
    pub errors: HashMap<String, Vec<ValidationError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self {
            errors: HashMap::new(),
        }
    }

    /// Add a single validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors
            .entry(error.field.clone())
            .or_default()
            .push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of attributes with errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Total number of errors across all attributes
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|v| v.len()).sum()
    }

    pub fn get_field_errors(&self, field: &str) -> Option<&Vec<ValidationError>> {
        self.errors.get(field)
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.get(field).map_or(false, |errors| !errors.is_empty())
    }

    /// Errors carrying the given translation key
    pub fn for_translation_key(&self, key: &str) -> Vec<&ValidationError> {
        self.iter()
            .filter(|error| error.translation_key.as_deref() == Some(key))
            .collect()
    }

    /// Iterate over every recorded error
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.values().flatten()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors.into_values().flatten().collect()
    }

    pub fn from_error(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}

impl Default for ValidationErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "No validation errors")
        } else {
            write!(f, "Validation failed for {} field(s):", self.errors.len())?;
            for error in self.iter() {
                write!(f, "\n  {}", error)?;
            }
            Ok(())
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_key_lookup() {
        let mut errors = ValidationErrors::new();
        errors.add(
            ValidationError::with_code("translations", "can't be blank", codes::BLANK)
                .translation_key("translations.en.title"),
        );
        errors.add(
            ValidationError::with_code("translations", "is invalid", codes::INVALID)
                .translation_key("translations.fr.title"),
        );

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.total_errors(), 2);

        let en = errors.for_translation_key("translations.en.title");
        assert_eq!(en.len(), 1);
        assert_eq!(en[0].code, codes::BLANK);
        assert!(errors.for_translation_key("translations.de.title").is_empty());
    }

    #[test]
    fn test_count_context() {
        let error = ValidationError::with_code("translations", "is too short", codes::TOO_SHORT)
            .context(serde_json::json!({ "count": 3 }));
        assert_eq!(error.count(), Some(3));
        assert_eq!(ValidationError::new("a", "b").count(), None);
    }

    #[test]
    fn test_display_prefers_translation_key() {
        let error = ValidationError::new("translations", "is invalid")
            .translation_key("translations.en.slug");
        assert_eq!(error.to_string(), "translations.en.slug is invalid");
    }
}
