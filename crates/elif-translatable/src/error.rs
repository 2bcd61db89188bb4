//! Error types for translatable models
//!
//! Everything here is a configuration or capability failure and is raised
//! immediately. Problems with stored translation data are not errors; they
//! are collected in [`elif_validation::ValidationErrors`].

use thiserror::Error;

pub type TranslatableResult<T> = Result<T, TranslatableError>;

#[derive(Debug, Error)]
pub enum TranslatableError {
    #[error("Model {model} is missing a '{column}' {column_type} column. Please add it via a migration:\n{migration}")]
    MissingTranslationsColumn {
        model: String,
        column: String,
        column_type: String,
        migration: String,
    },

    #[error("Model {model} must declare translatable fields. Example:\n{example}")]
    UndefinedTranslatableFields { model: String, example: String },

    #[error("Model {model} has database columns that conflict with translatable fields. Translatable fields should not exist as actual database columns.\n\nConflicting columns: {}", columns.join(", "))]
    DatabaseColumnConflict { model: String, columns: Vec<String> },

    #[error("Unsupported database adapter: {0}")]
    UnsupportedBackend(String),

    #[error("{capability} is not supported by the {strategy} storage strategy")]
    UnsupportedCapability {
        strategy: String,
        capability: String,
    },

    #[error("Field :{field} is not defined as translatable. Available translatable fields: {}", available.join(", "))]
    UndeclaredField {
        field: String,
        available: Vec<String>,
    },

    #[error("Invalid validation option(s): {}. Valid options are: {}", invalid.join(", "), valid.join(", "))]
    InvalidOption {
        invalid: Vec<String>,
        valid: Vec<String>,
    },

    #[error("Invalid value for validation option '{option}': {message}")]
    InvalidOptionValue { option: String, message: String },

    #[error("Invalid locale(s): {}. Available locales: {}", invalid.join(", "), available.join(", "))]
    InvalidLocale {
        invalid: Vec<String>,
        available: Vec<String>,
    },

    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Model {0} is already registered as translatable")]
    AlreadyRegistered(String),

    #[error("Model {0} has not been registered as translatable")]
    NotRegistered(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TranslatableError {
    pub fn unsupported_capability(strategy: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            strategy: strategy.into(),
            capability: capability.into(),
        }
    }

    pub fn invalid_identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_option_value(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOptionValue {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Errors raised while declaring a model, as opposed to while querying
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::UnsupportedCapability { .. } | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_lists_columns() {
        let err = TranslatableError::DatabaseColumnConflict {
            model: "Post".to_string(),
            columns: vec!["title".to_string(), "body".to_string()],
        };
        assert!(err.to_string().ends_with("Conflicting columns: title, body"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_capability_error_names_strategy() {
        let err = TranslatableError::unsupported_capability("sqlite (plain text)", "where_translations");
        assert_eq!(
            err.to_string(),
            "where_translations is not supported by the sqlite (plain text) storage strategy"
        );
        assert!(!err.is_configuration());
    }
}
