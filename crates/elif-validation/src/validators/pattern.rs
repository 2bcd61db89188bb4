//! Regular expression format rule

use crate::error::{codes, ValidationError, ValidationResult};
use crate::traits::{is_blank, ValidationRule};
use regex::Regex;
use serde_json::Value;

/// Fails when a present value does not match the pattern
///
/// Matching is a search anywhere in the value; anchor the expression
/// (`^...$`) to constrain the whole string.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    pattern: Regex,
}

impl PatternValidator {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl ValidationRule for PatternValidator {
    fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        if is_blank(value) {
            return Ok(());
        }

        let text = match value.as_str() {
            Some(text) => text,
            None => {
                return Err(ValidationError::with_code(
                    field,
                    "must be a string for format validation",
                    codes::INVALID_TYPE,
                )
                .into());
            }
        };

        if self.pattern.is_match(text) {
            return Ok(());
        }

        Err(ValidationError::with_code(field, "is invalid", codes::INVALID).into())
    }

    fn rule_name(&self) -> &'static str {
        "format"
    }

    fn parameters(&self) -> Option<Value> {
        Some(serde_json::json!({ "with": self.pattern.as_str() }))
    }
}
