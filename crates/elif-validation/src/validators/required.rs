//! Presence rule

use crate::error::{codes, ValidationError, ValidationResult};
use crate::traits::{is_blank, ValidationRule};
use serde_json::Value;

/// Fails when the value is null, empty, or whitespace-only
#[derive(Debug, Clone, Default)]
pub struct RequiredValidator;

impl RequiredValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ValidationRule for RequiredValidator {
    fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        if !is_blank(value) {
            return Ok(());
        }

        Err(ValidationError::with_code(field, "can't be blank", codes::BLANK).into())
    }

    fn rule_name(&self) -> &'static str {
        "presence"
    }
}
