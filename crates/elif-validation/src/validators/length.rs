//! Length bounds for string values

use crate::error::{codes, ValidationError, ValidationErrors, ValidationResult};
use crate::traits::{is_blank, ValidationRule};
use serde_json::Value;

/// Minimum/maximum character counts (inclusive)
///
/// Blank values are skipped; pair with [`RequiredValidator`](crate::RequiredValidator)
/// to reject them. Both bounds are checked independently, so a value can
/// collect a `too_short` and a `too_long` error when the bounds overlap.
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LengthValidator {
    pub fn new() -> Self {
        Self { min: None, max: None }
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    fn too_short(field: &str, min: usize) -> ValidationError {
        ValidationError::with_code(
            field,
            format!("is too short (minimum is {} characters)", min),
            codes::TOO_SHORT,
        )
        .context(serde_json::json!({ "count": min }))
    }

    fn too_long(field: &str, max: usize) -> ValidationError {
        ValidationError::with_code(
            field,
            format!("is too long (maximum is {} characters)", max),
            codes::TOO_LONG,
        )
        .context(serde_json::json!({ "count": max }))
    }
}

impl ValidationRule for LengthValidator {
    fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        if is_blank(value) {
            return Ok(());
        }

        let length = match value.as_str() {
            Some(text) => text.chars().count(),
            None => {
                return Err(ValidationError::with_code(
                    field,
                    "must be a string for length validation",
                    codes::INVALID_TYPE,
                )
                .into());
            }
        };

        let mut errors = ValidationErrors::new();
        if let Some(min) = self.min {
            if length < min {
                errors.add(Self::too_short(field, min));
            }
        }
        if let Some(max) = self.max {
            if length > max {
                errors.add(Self::too_long(field, max));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }

    fn parameters(&self) -> Option<Value> {
        let mut params = serde_json::Map::new();
        if let Some(min) = self.min {
            params.insert("minimum".to_string(), Value::from(min));
        }
        if let Some(max) = self.max {
            params.insert("maximum".to_string(), Value::from(max));
        }

        if params.is_empty() {
            None
        } else {
            Some(Value::Object(params))
        }
    }
}
