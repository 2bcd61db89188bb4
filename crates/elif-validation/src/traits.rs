//! Core validation traits

use crate::error::ValidationResult;
use serde_json::Value;

/// A rule applied to one value on behalf of an attribute
pub trait ValidationRule: Send + Sync {
    /// Validate a single value, reporting failures against `field`
    fn validate(&self, value: &Value, field: &str) -> ValidationResult<()>;

    /// Get the validation rule name/type
    fn rule_name(&self) -> &'static str;

    /// Rule configuration as JSON
    fn parameters(&self) -> Option<Value> {
        None
    }
}

/// Null, empty, or whitespace-only strings are blank
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(arr) => arr.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!("  \t\n")));
        assert!(is_blank(&json!([])));
        assert!(!is_blank(&json!("x")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
    }
}
