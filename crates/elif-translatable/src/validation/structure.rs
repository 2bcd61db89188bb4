//! Structural checks on the stored mapping

use elif_validation::{codes, ValidationError, ValidationErrors};
use serde_json::Value;

use crate::column::TranslationColumn;
use crate::schema::SchemaDescriptor;

/// Record every undeclared locale or field, and every value of the wrong
/// shape, against the translations column. An empty mapping is valid.
pub fn validate_structure(column: &TranslationColumn, schema: &SchemaDescriptor, errors: &mut ValidationErrors) {
    let attribute = schema.column();

    for (locale, entry) in column.as_map() {
        let declared = schema.has_locale(locale);
        if !declared {
            errors.add(ValidationError::with_code(
                attribute,
                format!("contains invalid locale: {}", locale),
                codes::INVALID_LOCALE,
            ));
        }

        let fields = match entry {
            Value::Object(fields) => fields,
            Value::Null => continue,
            _ if !declared => continue,
            _ => {
                errors.add(ValidationError::with_code(
                    attribute,
                    format!("contains a non-object value for locale {}", locale),
                    codes::INVALID_TYPE,
                ));
                continue;
            }
        };

        for (field, value) in fields {
            let key = format!("{}.{}.{}", attribute, locale, field);
            if !schema.has_field(field) {
                errors.add(
                    ValidationError::with_code(
                        attribute,
                        format!("contains invalid field: {} for locale {}", field, locale),
                        codes::INVALID_FIELD,
                    )
                    .translation_key(key),
                );
            } else if !matches!(value, Value::String(_) | Value::Null) {
                errors.add(
                    ValidationError::with_code(
                        attribute,
                        format!("contains a non-string value for {} in locale {}", field, locale),
                        codes::INVALID_TYPE,
                    )
                    .translation_key(key),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("Post", "posts", ["title", "content"], ["en", "fr"], "translations")
    }

    fn check(value: Value) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validate_structure(&TranslationColumn::from_value(value).unwrap(), &schema(), &mut errors);
        errors
    }

    #[test]
    fn test_declared_only_mapping_is_valid() {
        assert!(check(json!({})).is_empty());
        assert!(check(json!({ "en": { "title": "Hi", "content": null }, "fr": null })).is_empty());
    }

    #[test]
    fn test_reports_invalid_locale() {
        let errors = check(json!({ "en": { "title": "Hi" }, "de": { "title": "Hallo" } }));
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["contains invalid locale: de"]);
        assert_eq!(errors.iter().next().unwrap().code, codes::INVALID_LOCALE);
    }

    #[test]
    fn test_fields_under_invalid_locale_are_checked() {
        let schema = SchemaDescriptor::new("Post", "posts", ["title"], ["en"], "translations");
        let column = TranslationColumn::from_value(json!({
            "de": { "summary": "x", "body": "y", "title": "Hallo" }
        }))
        .unwrap();
        let mut errors = ValidationErrors::new();
        validate_structure(&column, &schema, &mut errors);

        let mut messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        messages.sort();
        assert_eq!(
            messages,
            vec![
                "contains invalid field: body for locale de",
                "contains invalid field: summary for locale de",
                "contains invalid locale: de",
            ]
        );
        assert_eq!(errors.for_translation_key("translations.de.summary")[0].code, codes::INVALID_FIELD);
    }

    #[test]
    fn test_collects_every_violation() {
        let errors = check(json!({
            "de": {},
            "xx": {},
            "en": { "summary": "x", "title": 5 },
            "fr": "Bonjour"
        }));

        assert_eq!(errors.total_errors(), 5);
        assert!(errors.has_field_errors("translations"));
        let invalid_field = errors.for_translation_key("translations.en.summary");
        assert_eq!(invalid_field[0].message, "contains invalid field: summary for locale en");
        assert_eq!(errors.for_translation_key("translations.en.title")[0].code, codes::INVALID_TYPE);
    }
}
