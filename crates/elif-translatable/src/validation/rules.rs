//! Declarative per-field, per-locale rules

use std::fmt;
use std::sync::Arc;

use elif_validation::{
    LengthValidator, PatternValidator, RequiredValidator, ValidationErrors, ValidationRule,
};
use serde_json::Value;

use crate::column::TranslationColumn;
use crate::error::{TranslatableError, TranslatableResult};
use crate::schema::SchemaDescriptor;

/// Option keys accepted by [`RuleOptions::from_json`]
pub const VALID_OPTIONS: &[&str] = &["presence", "length", "format", "locales"];

/// Custom check run before the built-in rules.
///
/// Receives the record, locale, field and the stored string (if any), and
/// records failures directly.
pub type CustomPredicate<M> =
    Arc<dyn Fn(&M, &str, &str, Option<&str>, &mut ValidationErrors) + Send + Sync>;

/// Options for one `validates_translation` declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOptions {
    pub presence: bool,
    pub minimum: Option<usize>,
    pub maximum: Option<usize>,
    pub format: Option<String>,
    /// Restrict the rule to these locales; `None` means every declared locale
    pub locales: Option<Vec<String>>,
}

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presence(mut self) -> Self {
        self.presence = true;
        self
    }

    pub fn minimum(mut self, minimum: usize) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: usize) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn length_between(self, minimum: usize, maximum: usize) -> Self {
        self.minimum(minimum).maximum(maximum)
    }

    pub fn format(mut self, pattern: &str) -> Self {
        self.format = Some(pattern.to_string());
        self
    }

    pub fn locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = Some(locales.into_iter().map(Into::into).collect());
        self
    }

    /// Parse options from JSON, e.g.
    /// `{"presence": true, "length": {"minimum": 3}, "format": {"with": "^[A-Z]"}, "locales": ["en"]}`
    pub fn from_json(options: &Value) -> TranslatableResult<Self> {
        let map = options
            .as_object()
            .ok_or_else(|| TranslatableError::invalid_option_value("options", "expected a JSON object"))?;

        let mut invalid: Vec<String> = map
            .keys()
            .filter(|key| !VALID_OPTIONS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            invalid.sort();
            return Err(TranslatableError::InvalidOption {
                invalid,
                valid: VALID_OPTIONS.iter().map(|o| o.to_string()).collect(),
            });
        }

        let mut parsed = Self::new();

        if let Some(presence) = map.get("presence") {
            parsed.presence = presence
                .as_bool()
                .ok_or_else(|| TranslatableError::invalid_option_value("presence", "expected true or false"))?;
        }

        if let Some(length) = map.get("length") {
            let length = length
                .as_object()
                .ok_or_else(|| TranslatableError::invalid_option_value("length", "expected an object"))?;
            for (key, value) in length {
                let bound = value.as_u64().map(|n| n as usize).ok_or_else(|| {
                    TranslatableError::invalid_option_value("length", format!("{} must be a non-negative integer", key))
                })?;
                match key.as_str() {
                    "minimum" => parsed.minimum = Some(bound),
                    "maximum" => parsed.maximum = Some(bound),
                    other => {
                        return Err(TranslatableError::invalid_option_value(
                            "length",
                            format!("unknown key '{}', expected minimum or maximum", other),
                        ))
                    }
                }
            }
        }

        if let Some(format) = map.get("format") {
            let pattern = match format {
                Value::String(pattern) => Some(pattern.as_str()),
                Value::Object(inner) => inner.get("with").and_then(Value::as_str),
                _ => None,
            };
            let pattern = pattern.ok_or_else(|| {
                TranslatableError::invalid_option_value("format", "expected a pattern or {\"with\": pattern}")
            })?;
            parsed.format = Some(pattern.to_string());
        }

        if let Some(locales) = map.get("locales") {
            let locales = match locales {
                Value::String(locale) => vec![locale.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        TranslatableError::invalid_option_value("locales", "expected a list of locale codes")
                    })?,
                _ => {
                    return Err(TranslatableError::invalid_option_value(
                        "locales",
                        "expected a locale code or a list of locale codes",
                    ))
                }
            };
            parsed.locales = Some(locales);
        }

        Ok(parsed)
    }
}

/// A compiled rule for one field
pub struct TranslationRule<M> {
    field: String,
    locales: Vec<String>,
    presence: Option<RequiredValidator>,
    length: Option<LengthValidator>,
    format: Option<PatternValidator>,
    custom: Option<CustomPredicate<M>>,
}

impl<M> TranslationRule<M> {
    /// Check the options against the schema and compile them
    pub fn compile(
        field: &str,
        options: RuleOptions,
        custom: Option<CustomPredicate<M>>,
        schema: &SchemaDescriptor,
    ) -> TranslatableResult<Self> {
        if !schema.has_field(field) {
            return Err(TranslatableError::UndeclaredField {
                field: field.to_string(),
                available: schema.fields().to_vec(),
            });
        }

        let locales = match options.locales {
            Some(locales) if !locales.is_empty() => {
                let invalid: Vec<String> = locales
                    .iter()
                    .filter(|locale| !schema.has_locale(locale))
                    .cloned()
                    .collect();
                if !invalid.is_empty() {
                    return Err(TranslatableError::InvalidLocale {
                        invalid,
                        available: schema.locales().to_vec(),
                    });
                }
                locales
            }
            _ => schema.locales().to_vec(),
        };

        if let (Some(min), Some(max)) = (options.minimum, options.maximum) {
            if min > max {
                return Err(TranslatableError::invalid_option_value(
                    "length",
                    format!("minimum ({}) is greater than maximum ({})", min, max),
                ));
            }
        }

        let length = match (options.minimum, options.maximum) {
            (None, None) => None,
            (min, max) => {
                let mut validator = LengthValidator::new();
                if let Some(min) = min {
                    validator = validator.min(min);
                }
                if let Some(max) = max {
                    validator = validator.max(max);
                }
                Some(validator)
            }
        };

        let format = match options.format {
            Some(pattern) => Some(
                PatternValidator::new(&pattern)
                    .map_err(|e| TranslatableError::invalid_option_value("format", e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            field: field.to_string(),
            locales,
            presence: options.presence.then(RequiredValidator::new),
            length,
            format,
            custom,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// Names of the checks this rule runs, in order
    pub fn checks(&self) -> Vec<&'static str> {
        let mut checks = Vec::new();
        if self.custom.is_some() {
            checks.push("custom");
        }
        let builtin: [Option<&dyn ValidationRule>; 3] = [
            self.presence.as_ref().map(|v| v as &dyn ValidationRule),
            self.length.as_ref().map(|v| v as &dyn ValidationRule),
            self.format.as_ref().map(|v| v as &dyn ValidationRule),
        ];
        checks.extend(builtin.iter().flatten().map(|rule| rule.rule_name()));
        checks
    }

    /// Run every check for every locale, recording failures against `attribute`
    pub fn apply(&self, record: &M, column: &TranslationColumn, attribute: &str, errors: &mut ValidationErrors) {
        for locale in &self.locales {
            let value = column.value(locale, &self.field).cloned().unwrap_or(Value::Null);
            let key = format!("{}.{}.{}", attribute, locale, self.field);

            if let Some(custom) = &self.custom {
                custom(record, locale, &self.field, value.as_str(), errors);
            }

            if let Some(presence) = &self.presence {
                record_failures(presence.validate(&value, attribute), &key, errors);
            }

            // Non-string values are reported by the structural validator
            if !value.is_string() {
                continue;
            }

            if let Some(length) = &self.length {
                record_failures(length.validate(&value, attribute), &key, errors);
            }

            if let Some(format) = &self.format {
                record_failures(format.validate(&value, attribute), &key, errors);
            }
        }
    }
}

fn record_failures(result: Result<(), ValidationErrors>, key: &str, errors: &mut ValidationErrors) {
    if let Err(failures) = result {
        for failure in failures.into_vec() {
            errors.add(failure.translation_key(key));
        }
    }
}

impl<M> fmt::Debug for TranslationRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationRule")
            .field("field", &self.field)
            .field("locales", &self.locales)
            .field("checks", &self.checks())
            .finish()
    }
}

/// Run every rule in declaration order
pub fn validate_fields<M>(
    rules: &[TranslationRule<M>],
    record: &M,
    column: &TranslationColumn,
    attribute: &str,
    errors: &mut ValidationErrors,
) {
    for rule in rules {
        rule.apply(record, column, attribute, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elif_validation::codes;
    use serde_json::json;

    struct Post;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("Post", "posts", ["title", "content"], ["en", "fr"], "translations")
    }

    fn run(rule: &TranslationRule<Post>, value: Value) -> ValidationErrors {
        let column = TranslationColumn::from_value(value).unwrap();
        let mut errors = ValidationErrors::new();
        rule.apply(&Post, &column, "translations", &mut errors);
        errors
    }

    fn en_title(value: Value) -> Value {
        json!({ "en": { "title": value } })
    }

    #[test]
    fn test_presence_blank_yields_one_keyed_error() {
        let rule = TranslationRule::compile("title", RuleOptions::new().presence().locales(["en"]), None, &schema()).unwrap();

        for blank in [Value::Null, json!(""), json!("   ")] {
            let errors = run(&rule, en_title(blank));
            assert_eq!(errors.total_errors(), 1);
            let keyed = errors.for_translation_key("translations.en.title");
            assert_eq!(keyed.len(), 1);
            assert_eq!(keyed[0].code, codes::BLANK);
        }

        assert!(run(&rule, en_title(json!("Hello"))).is_empty());
    }

    #[test]
    fn test_length_bounds() {
        let rule =
            TranslationRule::compile("title", RuleOptions::new().length_between(3, 10).locales(["en"]), None, &schema())
                .unwrap();

        let short = run(&rule, en_title(json!("ab")));
        assert_eq!(short.iter().next().unwrap().code, codes::TOO_SHORT);
        assert_eq!(short.iter().next().unwrap().count(), Some(3));

        let long = run(&rule, en_title(json!("abcdefghijk")));
        assert_eq!(long.iter().next().unwrap().code, codes::TOO_LONG);
        assert_eq!(long.iter().next().unwrap().count(), Some(10));

        assert!(run(&rule, en_title(json!("abcde"))).is_empty());
        // blank values are left to the presence rule
        assert!(run(&rule, en_title(json!(""))).is_empty());
        // characters, not bytes
        assert!(run(&rule, en_title(json!("ééé"))).is_empty());
    }

    #[test]
    fn test_format_searches_anywhere() {
        let rule = TranslationRule::compile("title", RuleOptions::new().format("[0-9]"), None, &schema()).unwrap();

        let errors = run(&rule, json!({ "en": { "title": "Post 1" }, "fr": { "title": "Sans chiffre" } }));
        assert_eq!(errors.total_errors(), 1);
        assert_eq!(errors.for_translation_key("translations.fr.title")[0].code, codes::INVALID);
    }

    #[test]
    fn test_rule_defaults_to_all_locales() {
        let rule = TranslationRule::<Post>::compile("title", RuleOptions::new().presence(), None, &schema()).unwrap();
        assert_eq!(rule.locales(), ["en", "fr"]);
        assert_eq!(run(&rule, json!({})).total_errors(), 2);
    }

    #[test]
    fn test_checks_run_in_order_without_short_circuit() {
        let custom: CustomPredicate<Post> = Arc::new(
            |_: &Post, locale: &str, field: &str, value: Option<&str>, errors: &mut ValidationErrors| {
                if value.is_none() {
                    errors.add(
                        elif_validation::ValidationError::with_code("translations", "custom", "custom")
                            .translation_key(format!("translations.{}.{}", locale, field)),
                    );
                }
            },
        );
        let rule = TranslationRule::compile(
            "title",
            RuleOptions::new().presence().minimum(2).locales(["en"]),
            Some(custom),
            &schema(),
        )
        .unwrap();

        assert_eq!(rule.checks(), vec!["custom", "presence", "length"]);
        let order: Vec<String> = run(&rule, json!({})).into_vec().into_iter().map(|e| e.code).collect();
        assert_eq!(order, vec!["custom", "blank"]);
    }

    #[test]
    fn test_compile_rejects_bad_declarations() {
        let schema = schema();
        assert!(matches!(
            TranslationRule::<Post>::compile("summary", RuleOptions::new(), None, &schema).unwrap_err(),
            TranslatableError::UndeclaredField { .. }
        ));
        assert!(matches!(
            TranslationRule::<Post>::compile("title", RuleOptions::new().locales(["de"]), None, &schema).unwrap_err(),
            TranslatableError::InvalidLocale { ref invalid, .. } if invalid == &vec!["de".to_string()]
        ));
        assert!(matches!(
            TranslationRule::<Post>::compile("title", RuleOptions::new().format("(unclosed"), None, &schema).unwrap_err(),
            TranslatableError::InvalidOptionValue { ref option, .. } if option == "format"
        ));
        assert!(TranslationRule::<Post>::compile("title", RuleOptions::new().length_between(5, 2), None, &schema).is_err());
    }

    #[test]
    fn test_options_from_json() {
        let options = RuleOptions::from_json(&json!({
            "presence": true,
            "length": { "minimum": 3, "maximum": 100 },
            "format": { "with": "^[A-Z]" },
            "locales": ["en"]
        }))
        .unwrap();

        assert_eq!(
            options,
            RuleOptions::new().presence().length_between(3, 100).format("^[A-Z]").locales(["en"])
        );
        assert_eq!(RuleOptions::from_json(&json!({ "locales": "fr" })).unwrap().locales, Some(vec!["fr".to_string()]));
    }

    #[test]
    fn test_unknown_option_keys_are_rejected() {
        let err = RuleOptions::from_json(&json!({ "presense": true, "uniqueness": true })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid validation option(s): presense, uniqueness. Valid options are: presence, length, format, locales"
        );
        assert!(RuleOptions::from_json(&json!({ "length": { "between": 3 } })).is_err());
        assert!(RuleOptions::from_json(&json!({ "presence": "yes" })).is_err());
    }
}
