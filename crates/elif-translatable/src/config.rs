//! Engine configuration and the locale provider seam

use std::env;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::backends::{ContainmentMode, SqliteMode};
use crate::error::{TranslatableError, TranslatableResult};
use crate::security::validate_identifier;

/// Source of the locales a model supports by default and the locale used
/// when a view is requested without one
pub trait LocaleProvider: Send + Sync + Debug {
    fn available_locales(&self) -> Vec<String>;

    fn default_locale(&self) -> String;
}

/// Fixed locale list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticLocales {
    available: Vec<String>,
    default: String,
}

impl StaticLocales {
    /// The first locale is the default; an empty list falls back to `en`
    pub fn new<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let available: Vec<String> = locales.into_iter().map(Into::into).collect();
        let available = if available.is_empty() {
            vec!["en".to_string()]
        } else {
            available
        };
        let default = available[0].clone();
        Self { available, default }
    }

    pub fn with_default(mut self, locale: impl Into<String>) -> Self {
        self.default = locale.into();
        self
    }
}

impl Default for StaticLocales {
    fn default() -> Self {
        Self::new(["en"])
    }
}

impl LocaleProvider for StaticLocales {
    fn available_locales(&self) -> Vec<String> {
        self.available.clone()
    }

    fn default_locale(&self) -> String {
        self.default.clone()
    }
}

/// Translatable engine configuration
#[derive(Debug, Clone)]
pub struct TranslatableConfig {
    pub default_column_name: String,
    pub sqlite_mode: SqliteMode,
    pub containment_mode: ContainmentMode,
    pub locale_provider: Arc<dyn LocaleProvider>,
}

impl TranslatableConfig {
    pub fn new() -> Self {
        Self {
            default_column_name: "translations".to_string(),
            sqlite_mode: SqliteMode::default(),
            containment_mode: ContainmentMode::default(),
            locale_provider: Arc::new(StaticLocales::default()),
        }
    }

    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locale_provider = Arc::new(StaticLocales::new(locales));
        self
    }

    pub fn with_locale_provider(mut self, provider: Arc<dyn LocaleProvider>) -> Self {
        self.locale_provider = provider;
        self
    }

    /// Load configuration from `TRANSLATABLE_*` environment variables
    pub fn from_env() -> TranslatableResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> TranslatableResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(column) = lookup("TRANSLATABLE_COLUMN") {
            config.default_column_name = column.trim().to_string();
        }

        if let Some(mode) = lookup("TRANSLATABLE_SQLITE_MODE") {
            config.sqlite_mode = mode.parse()?;
        }

        if let Some(mode) = lookup("TRANSLATABLE_CONTAINMENT") {
            config.containment_mode = mode.parse()?;
        }

        let locales: Option<Vec<String>> = lookup("TRANSLATABLE_LOCALES").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|locale| !locale.is_empty())
                .map(str::to_string)
                .collect()
        });
        let default_locale = lookup("TRANSLATABLE_DEFAULT_LOCALE").map(|l| l.trim().to_string());

        match (locales, default_locale) {
            (Some(locales), default) => {
                if locales.is_empty() {
                    return Err(TranslatableError::Configuration(
                        "TRANSLATABLE_LOCALES must list at least one locale".to_string(),
                    ));
                }
                let mut provider = StaticLocales::new(locales);
                if let Some(default) = default {
                    provider = provider.with_default(default);
                }
                config.locale_provider = Arc::new(provider);
            }
            (None, Some(default)) => {
                config.locale_provider = Arc::new(StaticLocales::new([default]));
            }
            (None, None) => {}
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TranslatableResult<()> {
        validate_identifier(&self.default_column_name)?;

        let available = self.locale_provider.available_locales();
        if available.is_empty() {
            return Err(TranslatableError::Configuration(
                "locale provider returned no locales".to_string(),
            ));
        }

        let default = self.locale_provider.default_locale();
        if !available.contains(&default) {
            return Err(TranslatableError::Configuration(format!(
                "default locale '{}' is not one of the available locales: {}",
                default,
                available.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for TranslatableConfig {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_CONFIG: Lazy<RwLock<Arc<TranslatableConfig>>> =
    Lazy::new(|| RwLock::new(Arc::new(TranslatableConfig::default())));

/// Process-wide configuration used by models that are not given one
pub fn current() -> Arc<TranslatableConfig> {
    match GLOBAL_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the process-wide configuration after validating it
pub fn configure(config: TranslatableConfig) -> TranslatableResult<()> {
    config.validate()?;
    let config = Arc::new(config);
    match GLOBAL_CONFIG.write() {
        Ok(mut slot) => *slot = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
    tracing::debug!("Translatable configuration replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TranslatableConfig::default();
        assert_eq!(config.default_column_name, "translations");
        assert_eq!(config.sqlite_mode, SqliteMode::Json);
        assert_eq!(config.containment_mode, ContainmentMode::WholeMapping);
        assert_eq!(config.locale_provider.available_locales(), vec!["en"]);
        assert_eq!(config.locale_provider.default_locale(), "en");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = TranslatableConfig::from_lookup(lookup(&[
            ("TRANSLATABLE_COLUMN", "i18n"),
            ("TRANSLATABLE_LOCALES", "en, fr , de"),
            ("TRANSLATABLE_DEFAULT_LOCALE", "fr"),
            ("TRANSLATABLE_SQLITE_MODE", "plain_text"),
            ("TRANSLATABLE_CONTAINMENT", "per_field"),
        ]))
        .unwrap();

        assert_eq!(config.default_column_name, "i18n");
        assert_eq!(config.locale_provider.available_locales(), vec!["en", "fr", "de"]);
        assert_eq!(config.locale_provider.default_locale(), "fr");
        assert_eq!(config.sqlite_mode, SqliteMode::PlainText);
        assert_eq!(config.containment_mode, ContainmentMode::PerField);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(TranslatableConfig::from_lookup(lookup(&[("TRANSLATABLE_SQLITE_MODE", "xml")])).is_err());
        assert!(TranslatableConfig::from_lookup(lookup(&[("TRANSLATABLE_LOCALES", " , ")])).is_err());
        assert!(TranslatableConfig::from_lookup(lookup(&[("TRANSLATABLE_COLUMN", "bad column")])).is_err());

        let err = TranslatableConfig::from_lookup(lookup(&[
            ("TRANSLATABLE_LOCALES", "en,fr"),
            ("TRANSLATABLE_DEFAULT_LOCALE", "de"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("default locale 'de'"));
    }

    #[test]
    fn test_static_locales() {
        let locales = StaticLocales::new(Vec::<String>::new());
        assert_eq!(locales.available_locales(), vec!["en"]);

        let locales = StaticLocales::new(["fr", "en"]).with_default("en");
        assert_eq!(locales.default_locale(), "en");
    }
}
