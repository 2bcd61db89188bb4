//! Read-only per-locale views over the translations column

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::column::TranslationColumn;
use crate::schema::SchemaDescriptor;

const INSPECT_WIDTH: usize = 30;

/// Field layout shared by every view of one model
#[derive(Debug, PartialEq, Eq)]
pub struct ViewShape {
    model: String,
    type_name: String,
    fields: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ViewShape {
    fn new(schema: &SchemaDescriptor) -> Self {
        let fields = schema.fields().to_vec();
        let positions = fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.clone(), index))
            .collect();
        Self {
            model: schema.model().to_string(),
            type_name: format!("{}Translation", schema.model()),
            fields,
            positions,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `<Model>Translation`
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.positions.get(field).copied()
    }
}

static GLOBAL_VIEWS: Lazy<Arc<ViewGenerator>> = Lazy::new(|| Arc::new(ViewGenerator::new()));

/// Builds view shapes once per model and hands out views
#[derive(Debug, Default)]
pub struct ViewGenerator {
    shapes: DashMap<String, Arc<ViewShape>>,
}

impl ViewGenerator {
    pub fn new() -> Self {
        Self {
            shapes: DashMap::new(),
        }
    }

    pub fn global() -> Arc<ViewGenerator> {
        GLOBAL_VIEWS.clone()
    }

    /// Cached shape for the model, generated on first use
    pub fn shape_for(&self, schema: &SchemaDescriptor) -> Arc<ViewShape> {
        if let Some(shape) = self.shapes.get(schema.model()) {
            return shape.clone();
        }

        self.shapes
            .entry(schema.model().to_string())
            .or_insert_with(|| {
                tracing::debug!("Generating {}Translation view shape", schema.model());
                Arc::new(ViewShape::new(schema))
            })
            .clone()
    }

    pub fn is_generated(&self, model: &str) -> bool {
        self.shapes.contains_key(model)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn view(&self, schema: &SchemaDescriptor, column: &TranslationColumn, locale: &str) -> TranslationView {
        TranslationView::new(self.shape_for(schema), column, locale)
    }
}

/// One record's translations in one locale
#[derive(Clone, PartialEq, Eq)]
pub struct TranslationView {
    shape: Arc<ViewShape>,
    locale: String,
    values: Vec<Option<String>>,
}

impl TranslationView {
    /// Project `column[locale]`; an unknown locale gives an all-null view
    pub fn new(shape: Arc<ViewShape>, column: &TranslationColumn, locale: &str) -> Self {
        let values = shape
            .fields
            .iter()
            .map(|field| column.get(locale, field).map(str::to_string))
            .collect();
        Self {
            shape,
            locale: locale.to_string(),
            values,
        }
    }

    pub fn shape(&self) -> &Arc<ViewShape> {
        &self.shape
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Value of a declared field; `None` when null or undeclared
    pub fn get(&self, field: &str) -> Option<&str> {
        let index = self.shape.position(field)?;
        self.values[index].as_deref()
    }

    /// Declared fields and their values, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.shape
            .fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.shape.fields.iter().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.values.iter().map(Option::as_deref)
    }

    /// True when every field is null or blank
    pub fn is_empty(&self) -> bool {
        self.values
            .iter()
            .all(|value| value.as_deref().map_or(true, |v| v.trim().is_empty()))
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Fields plus `locale`
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .iter()
            .map(|(field, value)| {
                let value = value.map_or(Value::Null, |v| Value::String(v.to_string()));
                (field.to_string(), value)
            })
            .collect();
        map.insert("locale".to_string(), Value::String(self.locale.clone()));
        map
    }

    /// Extract a typed struct, e.g. one with `title: Option<String>`
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.to_map()))
    }
}

impl Serialize for TranslationView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len() + 1))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field, &value)?;
        }
        map.serialize_entry("locale", &self.locale)?;
        map.end()
    }
}

impl fmt::Debug for TranslationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}", self.shape.type_name)?;
        let mut separator = " ";
        for (field, value) in self.iter() {
            let text = match value {
                Some(v) => format!("{:?}", v),
                None => "nil".to_string(),
            };
            let truncated: String = text.chars().take(INSPECT_WIDTH).collect();
            write!(f, "{}{}: {}", separator, field, truncated)?;
            separator = ", ";
        }
        write!(f, "{}locale: {:?}>", separator, self.locale)
    }
}

impl fmt::Display for TranslationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("Post", "posts", ["title", "content"], ["en", "fr"], "translations")
    }

    fn column() -> TranslationColumn {
        TranslationColumn::from_value(json!({
            "en": { "title": "Hello", "content": null },
            "fr": { "title": "Bonjour", "content": "Le contenu" }
        }))
        .unwrap()
    }

    #[test]
    fn test_shape_is_generated_once() {
        let generator = ViewGenerator::new();
        assert!(!generator.is_generated("Post"));

        let first = generator.shape_for(&schema());
        let second = generator.shape_for(&schema());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.type_name(), "PostTranslation");
        assert_eq!(first.position("content"), Some(1));
        assert_eq!(generator.len(), 1);
    }

    #[test]
    fn test_concurrent_first_use_shares_one_shape() {
        let generator = ViewGenerator::new();
        let schema = schema();

        let shapes: Vec<Arc<ViewShape>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| generator.shape_for(&schema)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(shapes.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(generator.len(), 1);
    }

    #[test]
    fn test_view_accessors() {
        let view = ViewGenerator::new().view(&schema(), &column(), "fr");

        assert_eq!(view.locale(), "fr");
        assert_eq!(view.get("title"), Some("Bonjour"));
        assert_eq!(view.get("summary"), None);
        assert_eq!(view.keys().collect::<Vec<_>>(), vec!["title", "content"]);
        assert_eq!(view.values().collect::<Vec<_>>(), vec![Some("Bonjour"), Some("Le contenu")]);
        assert_eq!(view.len(), 2);
        assert!(!view.is_empty());
    }

    #[test]
    fn test_unpopulated_locale_is_empty() {
        let generator = ViewGenerator::new();
        let view = generator.view(&schema(), &column(), "de");
        assert!(view.is_empty());
        assert_eq!(view.get("title"), None);
        assert_eq!(view.len(), 2);

        let blank = TranslationColumn::from_value(json!({ "en": { "title": "  " } })).unwrap();
        assert!(generator.view(&schema(), &blank, "en").is_empty());
    }

    #[test]
    fn test_serialize_and_typed_extraction() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct PostTranslation {
            title: Option<String>,
            content: Option<String>,
            locale: String,
        }

        let view = ViewGenerator::new().view(&schema(), &column(), "en");
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({ "title": "Hello", "content": null, "locale": "en" })
        );
        assert_eq!(Value::Object(view.to_map()), serde_json::to_value(&view).unwrap());

        let typed: PostTranslation = view.deserialize_into().unwrap();
        assert_eq!(
            typed,
            PostTranslation {
                title: Some("Hello".to_string()),
                content: None,
                locale: "en".to_string(),
            }
        );
    }

    #[test]
    fn test_inspect_format() {
        let view = ViewGenerator::new().view(&schema(), &column(), "en");
        assert_eq!(format!("{:?}", view), r#"#<PostTranslation title: "Hello", content: nil, locale: "en">"#);

        let long = TranslationColumn::from_value(json!({ "en": { "title": "a".repeat(40) } })).unwrap();
        let view = ViewGenerator::new().view(&schema(), &long, "en");
        let expected_title = format!("\"{}", "a".repeat(29));
        assert_eq!(
            view.to_string(),
            format!("#<PostTranslation title: {}, content: nil, locale: \"en\">", expected_title)
        );
    }
}
