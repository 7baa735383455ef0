// src/fieldtypes/mod.rs
pub mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::page::HtmlPage;
use crate::utils::error::ExtractError;

pub use builtin::{
    DateFieldType, ImageUrlFieldType, NumberFieldType, PriceFieldType, RawHtmlFieldType,
    SafeHtmlFieldType, TextFieldType, UrlFieldType,
};

/// Name of the field type used when nothing else is declared.
pub const DEFAULT_FIELD_TYPE: &str = "text";

/// Coercion logic for a named field type.
///
/// `extract` pulls a raw value out of a page fragment without any page
/// knowledge; `adapt` turns that value into the final, page-aware one.
/// Implementations hold no mutable state and are shared across threads.
pub trait TypeProcessor: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn extract(&self, raw: &str) -> Option<String>;

    fn adapt(&self, value: String, page: &HtmlPage) -> Option<String> {
        let _ = page;
        Some(value)
    }
}

/// Lookup table from type name to processor.
#[derive(Debug, Default, Clone)]
pub struct FieldTypeRegistry {
    processors: HashMap<String, Arc<dyn TypeProcessor>>,
}

impl FieldTypeRegistry {
    /// Creates an empty registry with no types at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every builtin field type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextFieldType));
        registry.register(Arc::new(RawHtmlFieldType));
        registry.register(Arc::new(SafeHtmlFieldType));
        registry.register(Arc::new(NumberFieldType));
        registry.register(Arc::new(PriceFieldType));
        registry.register(Arc::new(UrlFieldType));
        registry.register(Arc::new(ImageUrlFieldType));
        registry.register(Arc::new(DateFieldType));
        registry
    }

    /// Registers a processor under its own name, replacing any previous one.
    pub fn register(&mut self, processor: Arc<dyn TypeProcessor>) {
        let name = processor.name().to_string();
        if self.processors.insert(name.clone(), processor).is_some() {
            tracing::debug!("Replaced field type processor '{}'", name);
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn TypeProcessor>, ExtractError> {
        self.processors
            .get(name)
            .cloned()
            .ok_or_else(|| ExtractError::UnknownType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Upper;

    impl TypeProcessor for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "upper-cased text"
        }

        fn extract(&self, raw: &str) -> Option<String> {
            Some(raw.to_uppercase())
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = FieldTypeRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["date", "image", "number", "price", "raw html", "safe html", "text", "url"]
        );
        assert!(registry.contains(DEFAULT_FIELD_TYPE));
    }

    #[test]
    fn unknown_type_fails_resolution() {
        let registry = FieldTypeRegistry::with_builtins();
        let err = registry.resolve("geopoint").unwrap_err();
        assert!(matches!(err, ExtractError::UnknownType(ref name) if name == "geopoint"));
    }

    #[test]
    fn custom_processor_uses_default_adapt() {
        let mut registry = FieldTypeRegistry::new();
        registry.register(Arc::new(Upper));
        let upper = registry.resolve("upper").unwrap();
        let value = upper.extract("abc").unwrap();
        assert_eq!(upper.adapt(value, &HtmlPage::default()).as_deref(), Some("ABC"));
    }
}
