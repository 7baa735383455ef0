// src/extractors/typed.rs
use std::sync::Arc;

use crate::fieldtypes::{FieldTypeRegistry, TypeProcessor};
use crate::page::{HtmlPage, TextRegion};
use crate::utils::error::ExtractError;

/// Extractor that runs a field type's `extract` then `adapt`.
#[derive(Debug, Clone)]
pub struct TypeExtractor {
    processor: Arc<dyn TypeProcessor>,
}

impl TypeExtractor {
    /// Resolves `type_name` now, so unknown types fail before any page is seen.
    pub fn new(type_name: &str, types: &FieldTypeRegistry) -> Result<Self, ExtractError> {
        let processor = types.resolve(type_name)?;
        tracing::debug!("Built type extractor: {}", type_name);
        Ok(Self { processor })
    }

    pub fn from_processor(processor: Arc<dyn TypeProcessor>) -> Self {
        Self { processor }
    }

    pub fn type_name(&self) -> &str {
        self.processor.name()
    }

    pub fn processor(&self) -> &Arc<dyn TypeProcessor> {
        &self.processor
    }

    pub fn extract(&self, text: &TextRegion, page: &HtmlPage) -> Option<TextRegion> {
        let value = self.processor.extract(text.as_str()).filter(|v| !v.is_empty())?;
        self.processor
            .adapt(value, page)
            .filter(|v| !v.is_empty())
            .map(TextRegion::new)
    }

    pub fn label(&self) -> String {
        format!("Type Extractor: {}", self.processor.name())
    }
}
