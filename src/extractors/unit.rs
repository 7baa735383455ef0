// src/extractors/unit.rs
use std::fmt;
use std::sync::Arc;

use super::pattern::RegexExtractor;
use super::pipeline::PipelineExtractor;
use super::typed::TypeExtractor;
use crate::page::{HtmlPage, TextRegion};

/// A built extractor, shared between descriptors and pipelines.
pub type SharedUnit = Arc<ExtractorUnit>;

/// A stateless function from page text to an optional value.
///
/// Units are immutable once built and safe to call from any number of
/// threads at once.
#[derive(Debug, Clone)]
pub enum ExtractorUnit {
    Regex(RegexExtractor),
    Type(TypeExtractor),
    Pipeline(PipelineExtractor),
}

impl ExtractorUnit {
    pub fn apply(&self, text: &TextRegion, page: &HtmlPage) -> Option<TextRegion> {
        match self {
            ExtractorUnit::Regex(unit) => unit.extract(text),
            ExtractorUnit::Type(unit) => unit.extract(text, page),
            ExtractorUnit::Pipeline(unit) => unit.extract(text, page),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ExtractorUnit::Regex(unit) => unit.label(),
            ExtractorUnit::Type(unit) => unit.label(),
            ExtractorUnit::Pipeline(unit) => unit.label(),
        }
    }

    pub fn is_pipeline(&self) -> bool {
        matches!(self, ExtractorUnit::Pipeline(_))
    }
}

impl From<RegexExtractor> for ExtractorUnit {
    fn from(unit: RegexExtractor) -> Self {
        ExtractorUnit::Regex(unit)
    }
}

impl From<TypeExtractor> for ExtractorUnit {
    fn from(unit: TypeExtractor) -> Self {
        ExtractorUnit::Type(unit)
    }
}

impl From<PipelineExtractor> for ExtractorUnit {
    fn from(unit: PipelineExtractor) -> Self {
        ExtractorUnit::Pipeline(unit)
    }
}

impl fmt::Display for ExtractorUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Runs `unit` over `text`. `None` means the field has no value on this page.
pub fn invoke(unit: &ExtractorUnit, text: &str, page: &HtmlPage) -> Option<String> {
    unit.apply(&TextRegion::from(text), page)
        .map(TextRegion::into_text)
}
