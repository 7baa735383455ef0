// src/extractors/definition.rs
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Extractor definitions keyed by id, as declared in a project.
pub type ExtractorDefinitions = HashMap<String, ExtractorDefinition>;

/// Field name to the ordered list of extractor ids a template applies to it.
pub type TemplateExtractors = HashMap<String, Vec<String>>;

/// A configured extractor: either a regular expression or a field type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_extractor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind<'a> {
    Regex(&'a str),
    Type(&'a str),
}

impl ExtractorDefinition {
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self { regular_expression: Some(pattern.into()), type_extractor: None }
    }

    pub fn type_extractor(type_name: impl Into<String>) -> Self {
        Self { regular_expression: None, type_extractor: Some(type_name.into()) }
    }

    /// What this definition builds. A regular expression takes precedence
    /// when both keys are set; `None` when neither is.
    pub fn kind(&self) -> Option<DefinitionKind<'_>> {
        if let Some(pattern) = &self.regular_expression {
            Some(DefinitionKind::Regex(pattern))
        } else {
            self.type_extractor.as_deref().map(DefinitionKind::Type)
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.regular_expression.is_some() && self.type_extractor.is_some()
    }
}
