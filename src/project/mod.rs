// src/project/mod.rs
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorCollection;
use crate::extractors::{
    add_extractors_to_descriptors, bind_extractors, ExtractorDefinitions, ExtractorRegistry,
    TemplateExtractors,
};
use crate::fieldtypes::{FieldTypeRegistry, DEFAULT_FIELD_TYPE};
use crate::utils::error::ExtractError;

fn default_field_type() -> String {
    DEFAULT_FIELD_TYPE.to_string()
}

/// A scraping project as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default)]
    pub extractors: ExtractorDefinitions,
    #[serde(default)]
    pub items: HashMap<String, ItemSchema>,
    #[serde(default)]
    pub templates: Vec<TemplateSpec>,
}

impl ProjectSpec {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The declared fields of one item type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSchema {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One annotated page: which item it scrapes and the extractors per field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub id: String,
    pub scrapes: String,
    #[serde(default)]
    pub extractors: TemplateExtractors,
}

#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub id: String,
    pub descriptors: DescriptorCollection,
}

/// A project with every extractor built and bound, ready for scraping.
#[derive(Debug, Clone)]
pub struct Project {
    templates: HashMap<String, CompiledTemplate>,
    extractors: Arc<ExtractorRegistry>,
}

impl Project {
    /// Builds all extractor units and binds them to each template's fields.
    ///
    /// Any bad pattern, unknown type or undeclared item fails the whole
    /// project here, before a single page is extracted.
    pub fn compile(spec: &ProjectSpec, types: &FieldTypeRegistry) -> Result<Self, ExtractError> {
        let mut staged = Vec::with_capacity(spec.templates.len());
        for template in &spec.templates {
            let schema = spec.items.get(&template.scrapes).ok_or_else(|| ExtractError::UnknownItem {
                template: template.id.clone(),
                item: template.scrapes.clone(),
            })?;
            let descriptors = DescriptorCollection::from_schema(&template.scrapes, schema, types)?;
            staged.push((template, descriptors));
        }

        let extractors = add_extractors_to_descriptors(
            staged.iter_mut().map(|(_, descriptors)| descriptors),
            &spec.extractors,
            types,
        )?;

        let mut templates = HashMap::with_capacity(staged.len());
        for (template, mut descriptors) in staged {
            bind_extractors(&mut descriptors, &template.extractors, &spec.extractors, types)?;
            let compiled = CompiledTemplate { id: template.id.clone(), descriptors };
            if templates.insert(template.id.clone(), compiled).is_some() {
                tracing::warn!("Template id '{}' declared more than once; keeping the last", template.id);
            }
        }

        tracing::info!(
            "Compiled project: {} templates, {} extractors",
            templates.len(),
            extractors.len()
        );
        Ok(Self { templates, extractors })
    }

    pub fn template(&self, id: &str) -> Option<&CompiledTemplate> {
        self.templates.get(id)
    }

    /// Template ids, sorted.
    pub fn template_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn extractors(&self) -> &Arc<ExtractorRegistry> {
        &self.extractors
    }
}
