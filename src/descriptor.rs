// src/descriptor.rs
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::extractors::registry::ExtractorRegistry;
use crate::extractors::typed::TypeExtractor;
use crate::extractors::unit::{ExtractorUnit, SharedUnit};
use crate::fieldtypes::FieldTypeRegistry;
use crate::page::{HtmlPage, TextRegion};
use crate::project::ItemSchema;
use crate::utils::error::ExtractError;

/// Extracted values per field, in fragment order.
pub type ItemValues = BTreeMap<String, Vec<String>>;

/// One declared output field and the single extractor that fills it.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub extractor: SharedUnit,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, extractor: SharedUnit) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
            extractor,
        }
    }

    /// Descriptor whose extractor is the named field type.
    pub fn typed(
        name: impl Into<String>,
        description: impl Into<String>,
        type_name: &str,
        types: &FieldTypeRegistry,
    ) -> Result<Self, ExtractError> {
        let unit = ExtractorUnit::Type(TypeExtractor::new(type_name, types)?);
        Ok(Self::new(name, description, Arc::new(unit)))
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn extract(&self, text: &TextRegion, page: &HtmlPage) -> Option<TextRegion> {
        self.extractor.apply(text, page)
    }
}

/// The fields of one item type as seen by one template.
///
/// Field extractors are rewritten once when a template is loaded (which
/// needs `&mut self`) and only read afterwards, so a bound collection can
/// be shared behind an `Arc` by any number of extraction workers.
#[derive(Debug, Clone, Default)]
pub struct DescriptorCollection {
    pub name: String,
    attribute_map: HashMap<String, FieldDescriptor>,
    extractors: Option<Arc<ExtractorRegistry>>,
}

impl DescriptorCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Builds one descriptor per schema field, each starting with its declared type.
    pub fn from_schema(
        name: impl Into<String>,
        schema: &ItemSchema,
        types: &FieldTypeRegistry,
    ) -> Result<Self, ExtractError> {
        let mut collection = Self::new(name);
        for (field_name, field) in &schema.fields {
            let description = field.description.as_deref().unwrap_or(field_name);
            let descriptor = FieldDescriptor::typed(field_name, description, &field.field_type, types)?
                .with_required(field.required);
            collection.insert(descriptor);
        }
        tracing::debug!("Built descriptor collection '{}' with {} fields", collection.name, collection.len());
        Ok(collection)
    }

    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.attribute_map.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.attribute_map.contains_key(field)
    }

    /// Inserts a descriptor under its own name, returning the one it replaced.
    pub fn insert(&mut self, descriptor: FieldDescriptor) -> Option<FieldDescriptor> {
        self.attribute_map.insert(descriptor.name.clone(), descriptor)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.attribute_map.values()
    }

    pub fn len(&self) -> usize {
        self.attribute_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attribute_map.is_empty()
    }

    pub(crate) fn attribute_map(&self) -> &HashMap<String, FieldDescriptor> {
        &self.attribute_map
    }

    pub(crate) fn replace_attribute_map(&mut self, attribute_map: HashMap<String, FieldDescriptor>) {
        self.attribute_map = attribute_map;
    }

    /// Attaches the shared, prebuilt extractor units.
    pub fn attach_extractors(&mut self, extractors: Arc<ExtractorRegistry>) {
        self.extractors = Some(extractors);
    }

    pub fn extractors(&self) -> Option<&Arc<ExtractorRegistry>> {
        self.extractors.as_ref()
    }

    /// Runs each field's extractor over that field's candidate fragments.
    ///
    /// Returns `None` when a required field ends up without a value.
    /// Fragments for fields this collection does not declare are ignored.
    pub fn extract_item(
        &self,
        fragments: &HashMap<String, Vec<TextRegion>>,
        page: &HtmlPage,
    ) -> Option<ItemValues> {
        let mut values = ItemValues::new();

        for (field_name, regions) in fragments {
            let Some(descriptor) = self.get(field_name) else {
                tracing::debug!("'{}' has no field '{}', skipping its fragments", self.name, field_name);
                continue;
            };
            let extracted: Vec<String> = regions
                .iter()
                .filter_map(|region| descriptor.extract(region, page))
                .map(TextRegion::into_text)
                .collect();
            if !extracted.is_empty() {
                values.insert(field_name.clone(), extracted);
            }
        }

        if let Some(missing) = self.fields().find(|d| d.required && !values.contains_key(&d.name)) {
            tracing::debug!("Dropping '{}' item: required field '{}' has no value", self.name, missing.name);
            return None;
        }
        Some(values)
    }
}
