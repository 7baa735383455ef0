// src/extractors/registry.rs
use std::collections::HashMap;
use std::sync::Arc;

use super::definition::{DefinitionKind, ExtractorDefinitions};
use super::pattern::RegexExtractor;
use super::typed::TypeExtractor;
use super::unit::{ExtractorUnit, SharedUnit};
use crate::descriptor::DescriptorCollection;
use crate::fieldtypes::FieldTypeRegistry;
use crate::utils::error::ExtractError;

/// Ready-to-call units keyed by extractor id.
#[derive(Debug, Default, Clone)]
pub struct ExtractorRegistry {
    units: HashMap<String, SharedUnit>,
}

impl ExtractorRegistry {
    /// Builds one unit per definition. Definitions that share a pattern or
    /// a type name share the same unit.
    ///
    /// Fails on the first definition that cannot be built.
    pub fn build(
        definitions: &ExtractorDefinitions,
        types: &FieldTypeRegistry,
    ) -> Result<Self, ExtractError> {
        let mut by_pattern: HashMap<&str, SharedUnit> = HashMap::new();
        let mut by_type: HashMap<&str, SharedUnit> = HashMap::new();
        let mut units = HashMap::with_capacity(definitions.len());

        for (id, definition) in definitions {
            if definition.is_ambiguous() {
                tracing::warn!("Extractor '{}' sets both a regular expression and a type; using the regular expression", id);
            }

            let unit = match definition.kind() {
                Some(DefinitionKind::Regex(pattern)) => match by_pattern.get(pattern) {
                    Some(unit) => Arc::clone(unit),
                    None => {
                        let unit: SharedUnit = Arc::new(RegexExtractor::new(pattern)?.into());
                        by_pattern.insert(pattern, Arc::clone(&unit));
                        unit
                    }
                },
                Some(DefinitionKind::Type(type_name)) => match by_type.get(type_name) {
                    Some(unit) => Arc::clone(unit),
                    None => {
                        let unit: SharedUnit = Arc::new(TypeExtractor::new(type_name, types)?.into());
                        by_type.insert(type_name, Arc::clone(&unit));
                        unit
                    }
                },
                None => return Err(ExtractError::EmptyDefinition(id.clone())),
            };
            units.insert(id.clone(), unit);
        }

        tracing::info!(
            "Built extractor registry: {} ids, {} regex units, {} type units",
            units.len(),
            by_pattern.len(),
            by_type.len()
        );
        Ok(Self { units })
    }

    pub fn get(&self, id: &str) -> Option<&SharedUnit> {
        self.units.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }
}

/// Builds the extractor registry once and attaches the same `Arc` to every
/// collection, so all of them call the very same units.
pub fn add_extractors_to_descriptors<'a, I>(
    descriptors: I,
    definitions: &ExtractorDefinitions,
    types: &FieldTypeRegistry,
) -> Result<Arc<ExtractorRegistry>, ExtractError>
where
    I: IntoIterator<Item = &'a mut DescriptorCollection>,
{
    let registry = Arc::new(ExtractorRegistry::build(definitions, types)?);
    for collection in descriptors {
        collection.attach_extractors(Arc::clone(&registry));
    }
    Ok(registry)
}
