// src/extractors/binder.rs
use std::collections::hash_map::Entry;
use std::sync::Arc;

use super::definition::{DefinitionKind, ExtractorDefinitions, TemplateExtractors};
use super::pattern::RegexExtractor;
use super::pipeline::PipelineExtractor;
use super::registry::ExtractorRegistry;
use super::typed::TypeExtractor;
use super::unit::{ExtractorUnit, SharedUnit};
use crate::descriptor::{DescriptorCollection, FieldDescriptor};
use crate::fieldtypes::{FieldTypeRegistry, DEFAULT_FIELD_TYPE};
use crate::utils::error::ExtractError;

/// Rewrites the extractors of `collection` for one template.
///
/// For every field the template declares:
/// - a type definition replaces the field's descriptor with one using that
///   type (keeping description and `required`); the last one wins,
/// - regex definitions are queued in declared order,
/// - a field that still has no descriptor gets a default `text` one,
/// - queued regexes run after the field's extractor inside one pipeline.
///
/// Ids missing from `definitions`, and definitions with neither key, are
/// ignored. The collection is left untouched if any unit fails to build.
pub fn bind_extractors(
    collection: &mut DescriptorCollection,
    template: &TemplateExtractors,
    definitions: &ExtractorDefinitions,
    types: &FieldTypeRegistry,
) -> Result<(), ExtractError> {
    let mut staged = collection.attribute_map().clone();
    let shared = collection.extractors().cloned();

    for (field_name, ids) in template {
        let mut queue: Vec<SharedUnit> = Vec::new();

        for id in ids {
            let Some(definition) = definitions.get(id) else {
                tracing::warn!("Field '{}' references unknown extractor '{}', ignoring", field_name, id);
                continue;
            };
            match definition.kind() {
                Some(DefinitionKind::Regex(pattern)) => {
                    queue.push(regex_unit(id, pattern, shared.as_deref())?);
                }
                Some(DefinitionKind::Type(type_name)) => {
                    let (description, required) = match staged.get(field_name) {
                        Some(existing) => (existing.description.clone(), existing.required),
                        None => (field_name.clone(), false),
                    };
                    if staged.get(field_name).is_some_and(|d| d.extractor.is_pipeline()) {
                        tracing::debug!("Type override on '{}' discards an earlier pipeline", field_name);
                    }
                    let unit: SharedUnit = Arc::new(TypeExtractor::new(type_name, types)?.into());
                    let descriptor = FieldDescriptor::new(field_name, description, unit).with_required(required);
                    if staged.insert(field_name.clone(), descriptor).is_some() {
                        tracing::debug!("Field '{}' now uses type '{}'", field_name, type_name);
                    }
                }
                None => {
                    tracing::debug!("Extractor '{}' on field '{}' defines nothing, ignoring", id, field_name);
                }
            }
        }

        let descriptor = match staged.entry(field_name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let unit: SharedUnit = Arc::new(TypeExtractor::new(DEFAULT_FIELD_TYPE, types)?.into());
                entry.insert(FieldDescriptor::new(field_name, field_name, unit))
            }
        };

        if !queue.is_empty() {
            let current = Arc::clone(&descriptor.extractor);
            descriptor.extractor = Arc::new(PipelineExtractor::new(current, queue).into());
        }
        tracing::debug!("Bound '{}.{}' to {}", collection.name, field_name, descriptor.extractor);
    }

    collection.replace_attribute_map(staged);
    tracing::info!("Bound extractors for {} fields of '{}'", template.len(), collection.name);
    Ok(())
}

/// Reuses the prebuilt unit for `id` when it was built from the same pattern.
fn regex_unit(
    id: &str,
    pattern: &str,
    shared: Option<&ExtractorRegistry>,
) -> Result<SharedUnit, ExtractError> {
    if let Some(unit) = shared.and_then(|registry| registry.get(id)) {
        if let ExtractorUnit::Regex(existing) = unit.as_ref() {
            if existing.pattern() == pattern {
                return Ok(Arc::clone(unit));
            }
        }
    }
    Ok(Arc::new(RegexExtractor::new(pattern)?.into()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::extractors::definition::ExtractorDefinition;
    use crate::extractors::registry::add_extractors_to_descriptors;
    use crate::extractors::unit::invoke;
    use crate::page::HtmlPage;

    fn definitions() -> ExtractorDefinitions {
        let mut defs = ExtractorDefinitions::new();
        defs.insert("r1".to_string(), ExtractorDefinition::regex(r"^(\w+)$"));
        defs.insert("digits".to_string(), ExtractorDefinition::regex(r"(\d+)"));
        defs.insert("first2".to_string(), ExtractorDefinition::regex(r"^(\d{2})"));
        defs.insert("price".to_string(), ExtractorDefinition::type_extractor("price"));
        defs.insert("number".to_string(), ExtractorDefinition::type_extractor("number"));
        defs.insert("empty".to_string(), ExtractorDefinition::default());
        defs
    }

    fn template(pairs: &[(&str, &[&str])]) -> TemplateExtractors {
        pairs
            .iter()
            .map(|(field, ids)| (field.to_string(), ids.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn labelled(pairs: &[(&str, &str, bool)]) -> DescriptorCollection {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = DescriptorCollection::new("product");
        for (name, description, required) in pairs {
            collection.insert(
                FieldDescriptor::typed(*name, *description, "text", &types)
                    .unwrap()
                    .with_required(*required),
            );
        }
        collection
    }

    #[test]
    fn undeclared_field_gets_text_then_regex_pipeline() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = DescriptorCollection::new("product");

        bind_extractors(&mut collection, &template(&[("title", &["r1"])]), &definitions(), &types).unwrap();

        let title = collection.get("title").unwrap();
        assert_eq!(title.description, "title");
        assert_eq!(title.extractor.label(), r"Pipeline(Type Extractor: text, Regex: ^(\w+)$)");
        let page = HtmlPage::default();
        assert_eq!(invoke(&title.extractor, "<b>Lamp</b>", &page).as_deref(), Some("Lamp"));
        assert_eq!(invoke(&title.extractor, "<b>Desk Lamp</b>", &page), None);
    }

    #[test]
    fn field_without_extractors_gets_default_text() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = DescriptorCollection::new("product");

        bind_extractors(&mut collection, &template(&[("title", &[])]), &definitions(), &types).unwrap();

        let title = collection.get("title").unwrap();
        assert_eq!(title.extractor.label(), "Type Extractor: text");
        assert_eq!(title.description, "title");
    }

    #[test]
    fn type_override_keeps_description() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = labelled(&[("cost", "Cost in GBP", true)]);

        bind_extractors(&mut collection, &template(&[("cost", &["price"])]), &definitions(), &types).unwrap();

        let cost = collection.get("cost").unwrap();
        assert_eq!(cost.extractor.label(), "Type Extractor: price");
        assert_eq!(cost.description, "Cost in GBP");
        assert!(cost.required);
    }

    #[test]
    fn type_override_then_regex_is_two_stage_pipeline() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = labelled(&[("cost", "Cost", false)]);

        bind_extractors(
            &mut collection,
            &template(&[("cost", &["price", "first2"])]),
            &definitions(),
            &types,
        )
        .unwrap();

        let cost = collection.get("cost").unwrap();
        assert_eq!(
            cost.extractor.label(),
            r"Pipeline(Type Extractor: price, Regex: ^(\d{2}))"
        );
        assert_eq!(
            invoke(&cost.extractor, "<span>£1,234.99</span>", &HtmlPage::default()).as_deref(),
            Some("12")
        );
    }

    #[test]
    fn regex_declared_before_override_still_follows_it() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = labelled(&[("cost", "Cost", false)]);

        bind_extractors(
            &mut collection,
            &template(&[("cost", &["first2", "price"])]),
            &definitions(),
            &types,
        )
        .unwrap();

        assert_eq!(
            collection.get("cost").unwrap().extractor.label(),
            r"Pipeline(Type Extractor: price, Regex: ^(\d{2}))"
        );
    }

    #[test]
    fn last_type_override_wins() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = labelled(&[("count", "Count", false)]);

        bind_extractors(
            &mut collection,
            &template(&[("count", &["price", "number"])]),
            &definitions(),
            &types,
        )
        .unwrap();

        let count = collection.get("count").unwrap();
        assert_eq!(count.extractor.label(), "Type Extractor: number");
        assert_eq!(count.description, "Count");
    }

    #[test]
    fn multiple_regexes_run_in_declared_order() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = DescriptorCollection::new("product");

        bind_extractors(
            &mut collection,
            &template(&[("sku", &["digits", "first2"])]),
            &definitions(),
            &types,
        )
        .unwrap();

        let sku = collection.get("sku").unwrap();
        assert_eq!(
            sku.extractor.label(),
            r"Pipeline(Type Extractor: text, Regex: (\d+), Regex: ^(\d{2}))"
        );
        assert_eq!(
            invoke(&sku.extractor, "<p>SKU 98765-X</p>", &HtmlPage::default()).as_deref(),
            Some("98")
        );
    }

    #[test]
    fn unknown_and_empty_ids_are_no_ops() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = labelled(&[("title", "Title", false)]);

        bind_extractors(
            &mut collection,
            &template(&[("title", &["nope", "empty"])]),
            &definitions(),
            &types,
        )
        .unwrap();

        let title = collection.get("title").unwrap();
        assert_eq!(title.extractor.label(), "Type Extractor: text");
        assert_eq!(title.description, "Title");
    }

    #[test]
    fn fields_outside_template_are_untouched() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = labelled(&[("title", "Title", true), ("notes", "Notes", false)]);
        let before = Arc::clone(&collection.get("notes").unwrap().extractor);

        bind_extractors(&mut collection, &template(&[("title", &["r1"])]), &definitions(), &types).unwrap();

        assert!(Arc::ptr_eq(&before, &collection.get("notes").unwrap().extractor));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn reuses_prebuilt_regex_units() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = DescriptorCollection::new("product");
        let registry = add_extractors_to_descriptors([&mut collection], &definitions_without_empty(), &types).unwrap();

        bind_extractors(&mut collection, &template(&[("title", &["r1"])]), &definitions(), &types).unwrap();

        let title = collection.get("title").unwrap();
        let ExtractorUnit::Pipeline(pipeline) = title.extractor.as_ref() else {
            panic!("expected a pipeline, got {}", title.extractor);
        };
        assert!(Arc::ptr_eq(&pipeline.units()[1], registry.get("r1").unwrap()));
    }

    #[test]
    fn failure_leaves_collection_unchanged() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = labelled(&[("title", "Title", false)]);
        let mut defs = definitions();
        defs.insert("broken".to_string(), ExtractorDefinition::regex("(unclosed"));

        let result = bind_extractors(
            &mut collection,
            &template(&[("title", &["r1"]), ("sku", &["broken"])]),
            &defs,
            &types,
        );

        assert!(matches!(result, Err(ExtractError::Compilation { .. })));
        assert_eq!(collection.get("title").unwrap().extractor.label(), "Type Extractor: text");
        assert!(!collection.contains("sku"));
    }

    #[test]
    fn unknown_override_type_fails() {
        let types = FieldTypeRegistry::with_builtins();
        let mut collection = DescriptorCollection::new("product");
        let mut defs = definitions();
        defs.insert("geo".to_string(), ExtractorDefinition::type_extractor("geopoint"));

        let result = bind_extractors(&mut collection, &template(&[("where", &["geo"])]), &defs, &types);
        assert!(matches!(result, Err(ExtractError::UnknownType(_))));
    }

    fn definitions_without_empty() -> ExtractorDefinitions {
        let mut defs = definitions();
        defs.remove("empty");
        defs
    }
}
