// src/lib.rs
//! Field value extraction for template-driven scraping.
//!
//! A project declares extractor definitions (regular expressions or field
//! type names) and, per template, which of them apply to each field. The
//! definitions are built once into shared [`ExtractorUnit`]s, then bound to
//! each template's [`DescriptorCollection`] so that every field holds a
//! single effective extractor.
//!
//! ```
//! use field_extractors::{bind_extractors, invoke, DescriptorCollection, ExtractorDefinition,
//!     ExtractorDefinitions, FieldTypeRegistry, HtmlPage, TemplateExtractors};
//!
//! let types = FieldTypeRegistry::with_builtins();
//! let mut definitions = ExtractorDefinitions::new();
//! definitions.insert("r1".into(), ExtractorDefinition::regex(r"^(\w+)$"));
//! let mut template = TemplateExtractors::new();
//! template.insert("title".into(), vec!["r1".into()]);
//!
//! let mut descriptors = DescriptorCollection::new("product");
//! bind_extractors(&mut descriptors, &template, &definitions, &types).unwrap();
//!
//! let title = descriptors.get("title").unwrap();
//! let value = invoke(&title.extractor, "<h1> Lamp </h1>", &HtmlPage::default());
//! assert_eq!(value.as_deref(), Some("Lamp"));
//! ```

pub mod descriptor;
pub mod extractors;
pub mod fieldtypes;
pub mod page;
pub mod project;
pub mod runner;
pub mod storage;
pub mod utils;

pub use descriptor::{DescriptorCollection, FieldDescriptor, ItemValues};
pub use extractors::{
    add_extractors_to_descriptors, bind_extractors, invoke, ExtractorDefinition,
    ExtractorDefinitions, ExtractorRegistry, ExtractorUnit, PipelineExtractor, RegexExtractor,
    SharedUnit, TemplateExtractors, TypeExtractor,
};
pub use fieldtypes::{FieldTypeRegistry, TypeProcessor, DEFAULT_FIELD_TYPE};
pub use page::{HtmlPage, TextRegion};
pub use project::{Project, ProjectSpec};
pub use utils::{AppError, ExtractError, StorageError};
