// src/extractors/mod.rs
pub mod binder;
pub mod definition;
pub mod pattern;
pub mod pipeline;
pub mod registry;
pub mod typed;
pub mod unit;

// Re-export key extraction types for convenience
pub use binder::bind_extractors;
pub use definition::{DefinitionKind, ExtractorDefinition, ExtractorDefinitions, TemplateExtractors};
pub use pattern::RegexExtractor;
pub use pipeline::PipelineExtractor;
pub use registry::{add_extractors_to_descriptors, ExtractorRegistry};
pub use typed::TypeExtractor;
pub use unit::{invoke, ExtractorUnit, SharedUnit};
