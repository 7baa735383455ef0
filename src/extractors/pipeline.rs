// src/extractors/pipeline.rs
use super::unit::SharedUnit;
use crate::page::{HtmlPage, TextRegion};

/// Ordered chain of units; each stage receives the previous stage's output.
///
/// The chain stops at the first stage that yields nothing, and later stages
/// never see the original input again.
#[derive(Debug, Clone)]
pub struct PipelineExtractor {
    units: Vec<SharedUnit>,
}

impl PipelineExtractor {
    /// Builds a pipeline starting with `head`. A pipeline is never empty.
    pub fn new(head: SharedUnit, tail: impl IntoIterator<Item = SharedUnit>) -> Self {
        let mut units = vec![head];
        units.extend(tail);
        Self { units }
    }

    pub fn units(&self) -> &[SharedUnit] {
        &self.units
    }

    pub fn extract(&self, text: &TextRegion, page: &HtmlPage) -> Option<TextRegion> {
        if text.is_empty() {
            return None;
        }

        let mut value = text.clone();
        for (stage, unit) in self.units.iter().enumerate() {
            match unit.apply(&value, page) {
                Some(next) if !next.is_empty() => value = next,
                _ => {
                    tracing::trace!("Pipeline stopped at stage {} ({})", stage, unit.label());
                    return None;
                }
            }
        }
        Some(value)
    }

    /// Display name derived from the children on every call.
    pub fn label(&self) -> String {
        let children: Vec<String> = self.units.iter().map(|u| u.label()).collect();
        format!("Pipeline({})", children.join(", "))
    }
}
