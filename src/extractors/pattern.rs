// src/extractors/pattern.rs
use regex::{Regex, RegexBuilder};

use crate::page::TextRegion;
use crate::utils::error::ExtractError;

/// Extractor that searches a compiled pattern in the input and keeps only
/// the captured groups, concatenated in group order.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: String,
    regex: Regex,
}

impl RegexExtractor {
    /// Compiles `pattern` with `.` matching newlines.
    ///
    /// Patterns are meant to define at least one capturing group. A pattern
    /// without groups is accepted and yields the whole match instead.
    pub fn new(pattern: &str) -> Result<Self, ExtractError> {
        let regex = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| ExtractError::Compilation {
                pattern: pattern.to_string(),
                source,
            })?;

        if regex.captures_len() <= 1 {
            tracing::warn!(
                "Pattern '{}' defines no capturing groups; the whole match will be extracted",
                pattern
            );
        }
        tracing::debug!("Compiled regex extractor: {}", pattern);

        Ok(Self { pattern: pattern.to_string(), regex })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Number of capturing groups, not counting the implicit whole match.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    pub fn extract(&self, text: &TextRegion) -> Option<TextRegion> {
        let caps = self.regex.captures(text.as_str())?;

        let joined: String = if self.group_count() > 0 {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .filter(|g| !g.is_empty())
                .collect()
        } else {
            caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string()
        };

        if joined.is_empty() {
            None
        } else {
            Some(TextRegion::new(joined))
        }
    }

    pub fn label(&self) -> String {
        format!("Regex: {}", self.pattern)
    }
}
