// src/page.rs
use std::fmt;

use url::Url;

use crate::utils::error::ExtractError;

/// Page handle passed through extractor units untouched, except by field
/// types that resolve relative links against the page address.
#[derive(Debug, Clone, Default)]
pub struct HtmlPage {
    pub url: Option<Url>,
}

impl HtmlPage {
    pub fn new(url: &str) -> Result<Self, ExtractError> {
        let parsed = Url::parse(url).map_err(|source| ExtractError::InvalidPageUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self { url: Some(parsed) })
    }

    /// Resolves `link` against the page URL. Returns the link unchanged
    /// when the page has no URL or the join fails.
    pub fn resolve(&self, link: &str) -> String {
        match &self.url {
            Some(base) => match base.join(link) {
                Ok(resolved) => resolved.to_string(),
                Err(e) => {
                    tracing::debug!("Could not join '{}' onto {}: {}", link, base, e);
                    link.to_string()
                }
            },
            None => link.to_string(),
        }
    }
}

/// A piece of page text flowing through extractor units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRegion {
    pub text: String,
}

impl TextRegion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl From<&str> for TextRegion {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextRegion {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for TextRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
