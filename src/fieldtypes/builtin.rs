// src/fieldtypes/builtin.rs

// --- Imports ---
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::TypeProcessor;
use crate::page::HtmlPage;

// --- Constants ---
const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",  // 2024-01-05
    "%B %d, %Y", // January 05, 2024
    "%b %d, %Y", // Jan 05, 2024
    "%d %B %Y",  // 05 January 2024
    "%d %b %Y",  // 05 Jan 2024
];

const SAFE_HTML_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
    "li", "blockquote", "pre", "code", "a", "table", "thead", "tbody", "tr", "th", "td",
];

// --- Lazy statics ---
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img[src]").expect("Failed to compile IMG_SELECTOR")
});

static HAS_DIGIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d").expect("Failed to compile HAS_DIGIT_RE")
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("Failed to compile NUMBER_RE")
});

// A run of digits with optional separators, not preceded by a letter.
static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^a-zA-Z0-9])(\d+(?:[.,]\d+)*)")
        .expect("Failed to compile PRICE_RE")
});

// --- Helpers ---
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an HTML fragment with markup removed and whitespace collapsed.
pub fn html_to_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn text_with_digits(raw: &str) -> Option<String> {
    let text = html_to_text(raw);
    if HAS_DIGIT_RE.is_match(&text) {
        Some(text)
    } else {
        None
    }
}

fn looks_like_url(text: &str) -> bool {
    !text.is_empty()
        && !text.contains(char::is_whitespace)
        && (text.starts_with("http") || text.starts_with('/') || text.contains('.'))
}

/// Normalises a captured price number to `<integer>[.<decimals>]`.
///
/// A trailing group of exactly three digits is read as thousands, anything
/// else after the last separator is read as decimals. A zero integer part
/// never takes a thousands group, so `0.125` stays a decimal.
fn normalize_price(number: &str) -> String {
    let parts: Vec<&str> = number.split(|c| c == '.' || c == ',').collect();
    match parts.split_last() {
        Some((last, init)) if !init.is_empty() => {
            let integer = init.concat();
            if last.len() != 3 || integer.trim_start_matches('0').is_empty() {
                format!("{}.{}", integer, last)
            } else {
                parts.concat()
            }
        }
        _ => parts.concat(),
    }
}

fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // Fall back to dateparser for loose formats, read as UTC at midnight
    let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
    match dateparser::parse_with(text, &Utc, midnight) {
        Ok(dt) => Some(dt.naive_utc()),
        Err(e) => {
            tracing::trace!("Unparseable date '{}': {}", text, e);
            None
        }
    }
}

// --- Processors ---

/// Plain text with markup stripped. The default type for undeclared fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFieldType;

impl TypeProcessor for TextFieldType {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "plain text"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        non_empty(html_to_text(raw))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RawHtmlFieldType;

impl TypeProcessor for RawHtmlFieldType {
    fn name(&self) -> &str {
        "raw html"
    }

    fn description(&self) -> &str {
        "raw html as it appears in the page"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        non_empty(raw.to_string())
    }
}

/// Markup reduced to a whitelist of presentational tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafeHtmlFieldType;

impl TypeProcessor for SafeHtmlFieldType {
    fn name(&self) -> &str {
        "safe html"
    }

    fn description(&self) -> &str {
        "html with scripts, styles and unknown tags removed"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        let mut builder = ammonia::Builder::default();
        builder
            .tags(SAFE_HTML_TAGS.iter().copied().collect())
            .url_schemes(["http", "https", "mailto"].iter().copied().collect());
        let cleaned = builder.clean(raw).to_string();
        non_empty(cleaned.trim().to_string())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NumberFieldType;

impl TypeProcessor for NumberFieldType {
    fn name(&self) -> &str {
        "number"
    }

    fn description(&self) -> &str {
        "a number"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        text_with_digits(raw)
    }

    fn adapt(&self, value: String, _page: &HtmlPage) -> Option<String> {
        NUMBER_RE
            .find(&value)
            .map(|m| m.as_str().replace(',', ""))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PriceFieldType;

impl TypeProcessor for PriceFieldType {
    fn name(&self) -> &str {
        "price"
    }

    fn description(&self) -> &str {
        "a price with separators normalised"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        text_with_digits(raw)
    }

    fn adapt(&self, value: String, _page: &HtmlPage) -> Option<String> {
        let caps = PRICE_RE.captures(&value)?;
        caps.get(1).map(|m| normalize_price(m.as_str()))
    }
}

/// A link, made absolute against the page URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlFieldType;

impl TypeProcessor for UrlFieldType {
    fn name(&self) -> &str {
        "url"
    }

    fn description(&self) -> &str {
        "absolute url"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        non_empty(raw.trim().to_string())
    }

    fn adapt(&self, value: String, page: &HtmlPage) -> Option<String> {
        Some(page.resolve(&value))
    }
}

/// The `src` of the first image in the fragment, or bare URL-like text.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageUrlFieldType;

impl TypeProcessor for ImageUrlFieldType {
    fn name(&self) -> &str {
        "image"
    }

    fn description(&self) -> &str {
        "absolute image url"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        let fragment = Html::parse_fragment(raw);
        if let Some(src) = fragment
            .select(&IMG_SELECTOR)
            .filter_map(|img| img.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty())
        {
            return Some(src.to_string());
        }

        let text = raw.trim();
        if looks_like_url(text) {
            Some(text.to_string())
        } else {
            None
        }
    }

    fn adapt(&self, value: String, page: &HtmlPage) -> Option<String> {
        Some(page.resolve(&value))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DateFieldType;

impl TypeProcessor for DateFieldType {
    fn name(&self) -> &str {
        "date"
    }

    fn description(&self) -> &str {
        "date rendered as YYYY-MM-DDTHH:MM:SS"
    }

    fn extract(&self, raw: &str) -> Option<String> {
        non_empty(html_to_text(raw))
    }

    fn adapt(&self, value: String, _page: &HtmlPage) -> Option<String> {
        parse_date(&value).map(|dt| dt.format(DATE_OUTPUT_FORMAT).to_string())
    }
}
