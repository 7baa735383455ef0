// src/runner.rs
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::descriptor::ItemValues;
use crate::page::{HtmlPage, TextRegion};
use crate::project::Project;
use crate::utils::error::ExtractError;

/// Candidate fragments found on one page by the template matcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFragments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub template: String,
    #[serde(default)]
    pub fragments: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub template: String,
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub fields: ItemValues,
}

/// Outcome of a run, items kept in input page order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub items: Vec<ExtractedItem>,
    pub pages: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub failed: usize,
}

/// Extracts one page synchronously.
///
/// `Ok(None)` when the template is unknown or a required field is missing.
pub fn extract_page(project: &Project, page: &PageFragments) -> Result<Option<ExtractedItem>, ExtractError> {
    let Some(template) = project.template(&page.template) else {
        tracing::warn!("Page {:?} names unknown template '{}', skipping", page.url, page.template);
        return Ok(None);
    };

    let html_page = match &page.url {
        Some(url) => HtmlPage::new(url)?,
        None => HtmlPage::default(),
    };
    let regions: HashMap<String, Vec<TextRegion>> = page
        .fragments
        .iter()
        .map(|(field, raw)| (field.clone(), raw.iter().map(|r| TextRegion::from(r.as_str())).collect()))
        .collect();

    let item = template
        .descriptors
        .extract_item(&regions, &html_page)
        .map(|fields| ExtractedItem {
            template: template.id.clone(),
            item: template.descriptors.name.clone(),
            url: page.url.clone(),
            fields,
        });
    Ok(item)
}

/// Extracts all pages on the blocking pool, `workers` at a time.
///
/// The compiled project is only read here, so every worker shares it.
pub async fn extract_pages(project: Arc<Project>, pages: Vec<PageFragments>, workers: usize) -> RunReport {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut report = RunReport { pages: pages.len(), ..RunReport::default() };
    let mut handles = Vec::with_capacity(pages.len());

    for page in pages {
        let known = project.template(&page.template).is_some();
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            tracing::error!("Worker pool closed unexpectedly");
            break;
        };
        let project = Arc::clone(&project);
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            extract_page(&project, &page)
        });
        handles.push((known, handle));
    }

    for (known, handle) in handles {
        match handle.await {
            Ok(Ok(Some(item))) => report.items.push(item),
            Ok(Ok(None)) if !known => report.skipped += 1,
            Ok(Ok(None)) => report.dropped += 1,
            Ok(Err(e)) => {
                tracing::warn!("Page extraction failed: {}", e);
                report.failed += 1;
            }
            Err(e) => {
                tracing::error!("Extraction worker panicked: {}", e);
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        "Extracted {} items from {} pages ({} skipped, {} dropped, {} failed)",
        report.items.len(),
        report.pages,
        report.skipped,
        report.dropped,
        report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldtypes::FieldTypeRegistry;
    use crate::project::ProjectSpec;

    const PROJECT_JSON: &str = r#"{
        "extractors": {
            "word": {"regular_expression": "^(\\w+)$"},
            "as_image": {"type_extractor": "image"}
        },
        "items": {
            "product": {
                "fields": {
                    "name": {"required": true},
                    "picture": {"type": "text"}
                }
            }
        },
        "templates": [
            {"id": "t1", "scrapes": "product", "extractors": {"name": ["word"], "picture": ["as_image"]}}
        ]
    }"#;

    fn project() -> Arc<Project> {
        let spec = ProjectSpec::from_json(PROJECT_JSON).unwrap();
        Arc::new(Project::compile(&spec, &FieldTypeRegistry::with_builtins()).unwrap())
    }

    fn page(url: Option<&str>, template: &str, name: &str) -> PageFragments {
        let mut fragments = HashMap::new();
        fragments.insert("name".to_string(), vec![name.to_string()]);
        fragments.insert("picture".to_string(), vec!["<img src=\"/a.png\">".to_string()]);
        PageFragments { url: url.map(str::to_string), template: template.to_string(), fragments }
    }

    #[test]
    fn extract_page_resolves_against_page_url() {
        let project = project();
        let item = extract_page(&project, &page(Some("https://example.com/x/y"), "t1", "<h1>Lamp</h1>"))
            .unwrap()
            .unwrap();
        assert_eq!(item.template, "t1");
        assert_eq!(item.item, "product");
        assert_eq!(item.fields["name"], vec!["Lamp"]);
        assert_eq!(item.fields["picture"], vec!["https://example.com/a.png"]);
    }

    #[test]
    fn extract_page_rejects_bad_url() {
        let project = project();
        let result = extract_page(&project, &page(Some("::"), "t1", "Lamp"));
        assert!(matches!(result, Err(ExtractError::InvalidPageUrl { .. })));
    }

    #[test]
    fn extract_pages_keeps_order_and_counts() {
        let pages = vec![
            page(None, "t1", "First"),
            page(None, "nope", "Ghost"),
            page(None, "t1", "Two words"),
            page(Some("::"), "t1", "Broken"),
            page(None, "t1", "Last"),
        ];

        let report = tokio_test::block_on(extract_pages(project(), pages, 2));

        let names: Vec<&str> = report.items.iter().map(|i| i.fields["name"][0].as_str()).collect();
        assert_eq!(names, vec!["First", "Last"]);
        assert_eq!(report.pages, 5);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn pages_file_parses() {
        let json = r#"[{"template": "t1", "fragments": {"name": ["<b>x</b>"]}}]"#;
        let pages: Vec<PageFragments> = serde_json::from_str(json).unwrap();
        assert_eq!(pages[0].template, "t1");
        assert!(pages[0].url.is_none());
    }
}
