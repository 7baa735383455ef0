// src/main.rs
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use clap::Parser;
use field_extractors::runner::{self, ExtractedItem, PageFragments};
use field_extractors::storage::StorageManager;
use field_extractors::utils::{self, AppError};
use field_extractors::{FieldTypeRegistry, Project, ProjectSpec};

const WORKERS_ENV: &str = "FIELD_EXTRACT_WORKERS";
const DEFAULT_WORKERS: NonZeroUsize = match NonZeroUsize::new(4) {
    Some(n) => n,
    None => unreachable!(),
};

/// Extract typed field values from page fragments using a scraping project
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project file with extractor definitions, item schemas and templates
    #[arg(short, long)]
    project: String,

    /// Pages file: candidate fragments per field, per page
    #[arg(long)]
    pages: String,

    /// Output directory for extracted items
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Only extract pages matched by this template
    #[arg(short, long)]
    template: Option<String>,

    /// Pages extracted at once (default: $FIELD_EXTRACT_WORKERS or 4)
    #[arg(short, long)]
    workers: Option<NonZeroUsize>,
}

fn parse_workers(value: &str) -> Result<NonZeroUsize, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a positive integer, got '{}'", WORKERS_ENV, value)))
}

fn resolve_workers(arg: Option<NonZeroUsize>) -> Result<NonZeroUsize, AppError> {
    if let Some(workers) = arg {
        tracing::debug!("Using {} workers from command-line argument", workers);
        return Ok(workers);
    }
    match std::env::var(WORKERS_ENV) {
        Ok(value) => parse_workers(&value),
        Err(_) => {
            tracing::debug!("Using {} workers (default)", DEFAULT_WORKERS);
            Ok(DEFAULT_WORKERS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting extraction for args: {:?}", args);
    let workers = resolve_workers(args.workers)?;

    // 3. Load and compile the project; any broken extractor stops here
    let project_json = tokio::fs::read_to_string(&args.project).await?;
    let spec = ProjectSpec::from_json(&project_json)
        .map_err(|e| AppError::Config(format!("Invalid project file {}: {}", args.project, e)))?;
    let project = Arc::new(Project::compile(&spec, &FieldTypeRegistry::with_builtins())?);

    // 4. Load the pages
    let pages_json = tokio::fs::read_to_string(&args.pages).await?;
    let mut pages: Vec<PageFragments> = serde_json::from_str(&pages_json)
        .map_err(|e| AppError::Config(format!("Invalid pages file {}: {}", args.pages, e)))?;
    if let Some(template) = &args.template {
        pages.retain(|page| &page.template == template);
        tracing::info!("Kept {} pages for template '{}'", pages.len(), template);
    }

    // 5. Extract
    let report = runner::extract_pages(project, pages, workers.get()).await;

    // 6. Store items grouped by template
    let storage = StorageManager::new(&args.output_dir)?;
    let mut by_template: BTreeMap<&str, Vec<&ExtractedItem>> = BTreeMap::new();
    for item in &report.items {
        by_template.entry(item.template.as_str()).or_default().push(item);
    }
    for (template, items) in &by_template {
        storage.save_items(template, items)?;
    }
    storage.save_run_metadata(&report)?;

    println!(
        "{} items from {} pages ({} skipped, {} dropped, {} failed)",
        report.items.len(),
        report.pages,
        report.skipped,
        report.dropped,
        report.failed
    );

    if report.items.is_empty() && report.failed > 0 {
        return Err(AppError::Processing(format!("No items extracted; {} pages failed", report.failed)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(parse_workers("0"), Err(AppError::Config(_))));
        assert!(matches!(parse_workers("many"), Err(AppError::Config(_))));
        assert_eq!(parse_workers(" 8 ").unwrap().get(), 8);
    }

    #[test]
    fn zero_workers_flag_is_rejected() {
        let args = ["field-extract", "--project", "p.json", "--pages", "pages.json", "--workers", "0"];
        assert!(Args::try_parse_from(args).is_err());

        let args = ["field-extract", "--project", "p.json", "--pages", "pages.json", "--workers", "2"];
        let parsed = Args::try_parse_from(args).unwrap();
        assert_eq!(resolve_workers(parsed.workers).unwrap().get(), 2);
    }
}
