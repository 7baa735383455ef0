// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::{ExtractedItem, RunReport};
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Saves the items extracted with one template as a JSON array
    pub fn save_items(&self, template: &str, items: &[&ExtractedItem]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}_items.json", sanitize_file_stem(template)));

        let json = serde_json::to_string_pretty(items)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved {} items to {}", items.len(), file_path.display());

        Ok(file_path)
    }

    /// Saves counts for the whole run in JSON format
    pub fn save_run_metadata(&self, report: &RunReport) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join("run_meta.json");

        let metadata = serde_json::json!({
            "pages": report.pages,
            "items": report.items.len(),
            "skipped": report.skipped,
            "dropped": report.dropped,
            "failed": report.failed,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved run metadata to {}", file_path.display());

        Ok(file_path)
    }
}

// Template ids come from user projects; keep them to a safe file name.
fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
