// src/utils/error.rs
use thiserror::Error;

// Construction-time failures of extractor units and descriptor wiring.
// Absence of a value at invocation time is never an error.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid regular expression '{pattern}': {source}")]
    Compilation {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown field type: {0}")]
    UnknownType(String),

    #[error("Extractor definition '{0}' has neither a regular expression nor a type")]
    EmptyDefinition(String),

    #[error("Invalid page URL '{url}': {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Template '{template}' scrapes undeclared item '{item}'")]
    UnknownItem { template: String, item: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extractor setup failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
