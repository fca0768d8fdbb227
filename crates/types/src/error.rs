//! Error types for the Config Composer system

use thiserror::Error;

/// Main error type for the config composer system
#[derive(Error, Debug)]
pub enum ComposerError {
    /// Tool settings related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration document errors
    #[error("Document error: {path}: {message}")]
    Document { path: String, message: String },

    /// Rendering of a merged object failed
    #[error("Render error: {0}")]
    Render(String),

    /// Unknown build mode
    #[error("Invalid build mode: {0}")]
    InvalidMode(String),

    /// Unknown array merge strategy
    #[error("Invalid array strategy: {0}")]
    InvalidStrategy(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for config composer operations
pub type Result<T> = std::result::Result<T, ComposerError>;

/// Tool settings specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Configuration document specific errors
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Document file does not exist
    #[error("Document not found: {path}")]
    NotFound { path: String },

    /// Document could not be read
    #[error("Failed to read document {path}: {message}")]
    Unreadable { path: String, message: String },

    /// Document is not valid JSON/YAML; line and column are one-based
    #[error("Failed to parse document {path}: {message}")]
    Parse {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// Document root is not a mapping
    #[error("Document root must be a mapping in {path}, found {found}")]
    NotAMapping { path: String, found: String },
}

// Conversion implementations for common error types

impl From<ConfigError> for ComposerError {
    fn from(err: ConfigError) -> Self {
        ComposerError::Config(err.to_string())
    }
}

impl From<DocumentError> for ComposerError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound { path } => ComposerError::Document {
                path,
                message: "Document not found".to_string(),
            },
            DocumentError::Unreadable { path, message } => ComposerError::Document {
                path,
                message: format!("Unreadable: {}", message),
            },
            DocumentError::Parse {
                path,
                line,
                column,
                message,
            } => ComposerError::Document {
                path: match (line, column) {
                    (Some(line), Some(column)) => format!("{}:{}:{}", path, line, column),
                    (Some(line), None) => format!("{}:{}", path, line),
                    _ => path,
                },
                message: format!("Parse failure: {}", message),
            },
            DocumentError::NotAMapping { path, found } => ComposerError::Document {
                path,
                message: format!("Root must be a mapping, found {}", found),
            },
        }
    }
}
