use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the public javalore API.
#[derive(Debug, Error)]
pub enum JavaLoreError {
    #[error("Failed to initialize Java parser: {0}")]
    ParserInit(String),

    #[error("Failed to parse {path}")]
    Parse { path: String },

    #[error("Directory access failed for {}: {details}", path.display())]
    DirectoryAccess { path: PathBuf, details: String },

    #[error("No Java source files found in {}", path.display())]
    NoSourceFiles { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tool execution failed: {0}")]
    ToolError(String),

    #[error("Background indexing task failed: {0}")]
    Task(String),
}

impl From<config::ConfigError> for JavaLoreError {
    fn from(err: config::ConfigError) -> Self {
        JavaLoreError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JavaLoreError>;

/// A declaration that was skipped during extraction.
///
/// These are reported next to the successfully extracted types, never instead
/// of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("skipped {declaration} at line {line}: {reason}")]
pub struct ExtractionError {
    pub file: Option<String>,
    pub declaration: String,
    pub line: usize,
    pub reason: String,
}

impl ExtractionError {
    pub fn new(declaration: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self {
            file: None,
            declaration: declaration.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_display() {
        let err = ExtractionError::new("method frob", 12, "missing name").in_file("Foo.java");
        assert_eq!(err.to_string(), "skipped method frob at line 12: missing name");
        assert_eq!(err.file.as_deref(), Some("Foo.java"));
    }

    #[test]
    fn test_error_messages() {
        let err = JavaLoreError::NoSourceFiles { path: PathBuf::from("/tmp/repo") };
        assert!(err.to_string().contains("/tmp/repo"));

        let err = JavaLoreError::ToolError("bad input".to_string());
        assert_eq!(err.to_string(), "Tool execution failed: bad input");
    }
}
