use serde::{Deserialize, Serialize};

use super::entity::JavaType;
use crate::error::ExtractionError;

/// Result of walking one parse tree: the good types plus whatever was skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub types: Vec<JavaType>,
    pub errors: Vec<ExtractionError>,
}

impl Extraction {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Everything learned from a single source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub file_path: String,
    pub origin: String,
    pub types: Vec<JavaType>,
    pub errors: Vec<ExtractionError>,
    pub has_syntax_errors: bool,
}

impl FileAnalysis {
    pub fn method_count(&self) -> usize {
        self.types.iter().map(|t| t.methods.len()).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "File: {} | Origin: {} | Types: {} | Methods: {} | Skipped: {}",
            self.file_path,
            self.origin,
            self.types.len(),
            self.method_count(),
            self.errors.len()
        )
    }
}

/// Already-read source content handed in by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}
