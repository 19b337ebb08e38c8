use crate::error::Result;
use crate::types::FileAnalysis;

/// A source language the indexer can analyze.
pub trait LanguageAnalyzer: Send + Sync {
    fn language(&self) -> &'static str;

    fn file_extensions(&self) -> &[&'static str];

    /// Parse `content` and extract every type it declares, stamped with
    /// `origin` and `file_path`.
    fn analyze(&self, content: &str, file_path: &str, origin: &str) -> Result<FileAnalysis>;

    fn supports_file(&self, file_path: &str) -> bool {
        let lower = file_path.to_lowercase();
        self.file_extensions()
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }
}
