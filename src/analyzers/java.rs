use tracing::{debug, warn};

use super::traits::LanguageAnalyzer;
use crate::error::Result;
use crate::extractor::{EntityExtractor, ExtractorOptions};
use crate::syntax::JavaSourceParser;
use crate::types::FileAnalysis;

const JAVA_EXTENSIONS: &[&str] = &["java"];

/// Tree-sitter backed analyzer for `.java` files.
///
/// A parser is created per call, so one analyzer can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct JavaAnalyzer {
    extractor: EntityExtractor,
}

impl JavaAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractorOptions) -> Self {
        Self {
            extractor: EntityExtractor::with_options(options),
        }
    }
}

impl LanguageAnalyzer for JavaAnalyzer {
    fn language(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &[&'static str] {
        JAVA_EXTENSIONS
    }

    fn analyze(&self, content: &str, file_path: &str, origin: &str) -> Result<FileAnalysis> {
        let mut parser = JavaSourceParser::new()?;
        let parsed = parser.parse(content, file_path)?;
        let has_syntax_errors = parsed.has_errors();

        let extraction = self.extractor.extract(&parsed.root(), origin);

        let types = extraction
            .types
            .into_iter()
            .map(|mut ty| {
                ty.source_file = Some(file_path.to_string());
                ty
            })
            .collect();
        let errors: Vec<_> = extraction
            .errors
            .into_iter()
            .map(|e| e.in_file(file_path))
            .collect();

        for error in &errors {
            warn!("{}: {}", file_path, error);
        }

        let analysis = FileAnalysis {
            file_path: file_path.to_string(),
            origin: origin.to_string(),
            types,
            errors,
            has_syntax_errors,
        };
        debug!("{}", analysis.summary());
        Ok(analysis)
    }
}
