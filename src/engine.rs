//! The `JavaLore` façade: discovery, parallel extraction and indexing behind
//! one handle, plus the query and tool surfaces over the shared index.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analyzers::{JavaAnalyzer, LanguageAnalyzer};
use crate::config::JavaLoreConfig;
use crate::error::{ExtractionError, JavaLoreError, Result};
use crate::extractor::ExtractorOptions;
use crate::query::QueryEngine;
use crate::scanner::{RepositoryScanner, ScanConfig};
use crate::storage::{shared_index, ApiIndex, IndexStats, SharedIndex};
use crate::tools::{ApiTools, ToolResult, ToolSchema};
use crate::types::{FileAnalysis, JavaType, SourceFile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// What one indexing run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexReport {
    pub origin: String,
    pub files_scanned: usize,
    pub files_failed: Vec<FileFailure>,
    pub files_with_syntax_errors: usize,
    pub types_indexed: usize,
    pub methods_indexed: usize,
    /// Types from an earlier run of the same origin that were replaced.
    pub types_replaced: usize,
    pub collisions: Vec<String>,
    pub extraction_errors: Vec<ExtractionError>,
    pub duration: Duration,
}

impl IndexReport {
    pub fn is_clean(&self) -> bool {
        self.files_failed.is_empty() && self.extraction_errors.is_empty()
    }
}

pub struct JavaLore {
    index: SharedIndex,
    scanner: RepositoryScanner,
    analyzer: Arc<JavaAnalyzer>,
    tools: ApiTools,
    threads: usize,
}

impl JavaLore {
    pub fn builder() -> JavaLoreBuilder {
        JavaLoreBuilder::new()
    }

    /// Scan `path`, extract every Java type in parallel and replace `origin`'s
    /// contribution to the index in one step.
    pub async fn index_directory(&self, origin: &str, path: impl AsRef<Path>) -> Result<IndexReport> {
        let start = Instant::now();
        let root: PathBuf = path.as_ref().to_path_buf();
        let scanner = self.scanner.clone();
        let analyzer = Arc::clone(&self.analyzer);
        let threads = self.threads;
        let task_origin = origin.to_string();

        let (analyses, failures) = tokio::task::spawn_blocking(move || -> Result<_> {
            let scan = scanner.scan(&root)?;
            let pool = build_pool(threads)?;
            let outcome = pool.install(|| {
                scan.files
                    .par_iter()
                    .map(|file| -> std::result::Result<FileAnalysis, FileFailure> {
                        let content = std::fs::read(&file.path).map_err(|e| FileFailure {
                            path: file.relative_path.clone(),
                            reason: e.to_string(),
                        })?;
                        let content = String::from_utf8_lossy(&content);
                        analyze_one(analyzer.as_ref(), &content, &file.relative_path, &task_origin)
                    })
                    .collect::<Vec<_>>()
            });
            Ok(split_outcome(outcome))
        })
        .await
        .map_err(|e| JavaLoreError::Task(e.to_string()))??;

        Ok(self.ingest(origin, analyses, failures, start))
    }

    /// Index already-read sources under `origin`. Runs on the calling thread
    /// plus the rayon pool.
    pub fn index_sources(&self, origin: &str, sources: Vec<SourceFile>) -> Result<IndexReport> {
        let start = Instant::now();
        let pool = build_pool(self.threads)?;
        let analyzer = self.analyzer.as_ref();

        let outcome = pool.install(|| {
            sources
                .par_iter()
                .map(|source| analyze_one(analyzer, &source.content, &source.path, origin))
                .collect::<Vec<_>>()
        });
        let (analyses, failures) = split_outcome(outcome);

        Ok(self.ingest(origin, analyses, failures, start))
    }

    pub fn clear_origin(&self, origin: &str) -> usize {
        self.index.write().clear(origin)
    }

    pub fn clear_all(&self) {
        self.index.write().clear_all();
    }

    pub fn query(&self) -> QueryEngine {
        QueryEngine::new(Arc::clone(&self.index))
    }

    pub fn index(&self) -> SharedIndex {
        Arc::clone(&self.index)
    }

    pub fn stats(&self) -> IndexStats {
        self.index.read().stats()
    }

    pub fn is_indexed(&self) -> bool {
        !self.index.read().is_empty()
    }

    pub async fn execute_tool(&self, name: &str, input: Value) -> Result<ToolResult> {
        self.tools
            .execute_tool(name, input)
            .await
            .map_err(|e| JavaLoreError::ToolError(e.to_string()))
    }

    pub fn tool_definitions(&self) -> Vec<ToolSchema> {
        self.tools.get_tool_schemas()
    }

    fn ingest(
        &self,
        origin: &str,
        analyses: Vec<FileAnalysis>,
        files_failed: Vec<FileFailure>,
        start: Instant,
    ) -> IndexReport {
        let files_scanned = analyses.len() + files_failed.len();
        let files_with_syntax_errors = analyses.iter().filter(|a| a.has_syntax_errors).count();

        let mut types: Vec<JavaType> = Vec::new();
        let mut extraction_errors = Vec::new();
        for analysis in analyses {
            types.extend(analysis.types);
            extraction_errors.extend(analysis.errors);
        }

        let summary = self.index.write().ingest(types, origin);

        let report = IndexReport {
            origin: origin.to_string(),
            files_scanned,
            files_failed,
            files_with_syntax_errors,
            types_indexed: summary.types,
            methods_indexed: summary.methods,
            types_replaced: summary.replaced_types,
            collisions: summary.collisions,
            extraction_errors,
            duration: start.elapsed(),
        };
        info!(
            "Indexed origin '{}': {} files, {} types, {} methods, {} failures in {:?}",
            report.origin,
            report.files_scanned,
            report.types_indexed,
            report.methods_indexed,
            report.files_failed.len(),
            report.duration
        );
        report
    }
}

fn analyze_one(
    analyzer: &JavaAnalyzer,
    content: &str,
    path: &str,
    origin: &str,
) -> std::result::Result<FileAnalysis, FileFailure> {
    analyzer.analyze(content, path, origin).map_err(|e| {
        warn!("Failed to analyze {}: {}", path, e);
        FileFailure {
            path: path.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Results come back in input order; keep that order for deterministic ingest.
fn split_outcome(
    outcome: Vec<std::result::Result<FileAnalysis, FileFailure>>,
) -> (Vec<FileAnalysis>, Vec<FileFailure>) {
    let mut analyses = Vec::new();
    let mut failures = Vec::new();
    for result in outcome {
        match result {
            Ok(analysis) => analyses.push(analysis),
            Err(failure) => failures.push(failure),
        }
    }
    (analyses, failures)
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    let threads = if threads == 0 { num_cpus::get() } else { threads };
    debug!("Using {} parser threads", threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| JavaLoreError::Task(e.to_string()))
}

pub struct JavaLoreBuilder {
    scan: ScanConfig,
    extractor: ExtractorOptions,
    threads: usize,
    index: Option<SharedIndex>,
}

impl Default for JavaLoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaLoreBuilder {
    pub fn new() -> Self {
        Self {
            scan: ScanConfig::default(),
            extractor: ExtractorOptions::default(),
            threads: 0,
            index: None,
        }
    }

    /// Take every setting from a loaded configuration.
    pub fn from_config(config: &JavaLoreConfig) -> Self {
        Self {
            scan: config.scan_config(),
            extractor: config.extractor_options(),
            threads: config.indexing.threads,
            index: None,
        }
    }

    pub fn source_roots(mut self, roots: Vec<String>) -> Self {
        self.scan.source_roots = roots;
        self
    }

    pub fn strict_source_roots(mut self, strict: bool) -> Self {
        self.scan.strict_source_roots = strict;
        self
    }

    pub fn include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.scan.include_patterns = patterns;
        self
    }

    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.scan.exclude_patterns = patterns;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.scan.max_file_size = bytes;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.scan.max_depth = Some(depth);
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.scan.follow_symlinks = follow;
        self
    }

    pub fn include_private(mut self, include: bool) -> Self {
        self.extractor.include_private = include;
        self
    }

    /// Parser threads; `0` uses one per CPU.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Share an existing index instead of creating a new one.
    pub fn with_index(mut self, index: SharedIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn build(self) -> Result<JavaLore> {
        let scanner = RepositoryScanner::new(self.scan)?;
        let index = self.index.unwrap_or_else(|| shared_index(ApiIndex::new()));
        let tools = ApiTools::new(Arc::clone(&index));

        Ok(JavaLore {
            index,
            scanner,
            analyzer: Arc::new(JavaAnalyzer::with_options(self.extractor)),
            tools,
            threads: self.threads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn util_source() -> SourceFile {
        SourceFile::new(
            "com/acme/Util.java",
            "package com.acme;\npublic class Util {\n  public int add(int a, int b) { return a + b; }\n  public boolean addAll(java.util.List<Integer> items) { return true; }\n}\n",
        )
    }

    #[test]
    fn test_builder_configuration() {
        let lore = JavaLore::builder()
            .source_roots(vec!["src".to_string()])
            .include_patterns(vec!["**/*.java".to_string()])
            .exclude_patterns(vec!["**/generated/**".to_string()])
            .max_file_size(512 * 1024)
            .max_depth(20)
            .follow_symlinks(false)
            .include_private(false)
            .threads(2)
            .build();
        assert!(lore.is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_globs() {
        let result = JavaLore::builder()
            .include_patterns(vec!["[".to_string()])
            .build();
        assert!(matches!(result, Err(JavaLoreError::Pattern(_))));
    }

    #[test]
    fn test_index_sources_and_query() {
        let lore = JavaLore::builder().threads(2).build().unwrap();
        let report = lore.index_sources("lib-a", vec![util_source()]).unwrap();

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.types_indexed, 1);
        assert_eq!(report.methods_indexed, 2);
        assert!(report.is_clean());

        let hits = lore.query().find_methods_by_name("add", None, true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner().source_file.as_deref(), Some("com/acme/Util.java"));
        assert!(lore.is_indexed());
    }

    #[test]
    fn test_shared_index_is_visible_to_both_handles() {
        let index = shared_index(ApiIndex::new());
        let writer = JavaLore::builder().with_index(Arc::clone(&index)).build().unwrap();
        let reader = JavaLore::builder().with_index(index).build().unwrap();

        writer.index_sources("lib-a", vec![util_source()]).unwrap();
        assert_eq!(reader.stats().types, 1);

        writer.clear_origin("lib-a");
        assert_eq!(reader.stats().types, 0);
    }

    #[test]
    fn test_from_config() {
        let mut config = JavaLoreConfig::default();
        config.indexing.include_private = false;
        config.indexing.threads = 1;

        let lore = JavaLoreBuilder::from_config(&config).build().unwrap();
        let source = SourceFile::new(
            "A.java",
            "public class A { private void hidden() {} public void shown() {} }",
        );
        let report = lore.index_sources("o", vec![source]).unwrap();
        assert_eq!(report.methods_indexed, 1);
    }

    #[test]
    fn test_execute_tool_maps_to_tool_result() {
        let lore = JavaLore::builder().build().unwrap();
        lore.index_sources("lib-a", vec![util_source()]).unwrap();

        let result = tokio_test::block_on(lore.execute_tool(
            "search_methods",
            serde_json::json!({"method_name": "add", "partial": true}),
        ))
        .unwrap();
        assert!(result.success);
        assert_eq!(result.data["total_matches"], 2);

        let unknown = tokio_test::block_on(lore.execute_tool("nope", Value::Null)).unwrap();
        assert!(!unknown.success);
    }

    #[tokio::test]
    async fn test_index_directory_missing_path() {
        let lore = JavaLore::builder().build().unwrap();
        let result = lore.index_directory("o", "/no/such/repository").await;
        assert!(matches!(result, Err(JavaLoreError::DirectoryAccess { .. })));
    }
}
