use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::error::{JavaLoreError, Result};

/// Settings for one repository walk.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directories (relative to the repository root) that hold the sources.
    pub source_roots: Vec<String>,
    /// Fail instead of walking the whole tree when no source root exists.
    pub strict_source_roots: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_file_size: u64,
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
    pub respect_gitignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source_roots: vec!["src/main/java".to_string()],
            strict_source_roots: false,
            include_patterns: vec!["**/*.java".to_string()],
            exclude_patterns: vec![
                "**/target/**".to_string(),
                "**/build/**".to_string(),
                "**/.git/**".to_string(),
                "**/node_modules/**".to_string(),
            ],
            max_file_size: 1024 * 1024,
            max_depth: None,
            follow_symlinks: false,
            respect_gitignore: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the repository root, `/`-separated.
    pub relative_path: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub root: PathBuf,
    /// Source roots that were found and walked. Empty when the whole tree was used.
    pub source_roots: Vec<PathBuf>,
    pub files: Vec<ScannedFile>,
    pub skipped_too_large: usize,
    pub walk_errors: Vec<String>,
    pub duration: Duration,
}

/// Finds Java sources under a repository directory.
#[derive(Debug, Clone)]
pub struct RepositoryScanner {
    config: ScanConfig,
    include: GlobSet,
    exclude: GlobSet,
}

impl RepositoryScanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let include = build_globset(&config.include_patterns)?;
        let exclude = build_globset(&config.exclude_patterns)?;
        Ok(Self {
            config,
            include,
            exclude,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn scan(&self, root: &Path) -> Result<ScanResult> {
        let start = Instant::now();

        let metadata = std::fs::metadata(root).map_err(|e| JavaLoreError::DirectoryAccess {
            path: root.to_path_buf(),
            details: e.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(JavaLoreError::DirectoryAccess {
                path: root.to_path_buf(),
                details: "not a directory".to_string(),
            });
        }

        let source_roots = self.resolve_source_roots(root)?;
        let walk_roots = if source_roots.is_empty() {
            vec![root.to_path_buf()]
        } else {
            source_roots.clone()
        };

        let mut files = Vec::new();
        let mut skipped_too_large = 0;
        let mut walk_errors = Vec::new();

        for walk_root in &walk_roots {
            let mut builder = WalkBuilder::new(walk_root);
            builder
                .hidden(true)
                .follow_links(self.config.follow_symlinks)
                .git_ignore(self.config.respect_gitignore)
                .git_global(self.config.respect_gitignore)
                .git_exclude(self.config.respect_gitignore)
                .max_depth(self.config.max_depth);

            for result in builder.build() {
                let entry = match result {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!("Skipping unreadable entry: {}", err);
                        walk_errors.push(err.to_string());
                        continue;
                    }
                };
                if !entry.file_type().map_or(false, |ft| ft.is_file()) {
                    continue;
                }

                let path = entry.path();
                let relative = relative_path(root, path);
                if !self.include.is_match(&relative) || self.exclude.is_match(&relative) {
                    continue;
                }

                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(err) => {
                        walk_errors.push(format!("{}: {}", relative, err));
                        continue;
                    }
                };
                if size > self.config.max_file_size {
                    debug!("Skipping {} ({} bytes)", relative, size);
                    skipped_too_large += 1;
                    continue;
                }

                files.push(ScannedFile {
                    path: path.to_path_buf(),
                    relative_path: relative,
                    size,
                });
            }
        }

        if files.is_empty() {
            return Err(JavaLoreError::NoSourceFiles {
                path: root.to_path_buf(),
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        files.dedup_by(|a, b| a.relative_path == b.relative_path);

        let result = ScanResult {
            root: root.to_path_buf(),
            source_roots,
            files,
            skipped_too_large,
            walk_errors,
            duration: start.elapsed(),
        };
        info!(
            "Scanned {}: {} Java files in {:?}",
            root.display(),
            result.files.len(),
            result.duration
        );
        Ok(result)
    }

    /// Every directory under `root` whose relative path ends with one of the
    /// configured source roots, so each module of a multi-module build counts.
    fn resolve_source_roots(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let wanted: Vec<String> = self
            .config
            .source_roots
            .iter()
            .map(|r| normalize_root(r))
            .filter(|r| !r.is_empty())
            .collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .follow_links(self.config.follow_symlinks)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .max_depth(self.config.max_depth)
            .filter_entry(|entry| entry.file_type().map_or(false, |ft| ft.is_dir()));

        let mut found: Vec<(String, PathBuf)> = Vec::new();
        for entry in builder.build().flatten() {
            let relative = relative_path(root, entry.path());
            if relative.is_empty() {
                continue;
            }
            let dir_pattern = format!("{}/", relative);
            if self.exclude.is_match(&dir_pattern) || self.exclude.is_match(&relative) {
                continue;
            }
            let matches = wanted
                .iter()
                .any(|r| relative == *r || relative.ends_with(&format!("/{}", r)));
            if matches {
                found.push((relative, entry.path().to_path_buf()));
            }
        }

        // Shortest first, then drop roots nested inside an earlier one.
        found.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));
        let mut roots: Vec<(String, PathBuf)> = Vec::new();
        for (relative, path) in found {
            let nested = roots
                .iter()
                .any(|(outer, _)| relative.starts_with(&format!("{}/", outer)));
            if !nested {
                roots.push((relative, path));
            }
        }
        roots.sort_by(|a, b| a.0.cmp(&b.0));
        let roots: Vec<PathBuf> = roots.into_iter().map(|(_, path)| path).collect();

        if roots.is_empty() {
            if self.config.strict_source_roots {
                return Err(JavaLoreError::DirectoryAccess {
                    path: root.to_path_buf(),
                    details: format!(
                        "none of the source roots {:?} exist",
                        self.config.source_roots
                    ),
                });
            }
            debug!(
                "No source root of {:?} under {}, scanning the whole tree",
                self.config.source_roots,
                root.display()
            );
        } else {
            debug!("Found {} source roots under {}", roots.len(), root.display());
        }
        Ok(roots)
    }
}

pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn normalize_root(root: &str) -> String {
    root.split(|c| c == '/' || c == '\\')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
