use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{JavaLoreError, Result};
use crate::extractor::ExtractorOptions;
use crate::scanner::discovery::build_globset;
use crate::scanner::ScanConfig;

const ENV_PREFIX: &str = "JAVALORE";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaLoreConfig {
    pub scanning: ScanningConfig,
    pub indexing: IndexingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    pub source_roots: Vec<String>,
    pub strict_source_roots: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_file_size: u64,
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
    pub respect_gitignore: bool,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        let scan = ScanConfig::default();
        Self {
            source_roots: scan.source_roots,
            strict_source_roots: scan.strict_source_roots,
            include_patterns: scan.include_patterns,
            exclude_patterns: scan.exclude_patterns,
            max_file_size: scan.max_file_size,
            max_depth: scan.max_depth,
            follow_symlinks: scan.follow_symlinks,
            respect_gitignore: scan.respect_gitignore,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    pub include_private: bool,
    /// Worker threads for parsing; `0` means one per CPU.
    pub threads: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            include_private: true,
            threads: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl JavaLoreConfig {
    /// Defaults, then a TOML file, then `JAVALORE__SECTION__KEY` variables.
    ///
    /// An explicit `path` must exist; the per-user config file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&JavaLoreConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(user_file) = Self::default_path() {
                    builder = builder
                        .add_source(File::from(user_file).format(FileFormat::Toml).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scanning.source_roots")
                .with_list_parse_key("scanning.include_patterns")
                .with_list_parse_key("scanning.exclude_patterns"),
        );

        let config: JavaLoreConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults, without touching the
    /// environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: JavaLoreConfig =
            toml::from_str(content).map_err(|e| JavaLoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| JavaLoreError::Config(e.to_string()))
    }

    /// `<platform config dir>/javalore/config.toml`, when a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "javalore", "javalore").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.scanning.source_roots.iter().any(|r| r.trim().is_empty()) {
            return Err(JavaLoreError::Config("source roots must not be empty strings".to_string()));
        }
        if self.scanning.include_patterns.is_empty() {
            return Err(JavaLoreError::Config("at least one include pattern is required".to_string()));
        }
        if self.scanning.max_file_size == 0 {
            return Err(JavaLoreError::Config("max_file_size must be greater than zero".to_string()));
        }
        if self.scanning.max_depth == Some(0) {
            return Err(JavaLoreError::Config("max_depth must be greater than zero".to_string()));
        }
        build_globset(&self.scanning.include_patterns)?;
        build_globset(&self.scanning.exclude_patterns)?;

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(JavaLoreError::Config(format!(
                "unknown log level '{}', expected one of {:?}",
                self.logging.level, LOG_LEVELS
            )));
        }
        Ok(())
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            source_roots: self.scanning.source_roots.clone(),
            strict_source_roots: self.scanning.strict_source_roots,
            include_patterns: self.scanning.include_patterns.clone(),
            exclude_patterns: self.scanning.exclude_patterns.clone(),
            max_file_size: self.scanning.max_file_size,
            max_depth: self.scanning.max_depth,
            follow_symlinks: self.scanning.follow_symlinks,
            respect_gitignore: self.scanning.respect_gitignore,
        }
    }

    pub fn extractor_options(&self) -> ExtractorOptions {
        ExtractorOptions {
            include_private: self.indexing.include_private,
        }
    }
}
