//! # javalore
//!
//! Extracts the API surface of Java sources (types, methods, fields and their
//! Javadoc), keeps it in an in-memory index keyed by fully qualified name,
//! simple name, package, origin and method name, and answers queries over it.
//!
//! ```no_run
//! use javalore::JavaLore;
//!
//! # async fn example() -> javalore::Result<()> {
//! let lore = JavaLore::builder().build()?;
//! lore.index_directory("commons-lang", "./commons-lang").await?;
//!
//! for hit in lore.query().find_methods_by_name("isBlank", Some("StringUtils"), true) {
//!     println!("{} {}", hit.owner().fqn, hit.method().signature());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod javadoc;
pub mod query;
pub mod scanner;
pub mod storage;
pub mod syntax;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod cli_types;

// Re-export commonly used types
pub use analyzers::{JavaAnalyzer, LanguageAnalyzer};
pub use config::JavaLoreConfig;
pub use engine::{FileFailure, IndexReport, JavaLore, JavaLoreBuilder};
pub use error::{ExtractionError, JavaLoreError, Result};
pub use extractor::{EntityExtractor, ExtractorOptions};
pub use query::QueryEngine;
pub use scanner::{RepositoryScanner, ScanConfig, ScanResult};
pub use storage::{shared_index, ApiIndex, IndexStats, MethodHit, SharedIndex};
pub use tools::{ApiTools, ToolResult, ToolSchema};
pub use types::*;

#[cfg(feature = "cli")]
pub use cli::CliApp;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
