use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use tokio::fs;
use tracing::info;

use crate::{
    analyzers::{JavaAnalyzer, LanguageAnalyzer},
    cli_types::{AnalyzeArgs, ClassArgs, ConfigArgs, IndexArgs, PackageArgs, SearchArgs, SourceArgs},
    config::JavaLoreConfig,
    engine::{IndexReport, JavaLore, JavaLoreBuilder},
    extractor::ExtractorOptions,
    storage::MethodHit,
    tools::{method_json, names_match, type_summary_json},
    types::{FileAnalysis, JavaType, Method},
};

pub struct CliApp {
    config: JavaLoreConfig,
    verbose: bool,
    json: bool,
}

impl CliApp {
    pub fn new(config: JavaLoreConfig, verbose: bool, colors_enabled: bool, json: bool) -> Result<Self> {
        info!("Initializing javalore CLI");
        config.validate().context("Invalid configuration")?;
        colored::control::set_override(colors_enabled && !json);

        Ok(Self {
            config,
            verbose,
            json,
        })
    }

    pub async fn index(&self, args: IndexArgs) -> Result<()> {
        let start_time = Instant::now();
        let (lore, reports) = self.load(&args.source).await?;

        if self.json {
            let types: Vec<Value> = if args.list {
                all_types(&lore).iter().map(|ty| type_summary_json(ty)).collect()
            } else {
                Vec::new()
            };
            let output = json!({
                "reports": reports,
                "stats": lore.stats(),
                "types": types,
            });
            return print_json(&output);
        }

        self.print_header("Index");
        for report in &reports {
            self.print_report(report);
        }

        let stats = lore.stats();
        self.print_success(&format!(
            "{} types, {} methods, {} fields in {} packages from {} origin(s)",
            stats.types, stats.methods, stats.fields, stats.packages, stats.origins
        ));

        if args.list {
            println!();
            for ty in all_types(&lore) {
                println!("  {}", format_type_line(&ty));
            }
        }

        if self.verbose {
            self.print_info(&format!("Total time: {:?}", start_time.elapsed()));
        }
        Ok(())
    }

    pub async fn search(&self, args: SearchArgs) -> Result<()> {
        let (lore, _) = self.load(&args.source).await?;
        let query = lore.query();

        let mut hits = if args.partial {
            let mut hits = query.find_methods_by_partial_name(&args.name, args.case_sensitive);
            if let Some(class) = &args.class {
                hits.retain(|hit| names_match(&hit.owner().name, class, args.case_sensitive));
            }
            hits
        } else {
            query.find_methods_by_name(&args.name, args.class.as_deref(), args.case_sensitive)
        };
        let total = hits.len();
        hits.truncate(args.limit);

        if self.json {
            let methods: Vec<Value> = hits.iter().map(method_json).collect();
            return print_json(&json!({
                "query": args.name,
                "total": total,
                "methods": methods,
            }));
        }

        self.print_header("Method Search");
        if hits.is_empty() {
            self.print_warning(&format!("No methods match '{}'", args.name));
            return Ok(());
        }

        for hit in &hits {
            println!("{}", format_method_hit(hit));
        }
        if total > hits.len() {
            self.print_info(&format!("Showing {} of {} matches", hits.len(), total));
        } else {
            self.print_success(&format!("{} match(es)", total));
        }
        Ok(())
    }

    pub async fn class(&self, args: ClassArgs) -> Result<()> {
        let (lore, _) = self.load(&args.source).await?;
        let query = lore.query();

        let found = if args.case_sensitive {
            query.find_type_by_fqn(&args.fqn)
        } else {
            query.find_type_by_fqn_case_insensitive(&args.fqn)
        };

        let Some(ty) = found else {
            let simple = args.fqn.rsplit('.').next().unwrap_or(&args.fqn);
            let candidates = query.find_types_by_simple_name_with(simple, false);
            if self.json {
                let candidates: Vec<&str> = candidates.iter().map(|t| t.fqn.as_str()).collect();
                return print_json(&json!({
                    "found": false,
                    "fully_qualified_name": args.fqn,
                    "candidates": candidates,
                }));
            }
            self.print_warning(&format!("No type named {}", args.fqn));
            if !candidates.is_empty() {
                self.print_info("Types with the same simple name:");
                for candidate in candidates {
                    println!("  {}", candidate.fqn);
                }
            }
            return Ok(());
        };

        if self.json {
            return print_json(&json!({
                "found": true,
                "type": ty.as_ref(),
            }));
        }

        self.print_header(&format!("{} {}", ty.kind.as_str(), ty.fqn));
        self.print_type_details(&ty);
        Ok(())
    }

    pub async fn package(&self, args: PackageArgs) -> Result<()> {
        let (lore, _) = self.load(&args.source).await?;
        let query = lore.query();

        let types = match &args.only_origin {
            Some(origin) => query.find_types_by_package_in_origin(&args.package, origin),
            None => query.find_types_by_package(&args.package),
        };

        if self.json {
            let types: Vec<Value> = types.iter().map(|ty| type_summary_json(ty)).collect();
            return print_json(&json!({
                "package": args.package,
                "types": types,
            }));
        }

        self.print_header(&format!("Package {}", args.package));
        if types.is_empty() {
            self.print_warning("No types in this package");
            return Ok(());
        }
        for ty in &types {
            println!("  {}", format_type_line(ty));
        }
        self.print_success(&format!("{} type(s)", types.len()));
        Ok(())
    }

    pub async fn analyze(&self, args: AnalyzeArgs) -> Result<()> {
        if !args.file.is_file() {
            bail!("File not found: {}", args.file.display());
        }

        let start_time = Instant::now();
        let content = fs::read(&args.file)
            .await
            .with_context(|| format!("Failed to read {}", args.file.display()))?;
        let content = String::from_utf8_lossy(&content);

        let mut options = self.config.extractor_options();
        if args.public_only {
            options = ExtractorOptions {
                include_private: false,
            };
        }
        let analyzer = JavaAnalyzer::with_options(options);
        let file_path = args.file.display().to_string();
        let analysis = analyzer
            .analyze(&content, &file_path, &args.origin)
            .with_context(|| format!("Failed to analyze {}", file_path))?;

        if self.json {
            return print_json(&serde_json::to_value(&analysis)?);
        }

        self.print_header("File Analysis");
        self.print_analysis(&analysis);
        if self.verbose {
            self.print_info(&format!("Analysis completed in {:?}", start_time.elapsed()));
        }
        Ok(())
    }

    pub fn show_config(&self, args: ConfigArgs) -> Result<()> {
        if args.path {
            match JavaLoreConfig::default_path() {
                Some(path) => println!("{}", path.display()),
                None => self.print_warning("No home directory; the per-user config file is unavailable"),
            }
            return Ok(());
        }

        if self.json {
            return print_json(&serde_json::to_value(&self.config)?);
        }

        self.print_header("Configuration");
        let text = self
            .config
            .to_toml_string()
            .context("Failed to serialize configuration")?;
        println!("{}", text);
        Ok(())
    }

    /// Index every directory of `source` into one fresh engine.
    async fn load(&self, source: &SourceArgs) -> Result<(JavaLore, Vec<IndexReport>)> {
        if source.origin.is_some() && source.dirs.len() > 1 {
            bail!("--origin can only be used with a single directory");
        }

        let mut builder = JavaLoreBuilder::from_config(&self.config);
        if source.public_only {
            builder = builder.include_private(false);
        }
        let lore = builder.build().context("Failed to set up the indexer")?;

        let mut reports = Vec::with_capacity(source.dirs.len());
        for dir in &source.dirs {
            let origin = origin_for(dir, source.origin.as_deref());
            let progress = self.spinner(&format!("Indexing {} as '{}'", dir.display(), origin));

            let result = lore
                .index_directory(&origin, dir)
                .await
                .with_context(|| format!("Failed to index {}", dir.display()));
            match &result {
                Ok(report) => progress.finish_with_message(format!(
                    "Indexed '{}': {} types from {} files",
                    origin, report.types_indexed, report.files_scanned
                )),
                Err(_) => progress.abandon(),
            }
            reports.push(result?);
        }
        Ok((lore, reports))
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.to_string());
        progress.enable_steady_tick(Duration::from_millis(100));
        progress
    }

    fn print_report(&self, report: &IndexReport) {
        self.print_success(&format!(
            "{}: {} files, {} types, {} methods in {:?}",
            report.origin.bold(),
            report.files_scanned,
            report.types_indexed,
            report.methods_indexed,
            report.duration
        ));
        if report.files_with_syntax_errors > 0 {
            self.print_warning(&format!(
                "{} file(s) contained syntax errors",
                report.files_with_syntax_errors
            ));
        }
        for failure in &report.files_failed {
            self.print_warning(&format!("{}: {}", failure.path, failure.reason));
        }
        for collision in &report.collisions {
            self.print_warning(&format!("Duplicate type {}", collision));
        }
        if self.verbose {
            for error in &report.extraction_errors {
                self.print_info(&format!(
                    "{}: {}",
                    error.file.as_deref().unwrap_or("<unknown>"),
                    error
                ));
            }
        } else if !report.extraction_errors.is_empty() {
            self.print_info(&format!(
                "{} declaration(s) skipped (use --verbose for details)",
                report.extraction_errors.len()
            ));
        }
    }

    fn print_analysis(&self, analysis: &FileAnalysis) {
        self.print_info(&format!("{} [{}]", analysis.file_path, analysis.origin));
        for ty in &analysis.types {
            println!();
            println!("{}", format_type_line(ty));
            self.print_type_details(ty);
        }
        if analysis.has_syntax_errors {
            self.print_warning("The file contains syntax errors");
        }
        for error in &analysis.errors {
            self.print_warning(&error.to_string());
        }
        self.print_success(&format!(
            "{} type(s), {} method(s)",
            analysis.types.len(),
            analysis.method_count()
        ));
    }

    fn print_type_details(&self, ty: &JavaType) {
        if let Some(doc) = ty.doc.as_ref().filter(|d| !d.summary.is_empty()) {
            println!("  {}", doc.summary.italic());
        }
        let supers: Vec<&str> = ty.super_types().collect();
        if !supers.is_empty() {
            println!("  {} {}", "supertypes:".dimmed(), supers.join(", "));
        }
        if let Some(file) = &ty.source_file {
            println!("  {} {}:{}", "source:".dimmed(), file, ty.line);
        }
        if !ty.fields.is_empty() {
            println!("  {}", "fields".bold());
            for field in &ty.fields {
                println!(
                    "    {}{} {}",
                    modifiers_prefix(field.modifiers.iter().map(|m| m.as_str())),
                    field.type_name.cyan(),
                    field.name
                );
            }
        }
        if !ty.methods.is_empty() {
            println!("  {}", "methods".bold());
            for method in &ty.methods {
                println!("    {}", format_method(method));
            }
        }
        if !ty.nested_types.is_empty() {
            println!("  {} {}", "nested:".dimmed(), ty.nested_types.join(", "));
        }
    }

    // Utility methods for consistent output formatting
    fn print_header(&self, title: &str) {
        println!("{}", title.bold().blue());
        println!("{}", "─".repeat(title.chars().count()).blue());
    }

    fn print_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    fn print_info(&self, message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    fn print_warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message.yellow());
    }
}

/// Directory name unless an explicit origin was given.
fn origin_for(dir: &Path, explicit: Option<&str>) -> String {
    if let Some(origin) = explicit {
        return origin.to_string();
    }
    dir.canonicalize()
        .ok()
        .as_deref()
        .and_then(|p| p.file_name())
        .or_else(|| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

fn all_types(lore: &JavaLore) -> Vec<Arc<JavaType>> {
    let query = lore.query();
    let origins = lore.index().read().origins();
    origins
        .iter()
        .flat_map(|origin| query.find_types_by_origin(origin))
        .collect()
}

fn modifiers_prefix<'a>(modifiers: impl Iterator<Item = &'a str>) -> String {
    let mut prefix = String::new();
    for modifier in modifiers {
        prefix.push_str(modifier);
        prefix.push(' ');
    }
    prefix
}

fn format_type_line(ty: &JavaType) -> String {
    format!(
        "{} {} {}",
        ty.kind.as_str().magenta(),
        ty.fqn.bold(),
        format!("[{}]", ty.origin).dimmed()
    )
}

fn format_method(method: &Method) -> String {
    let mut line = format!(
        "{}{}",
        modifiers_prefix(method.modifiers.iter().map(|m| m.as_str())),
        method.signature()
    );
    if !method.throws.is_empty() {
        line.push_str(&format!(" throws {}", method.throws.join(", ")));
    }
    line
}

fn format_method_hit(hit: &MethodHit) -> String {
    let owner = hit.owner();
    let method = hit.method();
    let mut line = format!(
        "{}.{}  {}",
        owner.fqn.cyan(),
        method.name.bold(),
        format_method(method)
    );
    if let Some(doc) = method.doc.as_ref().filter(|d| !d.summary.is_empty()) {
        line.push_str(&format!("\n    {}", doc.summary.italic()));
    }
    line
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const UTIL: &str = r#"
package com.acme;

/** String helpers. */
public class Util {
    /** Joins parts. */
    public static String join(String sep, String... parts) { return ""; }
    public int parseInt(String s) { return 0; }
}
"#;

    fn create_test_repo(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("lib-a/src/main/java/com/acme/Util.java");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, UTIL).unwrap();
        dir.path().join("lib-a")
    }

    fn source(dirs: Vec<PathBuf>, origin: Option<&str>) -> SourceArgs {
        SourceArgs {
            dirs,
            origin: origin.map(str::to_string),
            public_only: false,
        }
    }

    fn create_app(json: bool) -> CliApp {
        CliApp::new(JavaLoreConfig::default(), false, false, json).unwrap()
    }

    #[test]
    fn test_origin_defaults_to_directory_name() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo(&dir);
        assert_eq!(origin_for(&repo, None), "lib-a");
        assert_eq!(origin_for(&repo, Some("core")), "core");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = JavaLoreConfig::default();
        config.logging.level = "chatty".to_string();
        assert!(CliApp::new(config, false, false, false).is_err());
    }

    #[tokio::test]
    async fn test_load_indexes_each_directory() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo(&dir);
        let app = create_app(true);

        let (lore, reports) = app.load(&source(vec![repo], None)).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].origin, "lib-a");
        assert_eq!(reports[0].types_indexed, 1);
        assert!(lore.query().find_type_by_fqn("com.acme.Util").is_some());
    }

    #[tokio::test]
    async fn test_origin_with_many_directories_is_rejected() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo(&dir);
        let app = create_app(true);

        let result = app.load(&source(vec![repo.clone(), repo], Some("x"))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_commands_run_in_json_mode() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo(&dir);
        let app = create_app(true);

        app.search(SearchArgs {
            name: "JOIN".to_string(),
            source: source(vec![repo.clone()], None),
            class: Some("util".to_string()),
            case_sensitive: false,
            partial: false,
            limit: 10,
        })
        .await
        .unwrap();

        app.class(ClassArgs {
            fqn: "com.acme.Missing".to_string(),
            source: source(vec![repo.clone()], None),
            case_sensitive: true,
        })
        .await
        .unwrap();

        app.package(PackageArgs {
            package: "com.acme".to_string(),
            source: source(vec![repo], None),
            only_origin: Some("lib-a".to_string()),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_analyze_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Util.java");
        std::fs::write(&file, UTIL).unwrap();
        let app = create_app(false);

        let result = app
            .analyze(AnalyzeArgs {
                file,
                origin: "local".to_string(),
                public_only: true,
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_analyze_missing_file() {
        let app = create_app(false);
        let result = app
            .analyze(AnalyzeArgs {
                file: PathBuf::from("/no/such/File.java"),
                origin: "local".to_string(),
                public_only: false,
            })
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_show_config() {
        let app = create_app(false);
        assert!(app.show_config(ConfigArgs { path: false }).is_ok());
        assert!(app.show_config(ConfigArgs { path: true }).is_ok());
    }
}
