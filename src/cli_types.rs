use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "javalore")]
#[command(about = "Index Java sources and query their API surface")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config file)
    #[arg(short, long, global = true, env = "JAVALORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging and extra output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index directories and print what was found
    Index(IndexArgs),
    /// Find methods by name
    Search(SearchArgs),
    /// Show one type by fully qualified name
    Class(ClassArgs),
    /// List the types of a package
    Package(PackageArgs),
    /// Extract a single Java file without indexing
    Analyze(AnalyzeArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Directories to index before a query runs.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Repository or source directory (repeatable)
    #[arg(short = 'd', long = "dir", value_name = "DIR", required = true)]
    pub dirs: Vec<PathBuf>,

    /// Origin label; only valid with a single directory
    #[arg(long)]
    pub origin: Option<String>,

    /// Skip private members and private nested types
    #[arg(long)]
    pub public_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// List every indexed type
    #[arg(long)]
    pub list: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Method name, or a fragment with --partial
    pub name: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Only methods declared on types with this simple name
    #[arg(long)]
    pub class: Option<String>,

    #[arg(long)]
    pub case_sensitive: bool,

    /// Match methods whose name contains the query
    #[arg(long)]
    pub partial: bool,

    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ClassArgs {
    /// Fully qualified type name, e.g. com.acme.Util
    pub fqn: String,

    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub case_sensitive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// Package name, e.g. com.acme.util
    pub package: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Only types from this origin
    #[arg(long)]
    pub only_origin: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Java file to extract
    pub file: PathBuf,

    #[arg(long, default_value = "local")]
    pub origin: String,

    /// Skip private members and private nested types
    #[arg(long)]
    pub public_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print the path of the per-user config file instead
    #[arg(long)]
    pub path: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_command() {
        let cli = Cli::try_parse_from([
            "javalore", "search", "parse", "-d", "lib-a", "-d", "lib-b", "--partial", "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.name, "parse");
                assert_eq!(args.source.dirs.len(), 2);
                assert!(args.partial);
                assert!(!args.case_sensitive);
                assert_eq!(args.limit, 50);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_source_directory_is_required() {
        assert!(Cli::try_parse_from(["javalore", "class", "com.acme.Util"]).is_err());
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["javalore", "analyze", "Util.java"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.origin, "local");
                assert!(!args.public_only);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
