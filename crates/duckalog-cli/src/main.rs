//! Duckalog Command-Line Client
//!
//! Validate, compile and build declarative DuckDB catalogs.

mod commands;
mod formatter;

use clap::{Parser, Subcommand};
use duckalog::{BuildOptions, ErrorKind, LoadOptions};
use formatter::OutputFormat;
use std::path::PathBuf;

/// Duckalog Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "duckalog")]
#[command(version, about = "Build DuckDB catalogs from YAML or JSON configuration")]
pub struct Args {
    /// Additional directory configuration paths may point into
    #[arg(long = "allow-root", global = true)]
    pub allow_roots: Vec<PathBuf>,

    /// Maximum import nesting
    #[arg(long, global = true, default_value_t = duckalog_core::resolver::DEFAULT_MAX_IMPORT_DEPTH)]
    pub max_import_depth: usize,

    /// Maximum nested catalog depth
    #[arg(long, global = true, default_value_t = duckalog::DEFAULT_MAX_NESTED_DEPTH)]
    pub max_nested_depth: usize,

    /// Do not add extensions implied by sources, attachments and secrets
    #[arg(long, global = true)]
    pub no_auto_extensions: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and validate a configuration
    Validate {
        /// Entry configuration file or URI
        config: String,
    },
    /// Print the SQL a build would execute
    GenerateSql {
        /// Entry configuration file or URI
        config: String,
        /// Print credentials instead of `***`
        #[arg(long)]
        include_secrets: bool,
        /// Write the script to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build the catalog database
    Build {
        /// Entry configuration file or URI
        config: String,
        /// Build into this database instead of the configured one
        #[arg(long)]
        db_path: Option<String>,
        /// Print the redacted script without executing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the merged configuration
    Show {
        /// Entry configuration file or URI
        config: String,
        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

impl Args {
    /// Map flags onto library options.
    pub fn to_options(&self) -> (LoadOptions, BuildOptions) {
        let mut load = LoadOptions::new().with_max_import_depth(self.max_import_depth);
        for root in &self.allow_roots {
            load = load.with_root(root);
        }
        let mut build = BuildOptions::new()
            .with_max_nested_depth(self.max_nested_depth)
            .with_auto_extensions(!self.no_auto_extensions)
            .with_load_options(load.clone());
        if let Command::Build {
            db_path: Some(db_path),
            ..
        } = &self.command
        {
            build = build.with_target(db_path.clone());
        }
        (load, build)
    }
}

/// Process exit code for an error family.
fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Parse
        | ErrorKind::Validation
        | ErrorKind::Type
        | ErrorKind::EnvVar => 2,
        ErrorKind::Import | ErrorKind::Security => 3,
        ErrorKind::Fetch => 4,
        ErrorKind::Connection | ErrorKind::Execution => 5,
        ErrorKind::Cancelled => 130,
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "duckalog=debug" } else { "duckalog=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::run(&args) {
        eprintln!("Error ({}): {}", e.kind, e.message);
        std::process::exit(exit_code(e.kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_flags_map_to_options() {
        let args = Args::parse_from([
            "duckalog",
            "build",
            "catalog.yaml",
            "--db-path",
            "out.duckdb",
            "--allow-root",
            "/shared",
            "--max-import-depth",
            "3",
            "--no-auto-extensions",
        ]);
        let (load, build) = args.to_options();
        assert_eq!(load.max_import_depth, 3);
        assert_eq!(load.extra_roots, vec![PathBuf::from("/shared")]);
        assert_eq!(build.target_override.as_deref(), Some("out.duckdb"));
        assert!(!build.compile.auto_extensions);
        assert_eq!(build.load.extra_roots, load.extra_roots);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["duckalog", "validate", "catalog.yaml"]);
        let (load, build) = args.to_options();
        assert_eq!(load.max_import_depth, 10);
        assert_eq!(build.max_nested_depth, 5);
        assert!(build.target_override.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_exit_codes_distinguish_families() {
        assert_eq!(exit_code(ErrorKind::Validation), 2);
        assert_eq!(exit_code(ErrorKind::Security), 3);
        assert_eq!(exit_code(ErrorKind::Execution), 5);
        assert_ne!(exit_code(ErrorKind::Fetch), exit_code(ErrorKind::Connection));
    }
}
