//! Subcommand implementations.

use crate::formatter;
use crate::{Args, Command};
use duckalog::{
    compile_script, load_and_validate, BuildError, BuildFailure, CatalogBuilder, ConfigError,
    ErrorKind,
};
use thiserror::Error;

/// Error reported to the user.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CliError {
    fn new(kind: ErrorKind, message: impl ToString) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.kind(), e)
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        Self::new(e.kind(), e)
    }
}

impl From<BuildFailure> for CliError {
    fn from(e: BuildFailure) -> Self {
        eprintln!("{}", e.report);
        e.error.into()
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Execution, e)
    }
}

/// Run the selected subcommand.
pub fn run(args: &Args) -> Result<(), CliError> {
    let (load, build) = args.to_options();

    match &args.command {
        Command::Validate { config } => {
            let doc = load_and_validate(config, load)?;
            println!(
                "{} is valid: {} views, {} secrets, {} imports",
                config,
                doc.views.len(),
                doc.secrets.len(),
                doc.imports.len()
            );
        }
        Command::GenerateSql {
            config,
            include_secrets,
            output,
        } => {
            let doc = load_and_validate(config, load)?;
            let script = compile_script(&doc, &build, !include_secrets)?;
            match output {
                Some(path) => {
                    std::fs::write(path, &script)?;
                    tracing::info!(path = %path.display(), "wrote SQL script");
                }
                None => print!("{}", script),
            }
        }
        Command::Build {
            config, dry_run, ..
        } => {
            let doc = load_and_validate(config, load)?;
            if *dry_run {
                print!("{}", compile_script(&doc, &build, true)?);
            } else {
                let report = CatalogBuilder::duckdb(build).build(&doc)?;
                println!("{}", report);
            }
        }
        Command::Show { config, format } => {
            let doc = load_and_validate(config, load)?;
            println!("{}", formatter::format_document(&doc, *format));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_keeps_kind_and_message() {
        let err = CliError::from(ConfigError::validation("duplicate view 'v1'"));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.to_string(), err.message);
        assert!(err.to_string().contains("duplicate view 'v1'"));
    }

    #[test]
    fn test_io_error_is_execution() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = CliError::from(io);
        assert_eq!(err.kind, ErrorKind::Execution);
        assert_eq!(err.to_string(), "read-only");
    }

    #[test]
    fn test_build_error_kind() {
        let err = CliError::from(BuildError::Cancelled);
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }
}
