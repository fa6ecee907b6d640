//! Document locations and reference resolution.

use crate::error::{ConfigError, ConfigResult};
use crate::security::{canonicalize_lenient, is_remote_uri, PathSecurityContext, ResolvedPath};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Where a document (or SQL file) lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentLocation {
    /// Canonical local path.
    Local(PathBuf),
    /// Remote URI.
    Remote(Url),
}

/// Structured-text format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML.
    Yaml,
    /// JSON.
    Json,
}

impl DocumentLocation {
    /// Parse an entry point given by a caller.
    ///
    /// Local entries are made absolute against the working directory and
    /// canonicalized; they are not checked against any root since they
    /// define the root.
    pub fn entry(raw: &str) -> ConfigResult<Self> {
        if raw.is_empty() {
            return Err(ConfigError::NotFound {
                location: String::new(),
            });
        }
        if is_remote_uri(raw) && !raw.starts_with("file://") {
            return Self::remote(raw);
        }

        let path = match Url::parse(raw).ok().and_then(|u| u.to_file_path().ok()) {
            Some(path) if raw.starts_with("file://") => path,
            _ => PathBuf::from(raw),
        };
        let absolute = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map_err(|e| ConfigError::Fetch {
                    location: raw.to_string(),
                    message: e.to_string(),
                })?
                .join(path)
        };
        let canonical = canonicalize_lenient(&absolute).map_err(|e| ConfigError::Fetch {
            location: raw.to_string(),
            message: e.to_string(),
        })?;
        Ok(DocumentLocation::Local(canonical))
    }

    fn remote(raw: &str) -> ConfigResult<Self> {
        Url::parse(raw)
            .map(DocumentLocation::Remote)
            .map_err(|e| ConfigError::Fetch {
                location: raw.to_string(),
                message: format!("invalid URI: {}", e),
            })
    }

    /// Stable identity used for cycle detection and merge bookkeeping.
    pub fn identity(&self) -> String {
        self.to_string()
    }

    /// Check whether this location is remote.
    pub fn is_remote(&self) -> bool {
        matches!(self, DocumentLocation::Remote(_))
    }

    /// Directory that relative references resolve against (local only).
    pub fn base_dir(&self) -> Option<&Path> {
        match self {
            DocumentLocation::Local(path) => path.parent(),
            DocumentLocation::Remote(_) => None,
        }
    }

    /// Format inferred from the extension; anything but `.json` is YAML.
    pub fn format(&self) -> DocumentFormat {
        let name = match self {
            DocumentLocation::Local(path) => path.to_string_lossy().into_owned(),
            DocumentLocation::Remote(url) => url.path().to_string(),
        };
        if name.to_ascii_lowercase().ends_with(".json") {
            DocumentFormat::Json
        } else {
            DocumentFormat::Yaml
        }
    }

    /// Resolve a reference written inside this document.
    ///
    /// Local documents resolve relative paths against their own directory
    /// and enforce `security`. Remote documents resolve by URL joining.
    /// References carrying their own scheme are taken as-is.
    pub fn resolve(
        &self,
        reference: &str,
        security: &PathSecurityContext,
    ) -> ConfigResult<ResolvedPath> {
        match self {
            DocumentLocation::Local(path) => {
                let base = path.parent().unwrap_or(security.primary_root());
                Ok(security.resolve_from(base, reference)?)
            }
            DocumentLocation::Remote(url) => {
                if reference.is_empty() {
                    return Err(crate::security::SecurityError::EmptyPath.into());
                }
                if is_remote_uri(reference) {
                    return Ok(ResolvedPath::Remote(reference.to_string()));
                }
                url.join(reference)
                    .map(|joined| ResolvedPath::Remote(joined.to_string()))
                    .map_err(|e| ConfigError::Fetch {
                        location: reference.to_string(),
                        message: format!("cannot resolve against {}: {}", url, e),
                    })
            }
        }
    }

    /// Resolve a reference to another document.
    pub fn join(
        &self,
        reference: &str,
        security: &PathSecurityContext,
    ) -> ConfigResult<DocumentLocation> {
        match self.resolve(reference, security)? {
            ResolvedPath::Local(path) => Ok(DocumentLocation::Local(path)),
            ResolvedPath::Remote(uri) => Self::remote(&uri),
        }
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentLocation::Local(path) => write!(f, "{}", path.display()),
            DocumentLocation::Remote(url) => write!(f, "{}", url),
        }
    }
}
