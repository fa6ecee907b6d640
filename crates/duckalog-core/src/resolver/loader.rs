//! Import/merge resolution.
//!
//! [`ConfigLoader::load`] reads the entry document, substitutes environment
//! variables, resolves every path it references, and then recursively does
//! the same for its imports. Imported documents are merged before the
//! importing document's own fields, so the importer wins scalar conflicts.
//! Validation runs once, on the fully merged result.

use super::fetcher::{ContentFetcher, FetchError, ObjectStoreFetcher};
use super::location::{DocumentFormat, DocumentLocation};
use crate::config::{
    self, merge_into, CatalogDocument, DocumentSpec, SourceKind, MEMORY_DATABASE,
};
use crate::env::{substitute_value, EnvLookup};
use crate::error::{ConfigError, ConfigResult};
use crate::security::PathSecurityContext;
use crate::template;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

/// Default bound on import nesting.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 10;

/// Options for loading a configuration.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Allowed roots in addition to the entry document's directory.
    pub extra_roots: Vec<PathBuf>,
    /// Maximum import nesting; the entry document is depth 0.
    pub max_import_depth: usize,
    /// Source of `${env:NAME}` values.
    pub env: EnvLookup,
    /// Reads documents and SQL files.
    pub fetcher: Arc<dyn ContentFetcher>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extra_roots: Vec::new(),
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            env: EnvLookup::Process,
            fetcher: Arc::new(ObjectStoreFetcher::new()),
        }
    }
}

impl LoadOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow another root directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.extra_roots.push(root.into());
        self
    }

    /// Set the maximum import depth.
    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    /// Set the environment lookup.
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    /// Set the content fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

/// Loads, merges, and validates configuration documents.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    options: LoadOptions,
}

impl ConfigLoader {
    /// Create a loader.
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Loader options.
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Build the security context for an entry document: its own directory
    /// plus the configured extra roots.
    pub fn security_context(&self, entry: &DocumentLocation) -> ConfigResult<PathSecurityContext> {
        let primary = match entry.base_dir() {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        let mut ctx = PathSecurityContext::new(primary)?;
        for root in &self.options.extra_roots {
            ctx = ctx.with_root(root)?;
        }
        Ok(ctx)
    }

    /// Load `entry` with all its imports into one validated document.
    pub fn load(&self, entry: &str) -> ConfigResult<CatalogDocument> {
        let location = DocumentLocation::entry(entry)?;
        let security = self.security_context(&location)?;
        debug!(entry = %location, roots = security.roots().len(), "loading catalog configuration");

        let mut session = LoadSession {
            options: &self.options,
            security: &security,
            stack: Vec::new(),
            included: HashSet::new(),
            merged: Vec::new(),
        };
        let spec = session
            .load_document(&location, 0)?
            .unwrap_or_default();

        let mut document = config::validate(spec)?;
        document.imports = session.merged;
        if let DocumentLocation::Local(path) = &location {
            document.source = Some(path.clone());
        }
        debug!(
            entry = %location,
            views = document.views.len(),
            imports = document.imports.len(),
            "catalog configuration loaded"
        );
        Ok(document)
    }
}

/// State of one top-level load. Never shared across loads.
struct LoadSession<'a> {
    options: &'a LoadOptions,
    security: &'a PathSecurityContext,
    /// Current import chain, for cycle detection.
    stack: Vec<String>,
    /// Documents already merged somewhere in this load.
    included: HashSet<String>,
    /// Imported identities in merge order.
    merged: Vec<String>,
}

impl LoadSession<'_> {
    /// Load one document and its imports. Returns `None` when the document
    /// was already merged elsewhere in this load.
    fn load_document(
        &mut self,
        location: &DocumentLocation,
        depth: usize,
    ) -> ConfigResult<Option<DocumentSpec>> {
        let identity = location.identity();

        if let Some(pos) = self.stack.iter().position(|id| *id == identity) {
            let mut chain = self.stack[pos..].to_vec();
            chain.push(identity);
            return Err(ConfigError::CircularImport { chain });
        }
        if depth > self.options.max_import_depth {
            return Err(ConfigError::ImportDepthExceeded {
                max_depth: self.options.max_import_depth,
                location: identity,
            });
        }
        if !self.included.insert(identity.clone()) {
            debug!(location = %identity, "document already merged, skipping");
            return Ok(None);
        }

        let mut own = self.read_document(location)?;
        self.resolve_paths(location, &mut own)?;
        let imports = std::mem::take(&mut own.imports);

        self.stack.push(identity.clone());
        let mut acc = DocumentSpec::default();
        for import in &imports {
            let child = location.join(import, self.security)?;
            debug!(from = %identity, import = %child, depth = depth + 1, "resolving import");
            if let Some(spec) = self.load_document(&child, depth + 1)? {
                merge_into(&mut acc, spec);
            }
        }
        self.stack.pop();

        merge_into(&mut acc, own);
        if depth > 0 {
            self.merged.push(identity);
        }
        Ok(Some(acc))
    }

    fn fetch(&self, location: &DocumentLocation) -> ConfigResult<Vec<u8>> {
        trace!(location = %location, "fetching");
        self.options
            .fetcher
            .fetch(location)
            .map_err(|err| match err {
                FetchError::NotFound => ConfigError::NotFound {
                    location: location.identity(),
                },
                other => ConfigError::Fetch {
                    location: location.identity(),
                    message: other.to_string(),
                },
            })
    }

    fn read_document(&self, location: &DocumentLocation) -> ConfigResult<DocumentSpec> {
        let identity = location.identity();
        let bytes = self.fetch(location)?;
        let parse_error = |message: String| ConfigError::Parse {
            location: identity.clone(),
            message,
        };

        let mut value: serde_json::Value = match location.format() {
            DocumentFormat::Json => {
                serde_json::from_slice(&bytes).map_err(|e| parse_error(e.to_string()))?
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_slice(&bytes).map_err(|e| parse_error(e.to_string()))?
            }
        };
        if value.is_null() {
            return Err(parse_error("document is empty".to_string()));
        }

        substitute_value(&mut value, &self.options.env, &identity)?;
        serde_json::from_value(value).map_err(|e| parse_error(e.to_string()))
    }

    fn resolve(&self, location: &DocumentLocation, reference: &str) -> ConfigResult<String> {
        Ok(location.resolve(reference, self.security)?.into_string())
    }

    /// Resolve every path-like field of `spec` against `location` and load
    /// file-backed SQL bodies.
    fn resolve_paths(&self, location: &DocumentLocation, spec: &mut DocumentSpec) -> ConfigResult<()> {
        if let Some(duckdb) = spec.duckdb.as_mut() {
            if let Some(database) = duckdb.database.as_mut() {
                if database.as_str() != MEMORY_DATABASE {
                    *database = self.resolve(location, database)?;
                }
            }
        }

        for a in &mut spec.attachments.duckdb {
            a.path = self.resolve(location, &a.path)?;
        }
        for a in &mut spec.attachments.sqlite {
            a.path = self.resolve(location, &a.path)?;
        }
        for a in &mut spec.attachments.duckalog {
            a.config_path = self.resolve(location, &a.config_path)?;
            if let Some(database) = a.database.as_mut() {
                if database.as_str() != MEMORY_DATABASE {
                    *database = self.resolve(location, database)?;
                }
            }
        }
        for catalog in &mut spec.iceberg_catalogs {
            catalog.warehouse = self.resolve(location, &catalog.warehouse)?;
        }

        for view in &mut spec.views {
            if matches!(
                view.source,
                Some(SourceKind::Parquet | SourceKind::Delta | SourceKind::Iceberg)
            ) {
                if let Some(uri) = view.uri.as_mut() {
                    *uri = self.resolve(location, uri)?;
                }
            }

            let always_render = view.sql_template.is_some();
            let file = match view.sql_file.as_mut().or(view.sql_template.as_mut()) {
                Some(file) => file,
                None => continue,
            };
            let sql_location = location.join(&file.path, self.security)?;
            file.path = sql_location.identity();

            let bytes = self.fetch(&sql_location)?;
            let text = String::from_utf8(bytes).map_err(|_| ConfigError::Parse {
                location: file.path.clone(),
                message: "SQL file is not valid UTF-8".to_string(),
            })?;
            let sql = if always_render || file.as_template {
                template::render(&text, &file.variables, &file.path)?
            } else {
                text
            };
            trace!(view = %view.name, path = %file.path, "loaded SQL file");
            view.loaded_sql = Some(sql);
        }
        Ok(())
    }
}
