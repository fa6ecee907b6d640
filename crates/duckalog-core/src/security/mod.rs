//! Filesystem security boundary for configuration documents.
//!
//! Every local path referenced by a document (database files, attachment
//! paths, SQL files, data URIs, imports) is confined to an allow-list of
//! root directories held by a [`PathSecurityContext`].
//!
//! # Security Model
//!
//! - Remote URIs (`scheme://...`) are returned unchanged and are never
//!   subject to local boundary checks.
//! - Local paths are made absolute, canonicalized (symlinks followed), and
//!   then compared component-wise against each allowed root.
//! - Canonicalization plus the root-prefix comparison is the only authority.
//!   Nothing counts `..` segments.
//!
//! # Example
//!
//! ```ignore
//! use duckalog_core::security::PathSecurityContext;
//!
//! let ctx = PathSecurityContext::new("/srv/catalog")?;
//! let resolved = ctx.resolve("data/events.parquet")?;
//! assert!(ctx.resolve("../../../etc/passwd").is_err());
//! ```

pub mod error;
pub mod path;

pub use error::{SecurityError, SecurityResult};
pub use path::{canonicalize_lenient, is_remote_uri, PathSecurityContext, ResolvedPath};
