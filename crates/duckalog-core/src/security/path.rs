//! Path resolution confined to an allow-list of root directories.

use super::error::{SecurityError, SecurityResult};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Returns true if `candidate` looks like `<scheme>://...`.
///
/// Single-letter schemes are rejected so Windows drive letters never
/// masquerade as URIs.
pub fn is_remote_uri(candidate: &str) -> bool {
    let Some(idx) = candidate.find("://") else {
        return false;
    };
    let scheme = &candidate[..idx];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    scheme.len() >= 2
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_file_uri(candidate: &str) -> bool {
    candidate
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("file://"))
}

/// Symlinks followed before a path is declared unresolvable.
const MAX_SYMLINK_HOPS: usize = 40;

/// Canonicalize a path that may not exist yet.
///
/// The longest existing ancestor is canonicalized by the operating system
/// (following symlinks). Each remaining component is inspected without
/// following it: a symlink there (including one whose target does not exist)
/// is replaced by its target and the whole path is resolved again, anything
/// else missing is appended lexically. Only `NotFound` lets the search fall
/// back to a shorter ancestor; any other error is returned.
pub fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    resolve_lenient(path, MAX_SYMLINK_HOPS)
}

fn resolve_lenient(path: &Path, hops: usize) -> io::Result<PathBuf> {
    let components: Vec<Component<'_>> = path.components().collect();

    for split in (0..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        if prefix.as_os_str().is_empty() {
            continue;
        }
        let mut resolved = match std::fs::canonicalize(&prefix) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        for (index, component) in components[split..].iter().enumerate() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => {
                    let candidate = resolved.join(part);
                    match std::fs::symlink_metadata(&candidate) {
                        Ok(meta) if meta.file_type().is_symlink() => {
                            if hops == 0 {
                                return Err(io::Error::new(
                                    io::ErrorKind::InvalidInput,
                                    "too many levels of symbolic links",
                                ));
                            }
                            // Relative targets are relative to the link's directory.
                            let mut target = resolved.join(std::fs::read_link(&candidate)?);
                            target.extend(&components[split + index + 1..]);
                            return resolve_lenient(&target, hops - 1);
                        }
                        Ok(_) => resolved.push(part),
                        Err(e) if e.kind() == io::ErrorKind::NotFound => resolved.push(part),
                        Err(e) => return Err(e),
                    }
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        return Ok(resolved);
    }

    Err(io::Error::new(io::ErrorKind::NotFound, "no existing ancestor"))
}

/// A path that passed the security check, or a remote URI that bypassed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedPath {
    /// Canonical local path below an allowed root.
    Local(PathBuf),
    /// Remote URI, unchanged.
    Remote(String),
}

impl ResolvedPath {
    /// Check whether this is a remote URI.
    pub fn is_remote(&self) -> bool {
        matches!(self, ResolvedPath::Remote(_))
    }

    /// Render as the string stored back into the document.
    pub fn into_string(self) -> String {
        match self {
            ResolvedPath::Local(path) => path.to_string_lossy().into_owned(),
            ResolvedPath::Remote(uri) => uri,
        }
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedPath::Local(path) => write!(f, "{}", path.display()),
            ResolvedPath::Remote(uri) => write!(f, "{}", uri),
        }
    }
}

/// Ordered set of canonical root directories that local paths must stay under.
///
/// The first root is the primary root; relative paths resolve against it
/// unless a different base directory is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSecurityContext {
    roots: Vec<PathBuf>,
}

impl PathSecurityContext {
    /// Create a context whose primary root is `primary_root`.
    pub fn new(primary_root: impl AsRef<Path>) -> SecurityResult<Self> {
        let root = Self::canonical_root(primary_root.as_ref())?;
        Ok(Self { roots: vec![root] })
    }

    /// Add another allowed root.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> SecurityResult<Self> {
        let root = Self::canonical_root(root.as_ref())?;
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
        Ok(self)
    }

    fn canonical_root(root: &Path) -> SecurityResult<PathBuf> {
        match std::fs::canonicalize(root) {
            Ok(canonical) if canonical.is_dir() => Ok(canonical),
            _ => Err(SecurityError::InvalidRoot {
                root: root.to_path_buf(),
            }),
        }
    }

    /// The primary root.
    pub fn primary_root(&self) -> &Path {
        &self.roots[0]
    }

    /// All allowed roots, primary first.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve `candidate` relative to the primary root.
    pub fn resolve(&self, candidate: &str) -> SecurityResult<ResolvedPath> {
        let base = self.primary_root().to_path_buf();
        self.resolve_from(&base, candidate)
    }

    /// Resolve `candidate` relative to `base` and enforce the root boundary.
    ///
    /// Remote URIs are returned unchanged. `file://` URIs are treated as
    /// local paths and checked like any other.
    pub fn resolve_from(&self, base: &Path, candidate: &str) -> SecurityResult<ResolvedPath> {
        if candidate.is_empty() {
            return Err(SecurityError::EmptyPath);
        }

        let local = if is_file_uri(candidate) {
            Url::parse(candidate)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| SecurityError::Unresolvable {
                    original: candidate.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "malformed file URI",
                    ),
                })?
        } else if is_remote_uri(candidate) {
            return Ok(ResolvedPath::Remote(candidate.to_string()));
        } else {
            PathBuf::from(candidate)
        };

        let joined = if local.is_absolute() {
            local
        } else {
            base.join(local)
        };

        let canonical =
            canonicalize_lenient(&joined).map_err(|source| SecurityError::Unresolvable {
                original: candidate.to_string(),
                source,
            })?;

        self.check_canonical(candidate, canonical)
            .map(ResolvedPath::Local)
    }

    fn check_canonical(&self, original: &str, canonical: PathBuf) -> SecurityResult<PathBuf> {
        // Path::starts_with compares whole components, so "/a/bc" is not under "/a/b".
        if self.roots.iter().any(|root| canonical.starts_with(root)) {
            Ok(canonical)
        } else {
            Err(SecurityError::OutsideRoots {
                original: original.to_string(),
                resolved: canonical,
                allowed_roots: self.roots.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> (tempfile::TempDir, PathSecurityContext) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data/events.parquet"), b"").unwrap();
        let ctx = PathSecurityContext::new(&root).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_remote_uri_detection() {
        assert!(is_remote_uri("s3://bucket/key.parquet"));
        assert!(is_remote_uri("https://example.com/a.yaml"));
        assert!(is_remote_uri("gcs+json://x/y"));
        assert!(!is_remote_uri("data/file.parquet"));
        assert!(!is_remote_uri("C://windows"));
        assert!(!is_remote_uri("://missing"));
        assert!(!is_remote_uri("1s://bad"));
    }

    #[test]
    fn test_relative_path_inside_root() {
        let (_dir, ctx) = setup();
        let resolved = ctx.resolve("data/events.parquet").unwrap();
        assert_eq!(
            resolved,
            ResolvedPath::Local(ctx.primary_root().join("data/events.parquet"))
        );
    }

    #[test]
    fn test_nonexistent_path_inside_root() {
        let (_dir, ctx) = setup();
        let resolved = ctx.resolve("out/catalog.duckdb").unwrap();
        assert_eq!(
            resolved,
            ResolvedPath::Local(ctx.primary_root().join("out/catalog.duckdb"))
        );
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let (_dir, ctx) = setup();
        let err = ctx.resolve("../../../etc/passwd").unwrap_err();
        match err {
            SecurityError::OutsideRoots {
                original,
                allowed_roots,
                ..
            } => {
                assert_eq!(original, "../../../etc/passwd");
                assert_eq!(allowed_roots, ctx.roots().to_vec());
            }
            other => panic!("expected OutsideRoots, got {other:?}"),
        }
    }

    #[test]
    fn test_segment_cancelling_sequence_rejected() {
        let (_dir, ctx) = setup();
        assert!(ctx.resolve("data/../../outside.csv").is_err());
        assert!(ctx.resolve("missing/../../outside.csv").is_err());
        assert!(ctx.resolve("data/./../data/events.parquet").is_ok());
    }

    #[test]
    fn test_sibling_directory_with_common_prefix_rejected() {
        let (dir, ctx) = setup();
        let sibling = dir.path().join("project-evil");
        fs::create_dir_all(&sibling).unwrap();
        let candidate = sibling.join("x.csv");
        assert!(ctx.resolve(candidate.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_absolute_path_outside_rejected() {
        let (dir, ctx) = setup();
        let outside = dir.path().join("other.csv");
        let err = ctx.resolve(outside.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SecurityError::OutsideRoots { .. }));
    }

    #[test]
    fn test_file_uri_is_checked() {
        let (_dir, ctx) = setup();
        assert!(ctx.resolve("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_remote_uri_passthrough() {
        let (_dir, ctx) = setup();
        let resolved = ctx.resolve("s3://bucket/../../x.parquet").unwrap();
        assert_eq!(
            resolved,
            ResolvedPath::Remote("s3://bucket/../../x.parquet".to_string())
        );
    }

    #[test]
    fn test_extra_root_allows_path() {
        let (dir, ctx) = setup();
        let shared = dir.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        let ctx = ctx.with_root(&shared).unwrap();
        let candidate = shared.join("base.yaml");
        assert!(ctx.resolve(candidate.to_str().unwrap()).is_ok());
        assert_eq!(ctx.roots().len(), 2);
    }

    #[test]
    fn test_invalid_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = PathSecurityContext::new(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SecurityError::InvalidRoot { .. }));
    }

    #[test]
    fn test_empty_path() {
        let (_dir, ctx) = setup();
        assert!(matches!(ctx.resolve(""), Err(SecurityError::EmptyPath)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, ctx) = setup();
        let secret_dir = dir.path().join("secrets");
        fs::create_dir_all(&secret_dir).unwrap();
        fs::write(secret_dir.join("key"), b"x").unwrap();
        std::os::unix::fs::symlink(&secret_dir, ctx.primary_root().join("link")).unwrap();

        let err = ctx.resolve("link/key").unwrap_err();
        match err {
            SecurityError::OutsideRoots { resolved, .. } => {
                assert_eq!(resolved, fs::canonicalize(secret_dir.join("key")).unwrap());
            }
            other => panic!("expected OutsideRoots, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_escape_rejected() {
        let (dir, ctx) = setup();
        let outside = dir.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(
            outside.join("evil.duckdb"),
            ctx.primary_root().join("out.duckdb"),
        )
        .unwrap();

        let err = ctx.resolve("out.duckdb").unwrap_err();
        match err {
            SecurityError::OutsideRoots { resolved, .. } => {
                assert_eq!(resolved, fs::canonicalize(&outside).unwrap().join("evil.duckdb"));
            }
            other => panic!("expected OutsideRoots, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_relative_symlink_escape_rejected() {
        let (_dir, ctx) = setup();
        std::os::unix::fs::symlink("../outside/evil.duckdb", ctx.primary_root().join("out.duckdb"))
            .unwrap();

        let err = ctx.resolve("out.duckdb").unwrap_err();
        assert!(matches!(err, SecurityError::OutsideRoots { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_inside_root_resolves_to_target() {
        let (_dir, ctx) = setup();
        let root = ctx.primary_root().to_path_buf();
        fs::create_dir_all(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real/new.duckdb"), root.join("out.duckdb")).unwrap();

        let resolved = ctx.resolve("out.duckdb").unwrap();
        assert_eq!(resolved, ResolvedPath::Local(root.join("real/new.duckdb")));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_directory_symlink_mid_path_rejected() {
        let (dir, ctx) = setup();
        std::os::unix::fs::symlink(
            dir.path().join("elsewhere"),
            ctx.primary_root().join("cache"),
        )
        .unwrap();

        let err = ctx.resolve("cache/nested/catalog.duckdb").unwrap_err();
        assert!(matches!(err, SecurityError::OutsideRoots { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_unresolvable() {
        let (_dir, ctx) = setup();
        let root = ctx.primary_root().to_path_buf();
        std::os::unix::fs::symlink(root.join("b"), root.join("a")).unwrap();
        std::os::unix::fs::symlink(root.join("a"), root.join("b")).unwrap();

        let err = ctx.resolve("a/x.duckdb").unwrap_err();
        assert!(matches!(err, SecurityError::Unresolvable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_is_unresolvable() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, ctx) = setup();
        let locked = ctx.primary_root().join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass directory permissions.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = ctx.resolve("locked/inner/x.duckdb");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(SecurityError::Unresolvable { original, source }) => {
                assert_eq!(original, "locked/inner/x.duckdb");
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Unresolvable, got {other:?}"),
        }
    }
}
