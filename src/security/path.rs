//! Path sandbox for filesystem tools.
//!
//! [`PathGuard`] turns an untrusted path string into a [`CanonicalPath`]
//! that is known to live under one of the [`AllowedRoots`], or into a
//! [`PathRejection`] saying which rule failed.
//!
//! Validation runs in two stages:
//!
//! 1. The requested path is made absolute against the working directory,
//!    normalized lexically (`.` dropped, `..` applied), and tested for
//!    membership against the configured and canonical forms of every root.
//! 2. Symlinks are resolved. An existing entry must resolve under a canonical
//!    root. A missing entry has its parent resolved instead; the returned path
//!    is the resolved parent joined with the final name.
//!
//! Callers must use the returned path for the actual I/O, never the input.

use crate::security::roots::AllowedRoots;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Upper bound on dangling symlinks followed while resolving a new entry.
const MAX_SYMLINK_HOPS: usize = 40;

/// Why a path was refused.
///
/// Each variant carries only the path the caller asked for, so messages
/// never disclose symlink targets or the configured root set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRejection {
    /// The path is malformed or could not be resolved.
    InvalidPath {
        /// The requested path.
        path: PathBuf,
        /// Why resolution failed.
        reason: String,
    },
    /// The normalized path is not under any allowed root.
    OutsideAllowedRoots {
        /// The requested path.
        path: PathBuf,
    },
    /// The entry does not exist and neither does its parent directory.
    ParentMissing {
        /// The requested path.
        path: PathBuf,
    },
    /// The entry does not exist and its resolved parent is outside every root.
    ParentOutsideAllowedRoots {
        /// The requested path.
        path: PathBuf,
    },
    /// A symlink along the path leads outside every root.
    SymlinkEscapesRoot {
        /// The requested path.
        path: PathBuf,
    },
}

impl PathRejection {
    /// Stable snake_case identifier for this rejection kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath { .. } => "invalid_path",
            Self::OutsideAllowedRoots { .. } => "outside_allowed_roots",
            Self::ParentMissing { .. } => "parent_missing",
            Self::ParentOutsideAllowedRoots { .. } => "parent_outside_allowed_roots",
            Self::SymlinkEscapesRoot { .. } => "symlink_escapes_root",
        }
    }

    /// The path the caller asked for.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidPath { path, .. }
            | Self::OutsideAllowedRoots { path }
            | Self::ParentMissing { path }
            | Self::ParentOutsideAllowedRoots { path }
            | Self::SymlinkEscapesRoot { path } => path,
        }
    }

    fn invalid(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PathRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPath { path, reason } => {
                write!(
                    f,
                    "invalid path '{}': {}; provide a well-formed path",
                    path.display(),
                    reason
                )
            }
            Self::OutsideAllowedRoots { path } => {
                write!(
                    f,
                    "path '{}' is outside the allowed directories; \
                     call list_allowed_directories to see where access is permitted",
                    path.display()
                )
            }
            Self::ParentMissing { path } => {
                write!(
                    f,
                    "parent directory of '{}' does not exist; create it first",
                    path.display()
                )
            }
            Self::ParentOutsideAllowedRoots { path } => {
                write!(
                    f,
                    "parent directory of '{}' resolves outside the allowed directories",
                    path.display()
                )
            }
            Self::SymlinkEscapesRoot { path } => {
                write!(
                    f,
                    "path '{}' follows a symbolic link outside the allowed directories",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for PathRejection {}

/// An absolute path with symlinks resolved that passed [`PathGuard::validate`].
///
/// Only the guard can construct one, so holding a `CanonicalPath` means the
/// check has already happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    /// Borrows the path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Deref for CanonicalPath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Validates untrusted paths against the allowed roots.
///
/// Cheap to clone; every clone shares the same immutable root set.
///
/// # Example
///
/// ```rust,ignore
/// use toolwarden::security::{AllowedRoots, PathGuard};
///
/// let roots = AllowedRoots::parse("/srv/project")?;
/// let guard = PathGuard::new(roots.into());
///
/// let canonical = guard.validate("/srv/project/src/main.rs")?;
/// std::fs::read_to_string(&canonical)?;
/// ```
#[derive(Debug, Clone)]
pub struct PathGuard {
    roots: Arc<AllowedRoots>,
}

impl PathGuard {
    /// Creates a guard over the given roots.
    #[must_use]
    pub fn new(roots: Arc<AllowedRoots>) -> Self {
        Self { roots }
    }

    /// The roots this guard admits.
    #[must_use]
    pub fn roots(&self) -> &AllowedRoots {
        &self.roots
    }

    /// Validates `requested` and returns the path to use for I/O.
    ///
    /// Only read-only metadata queries touch the filesystem.
    ///
    /// # Errors
    ///
    /// Returns the [`PathRejection`] for the first rule the path breaks.
    pub fn validate(&self, requested: impl AsRef<Path>) -> Result<CanonicalPath, PathRejection> {
        let requested = requested.as_ref();
        let result = self.check(requested);
        match &result {
            Ok(canonical) => {
                tracing::debug!(
                    requested = %requested.display(),
                    resolved = %canonical,
                    "path approved"
                );
            }
            Err(rejection) => {
                tracing::warn!(
                    requested = %requested.display(),
                    code = rejection.code(),
                    "path rejected"
                );
            }
        }
        result
    }

    /// Runs [`validate`](Self::validate) on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as `validate`; a failed worker is reported as `InvalidPath`.
    pub async fn validate_blocking(
        &self,
        requested: impl Into<PathBuf>,
    ) -> Result<CanonicalPath, PathRejection> {
        let requested = requested.into();
        let guard = self.clone();
        let fallback = requested.clone();
        tokio::task::spawn_blocking(move || guard.validate(&requested))
            .await
            .unwrap_or_else(|e| Err(PathRejection::invalid(&fallback, e.to_string())))
    }

    fn check(&self, requested: &Path) -> Result<CanonicalPath, PathRejection> {
        if requested.as_os_str().is_empty() {
            return Err(PathRejection::invalid(requested, "path is empty"));
        }
        if requested.to_string_lossy().contains('\0') {
            return Err(PathRejection::invalid(requested, "path contains a NUL byte"));
        }

        let absolute = absolutize(requested)
            .map(|p| normalize_lexically(&p))
            .map_err(|e| PathRejection::invalid(requested, e.to_string()))?;

        if !self.roots.contains_lexical(&absolute) {
            return Err(PathRejection::OutsideAllowedRoots {
                path: requested.to_path_buf(),
            });
        }

        match absolute.canonicalize() {
            Ok(real) => self.check_resolved(requested, real),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.resolve_new_entry(requested, absolute)
            }
            Err(e) => Err(PathRejection::invalid(requested, e.to_string())),
        }
    }

    fn check_resolved(&self, requested: &Path, real: PathBuf) -> Result<CanonicalPath, PathRejection> {
        if self.roots.contains_resolved(&real) {
            Ok(CanonicalPath(real))
        } else {
            Err(PathRejection::SymlinkEscapesRoot {
                path: requested.to_path_buf(),
            })
        }
    }

    /// Resolves an entry that does not exist yet.
    ///
    /// If the final component is a dangling symlink, its target is followed
    /// so a later create cannot write through the link to somewhere else.
    fn resolve_new_entry(
        &self,
        requested: &Path,
        absolute: PathBuf,
    ) -> Result<CanonicalPath, PathRejection> {
        let mut candidate = absolute;
        let mut through_link = false;

        for _ in 0..MAX_SYMLINK_HOPS {
            let (parent, name) = match (candidate.parent(), candidate.file_name()) {
                (Some(parent), Some(name)) => (parent, name.to_os_string()),
                _ => return Err(PathRejection::invalid(requested, "path has no parent directory")),
            };

            let real_parent = match parent.canonicalize() {
                Ok(p) => p,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(PathRejection::ParentMissing {
                        path: requested.to_path_buf(),
                    });
                }
                Err(e) => return Err(PathRejection::invalid(requested, e.to_string())),
            };

            if !self.roots.contains_resolved(&real_parent) {
                return Err(if through_link {
                    PathRejection::SymlinkEscapesRoot {
                        path: requested.to_path_buf(),
                    }
                } else {
                    PathRejection::ParentOutsideAllowedRoots {
                        path: requested.to_path_buf(),
                    }
                });
            }

            let resolved = real_parent.join(&name);
            match resolved.symlink_metadata() {
                Ok(meta) if meta.file_type().is_symlink() => {
                    let target = resolved
                        .read_link()
                        .map_err(|e| PathRejection::invalid(requested, e.to_string()))?;
                    let next = normalize_lexically(&real_parent.join(target));
                    if !self.roots.contains_lexical(&next) {
                        return Err(PathRejection::SymlinkEscapesRoot {
                            path: requested.to_path_buf(),
                        });
                    }
                    candidate = next;
                    through_link = true;
                }
                // Appeared since the first lookup.
                Ok(_) => {
                    let real = resolved
                        .canonicalize()
                        .map_err(|e| PathRejection::invalid(requested, e.to_string()))?;
                    return self.check_resolved(requested, real);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(CanonicalPath(resolved));
                }
                Err(e) => return Err(PathRejection::invalid(requested, e.to_string())),
            }
        }

        Err(PathRejection::invalid(
            requested,
            "too many levels of symbolic links",
        ))
    }
}

/// Joins a relative path onto the current working directory.
pub(crate) fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Drops `.` components and applies `..` without touching the filesystem.
///
/// `..` never climbs above the root.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
