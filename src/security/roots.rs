//! The set of directories filesystem tools may touch.

use crate::error::WardenError;
use crate::security::path::{absolutize, normalize_lexically};
use std::path::{Path, PathBuf};

/// A single allowed root directory.
///
/// Both forms are kept: `configured` is the absolute, lexically normalized
/// path as written in configuration, `canonical` has every symlink resolved.
/// Lexical membership accepts either form; real-path membership accepts only
/// the canonical one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoot {
    configured: PathBuf,
    canonical: PathBuf,
}

impl AllowedRoot {
    /// Resolves a configured directory into an allowed root.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the entry cannot be made absolute,
    /// does not exist, or is not a directory.
    pub fn resolve(entry: &Path) -> Result<Self, WardenError> {
        let configured = absolutize(entry)
            .map(|p| normalize_lexically(&p))
            .map_err(|e| {
                WardenError::configuration(
                    "filesystem.allowed_dir",
                    format!("failed to resolve path '{}': {e}", entry.display()),
                )
            })?;

        let canonical = configured.canonicalize().map_err(|e| {
            WardenError::configuration(
                "filesystem.allowed_dir",
                format!("failed to access directory '{}': {e}", configured.display()),
            )
        })?;

        if !canonical.is_dir() {
            return Err(WardenError::configuration(
                "filesystem.allowed_dir",
                format!("path is not a directory: '{}'", configured.display()),
            ));
        }

        Ok(Self {
            configured,
            canonical,
        })
    }

    /// The root as configured (absolute, lexically normalized).
    #[must_use]
    pub fn configured(&self) -> &Path {
        &self.configured
    }

    /// The root with all symlinks resolved.
    #[must_use]
    pub fn canonical(&self) -> &Path {
        &self.canonical
    }
}

/// Ordered, immutable set of allowed root directories.
///
/// Built once at startup; membership tests compare whole path components,
/// so a root `/tmp/foo` never admits `/tmp/foobar`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedRoots {
    roots: Vec<AllowedRoot>,
}

impl AllowedRoots {
    /// An empty set. Every path is outside it.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list of directories.
    ///
    /// Entries are trimmed and blank entries skipped.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that does not resolve to an existing directory.
    pub fn parse(list: &str) -> Result<Self, WardenError> {
        Self::from_dirs(
            list.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty()),
        )
    }

    /// Builds the set from individual directory paths.
    ///
    /// Entries whose canonical form duplicates an earlier entry are dropped.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that does not resolve to an existing directory.
    pub fn from_dirs<I, P>(dirs: I) -> Result<Self, WardenError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots: Vec<AllowedRoot> = Vec::new();
        for dir in dirs {
            let root = AllowedRoot::resolve(dir.as_ref())?;
            if roots.iter().all(|r| r.canonical != root.canonical) {
                roots.push(root);
            }
        }
        Ok(Self { roots })
    }

    /// Returns true if `path` lies under a root in either its configured or
    /// canonical form. `path` must already be absolute and normalized.
    #[must_use]
    pub fn contains_lexical(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|r| path.starts_with(&r.configured) || path.starts_with(&r.canonical))
    }

    /// Returns true if a fully resolved `path` lies under a canonical root.
    #[must_use]
    pub fn contains_resolved(&self, path: &Path) -> bool {
        self.roots.iter().any(|r| path.starts_with(&r.canonical))
    }

    /// Iterates over the roots in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &AllowedRoot> {
        self.roots.iter()
    }

    /// Returns the number of roots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns true if no roots are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_accepts_existing_directories() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let list = format!("{}, {}", a.path().display(), b.path().display());

        let roots = AllowedRoots::parse(&list).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(
            roots.iter().next().unwrap().canonical(),
            a.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn parse_skips_blank_entries() {
        let a = TempDir::new().unwrap();
        let list = format!(" ,{},, ", a.path().display());

        let roots = AllowedRoots::parse(&list).unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn parse_of_blank_string_is_empty() {
        let roots = AllowedRoots::parse("   ").unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn parse_rejects_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = AllowedRoots::parse(missing.to_str().unwrap()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn parse_rejects_file_entry() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = AllowedRoots::parse(file.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn duplicate_roots_collapse() {
        let a = TempDir::new().unwrap();
        let nested = a.path().join("x").join("..");
        fs::create_dir(a.path().join("x")).unwrap();

        let roots = AllowedRoots::from_dirs([a.path().to_path_buf(), nested]).unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn membership_is_component_wise() {
        let base = TempDir::new().unwrap();
        let foo = base.path().join("foo");
        fs::create_dir(&foo).unwrap();
        let roots = AllowedRoots::from_dirs([&foo]).unwrap();
        let canonical_base = base.path().canonicalize().unwrap();

        assert!(roots.contains_resolved(&canonical_base.join("foo")));
        assert!(roots.contains_resolved(&canonical_base.join("foo").join("x")));
        assert!(!roots.contains_resolved(&canonical_base.join("foobar").join("x")));
        assert!(!roots.contains_resolved(&canonical_base));
    }

    #[test]
    fn empty_roots_contain_nothing() {
        let roots = AllowedRoots::empty();
        assert!(!roots.contains_lexical(Path::new("/")));
        assert!(!roots.contains_resolved(Path::new("/tmp")));
    }
}
