//! The immutable allowlist snapshot built once at startup.

use crate::security::command::{AllowedCommandPrefixes, CommandGuard};
use crate::security::path::PathGuard;
use crate::security::roots::AllowedRoots;
use std::sync::Arc;

/// Allowed roots and allowed command prefixes, shared read-only by every
/// guard and handler.
///
/// Cloning copies two `Arc`s.
#[derive(Debug, Clone)]
pub struct Allowlist {
    roots: Arc<AllowedRoots>,
    commands: Arc<AllowedCommandPrefixes>,
}

impl Allowlist {
    /// Wraps validated roots and commands.
    #[must_use]
    pub fn new(roots: AllowedRoots, commands: AllowedCommandPrefixes) -> Self {
        Self {
            roots: Arc::new(roots),
            commands: Arc::new(commands),
        }
    }

    /// The allowed root directories.
    #[must_use]
    pub fn roots(&self) -> &AllowedRoots {
        &self.roots
    }

    /// The allowed command prefixes.
    #[must_use]
    pub fn commands(&self) -> &AllowedCommandPrefixes {
        &self.commands
    }

    /// A path guard over this snapshot's roots.
    #[must_use]
    pub fn path_guard(&self) -> PathGuard {
        PathGuard::new(Arc::clone(&self.roots))
    }

    /// A command guard over this snapshot's prefixes.
    #[must_use]
    pub fn command_guard(&self) -> CommandGuard {
        CommandGuard::new(Arc::clone(&self.commands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn guards_share_snapshot() {
        let dir = TempDir::new().unwrap();
        let allowlist = Allowlist::new(
            AllowedRoots::from_dirs([dir.path()]).unwrap(),
            AllowedCommandPrefixes::parse("ls").unwrap(),
        );

        let paths = allowlist.path_guard();
        let commands = allowlist.command_guard();
        assert_eq!(paths.roots(), allowlist.roots());
        assert_eq!(commands.prefixes(), allowlist.commands());
        assert!(paths.validate(dir.path().join("x")).is_ok());
        assert!(commands.validate("ls").is_ok());
    }

    #[test]
    fn clones_are_cheap_views_of_same_data() {
        let allowlist = Allowlist::new(
            AllowedRoots::empty(),
            AllowedCommandPrefixes::parse("echo").unwrap(),
        );
        let clone = allowlist.clone();
        assert!(std::ptr::eq(allowlist.commands(), clone.commands()));
    }
}
