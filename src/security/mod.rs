//! Access control for filesystem and command tools.
//!
//! Two guards sit between untrusted tool arguments and the operating system:
//!
//! - [`PathGuard`] admits a path only if it resolves under an allowed root,
//!   symlinks included, and hands back the [`CanonicalPath`] to use.
//! - [`CommandGuard`] admits a command line only if every simple command in
//!   it begins with an allowlist entry, compared token by token.
//!
//! Both read from an [`Allowlist`] that is built once from configuration and
//! never mutated, so guards are cheap to clone and need no locking.
//!
//! ```rust,ignore
//! use toolwarden::security::{AllowedCommandPrefixes, AllowedRoots, Allowlist};
//!
//! let allowlist = Allowlist::new(
//!     AllowedRoots::parse("/srv/project")?,
//!     AllowedCommandPrefixes::parse("ls,grep,git status")?,
//! );
//!
//! let path = allowlist.path_guard().validate("/srv/project/README.md")?;
//! allowlist.command_guard().validate("ls -la | grep md")?;
//! ```

mod allowlist;
mod command;
mod path;
mod roots;
mod shell;

pub use allowlist::Allowlist;
pub use command::{AllowedCommandPrefixes, CommandGuard, CommandPrefix, CommandRejection};
pub use path::{CanonicalPath, PathGuard, PathRejection};
pub use roots::{AllowedRoot, AllowedRoots};
pub use shell::{split_commands, Segment, ShellSyntaxError};
