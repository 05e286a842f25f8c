//! Command allowlist and the guard that enforces it.

use crate::error::WardenError;
use crate::security::shell::{split_commands, ShellSyntaxError};
use std::fmt;
use std::sync::Arc;

/// One allowlist entry, e.g. `ls` or `git status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPrefix {
    raw: String,
    tokens: Vec<String>,
}

impl CommandPrefix {
    /// Parses an entry into whitespace-separated tokens.
    ///
    /// Returns `None` for a blank entry.
    #[must_use]
    pub fn parse(entry: &str) -> Option<Self> {
        let tokens: Vec<String> = entry.split_whitespace().map(String::from).collect();
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            raw: tokens.join(" "),
            tokens,
        })
    }

    /// The entry with whitespace collapsed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `words` begins with exactly this entry's tokens.
    #[must_use]
    pub fn matches(&self, words: &[String]) -> bool {
        words.len() >= self.tokens.len()
            && self.tokens.iter().zip(words).all(|(token, word)| token == word)
    }
}

impl fmt::Display for CommandPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The non-empty set of permitted command prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedCommandPrefixes {
    entries: Vec<CommandPrefix>,
}

impl AllowedCommandPrefixes {
    /// Parses a comma-separated allowlist.
    ///
    /// # Errors
    ///
    /// Fails if no usable entry remains after trimming.
    pub fn parse(list: &str) -> Result<Self, WardenError> {
        Self::from_entries(list.split(','))
    }

    /// Builds the allowlist from individual entries.
    ///
    /// Blank entries are dropped and duplicates collapse.
    ///
    /// # Errors
    ///
    /// Fails if no usable entry remains.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, WardenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed: Vec<CommandPrefix> = Vec::new();
        for prefix in entries
            .into_iter()
            .filter_map(|e| CommandPrefix::parse(e.as_ref()))
        {
            if !parsed.contains(&prefix) {
                parsed.push(prefix);
            }
        }

        if parsed.is_empty() {
            return Err(WardenError::configuration(
                "command.allowed_command",
                "no allowed commands specified",
            ));
        }

        Ok(Self { entries: parsed })
    }

    /// Returns true if some entry matches the leading words.
    #[must_use]
    pub fn permits(&self, words: &[String]) -> bool {
        self.entries.iter().any(|entry| entry.matches(words))
    }

    /// Iterates over entries in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandPrefix> {
        self.entries.iter()
    }

    /// Number of entries; never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false once constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries joined with `", "`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.entries
            .iter()
            .map(CommandPrefix::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Why a command line was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRejection {
    /// A simple command does not start with any allowlist entry.
    NotAllowed {
        /// The first offending simple command, as written.
        command: String,
    },
    /// The line contains no command at all.
    Empty,
    /// The line uses a construct that could hide a command.
    UnsupportedSyntax {
        /// Name of the construct.
        construct: String,
    },
}

impl CommandRejection {
    /// Stable snake_case identifier for this rejection kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAllowed { .. } => "not_allowed",
            Self::Empty => "empty_command",
            Self::UnsupportedSyntax { .. } => "unsupported_syntax",
        }
    }
}

impl From<ShellSyntaxError> for CommandRejection {
    fn from(error: ShellSyntaxError) -> Self {
        Self::UnsupportedSyntax {
            construct: error.construct().to_string(),
        }
    }
}

impl fmt::Display for CommandRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed { command } => {
                write!(
                    f,
                    "command '{}' is not in the allowed command list; \
                     use only the commands listed in the command prompt",
                    command
                )
            }
            Self::Empty => write!(f, "command line is empty; provide a command to run"),
            Self::UnsupportedSyntax { construct } => {
                write!(
                    f,
                    "{} is not supported; split the work into separate plain commands",
                    construct
                )
            }
        }
    }
}

impl std::error::Error for CommandRejection {}

/// Decides whether a command line may be executed.
///
/// Every simple command in the line (split on `|`, `&`, `;`, `&&`, `||` and
/// newline) must begin with the full token sequence of some allowlist entry,
/// so an entry `ls` never admits `lsblk`.
#[derive(Debug, Clone)]
pub struct CommandGuard {
    prefixes: Arc<AllowedCommandPrefixes>,
}

impl CommandGuard {
    /// Creates a guard over the given allowlist.
    #[must_use]
    pub fn new(prefixes: Arc<AllowedCommandPrefixes>) -> Self {
        Self { prefixes }
    }

    /// The allowlist this guard enforces.
    #[must_use]
    pub fn prefixes(&self) -> &AllowedCommandPrefixes {
        &self.prefixes
    }

    /// Validates `line`. Pure; nothing is executed.
    ///
    /// # Errors
    ///
    /// Returns the rejection for the first simple command that fails.
    pub fn validate(&self, line: &str) -> Result<(), CommandRejection> {
        let result = self.check(line);
        match &result {
            Ok(()) => tracing::debug!(command = line, "command approved"),
            Err(rejection) => {
                tracing::warn!(command = line, code = rejection.code(), "command rejected");
            }
        }
        result
    }

    fn check(&self, line: &str) -> Result<(), CommandRejection> {
        let segments = split_commands(line)?;
        if segments.is_empty() {
            return Err(CommandRejection::Empty);
        }

        match segments
            .iter()
            .find(|segment| !self.prefixes.permits(segment.words()))
        {
            Some(denied) => Err(CommandRejection::NotAllowed {
                command: denied.text().to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(list: &str) -> CommandGuard {
        CommandGuard::new(Arc::new(AllowedCommandPrefixes::parse(list).unwrap()))
    }

    #[test]
    fn parse_trims_and_drops_blanks() {
        let prefixes = AllowedCommandPrefixes::parse(" ls , ,cat,  git   status ").unwrap();
        let names: Vec<&str> = prefixes.iter().map(CommandPrefix::as_str).collect();
        assert_eq!(names, vec!["ls", "cat", "git status"]);
    }

    #[test]
    fn parse_collapses_duplicates() {
        let prefixes = AllowedCommandPrefixes::parse("ls,ls, ls").unwrap();
        assert_eq!(prefixes.len(), 1);
    }

    #[test]
    fn parse_rejects_empty_list() {
        for list in ["", " ", ",,", " , "] {
            let err = AllowedCommandPrefixes::parse(list).unwrap_err();
            assert!(err.is_configuration());
            assert_eq!(err.field(), Some("command.allowed_command"));
        }
    }

    #[test]
    fn joined_lists_entries() {
        let prefixes = AllowedCommandPrefixes::parse("ls,cat").unwrap();
        assert_eq!(prefixes.joined(), "ls, cat");
    }

    #[test]
    fn approves_exact_first_token() {
        let guard = guard("ls,cat");
        assert!(guard.validate("ls").is_ok());
        assert!(guard.validate("  ls -la /tmp  ").is_ok());
        assert!(guard.validate("cat file.txt").is_ok());
    }

    #[test]
    fn rejects_longer_command_sharing_prefix() {
        let result = guard("ls").validate("lsblk -a");
        assert_eq!(
            result,
            Err(CommandRejection::NotAllowed {
                command: "lsblk -a".to_string()
            })
        );
    }

    #[test]
    fn multi_token_entry_matches_whole_tokens() {
        let guard = guard("git status,git log");
        assert!(guard.validate("git status -s").is_ok());
        assert!(guard.validate("git log --oneline").is_ok());
        assert!(guard.validate("git push").is_err());
        assert!(guard.validate("git").is_err());
        assert!(guard.validate("git statusx").is_err());
    }

    #[test]
    fn pipeline_requires_every_command() {
        let guard = guard("ls,grep");
        assert!(guard.validate("ls | grep foo").is_ok());

        let denied = guard.validate("ls | wc -l").unwrap_err();
        assert_eq!(
            denied,
            CommandRejection::NotAllowed {
                command: "wc -l".to_string()
            }
        );
        assert!(guard.validate("cat x | grep foo").is_err());
    }

    #[test]
    fn sequencing_operators_are_checked() {
        let guard = guard("ls");
        for line in [
            "ls; rm -rf /",
            "ls && rm -rf /",
            "ls || rm -rf /",
            "ls & rm -rf /",
            "ls\nrm -rf /",
        ] {
            assert_eq!(
                guard.validate(line).unwrap_err().code(),
                "not_allowed",
                "{line}"
            );
        }
    }

    #[test]
    fn first_offending_command_is_reported() {
        let err = guard("ls").validate("ls; rm a; mv b c").unwrap_err();
        assert_eq!(
            err,
            CommandRejection::NotAllowed {
                command: "rm a".to_string()
            }
        );
    }

    #[test]
    fn hidden_commands_are_unsupported() {
        let guard = guard("echo,ls");
        for line in ["echo $(rm -rf /)", "echo `id`", "ls > /etc/passwd", "(rm x)"] {
            assert_eq!(
                guard.validate(line).unwrap_err().code(),
                "unsupported_syntax",
                "{line}"
            );
        }
    }

    #[test]
    fn quoted_separators_do_not_split() {
        let guard = guard("grep,echo");
        assert!(guard.validate("grep 'a|b' file").is_ok());
        assert!(guard.validate(r#"echo "x; rm -rf /""#).is_ok());
    }

    #[test]
    fn blank_line_is_empty() {
        let guard = guard("ls");
        assert_eq!(guard.validate(""), Err(CommandRejection::Empty));
        assert_eq!(guard.validate("  ;  "), Err(CommandRejection::Empty));
    }

    #[test]
    fn trailing_separator_is_ignored() {
        assert!(guard("ls").validate("ls -la;").is_ok());
    }

    #[test]
    fn rejection_display_names_command() {
        let err = guard("ls").validate("rm -rf /").unwrap_err();
        assert!(err.to_string().contains("rm -rf /"));
        assert!(err.to_string().contains("not in the allowed command list"));
    }
}
