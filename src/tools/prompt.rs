//! Prompts served alongside the tools.
//!
//! Each tool group has a built-in prompt describing what it can do; a
//! `prompt_file` in its configuration section replaces the built-in text.
//! Override files are read once at startup and an unreadable file is fatal.

use crate::config::{ToolModule, WardenConfig};
use crate::error::WardenError;
use crate::security::Allowlist;
use serde::Serialize;
use std::path::Path;

/// Name of the filesystem prompt.
pub const FILESYSTEM_PROMPT: &str = "filesystem_prompt";

/// Name of the command prompt.
pub const COMMAND_PROMPT: &str = "command_prompt";

const FILESYSTEM_PROMPT_TEXT: &str = "\
You manage files on the local machine through the filesystem tools.

You can:
- list directories and inspect file metadata (size, timestamps, permissions)
- read text files, optionally a window of lines at a time, and small images or binary files as base64
- create files and directories, and overwrite file contents
- move or rename files and directories
- search a directory tree for names matching a substring or wildcard pattern

Every path must lie inside one of these directories:
{allowed_dirs}

Paths outside them, or symbolic links that lead outside them, are refused.
Use absolute paths. Say what you are about to change before overwriting or
moving anything, and report the outcome of each operation.
";

const COMMAND_PROMPT_TEXT: &str = "\
You run terminal commands on a {os} machine through the execute_command tool.

Only these commands may start a command line:
{allowed_commands}

Pipelines and sequences (|, &&, ||, ;) are allowed when every command in
them is on the list. Redirection, command substitution and subshells are
refused, so pass file contents through pipes or use the filesystem tools.

Explain what a command will do before running anything destructive, and
report the exit code and relevant output afterwards.
";

/// Name and description advertised for a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptInfo {
    /// Prompt name
    pub name: String,
    /// What the prompt is for
    pub description: String,
}

/// A prompt with its resolved text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Name and description
    pub info: PromptInfo,
    /// The text returned by `prompts/get`
    pub text: String,
}

/// The prompts for every enabled tool group.
#[derive(Debug, Clone, Default)]
pub struct Prompts {
    prompts: Vec<Prompt>,
}

impl Prompts {
    /// Resolves prompt text for the enabled modules.
    ///
    /// # Errors
    ///
    /// Fails if a configured `prompt_file` cannot be read.
    pub fn load(config: &WardenConfig, allowlist: &Allowlist) -> Result<Self, WardenError> {
        let mut prompts = Vec::new();

        if config.module_enabled(ToolModule::Filesystem) {
            let text = match &config.filesystem.prompt_file {
                Some(path) => read_override("filesystem.prompt_file", path)?,
                None => {
                    let dirs: Vec<String> = allowlist
                        .roots()
                        .iter()
                        .map(|r| format!("- {}", r.configured().display()))
                        .collect();
                    let dirs = if dirs.is_empty() {
                        "(none; every path is refused)".to_string()
                    } else {
                        dirs.join("\n")
                    };
                    FILESYSTEM_PROMPT_TEXT.replace("{allowed_dirs}", &dirs)
                }
            };
            prompts.push(Prompt {
                info: PromptInfo {
                    name: FILESYSTEM_PROMPT.to_string(),
                    description: "How to use the filesystem tools".to_string(),
                },
                text,
            });
        }

        if config.module_enabled(ToolModule::Command) {
            let template = match &config.command.prompt_file {
                Some(path) => read_override("command.prompt_file", path)?,
                None => COMMAND_PROMPT_TEXT.to_string(),
            };
            let text = template
                .replace("{os}", std::env::consts::OS)
                .replace("{allowed_commands}", &allowlist.commands().joined());
            prompts.push(Prompt {
                info: PromptInfo {
                    name: COMMAND_PROMPT.to_string(),
                    description: "How to use the command tool".to_string(),
                },
                text,
            });
        }

        Ok(Self { prompts })
    }

    /// Name and description of every prompt.
    #[must_use]
    pub fn list(&self) -> Vec<PromptInfo> {
        self.prompts.iter().map(|p| p.info.clone()).collect()
    }

    /// Looks up a prompt by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.info.name == name)
    }
}

fn read_override(field: &str, path: &Path) -> Result<String, WardenError> {
    std::fs::read_to_string(path).map_err(|e| {
        WardenError::configuration(
            field,
            format!("failed to read prompt file '{}': {}", path.display(), e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{AllowedCommandPrefixes, AllowedRoots};
    use tempfile::TempDir;

    fn allowlist(dir: &Path) -> Allowlist {
        Allowlist::new(
            AllowedRoots::from_dirs([dir]).unwrap(),
            AllowedCommandPrefixes::parse("ls,git status").unwrap(),
        )
    }

    #[test]
    fn builtin_prompts_name_the_allowlist() {
        let dir = TempDir::new().unwrap();
        let prompts = Prompts::load(&WardenConfig::default(), &allowlist(dir.path())).unwrap();

        let fs = prompts.get(FILESYSTEM_PROMPT).unwrap();
        assert!(fs.text.contains(&dir.path().display().to_string()));

        let cmd = prompts.get(COMMAND_PROMPT).unwrap();
        assert!(cmd.text.contains("ls, git status"));
        assert!(cmd.text.contains(std::env::consts::OS));
        assert!(!cmd.text.contains("{os}"));
    }

    #[test]
    fn disabled_module_has_no_prompt() {
        let dir = TempDir::new().unwrap();
        let config = WardenConfig::default().with_modules("command").unwrap();
        let prompts = Prompts::load(&config, &allowlist(dir.path())).unwrap();

        assert!(prompts.get(FILESYSTEM_PROMPT).is_none());
        assert_eq!(prompts.list().len(), 1);
    }

    #[test]
    fn prompt_file_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("prompt.md");
        std::fs::write(&file, "custom for {os}").unwrap();

        let mut config = WardenConfig::default();
        config.command.prompt_file = Some(file);
        let prompts = Prompts::load(&config, &allowlist(dir.path())).unwrap();

        assert_eq!(
            prompts.get(COMMAND_PROMPT).unwrap().text,
            format!("custom for {}", std::env::consts::OS)
        );
    }

    #[test]
    fn unreadable_prompt_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = WardenConfig::default();
        config.filesystem.prompt_file = Some(dir.path().join("missing.md"));

        let err = Prompts::load(&config, &allowlist(dir.path())).unwrap_err();
        assert_eq!(err.field(), Some("filesystem.prompt_file"));
    }
}
