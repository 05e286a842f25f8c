//! Configuration types and their validation.

use crate::error::WardenError;
use crate::logging::LoggingConfig;
use crate::security::{AllowedCommandPrefixes, AllowedRoots, Allowlist};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Commands permitted when `command.allowed_command` is not set.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "ls", "cat", "echo", "pwd", "head", "tail", "grep", "find", "stat", "df", "du", "free", "top",
    "ps", "uptime", "who", "w", "last", "uname", "hostname", "ifconfig", "netstat", "ping",
    "traceroute", "route", "ip", "ss", "lsof", "vmstat", "iostat", "mpstat", "sar", "cut", "sort",
    "uniq", "wc", "awk", "sed", "diff", "cmp", "comm", "file", "basename", "dirname", "chmod",
    "chown", "curl", "nslookup", "dig", "host", "ssh", "scp", "sftp", "ftp", "wget", "tar",
    "gzip", "scutil", "networksetup", "git", "cd",
];

/// Default wall-clock limit for `execute_command`.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Upper bound a caller may request for `execute_command`.
pub const MAX_COMMAND_TIMEOUT_SECS: u64 = 600;

/// Largest value accepted for `command.max_timeout_secs` (one day).
pub const COMMAND_TIMEOUT_CEILING_SECS: u64 = 86_400;

/// A group of tools that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolModule {
    /// File tools behind the path guard.
    Filesystem,
    /// `execute_command` behind the command guard.
    Command,
}

impl ToolModule {
    /// Every module, in registration order.
    pub const ALL: [ToolModule; 2] = [ToolModule::Filesystem, ToolModule::Command];

    /// The name used in configuration and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for ToolModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolModule {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filesystem" | "fs" => Ok(Self::Filesystem),
            "command" | "cmd" => Ok(Self::Command),
            other => Err(WardenError::configuration(
                "modules",
                format!("unknown module '{other}', expected 'filesystem' or 'command'"),
            )),
        }
    }
}

/// Root configuration structure.
///
/// Maps directly onto the TOML file:
///
/// ```toml
/// modules = ["filesystem", "command"]
///
/// [filesystem]
/// allowed_dir = "/tmp,/home/me/project"
///
/// [command]
/// allowed_command = "ls,cat,grep,git status"
/// default_timeout_secs = 120
/// max_timeout_secs = 600
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Tool groups to expose.
    pub modules: Vec<ToolModule>,
    /// Filesystem tool settings.
    pub filesystem: FilesystemConfig,
    /// Command tool settings.
    pub command: CommandConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            modules: ToolModule::ALL.to_vec(),
            filesystem: FilesystemConfig::default(),
            command: CommandConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The `[filesystem]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemConfig {
    /// Comma-separated list of allowed root directories.
    pub allowed_dir: String,
    /// Replaces the built-in filesystem prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<PathBuf>,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            allowed_dir: std::env::temp_dir().display().to_string(),
            prompt_file: None,
        }
    }
}

/// The `[command]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Comma-separated list of allowed command prefixes.
    pub allowed_command: String,
    /// Replaces the built-in command prompt. `{os}` is substituted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<PathBuf>,
    /// Timeout applied when a call does not ask for one.
    pub default_timeout_secs: u64,
    /// Largest timeout a call may ask for.
    pub max_timeout_secs: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            allowed_command: DEFAULT_ALLOWED_COMMANDS.join(","),
            prompt_file: None,
            default_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            max_timeout_secs: MAX_COMMAND_TIMEOUT_SECS,
        }
    }
}

impl CommandConfig {
    /// The default timeout as a Duration.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// The maximum timeout as a Duration.
    #[must_use]
    pub fn max_timeout(&self) -> Duration {
        Duration::from_secs(self.max_timeout_secs)
    }
}

impl WardenConfig {
    /// Returns true if the given tool group is enabled.
    #[must_use]
    pub fn module_enabled(&self, module: ToolModule) -> bool {
        self.modules.contains(&module)
    }

    /// Replaces the enabled modules with a comma-separated list.
    ///
    /// # Errors
    ///
    /// Fails on an unknown module name.
    pub fn with_modules(mut self, list: &str) -> Result<Self, WardenError> {
        let mut modules = Vec::new();
        for name in list.split(',').filter(|s| !s.trim().is_empty()) {
            let module: ToolModule = name.parse()?;
            if !modules.contains(&module) {
                modules.push(module);
            }
        }
        self.modules = modules;
        Ok(self)
    }

    /// Checks settings that do not touch the filesystem.
    ///
    /// # Errors
    ///
    /// Fails if no module is enabled or the command timeouts are out of range.
    pub fn check(&self) -> Result<(), WardenError> {
        if self.modules.is_empty() {
            return Err(WardenError::configuration(
                "modules",
                "no tool modules enabled",
            ));
        }
        if self.command.default_timeout_secs == 0 {
            return Err(WardenError::configuration(
                "command.default_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.command.max_timeout_secs > COMMAND_TIMEOUT_CEILING_SECS {
            return Err(WardenError::configuration(
                "command.max_timeout_secs",
                format!("must be at most {COMMAND_TIMEOUT_CEILING_SECS}"),
            ));
        }
        if self.command.default_timeout_secs > self.command.max_timeout_secs {
            return Err(WardenError::configuration(
                "command.default_timeout_secs",
                format!(
                    "{} exceeds command.max_timeout_secs ({})",
                    self.command.default_timeout_secs, self.command.max_timeout_secs
                ),
            ));
        }
        Ok(())
    }

    /// Resolves the configured directories and commands into the immutable
    /// allowlist shared by every guard.
    ///
    /// An allowed_dir with no usable entries yields an empty root set, which
    /// denies every path.
    ///
    /// # Errors
    ///
    /// Fails if any directory entry is missing or not a directory, or if no
    /// usable command entry remains.
    pub fn build_allowlist(&self) -> Result<Allowlist, WardenError> {
        let roots = AllowedRoots::parse(&self.filesystem.allowed_dir)?;
        if roots.is_empty() && self.module_enabled(ToolModule::Filesystem) {
            tracing::warn!("filesystem.allowed_dir is empty; every path will be rejected");
        }

        let commands = AllowedCommandPrefixes::parse(&self.command.allowed_command)?;

        tracing::info!(
            roots = roots.len(),
            commands = commands.len(),
            "allowlist loaded"
        );
        Ok(Allowlist::new(roots, commands))
    }
}
