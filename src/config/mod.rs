//! Configuration loading and validation.
//!
//! Configuration is stored in TOML. Without `--config` the search order is:
//! 1. `./toolwarden.toml` (project-local)
//! 2. `~/.config/toolwarden/config.toml` (XDG config)
//!
//! A missing file means defaults: the system temp directory as the only
//! allowed root and a read-mostly command list.
//!
//! ```toml
//! modules = ["filesystem", "command"]
//!
//! [filesystem]
//! allowed_dir = "/tmp,/home/me/project"
//! prompt_file = "/home/me/fs-prompt.md"
//!
//! [command]
//! allowed_command = "ls,cat,grep,git status"
//! default_timeout_secs = 120
//! max_timeout_secs = 600
//!
//! [logging]
//! enabled = true
//! level = "info"
//! ```
//!
//! Loading only parses. [`WardenConfig::check`] and
//! [`WardenConfig::build_allowlist`] validate, and any failure there is
//! fatal to startup.

mod file;
mod types;

pub use file::{from_path, from_str, load, search_paths, to_toml, write_if_absent, xdg_config_path};
pub use types::{
    CommandConfig, FilesystemConfig, ToolModule, WardenConfig, COMMAND_TIMEOUT_CEILING_SECS,
    DEFAULT_ALLOWED_COMMANDS, DEFAULT_COMMAND_TIMEOUT_SECS, MAX_COMMAND_TIMEOUT_SECS,
};
