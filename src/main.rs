//! toolwarden command-line entry point.
//!
//! # Usage
//!
//! ```bash
//! # Serve MCP over stdio with the configured modules
//! toolwarden serve
//!
//! # Only the filesystem tools, with debug logging
//! toolwarden --module filesystem --debug serve
//!
//! # Ask the guards directly
//! toolwarden check-path ../etc/passwd
//! toolwarden check-command "git status && rm -rf /"
//!
//! # Write a starter config file
//! toolwarden config --init
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use toolwarden::config::{self, ToolModule, WardenConfig};
use toolwarden::logging;
use toolwarden::server::{FileResources, McpServer};
use toolwarden::tools::{build_registry, Prompts};

#[derive(Debug, Parser)]
#[command(name = "toolwarden", version, about)]
struct Cli {
    /// Configuration file (default: search ./toolwarden.toml, then the user config dir)
    #[arg(long, global = true, env = "TOOLWARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Force debug-level logging
    #[arg(long, global = true)]
    debug: bool,

    /// Comma-separated modules to enable (filesystem, command)
    #[arg(long, global = true, value_name = "LIST")]
    module: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve MCP over stdio (default)
    Serve,
    /// Check a path against the allowed directories
    CheckPath {
        /// Path to check
        path: PathBuf,
    },
    /// Check a command line against the allowed commands
    CheckCommand {
        /// Command line to check
        line: String,
    },
    /// List the tools the enabled modules provide
    Tools,
    /// Print the effective configuration
    Config {
        /// Write the configuration to the user config dir if no file exists there
        #[arg(long)]
        init: bool,
    },
}

fn load_config(cli: &Cli) -> Result<WardenConfig> {
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(ref modules) = cli.module {
        config = config.with_modules(modules)?;
    }
    config.check()?;
    Ok(config)
}

async fn serve(config: &WardenConfig) -> Result<ExitCode> {
    let allowlist = config.build_allowlist()?;
    let registry = build_registry(config, &allowlist)?;
    let prompts = Prompts::load(config, &allowlist)?;

    let mut server = McpServer::new(registry, prompts);
    if config.module_enabled(ToolModule::Filesystem) {
        server = server.with_resources(FileResources::new(allowlist.path_guard()));
    }
    server
        .serve_stdio()
        .await
        .context("MCP server failed")?;
    Ok(ExitCode::SUCCESS)
}

fn check_path(config: &WardenConfig, path: PathBuf) -> Result<ExitCode> {
    let allowlist = config.build_allowlist()?;
    match allowlist.path_guard().validate(&path) {
        Ok(resolved) => {
            println!("allowed: {resolved}");
            Ok(ExitCode::SUCCESS)
        }
        Err(rejection) => {
            println!("denied ({}): {rejection}", rejection.code());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check_command(config: &WardenConfig, line: &str) -> Result<ExitCode> {
    let allowlist = config.build_allowlist()?;
    match allowlist.command_guard().validate(line) {
        Ok(()) => {
            println!("allowed");
            Ok(ExitCode::SUCCESS)
        }
        Err(rejection) => {
            println!("denied ({}): {rejection}", rejection.code());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn list_tools(config: &WardenConfig) -> Result<ExitCode> {
    let allowlist = config.build_allowlist()?;
    let registry = build_registry(config, &allowlist)?;
    for definition in registry.definitions() {
        println!("{:<26} {}", definition.name, definition.description);
    }
    Ok(ExitCode::SUCCESS)
}

fn show_config(config: &WardenConfig, init: bool) -> Result<ExitCode> {
    if init {
        let path = config::xdg_config_path().context("no user config directory on this platform")?;
        if config::write_if_absent(&path, config)? {
            println!("wrote {}", path.display());
        } else {
            println!("{} already exists; left unchanged", path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    print!("{}", config::to_toml(config)?);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let command = cli.command.unwrap_or(Command::Serve);
    if !matches!(command, Command::Config { .. }) {
        logging::init(&config.logging, cli.debug)?;
    }

    match command {
        Command::Serve => serve(&config).await,
        Command::CheckPath { path } => check_path(&config, path),
        Command::CheckCommand { line } => check_command(&config, &line),
        Command::Tools => list_tools(&config),
        Command::Config { init } => show_config(&config, init),
    }
}
