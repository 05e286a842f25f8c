//! Integration tests for tool dispatch and the MCP server.
//!
//! These tests verify that:
//! - A rejected call leaves the filesystem untouched and spawns nothing
//! - Approved calls act only through the canonical path
//! - The server reports rejections as error results carrying the code

use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use toolwarden::config::WardenConfig;
use toolwarden::server::McpServer;
use toolwarden::tools::{build_registry, Prompts, ToolRegistry};

fn config_for(dir: &TempDir) -> WardenConfig {
    let mut config = WardenConfig::default();
    config.filesystem.allowed_dir = dir.path().display().to_string();
    config.command.allowed_command = "echo,ls".to_string();
    config
}

fn registry_for(dir: &TempDir) -> ToolRegistry {
    let config = config_for(dir);
    let allowlist = config.build_allowlist().unwrap();
    build_registry(&config, &allowlist).unwrap()
}

/// Snapshot of every entry under `dir`, for before/after comparison.
fn listing(dir: &std::path::Path) -> Vec<String> {
    let mut entries: Vec<String> = walk(dir)
        .into_iter()
        .map(|p| p.display().to_string())
        .collect();
    entries.sort();
    entries
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    if let Ok(read) = fs::read_dir(dir) {
        for entry in read.flatten() {
            let path = entry.path();
            out.push(path.clone());
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                out.extend(walk(&path));
            }
        }
    }
    out
}

#[tokio::test]
async fn rejected_calls_perform_no_io() {
    let root = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("keep.txt"), "original").unwrap();
    let registry = registry_for(&root);

    let before_root = listing(root.path());
    let before_outside = listing(outside.path());

    let target = outside.path().join("keep.txt");
    let marker = root.path().join("marker");
    let calls = [
        ("write_file", json!({"path": target, "content": "pwned"})),
        ("create_directory", json!({"path": outside.path().join("new")})),
        (
            "move_file",
            json!({"source": target, "destination": root.path().join("stolen.txt")}),
        ),
        (
            "execute_command",
            json!({"command": format!("echo hi && touch {}", marker.display())}),
        ),
        (
            "execute_command",
            json!({"command": "ls", "cwd": outside.path()}),
        ),
    ];

    for (tool, args) in calls {
        let err = registry.execute(tool, args).await.unwrap_err();
        assert!(err.is_denied(), "{tool} was not denied: {err}");
        assert!(err.request_id.is_some());
    }

    assert_eq!(listing(root.path()), before_root);
    assert_eq!(listing(outside.path()), before_outside);
    assert_eq!(fs::read_to_string(&target).unwrap(), "original");
}

#[tokio::test]
async fn approved_calls_round_trip_through_the_guard() {
    let root = TempDir::new().unwrap();
    let registry = registry_for(&root);

    let dir = root.path().join("notes");
    registry
        .execute("create_directory", json!({"path": dir}))
        .await
        .unwrap();
    registry
        .execute(
            "write_file",
            json!({"path": dir.join("../notes/today.md"), "content": "# today\n"}),
        )
        .await
        .unwrap();

    let read = registry
        .execute("read_file", json!({"path": dir.join("today.md")}))
        .await
        .unwrap();
    assert!(read["content"].as_str().unwrap().contains("# today"));

    let found = registry
        .execute("search_files", json!({"path": root.path(), "pattern": "*.md"}))
        .await
        .unwrap();
    assert_eq!(found["count"], 1);
}

#[tokio::test]
async fn unknown_tool_gets_a_suggestion() {
    let root = TempDir::new().unwrap();
    let registry = registry_for(&root);

    let err = registry.execute("read_fil", json!({})).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("read_file"));
}

#[tokio::test]
async fn server_reports_rejections_as_error_results() {
    let root = TempDir::new().unwrap();
    let config = config_for(&root);
    let allowlist = config.build_allowlist().unwrap();
    let server = Arc::new(McpServer::new(
        build_registry(&config, &allowlist).unwrap(),
        Prompts::load(&config, &allowlist).unwrap(),
    ));

    let request = json!({
        "jsonrpc": "2.0",
        "id": 9,
        "method": "tools/call",
        "params": {"name": "execute_command", "arguments": {"command": "rm -rf /"}}
    });
    let response = server.handle_line(&request.to_string()).await.unwrap();
    let response: Value = serde_json::to_value(response).unwrap();

    assert_eq!(response["id"], 9);
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(
        response["result"]["structuredContent"]["error"]["code"],
        "not_allowed"
    );
}
