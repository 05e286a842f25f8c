//! `file://` resources over the allowed directories.
//!
//! Every allowed root is listed as a resource. Reading a URI runs its path
//! through the same [`PathGuard`] the tools use, then returns a directory
//! listing, the text, or a base64 blob.

use crate::security::{CanonicalPath, PathGuard};
use crate::server::protocol::{JsonRpcError, Resource, ResourceContents};
use crate::tools::content::{
    binary_mime, encode_base64, file_uri, path_from_uri, text_mime, FileBody, MAX_BASE64_SIZE,
    MAX_INLINE_SIZE,
};
use std::fmt::Write as _;

const DIRECTORY_MIME: &str = "inode/directory";
const PLAIN: &str = "text/plain";

/// Read-only view of the allowed directories as MCP resources.
#[derive(Debug, Clone)]
pub struct FileResources {
    guard: PathGuard,
}

impl FileResources {
    /// Creates resources backed by the guard's roots.
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// One resource per allowed root.
    #[must_use]
    pub fn list(&self) -> Vec<Resource> {
        self.guard
            .roots()
            .iter()
            .map(|root| Resource {
                uri: file_uri(root.canonical()),
                name: root.configured().display().to_string(),
                description: Some("Allowed directory".to_string()),
                mime_type: Some(DIRECTORY_MIME.to_string()),
            })
            .collect()
    }

    /// Reads a `file://` URI.
    ///
    /// # Errors
    ///
    /// Returns invalid params for any other scheme, and resource not found
    /// when the guard rejects the path or it cannot be read.
    pub async fn read(&self, uri: &str) -> Result<Vec<ResourceContents>, JsonRpcError> {
        let requested = path_from_uri(uri)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("unsupported URI scheme: {uri}")))?;

        let path = self
            .guard
            .validate_blocking(requested)
            .await
            .map_err(|rejection| {
                JsonRpcError::resource_not_found(format!("{}: {rejection}", rejection.code()))
            })?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| JsonRpcError::resource_not_found(format!("cannot read {uri}: {e}")))?;

        if metadata.is_dir() {
            let text = listing(&path).await?;
            return Ok(vec![ResourceContents::text(uri, PLAIN, text)]);
        }

        if metadata.len() > MAX_INLINE_SIZE {
            return Ok(vec![ResourceContents::text(
                uri,
                PLAIN,
                format!(
                    "File is too large to display inline ({} bytes). Use the read_file tool to access specific portions.",
                    metadata.len()
                ),
            )]);
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| JsonRpcError::resource_not_found(format!("cannot read {uri}: {e}")))?;

        let contents = match FileBody::classify(bytes) {
            FileBody::Text(text) => ResourceContents::text(uri, text_mime(&path), text),
            FileBody::Binary(bytes) => {
                let mime = binary_mime(&path);
                if bytes.len() as u64 <= MAX_BASE64_SIZE {
                    ResourceContents::blob(uri, mime, encode_base64(&bytes))
                } else {
                    ResourceContents::text(
                        uri,
                        PLAIN,
                        format!(
                            "Binary file ({mime}, {} bytes). Use the read_file tool to access specific portions.",
                            bytes.len()
                        ),
                    )
                }
            }
        };
        Ok(vec![contents])
    }
}

/// Directory listing with a `file://` URI per entry, sorted by name.
async fn listing(dir: &CanonicalPath) -> Result<String, JsonRpcError> {
    let unreadable = |e: std::io::Error| {
        JsonRpcError::resource_not_found(format!("cannot list {dir}: {e}"))
    };

    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(unreadable)? {
        let metadata = entry.metadata().await.ok();
        entries.push((entry.file_name().to_string_lossy().into_owned(), metadata));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = format!("Directory listing for: {dir}\n\n");
    for (name, metadata) in entries {
        let uri = file_uri(&dir.join(&name));
        let _ = match metadata {
            Some(m) if m.is_dir() => writeln!(out, "[DIR]  {name} ({uri})"),
            Some(m) if m.is_symlink() => writeln!(out, "[LINK] {name} ({uri})"),
            Some(m) => writeln!(out, "[FILE] {name} ({uri}) - {} bytes", m.len()),
            None => writeln!(out, "[FILE] {name} ({uri})"),
        };
    }
    Ok(out)
}
