//! File content handling shared by `read_file` and `file://` resources.
//!
//! Files are sniffed rather than trusted by extension: anything with a NUL
//! byte in its first 8KB, or that is not valid UTF-8, is binary. The
//! extension only picks the MIME type.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::path::Path;

/// Files larger than this are referenced instead of inlined (5MB).
pub const MAX_INLINE_SIZE: u64 = 5 * 1024 * 1024;

/// Binary files larger than this are not base64 encoded (1MB).
pub const MAX_BASE64_SIZE: u64 = 1024 * 1024;

/// URI scheme for filesystem resources.
pub const FILE_SCHEME: &str = "file://";

/// Bytes sampled when deciding whether a file is binary.
const BINARY_SAMPLE: usize = 8192;

const OCTET_STREAM: &str = "application/octet-stream";

/// Decoded file body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBody {
    /// UTF-8 text.
    Text(String),
    /// Anything else.
    Binary(Vec<u8>),
}

impl FileBody {
    /// Sorts raw bytes into text or binary.
    #[must_use]
    pub fn classify(bytes: Vec<u8>) -> Self {
        let sample = &bytes[..bytes.len().min(BINARY_SAMPLE)];
        if sample.contains(&0) {
            return Self::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }
}

/// MIME type for a text file, defaulting to `text/plain`.
#[must_use]
pub fn text_mime(path: &Path) -> &'static str {
    mime_guess::from_path(path).first_raw().unwrap_or("text/plain")
}

/// MIME type for a binary file, defaulting to `application/octet-stream`.
#[must_use]
pub fn binary_mime(path: &Path) -> &'static str {
    mime_guess::from_path(path).first_raw().unwrap_or(OCTET_STREAM)
}

/// Returns true for `image/*` types.
#[must_use]
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Standard base64 with padding.
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// `file://` URI for an absolute path.
#[must_use]
pub fn file_uri(path: &Path) -> String {
    format!("{FILE_SCHEME}{}", path.display())
}

/// Path part of a `file://` URI, or `None` for any other scheme.
#[must_use]
pub fn path_from_uri(uri: &str) -> Option<&str> {
    uri.strip_prefix(FILE_SCHEME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_separates_text_from_binary() {
        assert_eq!(
            FileBody::classify(b"hello\n".to_vec()),
            FileBody::Text("hello\n".to_string())
        );
        assert!(matches!(
            FileBody::classify(vec![0x89, b'P', b'N', b'G', 0, 0]),
            FileBody::Binary(_)
        ));
        assert!(matches!(
            FileBody::classify(vec![0xff, 0xfe, b'a']),
            FileBody::Binary(_)
        ));
    }

    #[test]
    fn mime_follows_extension_with_fallbacks() {
        assert_eq!(binary_mime(Path::new("/a/logo.png")), "image/png");
        assert_eq!(binary_mime(Path::new("/a/blob")), "application/octet-stream");
        assert_eq!(text_mime(Path::new("/a/notes")), "text/plain");
        assert!(is_image("image/jpeg"));
        assert!(!is_image("application/pdf"));
    }

    #[test]
    fn uri_round_trip() {
        let uri = file_uri(Path::new("/tmp/x.txt"));
        assert_eq!(uri, "file:///tmp/x.txt");
        assert_eq!(path_from_uri(&uri), Some("/tmp/x.txt"));
        assert_eq!(path_from_uri("http://example.com"), None);
    }

    #[test]
    fn base64_is_padded_standard() {
        assert_eq!(encode_base64(b"hi"), "aGk=");
    }
}
