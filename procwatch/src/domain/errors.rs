//! Structured error types for procwatch
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::Registry;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to inspect an executable image.
///
/// Both variants are per-entry: the scan logs them and moves on to the next
/// process.
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ELF image {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },
}

#[derive(Error, Debug)]
#[error("Failed to hash {}: {source}", path.display())]
pub struct DigestError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("The {0} has already been numbered")]
    AlreadyNumbered(Registry),

    #[error("Entry id space exhausted")]
    IdSpaceExhausted,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Entry {0} has not been numbered")]
    Unnumbered(String),

    #[error("Missing required manifest key '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Upload to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server rejected the report with HTTP {0}")]
    Status(u16),

    #[error("Failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = ElfError::Format {
            path: PathBuf::from("/usr/bin/broken"),
            reason: "bad magic".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed ELF image /usr/bin/broken: bad magic");
    }

    #[test]
    fn test_already_numbered_display() {
        let err = GraphError::AlreadyNumbered(Registry::Library);
        assert!(err.to_string().contains("library catalog"));
    }

    #[test]
    fn test_digest_error_keeps_source() {
        let err = DigestError {
            path: PathBuf::from("/lib/libc.so.6"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/lib/libc.so.6"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
