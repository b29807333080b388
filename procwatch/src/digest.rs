//! Content fingerprints for executables and libraries
//!
//! A [`Digester`] turns a file path into a fixed-length lowercase hex digest.
//! The graph builder calls it at most once per catalog entry; the trait seam
//! lets tests count invocations without touching the filesystem twice.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::domain::DigestError;

/// Computes a content hash for a file
pub trait Digester {
    /// Hash the file at `path`.
    ///
    /// # Errors
    /// Returns [`DigestError`] if the file cannot be opened or read.
    fn digest(&self, path: &Path) -> Result<String, DigestError>;
}

/// Streaming SHA-256 over the file contents
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Digester;

impl Sha256Digester {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Digester for Sha256Digester {
    fn digest(&self, path: &Path) -> Result<String, DigestError> {
        let to_err = |source| DigestError { path: path.to_path_buf(), source };
        let mut file = File::open(path).map_err(to_err)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(to_err)?;
        Ok(hex::encode(hasher.finalize()))
    }
}
