//! Manifest loading
//!
//! The manifest is a flat `key = value` file:
//!
//! ```text
//! # /etc/procwatch/procwatch.conf
//! tenant = acme
//! domain = prod
//! url = https://inventory.example.com/api/fingers
//! publish = true
//! ```
//!
//! Only the first occurrence of a key counts. Lines that do not contain a
//! `key = value` pair are ignored.

use anyhow::{Context, Result};
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::ReportError;

/// Default manifest location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/procwatch/procwatch.conf";

/// Default linker cache tool
pub const DEFAULT_LDCONFIG: &str = "/sbin/ldconfig";

/// Upload timeout when the manifest does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw key/value pairs from the manifest
pub type Properties = HashMap<String, String>;

/// Typed view of the manifest
#[derive(Debug, Clone)]
pub struct Config {
    pub tenant: String,
    pub domain: String,
    /// Overrides the kernel hostname in the report
    pub hostname: Option<String>,
    pub publish: bool,
    /// Upload endpoint; only needed when uploading
    pub url: Option<String>,
    pub timeout: Duration,
    pub ldconfig: PathBuf,
}

impl Config {
    /// Read and validate the manifest at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or `tenant`/`domain` is missing.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_properties(&parse_manifest(&text))
            .with_context(|| format!("Invalid manifest {}", path.display()))
    }

    /// # Errors
    /// Returns [`ReportError::MissingField`] if `tenant` or `domain` is absent.
    pub fn from_properties(props: &Properties) -> Result<Self, ReportError> {
        let required =
            |key: &'static str| props.get(key).cloned().ok_or(ReportError::MissingField(key));

        let timeout = match props.get("timeout") {
            Some(secs) => match secs.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!("Ignoring invalid timeout '{secs}', using default");
                    DEFAULT_TIMEOUT
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            tenant: required("tenant")?,
            domain: required("domain")?,
            hostname: props.get("hostname").cloned(),
            publish: props.get("publish").is_some_and(|v| v == "true"),
            url: props.get("url").cloned(),
            timeout,
            ldconfig: props.get("ldconfig").map_or_else(|| PathBuf::from(DEFAULT_LDCONFIG), PathBuf::from),
        })
    }

    /// The configured hostname, or the kernel's.
    ///
    /// # Errors
    /// Returns an error if no hostname is configured and
    /// `/proc/sys/kernel/hostname` cannot be read.
    pub fn resolve_hostname(&self) -> Result<String> {
        if let Some(ref hostname) = self.hostname {
            return Ok(hostname.clone());
        }
        let hostname = fs::read_to_string("/proc/sys/kernel/hostname")
            .context("Failed to read /proc/sys/kernel/hostname")?;
        Ok(hostname.trim().to_string())
    }
}

/// Parse manifest text into properties
#[must_use]
pub fn parse_manifest(text: &str) -> Properties {
    let mut props = Properties::new();
    for line in text.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        if let Some((key, value)) = parse_pair(line) {
            props.entry(key.to_string()).or_insert_with(|| value.to_string());
        }
    }
    props
}

/// The token directly before the first `=` and the token directly after it
fn parse_pair(line: &str) -> Option<(&str, &str)> {
    let (left, right) = line.split_once('=')?;
    let key = left.split_whitespace().last()?;
    let value = right.split_whitespace().next()?;
    Some((key, value))
}
