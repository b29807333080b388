//! Preload the library catalog from the dynamic linker cache.
//!
//! `ldconfig -p` prints one cached library per line:
//!
//! ```text
//! 1183 libs found in cache `/etc/ld.so.cache'
//!         libzstd.so.1 (libc6,x86-64) => /lib/x86_64-linux-gnu/libzstd.so.1
//!         libc.so.6 (libc6,x86-64, OS ABI: Linux 3.2.0) => /lib/x86_64-linux-gnu/libc.so.6
//! ```

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::Path;
use std::process::Command;

use crate::graph::GraphSession;

/// A library name and the path the linker cache maps it to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryMapping {
    pub name: String,
    pub path: String,
}

/// Run `<ldconfig> -p` and parse its listing.
///
/// # Errors
/// Returns an error if the tool cannot be spawned or exits unsuccessfully.
pub fn load_ldconfig(ldconfig: &Path) -> Result<Vec<LibraryMapping>> {
    let output = Command::new(ldconfig)
        .arg("-p")
        .output()
        .with_context(|| format!("Failed to run {} -p", ldconfig.display()))?;

    if !output.status.success() {
        bail!(
            "{} -p exited with {}: {}",
            ldconfig.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    let mappings = parse_ldconfig_output(&listing);
    info!("Linker cache lists {} libraries", mappings.len());
    Ok(mappings)
}

/// Parse `ldconfig -p` output. Lines without `=>` (header, footer) are skipped.
#[must_use]
pub fn parse_ldconfig_output(listing: &str) -> Vec<LibraryMapping> {
    listing.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<LibraryMapping> {
    let (left, right) = line.split_once("=>")?;
    let name = left.split_whitespace().next()?;
    let path = right.split_whitespace().next()?;
    Some(LibraryMapping { name: name.to_string(), path: path.to_string() })
}

/// Seed the library catalog. The first mapping listed for a name wins.
/// Returns the number of entries added.
pub fn register_libraries(session: &mut GraphSession, mappings: &[LibraryMapping]) -> usize {
    let mut added = 0;
    for mapping in mappings {
        if session.register_library(&mapping.name, &mapping.path) {
            added += 1;
        } else {
            debug!("Ignoring duplicate mapping {} => {}", mapping.name, mapping.path);
        }
    }
    added
}
