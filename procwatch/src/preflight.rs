//! Pre-flight checks for procwatch
//!
//! Validates the host before a scan starts, with clear, actionable error
//! messages when a requirement isn't met.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Run all pre-flight checks before scanning
///
/// # Errors
/// Returns an error if the proc filesystem cannot be listed or the linker
/// cache tool is missing.
pub fn run_preflight_checks(proc_root: &Path, ldconfig: &Path, quiet: bool) -> Result<()> {
    if !is_root() && !quiet {
        eprintln!(
            "warning: not running as root, executables of other users' processes will be skipped"
        );
    }
    check_proc_access(proc_root)?;
    check_ldconfig_exists(ldconfig)?;
    Ok(())
}

/// Whether we run with root privileges, needed to read every `/proc/<pid>/exe`
#[must_use]
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Check that the proc filesystem can be listed
fn check_proc_access(proc_root: &Path) -> Result<()> {
    std::fs::read_dir(proc_root).with_context(|| {
        format!(
            "Cannot read {}\n\n\
             This usually means:\n\
             - /proc is not mounted\n\
             - The agent runs in a sandbox without a process filesystem",
            proc_root.display()
        )
    })?;
    Ok(())
}

/// Check that the linker cache tool exists and is a file
fn check_ldconfig_exists(ldconfig: &Path) -> Result<()> {
    if !ldconfig.exists() {
        bail!(
            "ldconfig not found: {}\n\n\
             Set 'ldconfig = <path>' in the manifest if it lives elsewhere.",
            ldconfig.display()
        );
    }
    if !ldconfig.is_file() {
        bail!("Not a file: {}", ldconfig.display());
    }
    Ok(())
}
