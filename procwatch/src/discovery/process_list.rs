//! Enumerate running executables from the proc filesystem.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Pid;
use crate::graph::GraphSession;

/// A live process and the executable it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub exe_path: PathBuf,
}

/// List every process under `proc_root` whose `exe` link can be read.
///
/// Kernel threads and processes we lack permission for have no readable
/// `exe` link and are skipped. The result is sorted by PID so registry
/// order is stable between runs on an unchanged host.
///
/// # Errors
/// Returns an error if `proc_root` itself cannot be read.
pub fn list_processes(proc_root: &Path) -> Result<Vec<ProcessInfo>> {
    let proc_dir = fs::read_dir(proc_root)
        .with_context(|| format!("Failed to read {}", proc_root.display()))?;

    let mut processes: Vec<ProcessInfo> = proc_dir
        .flatten()
        .filter_map(|entry| {
            let file_name = entry.file_name();
            let pid = file_name.to_str()?.parse::<i32>().ok()?;

            let exe_link = entry.path().join("exe");
            match fs::read_link(&exe_link) {
                Ok(exe_path) => Some(ProcessInfo { pid: Pid(pid), exe_path }),
                Err(e) => {
                    debug!("Cannot read {}: {e}", exe_link.display());
                    None
                }
            }
        })
        .collect();

    processes.sort_by_key(|p| p.pid);
    Ok(processes)
}

/// Add discovered processes to the registry, one entry per distinct path.
///
/// When several processes run the same executable only the first keeps an
/// entry, so a kill directive for that path reaches the lowest PID.
/// Returns the number of entries added.
pub fn register_processes(session: &mut GraphSession, processes: &[ProcessInfo]) -> usize {
    let mut added = 0;
    for process in processes {
        let path = process.exe_path.to_string_lossy();
        if session.register_process(&path, process.pid) {
            added += 1;
        } else {
            debug!("{} shares {path} with an earlier entry", process.pid);
        }
    }
    info!("Registered {added} executables from {} processes", processes.len());
    added
}
