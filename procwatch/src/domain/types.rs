//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing an operating-system
//! PID where a report id is expected, and make function signatures more
//! expressive.

use std::fmt;

/// Process ID
///
/// Represents an operating-system process ID as read from `/proc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<i32> for Pid {
    fn from(pid: i32) -> Self {
        Pid(pid)
    }
}

impl From<Pid> for i32 {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

/// Entry ID (1-based by convention)
///
/// The number assigned to a catalog entry during the numbering phase. It is
/// the `dbid` in the uploaded report and the address used by kill directives.
/// This is NOT the same as the operating-system PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u32);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which registry a catalog entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Registry {
    /// Running executables discovered from `/proc`
    Process,
    /// Shared libraries from the linker cache or interpreter references
    Library,
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registry::Process => f.write_str("process registry"),
            Registry::Library => f.write_str("library catalog"),
        }
    }
}
