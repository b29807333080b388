//! Inputs to the dependency graph
//!
//! - `process_list`: running executables from `/proc/<pid>/exe`
//! - `ldconfig`: library name → path mappings from the linker cache

pub mod ldconfig;
pub mod process_list;

pub use ldconfig::{load_ldconfig, parse_ldconfig_output, register_libraries, LibraryMapping};
pub use process_list::{list_processes, register_processes, ProcessInfo};
