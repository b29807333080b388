//! # ELF Image Parsing
//!
//! Extracts the dynamic-linking metadata of a running executable: the
//! program interpreter (`.interp`) and the `DT_NEEDED` entries of its
//! dynamic sections, resolved through `.dynstr`.
//!
//! The image named by `/proc/<pid>/exe` is whatever happens to be running on
//! the host, so its header fields are attacker-controlled. All table loads go
//! through `ImageReader`, which rejects ranges that overflow or
//! extend past the end of the file before allocating.
//!
//! Supported images: ELF64, little-endian, `EM_X86_64`. Anything else is an
//! [`ElfError::Format`](crate::domain::ElfError::Format).
//!
//! ```text
//! ELF header ──▶ program headers (validated, counted)
//!     │
//!     └──▶ section headers ──▶ section name table
//!               │                   │
//!               │          ".dynstr", ".interp" located by name
//!               ▼
//!         SHT_DYNAMIC sections ──▶ DT_NEEDED ... DT_NULL ──▶ names via .dynstr
//! ```
//!
//! The structure definitions and endian-aware field accessors come from the
//! `object` crate; the offset arithmetic is done here so every read can be
//! bounded independently.

pub mod parser;
mod reader;

pub use parser::{parse_image, ElfImage};
