//! Synthetic ELF64 images for tests
//!
//! Layout produced by [`ElfBuilder::build`]:
//!
//! ```text
//! 0x00  ELF header (64 bytes)
//! 0x40  one PT_LOAD program header (56 bytes)
//! 0x78  .interp      "<path>\0"              (optional)
//!       .dynstr      "\0name1\0name2\0..."   (optional)
//!       .dynamic     DT_NEEDED..., DT_STRSZ, DT_NULL, <garbage DT_NEEDED>
//!       .shstrtab
//!       section headers: NULL, [.interp], [.dynstr], .dynamic, .shstrtab
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const EM_X86_64: u16 = 62;
pub const EM_AARCH64: u16 = 183;

const PT_LOAD: u32 = 1;
const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHT_DYNAMIC: u32 = 6;
const DT_NULL: u64 = 0;
const DT_NEEDED: u64 = 1;
const DT_STRSZ: u64 = 10;

/// Offsets of header fields tests like to corrupt
pub const E_SHOFF: usize = 40;
pub const E_PHENTSIZE: usize = 54;
pub const E_PHNUM: usize = 56;
pub const E_SHENTSIZE: usize = 58;
pub const E_SHNUM: usize = 60;
pub const E_SHSTRNDX: usize = 62;

#[derive(Debug, Clone)]
pub struct ElfBuilder {
    machine: u16,
    interp: Option<String>,
    needed: Vec<String>,
    /// `DT_NEEDED` entries with a raw `.dynstr` offset
    raw_needed: Vec<u64>,
    dynstr: bool,
    /// Declared `.dynamic` size, replacing the real one
    dynamic_size: Option<u64>,
}

impl Default for ElfBuilder {
    fn default() -> Self {
        Self {
            machine: EM_X86_64,
            interp: None,
            needed: Vec::new(),
            raw_needed: Vec::new(),
            dynstr: true,
            dynamic_size: None,
        }
    }
}

struct Section {
    name: u32,
    kind: u32,
    offset: u64,
    size: u64,
    entsize: u64,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn interp(mut self, path: &str) -> Self {
        self.interp = Some(path.to_string());
        self
    }

    pub fn needed(mut self, name: &str) -> Self {
        self.needed.push(name.to_string());
        self
    }

    pub fn needed_at(mut self, dynstr_offset: u64) -> Self {
        self.raw_needed.push(dynstr_offset);
        self
    }

    pub fn dynamic_size(mut self, size: u64) -> Self {
        self.dynamic_size = Some(size);
        self
    }

    pub fn without_dynstr(mut self) -> Self {
        self.dynstr = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; 64 + 56];
        let mut shstrtab = vec![0u8];
        let mut sections = Vec::new();

        let mut name = |shstrtab: &mut Vec<u8>, s: &str| -> u32 {
            let offset = shstrtab.len() as u32;
            shstrtab.extend_from_slice(s.as_bytes());
            shstrtab.push(0);
            offset
        };

        if let Some(interp) = &self.interp {
            let offset = out.len() as u64;
            out.extend_from_slice(interp.as_bytes());
            out.push(0);
            sections.push(Section {
                name: name(&mut shstrtab, ".interp"),
                kind: SHT_PROGBITS,
                offset,
                size: interp.len() as u64 + 1,
                entsize: 0,
            });
        }

        let mut dynstr = vec![0u8];
        let mut name_offsets = Vec::new();
        for needed in &self.needed {
            name_offsets.push(dynstr.len() as u64);
            dynstr.extend_from_slice(needed.as_bytes());
            dynstr.push(0);
        }
        if self.dynstr {
            let offset = out.len() as u64;
            out.extend_from_slice(&dynstr);
            sections.push(Section {
                name: name(&mut shstrtab, ".dynstr"),
                kind: SHT_STRTAB,
                offset,
                size: dynstr.len() as u64,
                entsize: 0,
            });
        }

        align(&mut out, 8);
        let offset = out.len() as u64;
        for name_offset in name_offsets.iter().chain(&self.raw_needed) {
            push_u64(&mut out, DT_NEEDED);
            push_u64(&mut out, *name_offset);
        }
        push_u64(&mut out, DT_STRSZ);
        push_u64(&mut out, dynstr.len() as u64);
        push_u64(&mut out, DT_NULL);
        push_u64(&mut out, 0);
        // Past the terminator: must never be read
        push_u64(&mut out, DT_NEEDED);
        push_u64(&mut out, 0xffff_ffff);
        sections.push(Section {
            name: name(&mut shstrtab, ".dynamic"),
            kind: SHT_DYNAMIC,
            offset,
            size: self.dynamic_size.unwrap_or(out.len() as u64 - offset),
            entsize: 16,
        });

        let shstrtab_name = name(&mut shstrtab, ".shstrtab");
        let offset = out.len() as u64;
        out.extend_from_slice(&shstrtab);
        sections.push(Section {
            name: shstrtab_name,
            kind: SHT_STRTAB,
            offset,
            size: shstrtab.len() as u64,
            entsize: 0,
        });

        align(&mut out, 8);
        let shoff = out.len() as u64;
        // NULL section
        out.extend_from_slice(&[0u8; 64]);
        for section in &sections {
            push_u32(&mut out, section.name);
            push_u32(&mut out, section.kind);
            push_u64(&mut out, 0); // sh_flags
            push_u64(&mut out, 0); // sh_addr
            push_u64(&mut out, section.offset);
            push_u64(&mut out, section.size);
            push_u32(&mut out, 0); // sh_link
            push_u32(&mut out, 0); // sh_info
            push_u64(&mut out, 1); // sh_addralign
            push_u64(&mut out, section.entsize);
        }
        let shnum = sections.len() as u16 + 1;
        let total = out.len() as u64;

        // ELF header
        let mut header = Vec::with_capacity(64);
        header.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
        header.extend_from_slice(&[0u8; 8]);
        push_u16(&mut header, 3); // ET_DYN
        push_u16(&mut header, self.machine);
        push_u32(&mut header, 1); // e_version
        push_u64(&mut header, 0); // e_entry
        push_u64(&mut header, 64); // e_phoff
        push_u64(&mut header, shoff);
        push_u32(&mut header, 0); // e_flags
        push_u16(&mut header, 64); // e_ehsize
        push_u16(&mut header, 56); // e_phentsize
        push_u16(&mut header, 1); // e_phnum
        push_u16(&mut header, 64); // e_shentsize
        push_u16(&mut header, shnum);
        push_u16(&mut header, shnum - 1); // .shstrtab is last
        assert_eq!(header.len(), 64);

        // PT_LOAD covering the whole file
        let mut phdr = Vec::with_capacity(56);
        push_u32(&mut phdr, PT_LOAD);
        push_u32(&mut phdr, 4); // PF_R
        push_u64(&mut phdr, 0);
        push_u64(&mut phdr, 0);
        push_u64(&mut phdr, 0);
        push_u64(&mut phdr, total);
        push_u64(&mut phdr, total);
        push_u64(&mut phdr, 0x1000);
        assert_eq!(phdr.len(), 56);

        out[..64].copy_from_slice(&header);
        out[64..120].copy_from_slice(&phdr);
        out
    }

    /// Build and write to `dir/name`, returning the path
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        write_file(dir, name, &self.build())
    }
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

pub fn patch_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn patch_u64(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn align(out: &mut Vec<u8>, to: usize) {
    while out.len() % to != 0 {
        out.push(0);
    }
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}
