//! ELF64 dynamic-linking metadata extraction
//!
//! Only the pieces needed to build the dependency graph are loaded: the file
//! header, the program and section header tables, the section-name string
//! table, `.dynstr`, `.interp` and every `SHT_DYNAMIC` section. Each table is
//! an owned buffer scoped to [`parse_image`], so nothing outlives the call on
//! any exit path.

use std::mem;
use std::path::Path;

use log::debug;
use object::elf::{
    Dyn64, FileHeader64, ProgramHeader64, SectionHeader64, DT_NEEDED, DT_NULL, ELFCLASS64,
    ELFDATA2LSB, ELFMAG, EM_X86_64, SHT_DYNAMIC,
};
use object::{pod, LittleEndian};

use super::reader::ImageReader;
use crate::domain::ElfError;

type Header = FileHeader64<LittleEndian>;
type ProgramHeader = ProgramHeader64<LittleEndian>;
type SectionHeader = SectionHeader64<LittleEndian>;
type DynEntry = Dyn64<LittleEndian>;

const LE: LittleEndian = LittleEndian;

/// Dynamic-linking metadata declared by one executable image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElfImage {
    /// Program interpreter from `.interp` (the dynamic loader path)
    pub interpreter: Option<String>,
    /// `DT_NEEDED` library names in declaration order
    pub needed: Vec<String>,
    /// Number of program headers
    pub segments: usize,
    /// Number of section headers
    pub sections: usize,
}

/// Parse the ELF64 image at `path` and return its declared dependencies.
///
/// The file is untrusted: every offset and count taken from it is checked
/// against the file length before it is used.
///
/// # Errors
/// - [`ElfError::Open`] if the file cannot be opened
/// - [`ElfError::Format`] if the header is truncated, the magic, class,
///   byte order or machine is not ELF64 little-endian x86-64, or any table
///   read falls outside the file
pub fn parse_image(path: &Path) -> Result<ElfImage, ElfError> {
    let reader = ImageReader::open(path)?;

    let header_size = mem::size_of::<Header>() as u64;
    if reader.len() < header_size {
        return Err(reader.format_error(format!("truncated ELF header ({} bytes)", reader.len())));
    }
    let header_bytes = reader.read_at(0, header_size, "ELF header")?;
    let (header, _) = pod::from_bytes::<Header>(&header_bytes)
        .map_err(|_| reader.format_error("unreadable ELF header"))?;
    check_identity(&reader, header)?;

    let segments = load_program_headers(&reader, header)?;

    let section_bytes = load_table::<SectionHeader>(
        &reader,
        header.e_shoff.get(LE),
        header.e_shnum.get(LE),
        header.e_shentsize.get(LE),
        "section header table",
    )?;
    let sections = cast_table::<SectionHeader>(&reader, &section_bytes, "section header table")?;

    let names_index = usize::from(header.e_shstrndx.get(LE));
    let names_section = sections.get(names_index).ok_or_else(|| {
        reader.format_error(format!(
            "section name table index {names_index} out of range ({} sections)",
            sections.len()
        ))
    })?;
    let names = read_section(&reader, names_section, "section name table")?;

    let dynstr = find_section(sections, &names, b".dynstr")
        .map(|section| read_section(&reader, section, ".dynstr"))
        .transpose()?;

    let interpreter = find_section(sections, &names, b".interp")
        .map(|section| read_section(&reader, section, ".interp"))
        .transpose()?
        .and_then(|bytes| interpreter_path(&bytes));

    let mut needed = Vec::new();
    for section in sections.iter().filter(|s| s.sh_type.get(LE) == SHT_DYNAMIC) {
        let entries = read_section(&reader, section, ".dynamic")?;
        collect_needed(&reader, &entries, dynstr.as_deref(), &mut needed)?;
    }

    debug!(
        "Parsed {}: {} segments, {} sections, {} needed, interpreter {:?}",
        path.display(),
        segments,
        sections.len(),
        needed.len(),
        interpreter
    );

    Ok(ElfImage { interpreter, needed, segments, sections: sections.len() })
}

/// Reject anything that is not a 64-bit little-endian x86-64 image
fn check_identity(reader: &ImageReader, header: &Header) -> Result<(), ElfError> {
    let ident = &header.e_ident;
    if ident.magic != ELFMAG {
        return Err(reader.format_error("bad ELF magic"));
    }
    if ident.class != ELFCLASS64 {
        return Err(reader.format_error(format!("unsupported ELF class {}", ident.class)));
    }
    if ident.data != ELFDATA2LSB {
        return Err(reader.format_error(format!("unsupported byte order {}", ident.data)));
    }
    let machine = header.e_machine.get(LE);
    if machine != EM_X86_64 {
        return Err(reader.format_error(format!("unsupported machine type {machine}")));
    }
    Ok(())
}

fn load_program_headers(reader: &ImageReader, header: &Header) -> Result<usize, ElfError> {
    let bytes = load_table::<ProgramHeader>(
        reader,
        header.e_phoff.get(LE),
        header.e_phnum.get(LE),
        header.e_phentsize.get(LE),
        "program header table",
    )?;
    Ok(cast_table::<ProgramHeader>(reader, &bytes, "program header table")?.len())
}

/// Read a header table, insisting on the standard entry size when non-empty
fn load_table<T>(
    reader: &ImageReader,
    offset: u64,
    count: u16,
    entsize: u16,
    what: &str,
) -> Result<Vec<u8>, ElfError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if usize::from(entsize) != mem::size_of::<T>() {
        return Err(reader.format_error(format!("{what} entry size {entsize} is not supported")));
    }
    reader.read_table(offset, u64::from(count), u64::from(entsize), what)
}

/// View a loaded table as whole entries; a trailing partial entry is ignored
fn cast_table<'a, T: pod::Pod>(
    reader: &ImageReader,
    bytes: &'a [u8],
    what: &str,
) -> Result<&'a [T], ElfError> {
    if bytes.is_empty() {
        return Ok(&[]);
    }
    let count = bytes.len() / mem::size_of::<T>();
    pod::slice_from_bytes::<T>(bytes, count)
        .map(|(entries, _)| entries)
        .map_err(|_| reader.format_error(format!("unreadable {what}")))
}

fn read_section(
    reader: &ImageReader,
    section: &SectionHeader,
    what: &str,
) -> Result<Vec<u8>, ElfError> {
    reader.read_at(section.sh_offset.get(LE), section.sh_size.get(LE), what)
}

/// Linear scan of the section table for `name`
fn find_section<'a>(
    sections: &'a [SectionHeader],
    names: &[u8],
    name: &[u8],
) -> Option<&'a SectionHeader> {
    sections.iter().find(|section| cstr_at(names, u64::from(section.sh_name.get(LE))) == Some(name))
}

fn collect_needed(
    reader: &ImageReader,
    bytes: &[u8],
    dynstr: Option<&[u8]>,
    needed: &mut Vec<String>,
) -> Result<(), ElfError> {
    for entry in cast_table::<DynEntry>(reader, bytes, ".dynamic")? {
        let tag = entry.d_tag.get(LE);
        if tag == u64::from(DT_NULL) {
            break;
        }
        if tag != u64::from(DT_NEEDED) {
            continue;
        }
        // Without .dynstr the names cannot be recovered
        let Some(strings) = dynstr else {
            continue;
        };
        let offset = entry.d_val.get(LE);
        let name = cstr_at(strings, offset).ok_or_else(|| {
            reader.format_error(format!("DT_NEEDED name offset 0x{offset:x} outside .dynstr"))
        })?;
        needed.push(String::from_utf8_lossy(name).into_owned());
    }
    Ok(())
}

/// NUL-terminated string starting at `offset`, or `None` if it runs off the table
fn cstr_at(table: &[u8], offset: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let tail = table.get(start..)?;
    let len = tail.iter().position(|&b| b == 0)?;
    Some(&tail[..len])
}

/// `.interp` holds the loader path followed by a NUL
fn interpreter_path(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let path = &bytes[..end];
    if path.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(path).into_owned())
    }
}
