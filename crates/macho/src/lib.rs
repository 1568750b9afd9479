//! Minimal Mach-O64 parser for locating exported symbols in a loaded image.
//!
//! Parses just enough of the Mach-O64 container format — the file header,
//! `LC_SEGMENT_64` load commands, and the `LC_SYMTAB` symbol/string tables —
//! to answer one question: "at what address does symbol X live in this
//! image?" This is the question the tracer's breakpoint controller needs
//! answered for every candidate syscall-trampoline symbol name.
//!
//! # Usage
//!
//! ```no_run
//! use machobj::MachOFile;
//!
//! let data = std::fs::read("/usr/lib/system/libsystem_kernel.dylib").unwrap();
//! let image = MachOFile::parse(&data).unwrap();
//! if let Some(sym) = image.find_symbol("_read") {
//!     println!("_read is at file-relative address {:#x}", sym.address);
//! }
//! ```

#![forbid(unsafe_code)]

mod header;
mod segment;
mod symtab;

pub use header::{MachHeader, MachOError, CPU_TYPE_ARM64, CPU_TYPE_X86_64};
pub use symtab::Symbol;

use segment::{LoadCommandEntry, LoadCommandIter, Segment64, LC_SEGMENT_64};
use symtab::{SymtabCommand, LC_SYMTAB};

/// A parsed Mach-O64 image: header, segments, and resolved symbols.
#[derive(Debug)]
pub struct MachOFile {
    header: MachHeader,
    segments: Vec<Segment64>,
    symbols: Vec<Symbol>,
}

impl MachOFile {
    /// Parse a Mach-O64 image from raw bytes (as read from disk — no
    /// slide/ASLR bias applied; see [`Symbol::address`]).
    ///
    /// # Errors
    ///
    /// Returns [`MachOError`] if the header, a load command, a segment, or
    /// the symbol table is malformed or out of bounds.
    pub fn parse(data: &[u8]) -> Result<Self, MachOError> {
        let header = MachHeader::parse(data)?;

        let mut segments = Vec::new();
        let mut symtab_cmd: Option<SymtabCommand> = None;

        let cmds = LoadCommandIter::new(data, header.load_commands_offset(), header.ncmds);
        for entry in cmds {
            let (cmd, _cmdsize, off): LoadCommandEntry = entry?;
            match cmd {
                LC_SEGMENT_64 => segments.push(Segment64::parse(data, off)?),
                LC_SYMTAB => symtab_cmd = Some(SymtabCommand::parse(data, off)?),
                _ => {}
            }
        }

        let symbols = match &symtab_cmd {
            Some(cmd) => symtab::extract_symbols(data, cmd)?,
            None => Vec::new(),
        };

        Ok(Self {
            header,
            segments,
            symbols,
        })
    }

    /// The parsed file header.
    #[must_use]
    pub fn header(&self) -> &MachHeader {
        &self.header
    }

    /// `LC_SEGMENT_64` segments in load-command order.
    #[must_use]
    pub fn load_segments(&self) -> &[Segment64] {
        &self.segments
    }

    /// All resolved, named, defined symbols, sorted by ascending address.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Look up a symbol by its exact (mangled, leading-underscore) name.
    ///
    /// Returns `None` if no symbol with that name is defined in this image.
    /// Linear scan: images carry at most a few thousand exported symbols and
    /// this is called a handful of times per session, not per syscall.
    #[must_use]
    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Lowest `vmaddr` among `LC_SEGMENT_64` commands — the image's base
    /// address before any ASLR slide is applied.
    #[must_use]
    pub fn preferred_base(&self) -> Option<u64> {
        self.segments.iter().map(|s| s.vmaddr).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_image(symbols: &[(&str, u64)]) -> Vec<u8> {
        // Build symtab payload first so we know its size up front.
        let mut strtab = vec![0u8];
        let mut nlist = Vec::new();
        for (name, addr) in symbols {
            let strx = strtab.len() as u32;
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
            nlist.extend_from_slice(&strx.to_le_bytes());
            nlist.push(0x0e | 0x01); // N_SECT | N_EXT
            nlist.push(0);
            nlist.extend_from_slice(&0u16.to_le_bytes());
            nlist.extend_from_slice(&addr.to_le_bytes());
        }

        const HEADER_SIZE: usize = 32;
        const SEG_SIZE: usize = 72;
        const SYMTAB_SIZE: usize = 24;

        let symoff = HEADER_SIZE + SEG_SIZE + SYMTAB_SIZE;
        let stroff = symoff + nlist.len();

        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&0xfeed_facfu32.to_le_bytes());
        buf[4..8].copy_from_slice(&CPU_TYPE_ARM64.to_le_bytes());
        buf[12..16].copy_from_slice(&6u32.to_le_bytes()); // MH_DYLIB
        buf[16..20].copy_from_slice(&2u32.to_le_bytes()); // ncmds
        buf[20..24].copy_from_slice(&((SEG_SIZE + SYMTAB_SIZE) as u32).to_le_bytes());

        // LC_SEGMENT_64
        let mut seg = vec![0u8; SEG_SIZE];
        seg[0..4].copy_from_slice(&LC_SEGMENT_64.to_le_bytes());
        seg[4..8].copy_from_slice(&(SEG_SIZE as u32).to_le_bytes());
        seg[24..32].copy_from_slice(&0x1_8000_0000u64.to_le_bytes()); // vmaddr

        // LC_SYMTAB
        let mut symtab_cmd = vec![0u8; SYMTAB_SIZE];
        symtab_cmd[0..4].copy_from_slice(&LC_SYMTAB.to_le_bytes());
        symtab_cmd[4..8].copy_from_slice(&(SYMTAB_SIZE as u32).to_le_bytes());
        symtab_cmd[8..12].copy_from_slice(&(symoff as u32).to_le_bytes());
        symtab_cmd[12..16].copy_from_slice(&(symbols.len() as u32).to_le_bytes());
        symtab_cmd[16..20].copy_from_slice(&(stroff as u32).to_le_bytes());
        symtab_cmd[20..24].copy_from_slice(&(strtab.len() as u32).to_le_bytes());

        buf.extend_from_slice(&seg);
        buf.extend_from_slice(&symtab_cmd);
        buf.extend_from_slice(&nlist);
        buf.extend_from_slice(&strtab);
        buf
    }

    #[test]
    fn parses_segments_and_symbols() {
        let data = minimal_image(&[("_read", 0x1234), ("_write", 0x5678)]);
        let image = MachOFile::parse(&data).unwrap();
        assert_eq!(image.load_segments().len(), 1);
        assert_eq!(image.preferred_base(), Some(0x1_8000_0000));
        assert_eq!(image.find_symbol("_read").unwrap().address, 0x1234);
        assert_eq!(image.find_symbol("_write").unwrap().address, 0x5678);
        assert!(image.find_symbol("_nonexistent").is_none());
    }

    #[test]
    fn rejects_non_macho_data() {
        assert_eq!(MachOFile::parse(b"not a macho file"), Err(MachOError::BadMagic));
    }
}
