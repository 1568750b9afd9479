//! Mach-O64 file header parsing.
//!
//! Parses the `mach_header_64` and the load-command table directory from raw
//! byte slices using safe field extraction (`from_le_bytes`). Only the
//! native little-endian encoding used by Apple's arm64 and x86-64 targets is
//! supported — a big-endian (byte-swapped) magic is rejected outright.

use core::fmt;

/// 64-bit Mach-O magic, native byte order.
const MH_MAGIC_64: u32 = 0xfeed_facf;

/// CPU type: ARM64 (`CPU_TYPE_ARM | CPU_ARCH_ABI64`).
pub const CPU_TYPE_ARM64: u32 = 0x0100_000c;

/// CPU type: x86-64 (`CPU_TYPE_X86 | CPU_ARCH_ABI64`).
pub const CPU_TYPE_X86_64: u32 = 0x0100_0007;

/// Size of the `mach_header_64` structure (32 bytes).
const MH_HEADER_SIZE: usize = 32;

/// Read a little-endian `u32` from `data` at byte offset `off`.
///
/// # Panics
///
/// Panics if `off + 4 > data.len()`. Callers must bounds-check first.
pub(crate) fn le_u32(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(*data[off..].first_chunk().unwrap())
}

/// Read a little-endian `u64` from `data` at byte offset `off`.
pub(crate) fn le_u64(data: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(*data[off..].first_chunk().unwrap())
}

/// Read a little-endian `i32` from `data` at byte offset `off`.
pub(crate) fn le_i32(data: &[u8], off: usize) -> i32 {
    i32::from_le_bytes(*data[off..].first_chunk().unwrap())
}

/// Errors that can occur when parsing a Mach-O64 image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachOError {
    /// The file does not start with the native 64-bit Mach-O magic.
    BadMagic,
    /// The CPU type is neither ARM64 nor x86-64.
    UnsupportedCpu,
    /// The input data is too short for the declared structure.
    Truncated,
    /// A load command, segment, or symbol table offset is out of bounds.
    InvalidOffset,
}

impl fmt::Display for MachOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "not a native-endian 64-bit Mach-O image"),
            Self::UnsupportedCpu => write!(f, "unsupported CPU type (expected arm64 or x86-64)"),
            Self::Truncated => write!(f, "input data truncated"),
            Self::InvalidOffset => write!(f, "invalid load command or table offset"),
        }
    }
}

impl std::error::Error for MachOError {}

/// Parsed `mach_header_64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachHeader {
    /// CPU type (`CPU_TYPE_ARM64` or `CPU_TYPE_X86_64`).
    pub cputype: u32,
    /// CPU subtype, architecture-specific.
    pub cpusubtype: i32,
    /// Mach-O file type (executable, dylib, bundle, ...).
    pub filetype: u32,
    /// Number of load commands following the header.
    pub ncmds: u32,
    /// Total size in bytes of all load commands.
    pub sizeofcmds: u32,
    /// Header flags.
    pub flags: u32,
}

impl MachHeader {
    /// Parse the Mach-O64 header from the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`MachOError`] if the magic is wrong, the CPU type is
    /// unsupported, or `data` is shorter than the header.
    pub fn parse(data: &[u8]) -> Result<Self, MachOError> {
        if data.len() < MH_HEADER_SIZE {
            return Err(MachOError::Truncated);
        }

        let magic = le_u32(data, 0);
        if magic != MH_MAGIC_64 {
            return Err(MachOError::BadMagic);
        }

        let cputype = le_u32(data, 4);
        if cputype != CPU_TYPE_ARM64 && cputype != CPU_TYPE_X86_64 {
            return Err(MachOError::UnsupportedCpu);
        }
        let cpusubtype = le_i32(data, 8);
        let filetype = le_u32(data, 12);
        let ncmds = le_u32(data, 16);
        let sizeofcmds = le_u32(data, 20);
        let flags = le_u32(data, 24);

        let cmds_end = (MH_HEADER_SIZE as u64)
            .checked_add(u64::from(sizeofcmds))
            .ok_or(MachOError::InvalidOffset)?;
        if cmds_end > data.len() as u64 {
            return Err(MachOError::InvalidOffset);
        }

        Ok(Self {
            cputype,
            cpusubtype,
            filetype,
            ncmds,
            sizeofcmds,
            flags,
        })
    }

    /// Byte offset of the first load command (immediately after the header).
    #[must_use]
    pub const fn load_commands_offset(&self) -> usize {
        MH_HEADER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header(cputype: u32, ncmds: u32, sizeofcmds: u32) -> Vec<u8> {
        let mut buf = vec![0u8; MH_HEADER_SIZE];
        buf[0..4].copy_from_slice(&MH_MAGIC_64.to_le_bytes());
        buf[4..8].copy_from_slice(&cputype.to_le_bytes());
        buf[8..12].copy_from_slice(&0i32.to_le_bytes());
        buf[12..16].copy_from_slice(&2u32.to_le_bytes()); // MH_EXECUTE
        buf[16..20].copy_from_slice(&ncmds.to_le_bytes());
        buf[20..24].copy_from_slice(&sizeofcmds.to_le_bytes());
        buf.resize(MH_HEADER_SIZE + sizeofcmds as usize, 0);
        buf
    }

    #[test]
    fn parse_arm64_header() {
        let buf = make_header(CPU_TYPE_ARM64, 0, 0);
        let hdr = MachHeader::parse(&buf).expect("valid header");
        assert_eq!(hdr.cputype, CPU_TYPE_ARM64);
        assert_eq!(hdr.ncmds, 0);
    }

    #[test]
    fn parse_x86_64_header() {
        let buf = make_header(CPU_TYPE_X86_64, 3, 300);
        let hdr = MachHeader::parse(&buf).expect("valid header");
        assert_eq!(hdr.cputype, CPU_TYPE_X86_64);
        assert_eq!(hdr.ncmds, 3);
    }

    #[test]
    fn reject_bad_magic() {
        let mut buf = make_header(CPU_TYPE_ARM64, 0, 0);
        buf[0] = 0;
        assert_eq!(MachHeader::parse(&buf), Err(MachOError::BadMagic));
    }

    #[test]
    fn reject_unsupported_cpu() {
        let buf = make_header(0x0000_0012, 0, 0); // CPU_TYPE_POWERPC
        assert_eq!(MachHeader::parse(&buf), Err(MachOError::UnsupportedCpu));
    }

    #[test]
    fn reject_truncated() {
        assert_eq!(MachHeader::parse(&[0u8; 10]), Err(MachOError::Truncated));
    }

    #[test]
    fn reject_cmds_out_of_bounds() {
        let mut buf = make_header(CPU_TYPE_ARM64, 1, 1000);
        buf.truncate(MH_HEADER_SIZE); // lied about sizeofcmds
        assert_eq!(MachHeader::parse(&buf), Err(MachOError::InvalidOffset));
    }
}
