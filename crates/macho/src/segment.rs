//! `LC_SEGMENT_64` load command parsing.

use crate::header::{le_u32, le_u64, MachOError};

/// Load command type: 64-bit segment.
pub(crate) const LC_SEGMENT_64: u32 = 0x19;

/// Size of a `segment_command_64`, including its 8-byte load command header.
const SEGMENT_CMD_SIZE: usize = 72;

/// A parsed `LC_SEGMENT_64` load command.
#[derive(Debug, Clone, Copy)]
pub struct Segment64 {
    /// Virtual address at which the segment loads.
    pub vmaddr: u64,
    /// Size in memory (may exceed `filesize`, e.g. zero-filled `__BSS`).
    pub vmsize: u64,
    /// Offset into the file where the segment's data starts.
    pub fileoff: u64,
    /// Size of the segment's data in the file.
    pub filesize: u64,
    /// Number of `section_64` entries immediately following this command.
    pub nsects: u32,
}

impl Segment64 {
    /// Parse a `segment_command_64` whose load-command header starts at
    /// `data[offset..]`.
    ///
    /// `cmdsize` is the value already read from the load command header;
    /// the caller has verified `offset + cmdsize <= data.len()`.
    pub(crate) fn parse(data: &[u8], offset: usize) -> Result<Self, MachOError> {
        if offset + SEGMENT_CMD_SIZE > data.len() {
            return Err(MachOError::Truncated);
        }
        let b = &data[offset..];
        Ok(Self {
            // segname at 8..24 — not needed to locate symbols.
            vmaddr: le_u64(b, 24),
            vmsize: le_u64(b, 32),
            fileoff: le_u64(b, 40),
            filesize: le_u64(b, 48),
            // maxprot at 56, initprot at 60 — unused.
            nsects: le_u32(b, 64),
            // flags at 68 — unused.
        })
    }
}

/// An iterator over the raw load command table of a Mach-O64 image.
pub(crate) struct LoadCommandIter<'a> {
    data: &'a [u8],
    pos: usize,
    remaining: u32,
}

impl<'a> LoadCommandIter<'a> {
    pub(crate) fn new(data: &'a [u8], start: usize, ncmds: u32) -> Self {
        Self {
            data,
            pos: start,
            remaining: ncmds,
        }
    }
}

/// One entry from the load command table: `(cmd, cmdsize, offset_of_cmd)`.
pub(crate) type LoadCommandEntry = (u32, u32, usize);

impl<'a> Iterator for LoadCommandIter<'a> {
    type Item = Result<LoadCommandEntry, MachOError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.pos + 8 > self.data.len() {
            self.remaining = 0;
            return Some(Err(MachOError::Truncated));
        }
        let cmd = le_u32(self.data, self.pos);
        let cmdsize = le_u32(self.data, self.pos + 4);
        if cmdsize < 8 || self.pos + cmdsize as usize > self.data.len() {
            self.remaining = 0;
            return Some(Err(MachOError::InvalidOffset));
        }
        let entry = (cmd, cmdsize, self.pos);
        self.pos += cmdsize as usize;
        self.remaining -= 1;
        Some(Ok(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_segment(buf: &mut Vec<u8>, vmaddr: u64, vmsize: u64, fileoff: u64, filesize: u64) {
        let start = buf.len();
        buf.resize(start + SEGMENT_CMD_SIZE, 0);
        let b = &mut buf[start..];
        b[0..4].copy_from_slice(&LC_SEGMENT_64.to_le_bytes());
        b[4..8].copy_from_slice(&(SEGMENT_CMD_SIZE as u32).to_le_bytes());
        b[24..32].copy_from_slice(&vmaddr.to_le_bytes());
        b[32..40].copy_from_slice(&vmsize.to_le_bytes());
        b[40..48].copy_from_slice(&fileoff.to_le_bytes());
        b[48..56].copy_from_slice(&filesize.to_le_bytes());
    }

    #[test]
    fn parse_single_segment() {
        let mut buf = Vec::new();
        push_segment(&mut buf, 0x1_0000_0000, 0x4000, 0, 0x4000);
        let seg = Segment64::parse(&buf, 0).unwrap();
        assert_eq!(seg.vmaddr, 0x1_0000_0000);
        assert_eq!(seg.vmsize, 0x4000);
    }

    #[test]
    fn iter_walks_multiple_commands() {
        let mut buf = Vec::new();
        push_segment(&mut buf, 0x1000, 0x1000, 0, 0x1000);
        push_segment(&mut buf, 0x2000, 0x1000, 0x1000, 0x1000);
        let entries: Vec<_> = LoadCommandIter::new(&buf, 0, 2).collect::<Result<_, _>>().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, LC_SEGMENT_64);
        assert_eq!(entries[1].2, SEGMENT_CMD_SIZE);
    }

    #[test]
    fn iter_rejects_truncated_cmdsize() {
        let mut buf = Vec::new();
        push_segment(&mut buf, 0x1000, 0x1000, 0, 0x1000);
        buf[4..8].copy_from_slice(&1000u32.to_le_bytes()); // lie about cmdsize
        let result: Result<Vec<_>, _> = LoadCommandIter::new(&buf, 0, 1).collect();
        assert_eq!(result, Err(MachOError::InvalidOffset));
    }
}
