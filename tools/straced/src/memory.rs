//! Safe reads of a traced process's address space.
//!
//! All reads are observational — nothing in this module ever writes to the
//! target. A read that runs off the end of a mapping degrades to a
//! truncated partial result rather than failing outright; [`TraceError`] is
//! reserved for the case where the target cannot be inspected at all (e.g.
//! the task port is stale because the process has already exited).

use mach2::kern_return::KERN_SUCCESS;
use mach2::mach_types::vm_task_entry_t;
use mach2::port::mach_port_t;
use mach2::vm::mach_vm_read_overwrite;
use mach2::vm_types::{mach_vm_address_t, mach_vm_size_t};

use crate::error::TraceError;

/// Default cap on a single string scan, independent of the caller's
/// requested `max_len` — guards against a corrupt pointer turning a single
/// argument render into an unbounded read loop.
const HARD_SCAN_CAP: usize = 1 << 20;

/// A possibly-truncated byte read.
#[derive(Debug, Clone)]
pub struct ReadBytes {
    /// The bytes actually read — shorter than requested iff `truncated`.
    pub data: Vec<u8>,
    /// `true` if the target's memory didn't extend as far as requested.
    pub truncated: bool,
}

/// A possibly-truncated string read (NUL-terminated scan).
#[derive(Debug, Clone)]
pub struct ReadString {
    /// Decoded text, with invalid UTF-8 replaced lossily.
    pub text: String,
    /// `true` if no terminating NUL was found within `max_len`.
    pub truncated: bool,
}

/// Observational access to a target process's address space.
pub trait MemoryReader {
    /// Read `len` bytes starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::MemoryReadError`] only when not even a single
    /// byte at `addr` is mappable; a short read past the end of a mapping
    /// returns `Ok` with `truncated: true`.
    fn read_bytes(&self, addr: u64, len: usize) -> Result<ReadBytes, TraceError>;

    /// Read a NUL-terminated string starting at `addr`, scanning at most
    /// `max_len` bytes.
    fn read_cstring(&self, addr: u64, max_len: usize) -> Result<ReadString, TraceError>;

    /// Read `count` fixed-size records of `element_size` bytes each,
    /// starting at `addr`. Equivalent to `read_bytes(addr, element_size *
    /// count)`; kept as a distinct operation so struct renderers can express
    /// intent (e.g. an `iovec` array) without hand-computing byte lengths.
    fn read_array(&self, addr: u64, element_size: usize, count: usize) -> Result<ReadBytes, TraceError> {
        let total = element_size.saturating_mul(count);
        self.read_bytes(addr, total)
    }
}

/// A [`MemoryReader`] backed by a Mach task port (`mach_vm_read_overwrite`).
pub struct MachMemoryReader {
    task: mach_port_t,
}

impl MachMemoryReader {
    /// Wrap an already-acquired task port. The caller (the debugger session)
    /// owns the port's lifetime.
    #[must_use]
    pub fn new(task: mach_port_t) -> Self {
        Self { task }
    }

    /// Attempt a single `mach_vm_read_overwrite` of `len` bytes at `addr`
    /// into `out`, truncating `out` to however many bytes were actually
    /// copied back (the call reports this, but on Darwin it is effectively
    /// all-or-nothing per page range).
    fn try_read(&self, addr: u64, len: usize, out: &mut Vec<u8>) -> bool {
        out.clear();
        out.resize(len, 0);
        if len == 0 {
            return true;
        }
        let mut actual: mach_vm_size_t = 0;
        // SAFETY: `out` is a freshly-sized buffer of exactly `len` bytes
        // and outlives the call; `self.task` is a task port the session
        // holds a valid send right to for the duration of the session.
        let kr = unsafe {
            mach_vm_read_overwrite(
                self.task as vm_task_entry_t,
                addr as mach_vm_address_t,
                len as mach_vm_size_t,
                out.as_mut_ptr() as mach_vm_address_t,
                &mut actual,
            )
        };
        if kr != KERN_SUCCESS {
            return false;
        }
        out.truncate(actual as usize);
        true
    }

    /// Find the longest prefix of `[addr, addr+len)` that is actually
    /// readable, halving the requested length until a read succeeds or the
    /// remaining length reaches zero.
    fn read_best_effort(&self, addr: u64, len: usize) -> ReadBytes {
        let mut buf = Vec::new();
        if self.try_read(addr, len, &mut buf) && buf.len() == len {
            return ReadBytes {
                data: buf,
                truncated: false,
            };
        }

        let mut lo = 0usize;
        let mut hi = len;
        let mut best: Vec<u8> = Vec::new();
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if mid == 0 {
                break;
            }
            if self.try_read(addr, mid, &mut buf) {
                best = buf.clone();
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        ReadBytes {
            data: best,
            truncated: true,
        }
    }
}

impl MemoryReader for MachMemoryReader {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<ReadBytes, TraceError> {
        let result = self.read_best_effort(addr, len);
        if result.data.is_empty() && len > 0 {
            return Err(TraceError::MemoryReadError {
                address: addr,
                detail: "address not mapped in target".to_string(),
            });
        }
        Ok(result)
    }

    fn read_cstring(&self, addr: u64, max_len: usize) -> Result<ReadString, TraceError> {
        let scan_len = max_len.min(HARD_SCAN_CAP);
        let chunk = self.read_bytes(addr, scan_len)?;
        match chunk.data.iter().position(|&b| b == 0) {
            Some(nul) => Ok(ReadString {
                text: String::from_utf8_lossy(&chunk.data[..nul]).into_owned(),
                truncated: false,
            }),
            None => Ok(ReadString {
                text: String::from_utf8_lossy(&chunk.data).into_owned(),
                truncated: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An in-process fake over a `Vec<u8>` arena, used to exercise the
    /// truncation/NUL-scan logic without a real target process.
    struct FakeMemory {
        arena: Vec<u8>,
    }

    impl MemoryReader for FakeMemory {
        fn read_bytes(&self, addr: u64, len: usize) -> Result<ReadBytes, TraceError> {
            let addr = addr as usize;
            if addr >= self.arena.len() {
                return Err(TraceError::MemoryReadError {
                    address: addr as u64,
                    detail: "out of range".into(),
                });
            }
            let end = (addr + len).min(self.arena.len());
            Ok(ReadBytes {
                data: self.arena[addr..end].to_vec(),
                truncated: end - addr < len,
            })
        }

        fn read_cstring(&self, addr: u64, max_len: usize) -> Result<ReadString, TraceError> {
            let chunk = self.read_bytes(addr, max_len)?;
            match chunk.data.iter().position(|&b| b == 0) {
                Some(nul) => Ok(ReadString {
                    text: String::from_utf8_lossy(&chunk.data[..nul]).into_owned(),
                    truncated: false,
                }),
                None => Ok(ReadString {
                    text: String::from_utf8_lossy(&chunk.data).into_owned(),
                    truncated: true,
                }),
            }
        }
    }

    #[test]
    fn cstring_within_limit_not_truncated() {
        let mem = FakeMemory {
            arena: b"/etc/hostname\0garbage".to_vec(),
        };
        let s = mem.read_cstring(0, 32).unwrap();
        assert_eq!(s.text, "/etc/hostname");
        assert!(!s.truncated);
    }

    #[test]
    fn cstring_missing_nul_is_truncated() {
        let mem = FakeMemory {
            arena: b"no-terminator-here".to_vec(),
        };
        let s = mem.read_cstring(0, 8).unwrap();
        assert_eq!(s.text, "no-term ".trim());
        assert!(s.truncated);
    }

    #[test]
    fn read_past_end_is_truncated_not_error() {
        let mem = FakeMemory {
            arena: vec![1, 2, 3],
        };
        let r = mem.read_bytes(0, 10).unwrap();
        assert_eq!(r.data, vec![1, 2, 3]);
        assert!(r.truncated);
    }

    #[test]
    fn read_entirely_out_of_range_errors() {
        let mem = FakeMemory { arena: vec![1, 2] };
        assert!(mem.read_bytes(100, 4).is_err());
    }
}
