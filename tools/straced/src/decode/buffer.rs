//! The buffer renderer (spec §4.4, §8 boundary behaviors): a quoted,
//! C-escaped preview of a byte range, capped at a configurable display
//! length with an ellipsis and the untruncated length when capped.

use crate::memory::MemoryReader;

/// Default display cap when a call site doesn't override it (`--string-limit`'s
/// default, spec §6).
pub const DEFAULT_STRING_LIMIT: usize = 32;

/// Render `len` bytes at `addr` as a quoted, C-escaped string, reading at
/// most `cap` bytes. A `len` exactly equal to `cap` is shown in full
/// without an ellipsis; `len > cap` is truncated with `"..."` and the
/// total length annotation (spec §8: "a string argument exactly at the
/// render cap is shown without ellipsis; at cap+1 it is truncated").
#[must_use]
pub fn render_buffer(addr: u64, memory: &dyn MemoryReader, len: usize, cap: usize) -> String {
    if addr == 0 {
        return "NULL".to_string();
    }
    let to_read = len.min(cap);
    let read = match memory.read_bytes(addr, to_read) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let escaped = escape_c(&read.data);
    if len > cap || read.truncated {
        format!("\"{escaped}\"... ({len} bytes)")
    } else {
        format!("\"{escaped}\"")
    }
}

/// [`render_buffer`] pinned to [`DEFAULT_STRING_LIMIT`], matching the
/// three-argument shape [`super::Decoder::PostCallMem`] expects. `limit` is
/// the actual byte count (typically a syscall's return value or a
/// companion length argument); the display cap is fixed.
#[must_use]
pub fn render_buffer_default(addr: u64, memory: &dyn MemoryReader, limit: usize) -> String {
    render_buffer(addr, memory, limit, super::string_limit())
}

/// Render a NUL-terminated string argument (paths, the first argument of
/// `execve`) — same quoting rules as [`render_buffer`], scanning up to
/// `max_len` for the terminator.
#[must_use]
pub fn render_cstring(addr: u64, memory: &dyn MemoryReader, max_len: usize) -> String {
    if addr == 0 {
        return "NULL".to_string();
    }
    match memory.read_cstring(addr, max_len) {
        Ok(s) => {
            let escaped = escape_c(s.text.as_bytes());
            if s.truncated {
                format!("\"{escaped}\"...")
            } else {
                format!("\"{escaped}\"")
            }
        }
        Err(_) => format!("{addr:#x}=<unreadable>"),
    }
}

/// C-style escaping for non-printable bytes: `\n`, `\t`, `\r`, `\\`, `\"`,
/// and `\xHH` for everything else outside printable ASCII.
fn escape_c(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraceError;
    use crate::memory::{ReadBytes, ReadString};

    struct FakeMemory(Vec<u8>);
    impl MemoryReader for FakeMemory {
        fn read_bytes(&self, addr: u64, len: usize) -> Result<ReadBytes, TraceError> {
            let addr = addr as usize;
            let end = (addr + len).min(self.0.len());
            Ok(ReadBytes {
                data: self.0.get(addr..end).unwrap_or_default().to_vec(),
                truncated: end < addr + len,
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
    fn exact_cap_not_truncated() {
        let mem = FakeMemory(b"01234567890".to_vec());
        assert_eq!(render_buffer(1, &mem, 10, 10), "\"1234567890\"");
    }

    #[test]
    fn over_cap_truncated_with_length() {
        let mem = FakeMemory(b"01234567890".to_vec());
        assert_eq!(render_buffer(1, &mem, 9, 8), "\"12345678\"... (9 bytes)");
    }

    #[test]
    fn non_printable_bytes_escape() {
        let mem = FakeMemory(vec![0xff, b'a', 0x01, b'\n', b'"']);
        assert_eq!(render_buffer(1, &mem, 4, 16), "\"a\\x01\\n\\\"\"");
    }

    #[test]
    fn null_pointer_renders_null() {
        let mem = FakeMemory(vec![]);
        assert_eq!(render_buffer(0, &mem, 4, 16), "NULL");
    }

    #[test]
    fn cstring_reads_up_to_nul() {
        let mem = FakeMemory(b"x/etc/hostname\0trailing".to_vec());
        assert_eq!(render_cstring(1, &mem, 32), "\"/etc/hostname\"");
    }
}
