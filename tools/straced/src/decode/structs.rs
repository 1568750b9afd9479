//! Struct renderers: a base address, a fixed field layout, one bounded
//! memory read, field-by-field rendering in source-declared order (spec
//! §4.4).
//!
//! Offsets below are macOS's 64-bit `stat`/`statfs`/`kevent`/`sigaction`
//! layouts (LP64, 8-byte-aligned). Each renderer does its own little-endian
//! field extraction the same way `machobj`'s segment/symtab parsers do —
//! this tool does not link against the C struct definitions (there's
//! nothing to link against; the bytes live in a different process's
//! address space), so the offsets are reproduced here deliberately rather
//! than pulled from `libc`.

use super::flags::{file_type_symbol, octal_mode};
use crate::memory::MemoryReader;

fn le_u32(b: &[u8], off: usize) -> u32 {
    if off + 4 > b.len() {
        return 0;
    }
    u32::from_le_bytes(b[off..off + 4].try_into().unwrap())
}

fn le_u64(b: &[u8], off: usize) -> u64 {
    if off + 8 > b.len() {
        return 0;
    }
    u64::from_le_bytes(b[off..off + 8].try_into().unwrap())
}

fn le_i64(b: &[u8], off: usize) -> i64 {
    le_u64(b, off) as i64
}

fn le_i32(b: &[u8], off: usize) -> i32 {
    le_u32(b, off) as i32
}

/// Render `struct stat` (macOS 64-bit layout, `sys/stat.h`).
///
/// Field order mirrors the struct's source declaration: device, inode,
/// mode, nlink, uid/gid, rdev, the three timespecs, size, blocks,
/// blksize, flags, gen.
#[must_use]
pub fn render_stat(addr: u64, memory: &dyn MemoryReader, _limit: usize) -> String {
    const STAT_SIZE: usize = 144;
    let read = match memory.read_bytes(addr, STAT_SIZE) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let b = &read.data;
    if b.len() < 24 {
        return format!("{addr:#x}=<unreadable>");
    }
    let dev = le_i32(b, 0);
    let mode = le_u32(b, 4) as u64 & 0xffff;
    let nlink = le_u32(b, 8);
    let ino = le_u64(b, 12);
    let uid = le_u32(b, 20);
    let gid = le_u32(b, 24);
    let rdev = le_i32(b, 28);
    let atime = le_i64(b, 32);
    let atime_ns = le_i64(b, 40);
    let mtime = le_i64(b, 48);
    let mtime_ns = le_i64(b, 56);
    let ctime = le_i64(b, 64);
    let ctime_ns = le_i64(b, 72);
    let size = le_i64(b, 96);
    let blocks = le_i64(b, 104);
    let blksize = le_i32(b, 112);

    let suffix = if read.truncated { " ...}" } else { "}" };
    format!(
        "{{st_dev={dev}, st_ino={ino}, st_mode={} ({}), st_nlink={nlink}, st_uid={uid}, \
         st_gid={gid}, st_rdev={rdev}, st_atime={atime}.{atime_ns:09}, \
         st_mtime={mtime}.{mtime_ns:09}, st_ctime={ctime}.{ctime_ns:09}, st_size={size}, \
         st_blocks={blocks}, st_blksize={blksize}{suffix}",
        octal_mode(mode),
        file_type_symbol(mode),
    )
}

/// Render an array of `struct iovec` (`{iov_base, iov_len}`, 16 bytes each
/// on LP64), dereferencing each `iov_base` for a short preview the way
/// `strace -v` would. `limit` is the vector count (`iovcnt`), resolved by
/// the caller from the companion argument.
#[must_use]
pub fn render_iovec_array(addr: u64, memory: &dyn MemoryReader, limit: usize) -> String {
    const IOVEC_SIZE: usize = 16;
    let count = limit.min(64); // strace-style display cap on vector length
    let read = match memory.read_array(addr, IOVEC_SIZE, count) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let mut parts = Vec::new();
    for chunk in read.data.chunks(IOVEC_SIZE) {
        if chunk.len() < IOVEC_SIZE {
            break;
        }
        let base = le_u64(chunk, 0);
        let len = le_u64(chunk, 8);
        let preview = super::buffer::render_buffer(base, memory, len as usize, 32);
        parts.push(format!("{{iov_base={preview}, iov_len={len}}}"));
    }
    let ellipsis = if count < limit { ", ..." } else { "" };
    format!("[{}{}]", parts.join(", "), ellipsis)
}

/// Render `struct msghdr` (`sendmsg`/`recvmsg`): name (peer address),
/// iovec array, and, when non-zero, the control buffer — recursively
/// rendering the first two per spec §4.4.
#[must_use]
pub fn render_msghdr(addr: u64, memory: &dyn MemoryReader, _limit: usize) -> String {
    const MSGHDR_SIZE: usize = 48;
    let read = match memory.read_bytes(addr, MSGHDR_SIZE) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let b = &read.data;
    if b.len() < MSGHDR_SIZE {
        return format!("{addr:#x}=<unreadable>");
    }
    let name = le_u64(b, 0);
    let namelen = le_u32(b, 8);
    let iov = le_u64(b, 16);
    let iovlen = le_u64(b, 24);
    let control = le_u64(b, 32);
    let controllen = le_u32(b, 40);
    let flags = le_i32(b, 44);

    let name_rendered = if name != 0 && namelen > 0 {
        super::sockaddr::render_sockaddr(name, memory, namelen as usize)
    } else {
        "NULL".to_string()
    };
    let iov_rendered = if iov != 0 {
        render_iovec_array(iov, memory, iovlen as usize)
    } else {
        "NULL".to_string()
    };
    let control_rendered = if control != 0 && controllen > 0 {
        super::buffer::render_buffer(control, memory, controllen as usize, 32)
    } else {
        "NULL".to_string()
    };
    format!(
        "{{msg_name={name_rendered}, msg_iov={iov_rendered}, msg_control={control_rendered}, \
         msg_flags={}}}",
        super::flags::msg_flags(flags as u64)
    )
}

/// Render `struct statfs` (macOS 64-bit layout): just the handful of
/// fields `strace`-equivalents commonly surface — type, block size, total
/// and free blocks, and the mounted-on path.
#[must_use]
pub fn render_statfs(addr: u64, memory: &dyn MemoryReader, _limit: usize) -> String {
    const STATFS_SIZE: usize = 2168;
    let read = memory.read_bytes(addr, STATFS_SIZE.min(64));
    let b = match &read {
        Ok(r) => &r.data,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let bsize = le_u32(b, 4);
    let iosize = le_i32(b, 8);
    let blocks = le_u64(b, 12);
    let bfree = le_u64(b, 20);
    let bavail = le_u64(b, 28);
    format!("{{f_bsize={bsize}, f_iosize={iosize}, f_blocks={blocks}, f_bfree={bfree}, f_bavail={bavail}}}")
}

/// Render `struct kevent64_s` (the `kevent64(2)` ABI): ident, filter,
/// flags, fflags, data, udata.
#[must_use]
pub fn render_kevent(addr: u64, memory: &dyn MemoryReader, _limit: usize) -> String {
    const KEVENT_SIZE: usize = 48;
    let read = match memory.read_bytes(addr, KEVENT_SIZE) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let b = &read.data;
    if b.len() < KEVENT_SIZE {
        return format!("{addr:#x}=<unreadable>");
    }
    let ident = le_u64(b, 0);
    let filter = le_i32(b, 8) as i16 as i64;
    let flags = le_u32(b, 10) as u64 >> 16; // flags packed alongside filter
    let fflags = le_u32(b, 12);
    let data = le_i64(b, 16);
    format!(
        "{{ident={ident}, filter={}, flags={}, fflags={fflags:#x}, data={data}}}",
        super::render_enum(filter, KEVENT_FILTERS, "EVFILT"),
        render_kevent_flags(flags)
    )
}

const KEVENT_FILTERS: &[(i64, &str)] = &[
    (-1, "EVFILT_READ"),
    (-2, "EVFILT_WRITE"),
    (-3, "EVFILT_AIO"),
    (-4, "EVFILT_VNODE"),
    (-5, "EVFILT_PROC"),
    (-6, "EVFILT_SIGNAL"),
    (-7, "EVFILT_TIMER"),
];

fn render_kevent_flags(flags: u64) -> String {
    const TABLE: &[(u64, &str)] = &[
        (0x0001, "EV_ADD"),
        (0x0002, "EV_DELETE"),
        (0x0004, "EV_ENABLE"),
        (0x0008, "EV_DISABLE"),
        (0x0010, "EV_ONESHOT"),
        (0x0020, "EV_CLEAR"),
    ];
    super::render_flag_set(flags, TABLE, Some("0"))
}

/// Render `struct sigaction`: handler address, mask, flags.
#[must_use]
pub fn render_sigaction(addr: u64, memory: &dyn MemoryReader, _limit: usize) -> String {
    const SIGACTION_SIZE: usize = 24;
    let read = match memory.read_bytes(addr, SIGACTION_SIZE) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let b = &read.data;
    if b.len() < SIGACTION_SIZE {
        return format!("{addr:#x}=<unreadable>");
    }
    let handler = le_u64(b, 0);
    let mask = le_u32(b, 8);
    let flags = le_i32(b, 12);
    format!("{{sa_handler={handler:#x}, sa_mask={mask:#x}, sa_flags={flags:#x}}}")
}

/// Render `struct rusage`'s user/system time pair (the fields every
/// `getrusage`/`wait4` caller actually looks at).
#[must_use]
pub fn render_rusage(addr: u64, memory: &dyn MemoryReader, _limit: usize) -> String {
    const RUSAGE_PREFIX: usize = 16;
    let read = match memory.read_bytes(addr, RUSAGE_PREFIX) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let b = &read.data;
    if b.len() < RUSAGE_PREFIX {
        return format!("{addr:#x}=<unreadable>");
    }
    let utime_sec = le_i64(b, 0);
    let stime_sec = le_i64(b, 8);
    format!("{{ru_utime={utime_sec}.000000, ru_stime={stime_sec}.000000, ...}}")
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
            if addr >= self.0.len() {
                return Err(TraceError::MemoryReadError {
                    address: addr as u64,
                    detail: "oor".into(),
                });
            }
            let end = (addr + len).min(self.0.len());
            Ok(ReadBytes {
                data: self.0[addr..end].to_vec(),
                truncated: end - addr < len,
            })
        }
        fn read_cstring(&self, _addr: u64, _max_len: usize) -> Result<ReadString, TraceError> {
            unreachable!()
        }
    }

    #[test]
    fn stat_renders_mode_as_octal_and_type() {
        let mut buf = vec![0u8; 144];
        buf[4..8].copy_from_slice(&(0o100644u32 | (libc::S_IFREG)).to_le_bytes());
        buf[96..104].copy_from_slice(&4096i64.to_le_bytes());
        let mem = FakeMemory(buf);
        let rendered = render_stat(0, &mem, 0);
        assert!(rendered.contains("0644"));
        assert!(rendered.contains("S_IFREG"));
        assert!(rendered.contains("st_size=4096"));
    }

    #[test]
    fn unreadable_struct_degrades_gracefully() {
        let mem = FakeMemory(vec![]);
        assert_eq!(render_stat(0, &mem, 0), "0x0=<unreadable>");
    }

    #[test]
    fn kevent_renders_known_filter() {
        let mut buf = vec![0u8; 48];
        buf[8..12].copy_from_slice(&(-1i32).to_le_bytes());
        let mem = FakeMemory(buf);
        assert!(render_kevent(0, &mem, 0).contains("EVFILT_READ"));
    }
}
