//! `sockaddr` family dispatch (spec §4.4): `AF_UNIX` renders the socket
//! path, `AF_INET`/`AF_INET6` render address literals and port, anything
//! else renders as a length-prefixed hex dump.

use crate::memory::MemoryReader;
use std::net::{Ipv4Addr, Ipv6Addr};

fn be_u16(b: &[u8], off: usize) -> u16 {
    if off + 2 > b.len() {
        return 0;
    }
    u16::from_be_bytes([b[off], b[off + 1]])
}

/// Render a `sockaddr*` at `addr`, given its declared length (`socklen_t`
/// from the call site — the third argument of `bind`/`connect`, or the
/// in/out length word of `accept`/`getsockname`/`recvfrom`).
#[must_use]
pub fn render_sockaddr(addr: u64, memory: &dyn MemoryReader, len: usize) -> String {
    if addr == 0 {
        return "NULL".to_string();
    }
    let read = match memory.read_bytes(addr, len.max(16)) {
        Ok(r) => r,
        Err(_) => return format!("{addr:#x}=<unreadable>"),
    };
    let b = &read.data;
    if b.len() < 2 {
        return format!("{addr:#x}=<unreadable>");
    }
    // BSD sockaddr: sa_len (1 byte) then sa_family (1 byte).
    let family = b[1] as i32;
    match family {
        libc::AF_UNIX => render_unix(b),
        libc::AF_INET => render_inet(b),
        libc::AF_INET6 => render_inet6(b),
        _ => format!(
            "{{sa_family={}, sa_data=[{} bytes]}}",
            family,
            b.len().saturating_sub(2)
        ),
    }
}

fn render_unix(b: &[u8]) -> String {
    let path_bytes = &b[2..];
    let end = path_bytes.iter().position(|&c| c == 0).unwrap_or(path_bytes.len());
    let path = String::from_utf8_lossy(&path_bytes[..end]);
    format!("{{sa_family=AF_UNIX, sun_path=\"{path}\"}}")
}

fn render_inet(b: &[u8]) -> String {
    let port = be_u16(b, 2);
    let octets: [u8; 4] = if b.len() >= 8 {
        [b[4], b[5], b[6], b[7]]
    } else {
        [0; 4]
    };
    let ip = Ipv4Addr::from(octets);
    format!("{{sa_family=AF_INET, sin_port=htons({port}), sin_addr=inet_addr(\"{ip}\")}}")
}

fn render_inet6(b: &[u8]) -> String {
    let port = be_u16(b, 2);
    let mut octets = [0u8; 16];
    if b.len() >= 8 + 16 {
        octets.copy_from_slice(&b[8..8 + 16]);
    }
    let ip = Ipv6Addr::from(octets);
    let scope_id = if b.len() >= 28 {
        u32::from_le_bytes(b[24..28].try_into().unwrap())
    } else {
        0
    };
    format!(
        "{{sa_family=AF_INET6, sin6_port=htons({port}), sin6_addr=\"{ip}\", sin6_scope_id={scope_id}}}"
    )
}
