//! Concrete flag bit-tables for scalar arguments: `open(2)`'s `O_*`,
//! `mmap(2)`'s `PROT_*`/`MAP_*`, and `sendmsg(2)`/`recvmsg(2)`'s `MSG_*`.
//!
//! Each table feeds [`super::render_flag_set`] through a thin wrapper
//! function, because [`super::Decoder::Scalar`] holds a bare `fn` pointer —
//! a closure capturing a `&'static [(u64, &str)]` table wouldn't coerce to
//! one, so every flag set gets its own named entry point instead.

use super::render_flag_set;

const OPEN_FLAGS: &[(u64, &str)] = &[
    (libc::O_WRONLY as u64, "O_WRONLY"),
    (libc::O_RDWR as u64, "O_RDWR"),
    (libc::O_NONBLOCK as u64, "O_NONBLOCK"),
    (libc::O_APPEND as u64, "O_APPEND"),
    (libc::O_CREAT as u64, "O_CREAT"),
    (libc::O_TRUNC as u64, "O_TRUNC"),
    (libc::O_EXCL as u64, "O_EXCL"),
    (libc::O_SHLOCK as u64, "O_SHLOCK"),
    (libc::O_EXLOCK as u64, "O_EXLOCK"),
    (libc::O_NOFOLLOW as u64, "O_NOFOLLOW"),
    (libc::O_SYMLINK as u64, "O_SYMLINK"),
    (libc::O_DIRECTORY as u64, "O_DIRECTORY"),
    (libc::O_CLOEXEC as u64, "O_CLOEXEC"),
];

/// Render `open(2)`/`openat(2)`'s flags word. `O_RDONLY` is `0`, which has
/// no bit of its own, so it is the dedicated zero symbol.
#[must_use]
pub fn open_flags(value: u64) -> String {
    render_flag_set(value, OPEN_FLAGS, Some("O_RDONLY"))
}

const PROT_FLAGS: &[(u64, &str)] = &[
    (libc::PROT_READ as u64, "PROT_READ"),
    (libc::PROT_WRITE as u64, "PROT_WRITE"),
    (libc::PROT_EXEC as u64, "PROT_EXEC"),
];

/// Render `mmap(2)`/`mprotect(2)`'s protection word. `PROT_NONE` is `0`.
#[must_use]
pub fn mmap_prot(value: u64) -> String {
    render_flag_set(value, PROT_FLAGS, Some("PROT_NONE"))
}

const MAP_FLAGS: &[(u64, &str)] = &[
    (libc::MAP_SHARED as u64, "MAP_SHARED"),
    (libc::MAP_PRIVATE as u64, "MAP_PRIVATE"),
    (libc::MAP_FIXED as u64, "MAP_FIXED"),
    (libc::MAP_ANON as u64, "MAP_ANON"),
];

/// Render `mmap(2)`'s sharing/placement flags.
#[must_use]
pub fn mmap_flags(value: u64) -> String {
    render_flag_set(value, MAP_FLAGS, None)
}

const MSG_FLAGS: &[(u64, &str)] = &[
    (libc::MSG_OOB as u64, "MSG_OOB"),
    (libc::MSG_PEEK as u64, "MSG_PEEK"),
    (libc::MSG_DONTROUTE as u64, "MSG_DONTROUTE"),
    (libc::MSG_WAITALL as u64, "MSG_WAITALL"),
    (libc::MSG_DONTWAIT as u64, "MSG_DONTWAIT"),
    (libc::MSG_EOR as u64, "MSG_EOR"),
    (libc::MSG_TRUNC as u64, "MSG_TRUNC"),
    (libc::MSG_CTRUNC as u64, "MSG_CTRUNC"),
];

/// Render `send*(2)`/`recv*(2)`'s flags word.
#[must_use]
pub fn msg_flags(value: u64) -> String {
    render_flag_set(value, MSG_FLAGS, Some("0"))
}

const ACCESS_FLAGS: &[(u64, &str)] = &[
    (libc::R_OK as u64, "R_OK"),
    (libc::W_OK as u64, "W_OK"),
    (libc::X_OK as u64, "X_OK"),
];

/// Render `access(2)`'s mode word. `F_OK` is `0`.
#[must_use]
pub fn access_mode(value: u64) -> String {
    render_flag_set(value, ACCESS_FLAGS, Some("F_OK"))
}

const FD_FLAGS: &[(u64, &str)] = &[(libc::FD_CLOEXEC as u64, "FD_CLOEXEC")];

/// Render `fcntl(2)` `F_GETFD`/`F_SETFD`'s descriptor-flags word.
#[must_use]
pub fn fd_flags(value: u64) -> String {
    render_flag_set(value, FD_FLAGS, Some("0"))
}

/// Render an octal file-mode word (`open(2)`'s third argument, `chmod(2)`'s
/// mode, `stat`'s `st_mode` permission bits) the way `strace` does: bare
/// octal digits, no `0o` prefix.
#[must_use]
pub fn octal_mode(value: u64) -> String {
    format!("0{:o}", value & 0o7777)
}

/// `stat`'s `st_mode` file-type nibble, rendered as the symbol `strace`
/// uses in its `S_IFREG`-style annotations.
#[must_use]
pub fn file_type_symbol(mode: u64) -> &'static str {
    match (mode as u32) & libc::S_IFMT {
        libc::S_IFREG => "S_IFREG",
        libc::S_IFDIR => "S_IFDIR",
        libc::S_IFLNK => "S_IFLNK",
        libc::S_IFCHR => "S_IFCHR",
        libc::S_IFBLK => "S_IFBLK",
        libc::S_IFIFO => "S_IFIFO",
        libc::S_IFSOCK => "S_IFSOCK",
        _ => "S_IFUNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rdonly_is_zero_symbol() {
        assert_eq!(open_flags(0), "O_RDONLY");
    }

    #[test]
    fn open_creat_wronly_combine() {
        let v = (libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC) as u64;
        assert_eq!(open_flags(v), "O_WRONLY|O_CREAT|O_TRUNC");
    }

    #[test]
    fn prot_none_is_zero_symbol() {
        assert_eq!(mmap_prot(0), "PROT_NONE");
    }

    #[test]
    fn prot_read_write() {
        let v = (libc::PROT_READ | libc::PROT_WRITE) as u64;
        assert_eq!(mmap_prot(v), "PROT_READ|PROT_WRITE");
    }

    #[test]
    fn octal_mode_renders_bare_digits() {
        assert_eq!(octal_mode(0o644), "0644");
    }

    #[test]
    fn file_type_symbol_regular_file() {
        assert_eq!(file_type_symbol(libc::S_IFREG as u64 | 0o644), "S_IFREG");
    }
}
