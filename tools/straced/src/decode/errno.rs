//! errno decoding: `-1 ENOENT (No such file or directory)`.

/// `(errno value, symbolic name, short description)`, in no particular
/// order — looked up by value, not position.
const ERRNO_TABLE: &[(i32, &str, &str)] = &[
    (libc::EPERM, "EPERM", "Operation not permitted"),
    (libc::ENOENT, "ENOENT", "No such file or directory"),
    (libc::ESRCH, "ESRCH", "No such process"),
    (libc::EINTR, "EINTR", "Interrupted system call"),
    (libc::EIO, "EIO", "Input/output error"),
    (libc::ENXIO, "ENXIO", "Device not configured"),
    (libc::E2BIG, "E2BIG", "Argument list too long"),
    (libc::ENOEXEC, "ENOEXEC", "Exec format error"),
    (libc::EBADF, "EBADF", "Bad file descriptor"),
    (libc::ECHILD, "ECHILD", "No child processes"),
    (libc::EDEADLK, "EDEADLK", "Resource deadlock avoided"),
    (libc::ENOMEM, "ENOMEM", "Cannot allocate memory"),
    (libc::EACCES, "EACCES", "Permission denied"),
    (libc::EFAULT, "EFAULT", "Bad address"),
    (libc::ENOTBLK, "ENOTBLK", "Block device required"),
    (libc::EBUSY, "EBUSY", "Resource busy"),
    (libc::EEXIST, "EEXIST", "File exists"),
    (libc::EXDEV, "EXDEV", "Cross-device link"),
    (libc::ENODEV, "ENODEV", "Operation not supported by device"),
    (libc::ENOTDIR, "ENOTDIR", "Not a directory"),
    (libc::EISDIR, "EISDIR", "Is a directory"),
    (libc::EINVAL, "EINVAL", "Invalid argument"),
    (libc::ENFILE, "ENFILE", "Too many open files in system"),
    (libc::EMFILE, "EMFILE", "Too many open files"),
    (libc::ENOTTY, "ENOTTY", "Inappropriate ioctl for device"),
    (libc::ETXTBSY, "ETXTBSY", "Text file busy"),
    (libc::EFBIG, "EFBIG", "File too large"),
    (libc::ENOSPC, "ENOSPC", "No space left on device"),
    (libc::ESPIPE, "ESPIPE", "Illegal seek"),
    (libc::EROFS, "EROFS", "Read-only file system"),
    (libc::EMLINK, "EMLINK", "Too many links"),
    (libc::EPIPE, "EPIPE", "Broken pipe"),
    (libc::EDOM, "EDOM", "Numerical argument out of domain"),
    (libc::ERANGE, "ERANGE", "Result too large"),
    (libc::EAGAIN, "EAGAIN", "Resource temporarily unavailable"),
    (libc::EINPROGRESS, "EINPROGRESS", "Operation now in progress"),
    (libc::EALREADY, "EALREADY", "Operation already in progress"),
    (libc::ENOTSOCK, "ENOTSOCK", "Socket operation on non-socket"),
    (libc::EDESTADDRREQ, "EDESTADDRREQ", "Destination address required"),
    (libc::EMSGSIZE, "EMSGSIZE", "Message too long"),
    (libc::EPROTOTYPE, "EPROTOTYPE", "Protocol wrong type for socket"),
    (libc::ENOPROTOOPT, "ENOPROTOOPT", "Protocol not available"),
    (libc::EPROTONOSUPPORT, "EPROTONOSUPPORT", "Protocol not supported"),
    (libc::EOPNOTSUPP, "EOPNOTSUPP", "Operation not supported"),
    (libc::EAFNOSUPPORT, "EAFNOSUPPORT", "Address family not supported by protocol family"),
    (libc::EADDRINUSE, "EADDRINUSE", "Address already in use"),
    (libc::EADDRNOTAVAIL, "EADDRNOTAVAIL", "Can't assign requested address"),
    (libc::ENETDOWN, "ENETDOWN", "Network is down"),
    (libc::ENETUNREACH, "ENETUNREACH", "Network is unreachable"),
    (libc::ECONNABORTED, "ECONNABORTED", "Software caused connection abort"),
    (libc::ECONNRESET, "ECONNRESET", "Connection reset by peer"),
    (libc::ENOBUFS, "ENOBUFS", "No buffer space available"),
    (libc::EISCONN, "EISCONN", "Socket is already connected"),
    (libc::ENOTCONN, "ENOTCONN", "Socket is not connected"),
    (libc::ETIMEDOUT, "ETIMEDOUT", "Operation timed out"),
    (libc::ECONNREFUSED, "ECONNREFUSED", "Connection refused"),
    (libc::ELOOP, "ELOOP", "Too many levels of symbolic links"),
    (libc::ENAMETOOLONG, "ENAMETOOLONG", "File name too long"),
    (libc::ENOTEMPTY, "ENOTEMPTY", "Directory not empty"),
    (libc::EUSERS, "EUSERS", "Too many users"),
    (libc::EDQUOT, "EDQUOT", "Disc quota exceeded"),
    (libc::ESTALE, "ESTALE", "Stale NFS file handle"),
    (libc::ENOLCK, "ENOLCK", "No locks available"),
    (libc::ENOSYS, "ENOSYS", "Function not implemented"),
    (libc::EOVERFLOW, "EOVERFLOW", "Value too large to be stored in data type"),
    (libc::ECANCELED, "ECANCELED", "Operation canceled"),
    (libc::EIDRM, "EIDRM", "Identifier removed"),
    (libc::ENOMSG, "ENOMSG", "No message of desired type"),
    (libc::ENOTSUP, "ENOTSUP", "Operation not supported"),
];

/// Render a return value that may be an error, per the errno decoder's
/// contract (spec §4.4): `-1 ENOENT (No such file or directory)` on error,
/// raw integer otherwise.
#[must_use]
pub fn render_return(retval: i64, is_error: bool) -> String {
    if !is_error {
        return retval.to_string();
    }
    let code = retval.unsigned_abs() as i32;
    match ERRNO_TABLE.iter().find(|(v, _, _)| *v == code) {
        Some((_, name, desc)) => format!("{retval} {name} ({desc})"),
        None => format!("{retval} E{code} (unknown error)"),
    }
}

/// Look up just the symbolic name for a raw errno value, independent of
/// sign convention — used by decoders that report errno out of band (e.g.
/// a struct field holding a stashed error code).
#[must_use]
pub fn name_for(code: i32) -> Option<&'static str> {
    ERRNO_TABLE
        .iter()
        .find(|(v, _, _)| *v == code)
        .map(|(_, name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_error() {
        assert_eq!(
            render_return(-libc::ENOENT as i64, true),
            "-2 ENOENT (No such file or directory)"
        );
    }

    #[test]
    fn renders_success_as_raw_integer() {
        assert_eq!(render_return(0, false), "0");
        assert_eq!(render_return(4, false), "4");
    }

    #[test]
    fn unknown_code_falls_back_without_panic() {
        let rendered = render_return(-9999, true);
        assert!(rendered.starts_with("-9999"));
    }
}
