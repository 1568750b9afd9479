//! Signal number decoding, used by `kill(2)`'s second argument and by the
//! debugger session when reporting a forwarded signal-hit (spec §4.5).

use super::render_enum;

const SIGNALS: &[(i64, &str)] = &[
    (libc::SIGHUP as i64, "SIGHUP"),
    (libc::SIGINT as i64, "SIGINT"),
    (libc::SIGQUIT as i64, "SIGQUIT"),
    (libc::SIGILL as i64, "SIGILL"),
    (libc::SIGTRAP as i64, "SIGTRAP"),
    (libc::SIGABRT as i64, "SIGABRT"),
    (libc::SIGFPE as i64, "SIGFPE"),
    (libc::SIGKILL as i64, "SIGKILL"),
    (libc::SIGBUS as i64, "SIGBUS"),
    (libc::SIGSEGV as i64, "SIGSEGV"),
    (libc::SIGSYS as i64, "SIGSYS"),
    (libc::SIGPIPE as i64, "SIGPIPE"),
    (libc::SIGALRM as i64, "SIGALRM"),
    (libc::SIGTERM as i64, "SIGTERM"),
    (libc::SIGURG as i64, "SIGURG"),
    (libc::SIGSTOP as i64, "SIGSTOP"),
    (libc::SIGTSTP as i64, "SIGTSTP"),
    (libc::SIGCONT as i64, "SIGCONT"),
    (libc::SIGCHLD as i64, "SIGCHLD"),
    (libc::SIGTTIN as i64, "SIGTTIN"),
    (libc::SIGTTOU as i64, "SIGTTOU"),
    (libc::SIGWINCH as i64, "SIGWINCH"),
    (libc::SIGUSR1 as i64, "SIGUSR1"),
    (libc::SIGUSR2 as i64, "SIGUSR2"),
];

/// Render a signal number (`kill`'s second argument, a forwarded stop).
#[must_use]
pub fn signal_name(value: u64) -> String {
    render_enum(value as i64, SIGNALS, "SIG")
}

/// The synthetic stop-for-attach signal (`SIGTRAP` on a freshly-attached
/// or `PT_ATTACHEXC`-stopped thread) the session must swallow rather than
/// forward (spec §4.5: "if the signal is the synthetic 'stopped for
/// attach' signal, resume").
#[must_use]
pub fn is_attach_stop_signal(sig: i32) -> bool {
    sig == libc::SIGTRAP || sig == libc::SIGSTOP
}
