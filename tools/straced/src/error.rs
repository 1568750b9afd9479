//! The closed set of error kinds the tracer can raise, and how each maps to
//! a process exit code (spec §6/§7).

use std::fmt;
use std::io;

/// A fatal or locally-recovered tracer error.
///
/// Every variant carries enough structured context (names, paths, pids) to
/// render a single self-contained diagnostic line — no variant needs a
/// caller-supplied prefix to be readable on its own.
#[derive(Debug)]
pub enum TraceError {
    /// Malformed or contradictory command-line input.
    UsageError { message: String },
    /// Failed to attach to an already-running process.
    AttachError { pid: i32, detail: String },
    /// Failed to spawn and attach to a new process.
    LaunchError { program: String, detail: String },
    /// A required syscall-trampoline symbol could not be resolved in the
    /// target's `libsystem_kernel.dylib`.
    SymbolResolutionError { symbol: String, image: String },
    /// The breakpoint controller could not install or remove a breakpoint.
    BreakpointInstallError { address: u64, detail: String },
    /// A memory read failed outright (see [`crate::memory::MemoryReader`]
    /// for when this is raised versus silently truncating).
    MemoryReadError { address: u64, detail: String },
    /// The debugger session could not make sense of, or act on, one stop
    /// event; the target's continued existence is not implied either way.
    DebuggerEventError { detail: String },
    /// Writing a trace record to the output sink failed.
    SinkIOError { detail: String },
    /// The user asked the tracer to stop (`SIGINT`/`SIGTERM`).
    Interrupted,
}

impl TraceError {
    /// The process exit code this error kind maps to when fatal (spec §6).
    ///
    /// Locally-recovered kinds (`MemoryReadError`, `DebuggerEventError` for
    /// a single stop) never reach this path in normal operation — it is
    /// used only when such an error escalates because the target is gone.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UsageError { .. } => 2,
            Self::SymbolResolutionError { .. } => 3,
            Self::Interrupted => 130,
            Self::AttachError { .. }
            | Self::LaunchError { .. }
            | Self::BreakpointInstallError { .. }
            | Self::MemoryReadError { .. }
            | Self::DebuggerEventError { .. }
            | Self::SinkIOError { .. } => 1,
        }
    }

    /// The short, stable name used as the error-kind tag in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UsageError { .. } => "UsageError",
            Self::AttachError { .. } => "AttachError",
            Self::LaunchError { .. } => "LaunchError",
            Self::SymbolResolutionError { .. } => "SymbolResolutionError",
            Self::BreakpointInstallError { .. } => "BreakpointInstallError",
            Self::MemoryReadError { .. } => "MemoryReadError",
            Self::DebuggerEventError { .. } => "DebuggerEventError",
            Self::SinkIOError { .. } => "SinkIOError",
            Self::Interrupted => "Interrupted",
        }
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsageError { message } => write!(f, "usage error: {message}"),
            Self::AttachError { pid, detail } => {
                write!(f, "failed to attach to pid {pid}: {detail}")
            }
            Self::LaunchError { program, detail } => {
                write!(f, "failed to launch {program}: {detail}")
            }
            Self::SymbolResolutionError { symbol, image } => {
                write!(f, "could not resolve symbol {symbol} in {image}")
            }
            Self::BreakpointInstallError { address, detail } => {
                write!(f, "could not install breakpoint at {address:#x}: {detail}")
            }
            Self::MemoryReadError { address, detail } => {
                write!(f, "memory read at {address:#x} failed: {detail}")
            }
            Self::DebuggerEventError { detail } => {
                write!(f, "debugger event error: {detail}")
            }
            Self::SinkIOError { detail } => write!(f, "trace output error: {detail}"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for TraceError {}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        Self::SinkIOError {
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_maps_to_exit_code_two() {
        let e = TraceError::UsageError {
            message: "missing target".into(),
        };
        assert_eq!(e.exit_code(), 2);
    }

    #[test]
    fn symbol_resolution_error_maps_to_exit_code_three() {
        let e = TraceError::SymbolResolutionError {
            symbol: "_read".into(),
            image: "libsystem_kernel.dylib".into(),
        };
        assert_eq!(e.exit_code(), 3);
    }

    #[test]
    fn interrupted_maps_to_130() {
        assert_eq!(TraceError::Interrupted.exit_code(), 130);
    }

    #[test]
    fn session_setup_errors_map_to_one() {
        assert_eq!(
            TraceError::AttachError {
                pid: 42,
                detail: "not entitled".into()
            }
            .exit_code(),
            1
        );
        assert_eq!(
            TraceError::SinkIOError {
                detail: "broken pipe".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn display_includes_kind_relevant_context() {
        let e = TraceError::BreakpointInstallError {
            address: 0x1000,
            detail: "page protected".into(),
        };
        let s = e.to_string();
        assert!(s.contains("0x1000"));
        assert!(s.contains("page protected"));
    }
}
