//! Diagnostic logging, kept strictly separate from the trace event stream.
//!
//! Everything in this module writes to stderr; the event pipeline owns
//! stdout exclusively (spec §5), so nothing here may ever contend with it.
//! Three levels, controlled by `-q`/`-v`:
//! - **Quiet** (`-q`): fatal errors only
//! - **Default** (no flag): fatal errors + session lifecycle notices
//! - **Verbose** (`-v`): everything — breakpoint installs, pairing detail, timings

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// Diagnostic output verbosity level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet = 0,
    Default = 1,
    Verbose = 2,
}

/// Global verbosity level, set once at startup from parsed CLI flags.
static VERBOSITY: AtomicU8 = AtomicU8::new(1); // Default

/// Initialize the verbosity level for the current process.
pub fn init(quiet: bool, verbose: bool) {
    let level = if quiet {
        Verbosity::Quiet
    } else if verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Default
    };
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Returns the current verbosity level.
pub fn verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Default,
    }
}

/// Returns `true` if verbose mode is active.
pub fn is_verbose() -> bool {
    verbosity() == Verbosity::Verbose
}

/// Returns `true` if quiet mode is active.
pub fn is_quiet() -> bool {
    verbosity() == Verbosity::Quiet
}

/// Print a message only when verbose mode is enabled. Usage mirrors
/// `eprintln!`.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::diag::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// Print a message at default verbosity and above (suppressed in quiet
/// mode). Usage mirrors `eprintln!`.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if !$crate::diag::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Write a single-line fatal diagnostic: program name, error kind, message.
/// This is the only sanctioned way to report a fatal [`crate::error::TraceError`]
/// (spec §7: "a single line to stderr beginning with the program name, the
/// error kind, and a human-readable message").
pub fn fatal(program: &str, err: &crate::error::TraceError) {
    eprintln!("{program}: {}: {err}", err.kind_name());
}

/// RAII timer that prints elapsed duration on drop when verbose mode is
/// active.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Begin timing a labeled operation.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if is_verbose() {
            let elapsed = self.start.elapsed();
            eprintln!("  {}: {:.1?}", self.label, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_quiet_sets_quiet_level() {
        init(true, false);
        assert!(is_quiet());
        assert!(!is_verbose());
        init(false, false); // reset for other tests sharing this process
    }

    #[test]
    fn init_verbose_sets_verbose_level() {
        init(false, true);
        assert!(is_verbose());
        init(false, false);
    }

    #[test]
    fn default_is_neither_quiet_nor_verbose() {
        init(false, false);
        assert!(!is_quiet());
        assert!(!is_verbose());
    }
}
