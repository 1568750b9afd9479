//! Symbolic decoders: pure functions turning raw register values or target
//! memory regions into human-readable strings (spec §4.4).
//!
//! The reference tracer this was distilled from dispatches decoders as
//! duck-typed callables picked per-argument at schema-construction time.
//! Here the dispatch surface is a closed, exhaustively-matched tagged union
//! (spec §9, "duck-typed decoder dispatch -> closed capability set") so a
//! missing match arm is a compile error rather than a runtime surprise.

pub mod buffer;
pub mod errno;
pub mod flags;
pub mod signal;
pub mod sockaddr;
pub mod structs;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::memory::MemoryReader;

/// The effective buffer/string render cap, set once at startup from
/// `--string-limit` (spec §6, default [`buffer::DEFAULT_STRING_LIMIT`]).
static STRING_LIMIT: AtomicUsize = AtomicUsize::new(buffer::DEFAULT_STRING_LIMIT);
/// Whether flag integers render as symbols (`true`) or raw hex (`false`,
/// `--no-abbrev`).
static ABBREVIATE: AtomicBool = AtomicBool::new(true);

/// Apply the resolved `--string-limit`/`--no-abbrev` knobs. Called once from
/// `main` before the session starts; every decoder call site reads these
/// through [`string_limit`]/[`abbreviate`] rather than taking them as
/// parameters, since they are fixed for the lifetime of one invocation.
pub fn configure(string_limit: usize, abbreviate: bool) {
    STRING_LIMIT.store(string_limit, Ordering::Relaxed);
    ABBREVIATE.store(abbreviate, Ordering::Relaxed);
}

#[must_use]
pub fn string_limit() -> usize {
    STRING_LIMIT.load(Ordering::Relaxed)
}

#[must_use]
pub fn abbreviate() -> bool {
    ABBREVIATE.load(Ordering::Relaxed)
}

/// How far into an argument's lifetime a decoder is willing to look, and
/// what it's allowed to look at.
///
/// The three variants are exactly the capability set spec §3 grants
/// Parameter Descriptors: `render-scalar`, `render-from-memory-pre-call`,
/// `render-from-memory-post-call`. Which variant a parameter carries
/// determines *when* [`crate::pairing::PairingTable`] invokes it, not just
/// how — pre-call decoders run while the snapshot is taken at entry-hit
/// (before the kernel has touched any out-parameters), post-call decoders
/// run once the matching exit-hit arrives.
#[derive(Clone, Copy)]
pub enum Decoder {
    /// No memory access; decode directly from the 64-bit register value.
    Scalar(fn(u64) -> String),
    /// Read memory as it stood at entry (paths, input buffers, the `IN`
    /// half of an `INOUT` struct).
    PreCallMem(fn(u64, &dyn MemoryReader, usize) -> String),
    /// Read memory as it stands after the syscall returns (filled-in
    /// `stat`, a returned peer address, bytes actually read).
    PostCallMem(fn(u64, &dyn MemoryReader, usize) -> String),
}

impl Decoder {
    /// Render a scalar-only argument. Panics if this decoder needs memory
    /// access — callers are expected to branch on the variant first (see
    /// `pairing::render_argument`).
    #[must_use]
    pub fn render_scalar(&self, value: u64) -> String {
        match self {
            Self::Scalar(f) => f(value),
            _ => format!("{value:#x}"),
        }
    }

    /// Render a memory-backed argument. `limit` is the byte/element cap
    /// this call site resolved (a fixed struct size, a companion-argument
    /// length, or the configured string-render cap).
    #[must_use]
    pub fn render_mem(&self, value: u64, memory: &dyn MemoryReader, limit: usize) -> String {
        match self {
            Self::PreCallMem(f) | Self::PostCallMem(f) => f(value, memory, limit),
            Self::Scalar(f) => f(value),
        }
    }
}

/// How the return value of a syscall is rendered, independent of argument
/// decoders (spec §3: "return descriptor (type string + decoder, typically
/// the errno decoder)").
#[derive(Clone, Copy)]
pub enum ReturnDecoder {
    /// `-1 ENOENT (No such file or directory)` on error, raw integer
    /// otherwise — the default for almost every BSD syscall.
    Errno,
    /// Always render as a raw signed integer, even on the architecture's
    /// error path (e.g. syscalls whose "negative" results are meaningful
    /// data, not an errno).
    Raw,
    /// Render a successful return as a symbolic flag-set (e.g. the events
    /// mask `kevent` reports); falls back to the errno decoder when the
    /// error indicator is set.
    Flags(fn(u64) -> String),
}

impl ReturnDecoder {
    #[must_use]
    pub fn render(&self, retval: i64, is_error: bool) -> String {
        match self {
            Self::Errno => errno::render_return(retval, is_error),
            Self::Raw => retval.to_string(),
            Self::Flags(f) => {
                if is_error {
                    errno::render_return(retval, is_error)
                } else {
                    f(retval as u64)
                }
            }
        }
    }
}

/// Render an ordered list of `(bitmask, symbol)` pairs as `SYM1|SYM2`, with
/// any bits not covered by the table folded into a trailing `0x…` residual
/// term, and an all-zero value rendered as the dedicated zero symbol if one
/// is given, else `"0"` (spec §4.4).
#[must_use]
pub fn render_flag_set(value: u64, table: &[(u64, &str)], zero_symbol: Option<&str>) -> String {
    if !abbreviate() {
        return format!("{value:#x}");
    }
    if value == 0 {
        return zero_symbol.unwrap_or("0").to_string();
    }
    let mut remaining = value;
    let mut symbols = Vec::new();
    for &(mask, name) in table {
        if mask != 0 && (remaining & mask) == mask {
            symbols.push(name.to_string());
            remaining &= !mask;
        }
    }
    if remaining != 0 {
        symbols.push(format!("{remaining:#x}"));
    }
    if symbols.is_empty() {
        "0".to_string()
    } else {
        symbols.join("|")
    }
}

/// Render a value against an enum table: exact symbol on a hit, else
/// `<prefix>_<decimal>` — never raw hex, so an unrecognized value still
/// reads (spec §4.4: "never to raw hex, to preserve readability").
#[must_use]
pub fn render_enum(value: i64, table: &[(i64, &str)], unknown_prefix: &str) -> String {
    match table.iter().find(|(v, _)| *v == value) {
        Some((_, name)) => (*name).to_string(),
        None => format!("{unknown_prefix}_{value}"),
    }
}
