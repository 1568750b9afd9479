//! Architecture-abstracted register and calling-convention access.
//!
//! Two variants exist — [`arm64`] and [`x86_64`] — each implementing
//! [`Arch`]. All architecture knowledge lives behind this trait; nothing
//! above it (registry, decoders, pairing) branches on the host CPU.

mod arm64;
mod x86_64;

use crate::error::TraceError;
use crate::memory::MemoryReader;

pub use arm64::Arm64Arch;
pub use x86_64::X8664Arch;

/// A snapshot of CPU register state captured at a debugger stop.
///
/// `gpr` is a flat, architecture-neutral register bank: the debugger
/// session fills it from the platform thread-state structure at stop time
/// using the layout each [`Arch`] impl expects (see the per-architecture
/// modules for the exact index mapping).
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterState {
    /// General-purpose registers, indexed per architecture.
    pub gpr: [u64; 32],
    /// Program counter / instruction pointer at the stop.
    pub pc: u64,
    /// Stack pointer at the stop.
    pub sp: u64,
    /// Link register (ARM64) or 0 (x86-64, which has none).
    pub lr: u64,
    /// Processor flags (`CPSR` on ARM64, `RFLAGS` on x86-64).
    pub flags: u64,
}

/// Capability set an architecture adapter must provide.
///
/// See spec §4.1. Implementations must be pure functions of the register
/// state passed in — no adapter may read target memory except inside
/// [`Arch::return_address`], which is the one operation that needs it (to
/// read the return address off the stack on x86-64).
pub trait Arch: Send + Sync {
    /// Short architecture name, used in diagnostics (`"arm64"`, `"x86_64"`).
    fn name(&self) -> &'static str;

    /// Decode the BSD syscall number from the register state.
    fn syscall_number(&self, regs: &RegisterState) -> u64;

    /// Decode argument `i` (0-indexed, `i < 6`) per the platform's syscall
    /// calling convention.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 6` — callers must only ask for declared parameters,
    /// and no BSD syscall takes more than six.
    fn arg(&self, i: usize, regs: &RegisterState) -> u64;

    /// Decode the raw (signed) return value.
    fn return_value(&self, regs: &RegisterState) -> i64;

    /// `true` if the kernel's error-indicator flag is set for this stop.
    fn error_indicator(&self, regs: &RegisterState) -> bool;

    /// Ordered candidate export names for `name`'s own BSD syscall stub in
    /// `libsystem_kernel.dylib`. Each BSD syscall has its own, independently
    /// generated wrapper — there is no single shared trampoline a tracer
    /// could breakpoint once and see every syscall through. The session
    /// resolves and breakpoints one of these candidates *per syscall* it
    /// wants to observe, and stamps the syscall number from which stub fired
    /// rather than trusting it to still be sitting in a register.
    ///
    /// Multiple candidates exist because the symbol name itself has varied
    /// across macOS releases — older release trains exported some BSD
    /// wrappers under a versioned alias (the historical `$UNIX2003` suffix
    /// convention, e.g. `_read$UNIX2003`) rather than the plain `_read`.
    /// Naming is identical on both architectures, so this has one default
    /// implementation rather than a per-architecture override.
    fn entry_symbol_candidates(&self, name: &str) -> Vec<String> {
        vec![format!("_{name}"), format!("_{name}$UNIX2003")]
    }

    /// Compute the address at which to arm the one-shot exit breakpoint for
    /// a thread that just hit entry with the given register state.
    ///
    /// On ARM64 this is the link register (no memory access needed). On
    /// x86-64 the trampoline is entered via `call`, so the return address
    /// sits at `[rsp]` and must be read from target memory.
    fn return_address(
        &self,
        regs: &RegisterState,
        memory: &dyn MemoryReader,
    ) -> Result<u64, TraceError>;
}

/// Host architecture the session should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    /// 64-bit ARM (Apple Silicon).
    Arm64,
    /// 64-bit x86 (Intel Macs, or Rosetta-translated processes — see
    /// [`Architecture::detect`]).
    X86_64,
}

impl Architecture {
    /// Detect the architecture this tracer binary itself was built for.
    ///
    /// A traced process always runs in the native CPU mode unless it is
    /// translated by Rosetta, which this tracer does not attempt to detect
    /// (spec §1 Non-goals: no cross-platform support beyond the two listed
    /// architectures).
    #[must_use]
    pub const fn detect() -> Self {
        #[cfg(target_arch = "aarch64")]
        {
            Self::Arm64
        }
        #[cfg(target_arch = "x86_64")]
        {
            Self::X86_64
        }
        #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
        {
            compile_error!("straced supports only arm64 and x86_64 macOS targets");
        }
    }

    /// Construct the adapter for this architecture.
    #[must_use]
    pub fn adapter(self) -> Box<dyn Arch> {
        match self {
            Self::Arm64 => Box::new(Arm64Arch),
            Self::X86_64 => Box::new(X8664Arch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_build_target() {
        let arch = Architecture::detect();
        let adapter = arch.adapter();
        #[cfg(target_arch = "aarch64")]
        assert_eq!(adapter.name(), "arm64");
        #[cfg(target_arch = "x86_64")]
        assert_eq!(adapter.name(), "x86_64");
    }
}
