//! x86-64 register and calling-convention access.
//!
//! The syscall trampolines in `libsystem_kernel.dylib` are ordinary
//! `call`-able functions, not raw `syscall` instructions: they follow the
//! System V AMD64 C calling convention (`rdi`, `rsi`, `rdx`, `rcx`, `r8`,
//! `r9`), return in `rax`, and signal failure via the carry flag (bit 0) in
//! `RFLAGS`. Because entry is via `call`, the return address is pushed to
//! the stack rather than held in a register — recovering it means reading
//! one word from `[rsp]`.

use super::{Arch, RegisterState};
use crate::error::TraceError;
use crate::memory::MemoryReader;

/// Bit position of the carry flag in `RFLAGS`.
const RFLAGS_CARRY_BIT: u32 = 0;

/// Index into [`RegisterState::gpr`] for each C-ABI argument register, in
/// declaration order.
const ARG_REGS: [usize; 6] = [
    Arch64Gpr::Rdi as usize,
    Arch64Gpr::Rsi as usize,
    Arch64Gpr::Rdx as usize,
    Arch64Gpr::Rcx as usize,
    Arch64Gpr::R8 as usize,
    Arch64Gpr::R9 as usize,
];

/// Flat register indices this adapter expects the debugger session to have
/// used when filling [`RegisterState::gpr`] from `x86_thread_state64_t`.
#[repr(usize)]
enum Arch64Gpr {
    Rax = 0,
    Rdi = 1,
    Rsi = 2,
    Rdx = 3,
    Rcx = 4,
    R8 = 5,
    R9 = 6,
}

pub struct X8664Arch;

impl Arch for X8664Arch {
    fn name(&self) -> &'static str {
        "x86_64"
    }

    fn syscall_number(&self, regs: &RegisterState) -> u64 {
        // There is no x86-64 register carrying the BSD syscall number the
        // way arm64's x16 does; `rax` only holds it by coincidence of this
        // being the return-value register too. The session determines which
        // syscall this is from which per-syscall stub the entry breakpoint
        // fired at (see `entry_symbol_candidates`), not from this value —
        // this is retained as the exit-time fallback and for callers that
        // only have a raw register snapshot.
        regs.gpr[Arch64Gpr::Rax as usize]
    }

    fn arg(&self, i: usize, regs: &RegisterState) -> u64 {
        assert!(i < 6, "BSD syscalls take at most 6 arguments");
        regs.gpr[ARG_REGS[i]]
    }

    fn return_value(&self, regs: &RegisterState) -> i64 {
        regs.gpr[Arch64Gpr::Rax as usize] as i64
    }

    fn error_indicator(&self, regs: &RegisterState) -> bool {
        regs.flags & (1 << RFLAGS_CARRY_BIT) != 0
    }

    fn return_address(
        &self,
        regs: &RegisterState,
        memory: &dyn MemoryReader,
    ) -> Result<u64, TraceError> {
        let word = memory.read_bytes(regs.sp, 8)?;
        if word.data.len() < 8 {
            return Err(TraceError::MemoryReadError {
                address: regs.sp,
                detail: "stack pointer did not yield a full return address".to_string(),
            });
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&word.data[..8]);
        Ok(u64::from_le_bytes(raw))
    }
}
