//! ARM64 (AArch64) register and calling-convention access.
//!
//! BSD syscall ABI on Apple Silicon: the syscall number is loaded into
//! `x16`, arguments occupy `x0`–`x5`, the result comes back in `x0`, and the
//! kernel signals failure via the carry flag (bit 29, `C`) in `CPSR` — not a
//! sentinel return value. The trampoline is entered with `bl`, so the
//! return address is already sitting in the link register (`x30`/`lr`) and
//! needs no memory access to recover.

use super::{Arch, RegisterState};
use crate::error::TraceError;
use crate::memory::MemoryReader;

/// Bit position of the carry flag in `CPSR`.
const CPSR_CARRY_BIT: u32 = 29;

pub struct Arm64Arch;

impl Arch for Arm64Arch {
    fn name(&self) -> &'static str {
        "arm64"
    }

    fn syscall_number(&self, regs: &RegisterState) -> u64 {
        regs.gpr[16]
    }

    fn arg(&self, i: usize, regs: &RegisterState) -> u64 {
        assert!(i < 6, "BSD syscalls take at most 6 arguments");
        regs.gpr[i]
    }

    fn return_value(&self, regs: &RegisterState) -> i64 {
        regs.gpr[0] as i64
    }

    fn error_indicator(&self, regs: &RegisterState) -> bool {
        regs.flags & (1 << CPSR_CARRY_BIT) != 0
    }

    fn return_address(
        &self,
        regs: &RegisterState,
        _memory: &dyn MemoryReader,
    ) -> Result<u64, TraceError> {
        Ok(regs.lr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_with(gpr: [u64; 32], flags: u64, lr: u64) -> RegisterState {
        RegisterState {
            gpr,
            pc: 0,
            sp: 0,
            lr,
            flags,
        }
    }

    #[test]
    fn syscall_number_comes_from_x16() {
        let mut gpr = [0u64; 32];
        gpr[16] = 5; // SYS_open
        let regs = regs_with(gpr, 0, 0);
        assert_eq!(Arm64Arch.syscall_number(&regs), 5);
    }

    #[test]
    fn args_come_from_x0_through_x5() {
        let mut gpr = [0u64; 32];
        for i in 0..6 {
            gpr[i] = (i as u64 + 1) * 10;
        }
        let regs = regs_with(gpr, 0, 0);
        for i in 0..6 {
            assert_eq!(Arm64Arch.arg(i, &regs), (i as u64 + 1) * 10);
        }
    }

    #[test]
    fn error_indicator_reads_carry_bit() {
        let clear = regs_with([0; 32], 0, 0);
        assert!(!Arm64Arch.error_indicator(&clear));

        let set = regs_with([0; 32], 1 << CPSR_CARRY_BIT, 0);
        assert!(Arm64Arch.error_indicator(&set));
    }

    #[test]
    fn return_address_is_link_register_no_memory_access() {
        struct PanicReader;
        impl MemoryReader for PanicReader {
            fn read_bytes(&self, _: u64, _: usize) -> Result<crate::memory::ReadBytes, TraceError> {
                panic!("arm64 return address must not touch memory");
            }
            fn read_cstring(&self, _: u64, _: usize) -> Result<crate::memory::ReadString, TraceError> {
                panic!("arm64 return address must not touch memory");
            }
        }
        let regs = regs_with([0; 32], 0, 0xdead_beef);
        assert_eq!(Arm64Arch.return_address(&regs, &PanicReader).unwrap(), 0xdead_beef);
    }
}
