//! The Breakpoint Controller (spec §4.6): installs one entry breakpoint per
//! resolved syscall stub, and manages one-shot, thread-scoped exit
//! breakpoints.
//!
//! Patching is byte-level: save the original instruction(s) at an address,
//! overwrite with the architecture's trap opcode, and restore on removal.
//! This mirrors [`crate::memory::MachMemoryReader`]'s best-effort style but
//! adds the write half Mach read-only access doesn't need.

use std::cell::RefCell;
use std::collections::HashMap;

use mach2::kern_return::KERN_SUCCESS;
use mach2::mach_types::vm_task_entry_t;
use mach2::port::mach_port_t;
use mach2::vm::{mach_vm_protect, mach_vm_write};
use mach2::vm_prot::{VM_PROT_EXECUTE, VM_PROT_READ, VM_PROT_WRITE};
use mach2::vm_types::{mach_vm_address_t, mach_vm_size_t};

use crate::error::TraceError;
use crate::memory::MemoryReader;

/// ARM64 `BRK #0`, little-endian.
const ARM64_TRAP: [u8; 4] = [0x00, 0x00, 0x20, 0xd4];
/// x86-64 `INT3`.
const X86_64_TRAP: [u8; 1] = [0xcc];

/// The trap opcode to install for a given architecture, keyed the same way
/// [`crate::arch::Architecture`] is, to avoid a second dependency edge into
/// that module for what is really just two byte constants.
#[must_use]
pub fn trap_opcode(is_arm64: bool) -> &'static [u8] {
    if is_arm64 {
        &ARM64_TRAP
    } else {
        &X86_64_TRAP
    }
}

/// Writes into a target process's address space — strictly for installing
/// and removing breakpoint traps; nothing else in this tracer writes to the
/// target (spec §5: "the target's memory is read-only from the tracer's
/// perspective" outside this controller).
pub trait BreakpointWriter: MemoryReader {
    /// # Errors
    ///
    /// Returns [`TraceError::BreakpointInstallError`] if the write (or the
    /// protection change needed to allow it) fails.
    fn write_bytes(&self, addr: u64, data: &[u8]) -> Result<(), TraceError>;
}

/// A [`BreakpointWriter`] backed by a Mach task port.
///
/// Also keeps its own cache of the bytes each patched address held
/// immediately before the trap was written. [`BreakpointController`] keeps
/// the authoritative copy for restore-on-disarm, but that copy is private
/// to the session layer; the backend's step-over-breakpoint dance in
/// [`crate::backend::MachBackend::resume`] runs one layer below the
/// controller and needs the same bytes to temporarily restore the original
/// instruction, single-step it, and reinstall the trap.
pub struct MachBreakpointWriter {
    task: mach_port_t,
    reader: crate::memory::MachMemoryReader,
    patches: RefCell<HashMap<u64, Vec<u8>>>,
}

impl MachBreakpointWriter {
    #[must_use]
    pub fn new(task: mach_port_t) -> Self {
        Self {
            task,
            reader: crate::memory::MachMemoryReader::new(task),
            patches: RefCell::new(HashMap::new()),
        }
    }

    /// The bytes `addr` held the first time it was patched, if any.
    #[must_use]
    pub fn original_at(&self, addr: u64) -> Option<Vec<u8>> {
        self.patches.borrow().get(&addr).cloned()
    }

    /// Drop the cached original for `addr` once it is permanently restored
    /// (e.g. a one-shot exit breakpoint disarming for good).
    pub fn forget_patch(&self, addr: u64) {
        self.patches.borrow_mut().remove(&addr);
    }
}

impl MemoryReader for MachBreakpointWriter {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<crate::memory::ReadBytes, TraceError> {
        self.reader.read_bytes(addr, len)
    }

    fn read_cstring(&self, addr: u64, max_len: usize) -> Result<crate::memory::ReadString, TraceError> {
        self.reader.read_cstring(addr, max_len)
    }
}

impl BreakpointWriter for MachBreakpointWriter {
    fn write_bytes(&self, addr: u64, data: &[u8]) -> Result<(), TraceError> {
        if !self.patches.borrow().contains_key(&addr) {
            let original = self.reader.read_bytes(addr, data.len())?.data;
            self.patches.borrow_mut().insert(addr, original);
        }

        let address = addr as mach_vm_address_t;
        let size = data.len() as mach_vm_size_t;

        // SAFETY: `address`/`size` describe a range this controller already
        // read successfully (the original bytes being saved before the
        // first write); `self.task` is a live task port send right held for
        // the session's duration.
        let kr = unsafe { mach_vm_protect(self.task as vm_task_entry_t, address, size, 0, VM_PROT_READ | VM_PROT_WRITE | VM_PROT_EXECUTE) };
        if kr != KERN_SUCCESS {
            return Err(TraceError::BreakpointInstallError {
                address: addr,
                detail: format!("mach_vm_protect failed with kern_return {kr}"),
            });
        }

        // SAFETY: `data` is a valid, readable slice for the call's
        // duration; `address` was just made writable above.
        let kr = unsafe {
            mach_vm_write(
                self.task as vm_task_entry_t,
                address,
                data.as_ptr() as mach_vm_address_t,
                data.len() as u32,
            )
        };
        if kr != KERN_SUCCESS {
            return Err(TraceError::BreakpointInstallError {
                address: addr,
                detail: format!("mach_vm_write failed with kern_return {kr}"),
            });
        }

        let _ = unsafe { mach_vm_protect(self.task as vm_task_entry_t, address, size, 0, VM_PROT_READ | VM_PROT_EXECUTE) };
        Ok(())
    }
}

/// A patched location: the address and the bytes that were there before the
/// trap was written, needed to restore on removal.
struct Patch {
    address: u64,
    original: Vec<u8>,
}

/// Manages the set of entry breakpoints (one per resolved syscall stub) and
/// the set of live, thread-scoped exit breakpoints (spec §4.6).
pub struct BreakpointController {
    entries: HashMap<u64, Patch>,
    entry_numbers: HashMap<u64, u32>,
    exits: HashMap<u64, Patch>,
    trap: &'static [u8],
}

impl BreakpointController {
    #[must_use]
    pub fn new(is_arm64: bool) -> Self {
        Self {
            entries: HashMap::new(),
            entry_numbers: HashMap::new(),
            exits: HashMap::new(),
            trap: trap_opcode(is_arm64),
        }
    }

    /// Install an entry breakpoint at `address` — a resolved syscall stub's
    /// own entry point, stamped with `number` (spec §4.1/§4.6: the
    /// controller is handed an already-resolved address, symbol resolution
    /// itself is the debugger session's job since it owns the loaded-image
    /// list). The session calls this once per syscall it wants to observe,
    /// not once overall — each BSD syscall has its own independently
    /// generated stub, so there is no single shared trampoline to
    /// breakpoint once and see every syscall through.
    ///
    /// # Errors
    ///
    /// A failure here is logged by the caller and skips that one syscall;
    /// the session treats the whole install as fatal (spec §4.10) only if
    /// not a single entry breakpoint ends up installed.
    pub fn install_entry(&mut self, address: u64, number: u32, writer: &dyn BreakpointWriter) -> Result<(), TraceError> {
        if !self.entries.contains_key(&address) {
            let original = writer.read_bytes(address, self.trap.len())?.data;
            writer.write_bytes(address, self.trap)?;
            self.entries.insert(address, Patch { address, original });
        }
        self.entry_numbers.insert(address, number);
        Ok(())
    }

    /// `true` if `address` is one of the installed entry breakpoints.
    #[must_use]
    pub fn is_entry(&self, address: u64) -> bool {
        self.entries.contains_key(&address)
    }

    /// The syscall number stamped onto the entry breakpoint at `address`,
    /// if one is installed there. The session uses this to identify which
    /// syscall fired rather than trusting a register to still hold the
    /// number at function entry (spec §4.1: arm64's x16 in particular is
    /// not guaranteed to be loaded yet at the very first instruction of a
    /// stub).
    #[must_use]
    pub fn entry_syscall_number(&self, address: u64) -> Option<u32> {
        self.entry_numbers.get(&address).copied()
    }

    /// Number of entry breakpoints currently installed, across all
    /// resolved syscalls.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Arm a one-shot exit breakpoint for `tid` at `address`. If one is
    /// already armed for this thread (should not happen under a correct
    /// kernel — a thread can only be inside one syscall at a time — but
    /// handled defensively), it is replaced.
    ///
    /// # Errors
    ///
    /// Spec §4.10: a failure here degrades to emitting an unfinished event
    /// rather than aborting the whole session.
    pub fn arm_exit(&mut self, tid: u64, address: u64, writer: &dyn BreakpointWriter) -> Result<(), TraceError> {
        let original = writer.read_bytes(address, self.trap.len())?.data;
        writer.write_bytes(address, self.trap)?;
        self.exits.insert(tid, Patch { address, original });
        Ok(())
    }

    /// `true` if `address` is the currently-armed exit breakpoint for
    /// `tid`.
    #[must_use]
    pub fn is_exit(&self, tid: u64, address: u64) -> bool {
        self.exits.get(&tid).is_some_and(|p| p.address == address)
    }

    /// Remove and restore the exit breakpoint for `tid`, on normal fire.
    ///
    /// # Errors
    ///
    /// A restore failure is logged by the caller and does not prevent the
    /// event from being emitted — the trap byte would remain installed,
    /// which would re-fire (and be ignored, since no entry is pending) on
    /// the next instruction fetch through that address, but that address is
    /// never reached again once the syscall has returned on this thread.
    pub fn disarm_exit(&mut self, tid: u64, writer: &dyn BreakpointWriter) -> Result<(), TraceError> {
        if let Some(patch) = self.exits.remove(&tid) {
            writer.write_bytes(patch.address, &patch.original)?;
        }
        Ok(())
    }

    /// Sweep any exit breakpoint left armed for a thread that has just
    /// terminated without firing it (spec §4.1 edge case, §4.6: "the
    /// Controller sweeps the orphan on the next thread-exit event").
    pub fn sweep_orphan(&mut self, tid: u64, writer: &dyn BreakpointWriter) {
        if let Some(patch) = self.exits.remove(&tid) {
            let _ = writer.write_bytes(patch.address, &patch.original);
        }
    }

    /// Number of exit breakpoints currently armed, across all threads.
    #[must_use]
    pub fn armed_exit_count(&self) -> usize {
        self.exits.len()
    }
}
