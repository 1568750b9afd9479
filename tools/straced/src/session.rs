//! The Debugger Session (spec §4.5): the state machine that drives launch or
//! attach, pumps the platform debugger event loop, and dispatches each stop
//! to the Breakpoint Controller, Pairing Table, and Event Pipeline.
//!
//! The raw Mach exception-port plumbing (`task_for_pid`, `mach_msg`,
//! `thread_get_state`) lives behind the [`DebuggerBackend`] trait so the
//! state machine and dispatch logic — the part with real branching to get
//! right — can be exercised with a scripted fake, the same way
//! [`crate::memory`] and [`crate::breakpoint`] are tested against in-process
//! fakes rather than a live target.

use std::time::{Instant, SystemTime};

use crate::arch::{Arch, RegisterState};
use crate::breakpoint::{BreakpointController, BreakpointWriter};
use crate::diag::{dprintln, vprintln};
use crate::error::TraceError;
use crate::filter::Filter;
use crate::pairing::{PairingTable, Resolution};
use crate::pipeline::Pipeline;
use crate::registry::Registry;

/// Lifecycle states (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Launched,
    Attached,
    Running,
    StoppedAtBreakpoint,
    Exited,
    Detached,
    Failed,
}

/// One event translated from the platform debugger's raw notification
/// (spec §4.5: "the session translates each event to one of {entry-hit,
/// exit-hit, signal, exit}").
pub enum DebugEvent {
    EntryHit { tid: u64, regs: RegisterState },
    ExitHit { tid: u64, regs: RegisterState },
    Signal { tid: u64, signal: i32 },
    ThreadExit { tid: u64 },
    TargetExited { code: i32 },
}

/// What drives the platform-specific half of the session: spawning or
/// attaching, waiting for the next stop, and resuming a thread.
pub trait DebuggerBackend {
    /// # Errors
    ///
    /// [`TraceError::LaunchError`] if spawning the target fails.
    fn launch(&mut self, program: &str, args: &[String]) -> Result<(), TraceError>;

    /// # Errors
    ///
    /// [`TraceError::AttachError`] if the target PID cannot be attached to
    /// (commonly a SIP-protected or not-same-uid process).
    fn attach(&mut self, pid: i32) -> Result<(), TraceError>;

    /// Resolve one syscall's entry breakpoint address by trying each
    /// candidate symbol name in turn against the target's loaded
    /// `libsystem_kernel.dylib`. Called once per syscall the session wants
    /// to observe (spec §4.1: every BSD syscall has its own stub, so there
    /// is no single shared trampoline to resolve once for all of them).
    ///
    /// # Errors
    ///
    /// [`TraceError::SymbolResolutionError`] if none of the candidates
    /// resolves.
    fn resolve_entry_symbol(&self, candidates: &[String]) -> Result<u64, TraceError>;

    /// Block until the next debugger notification and translate it.
    ///
    /// # Errors
    ///
    /// [`TraceError::DebuggerEventError`] for a notification the backend
    /// could not make sense of.
    fn wait_for_event(&mut self) -> Result<DebugEvent, TraceError>;

    /// Resume the named thread (or, for thread id 0, the whole task) after
    /// a stop has been handled.
    ///
    /// # Errors
    ///
    /// [`TraceError::DebuggerEventError`] if resuming fails.
    fn resume(&mut self, tid: u64) -> Result<(), TraceError>;

    /// A read/write view of the target's address space, for decoders and
    /// for the breakpoint controller's patches.
    fn memory(&self) -> &dyn BreakpointWriter;

    /// Detach from (launched: kill; attached: leave running) the target.
    fn shutdown(&mut self, detach_only: bool);
}

/// Wires every tracer-core component together and drives the event loop
/// (spec §4.5, §5).
pub struct DebuggerSession<B: DebuggerBackend> {
    backend: B,
    arch: Box<dyn Arch>,
    registry: Registry,
    filter: Filter,
    controller: BreakpointController,
    pairing: PairingTable,
    pipeline: Pipeline,
    state: SessionState,
    launched: bool,
    detach_on_exit: bool,
}

impl<B: DebuggerBackend> DebuggerSession<B> {
    #[must_use]
    pub fn new(
        backend: B,
        arch: Box<dyn Arch>,
        registry: Registry,
        filter: Filter,
        pipeline: Pipeline,
        detach_on_exit: bool,
    ) -> Self {
        let is_arm64 = arch.name() == "arm64";
        Self {
            backend,
            arch,
            registry,
            filter,
            controller: BreakpointController::new(is_arm64),
            pairing: PairingTable::new(),
            pipeline,
            state: SessionState::Created,
            launched: false,
            detach_on_exit,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Created → Launched (spec §4.5).
    ///
    /// # Errors
    ///
    /// Propagates [`DebuggerBackend::launch`]'s error; transitions to
    /// `Failed` first.
    pub fn launch(&mut self, program: &str, args: &[String]) -> Result<(), TraceError> {
        match self.backend.launch(program, args) {
            Ok(()) => {
                self.launched = true;
                self.state = SessionState::Launched;
                self.install_entry_breakpoints()
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Created → Attached (spec §4.5).
    ///
    /// # Errors
    ///
    /// Propagates [`DebuggerBackend::attach`]'s error; transitions to
    /// `Failed` first.
    pub fn attach(&mut self, pid: i32) -> Result<(), TraceError> {
        match self.backend.attach(pid) {
            Ok(()) => {
                self.state = SessionState::Attached;
                self.install_entry_breakpoints()
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Install one entry breakpoint per syscall in the Registry (spec §4.1,
    /// §4.6): each BSD syscall is its own independently generated stub in
    /// `libsystem_kernel.dylib`, so observing "every" syscall means
    /// resolving and breakpointing each one individually rather than a
    /// single shared trampoline. A syscall whose stub can't be resolved on
    /// this OS release is skipped, not fatal by itself — only ending up
    /// with zero installed breakpoints is (spec §4.10: no tracing is
    /// possible without at least one).
    fn install_entry_breakpoints(&mut self) -> Result<(), TraceError> {
        for schema in self.registry.iter() {
            let candidates = self.arch.entry_symbol_candidates(schema.name);
            match self.backend.resolve_entry_symbol(&candidates) {
                Ok(address) => {
                    if let Err(e) = self.controller.install_entry(address, schema.number, self.backend.memory()) {
                        dprintln!("entry breakpoint install failed for {} at {address:#x}: {e}", schema.name);
                    }
                }
                Err(e) => dprintln!("entry symbol resolution failed for {}: {e}", schema.name),
            }
        }

        if self.controller.entry_count() == 0 {
            self.state = SessionState::Failed;
            return Err(TraceError::SymbolResolutionError {
                symbol: "<every known syscall>".to_string(),
                image: "libsystem_kernel.dylib".to_string(),
            });
        }
        self.state = SessionState::Running;
        Ok(())
    }

    /// Run the event loop until the target exits or the session is
    /// interrupted (spec §4.5, §5). Returns the exit code to report (spec
    /// §6).
    ///
    /// # Errors
    ///
    /// A `SinkIOError` from the pipeline is fatal (spec §7); any other
    /// error surfaced this way means the backend itself failed
    /// catastrophically (the target process is gone and unrecoverable).
    pub fn run(&mut self) -> Result<i32, TraceError> {
        loop {
            let event = self.backend.wait_for_event()?;
            match event {
                DebugEvent::EntryHit { tid, regs } => self.handle_entry(tid, &regs)?,
                DebugEvent::ExitHit { tid, regs } => self.handle_exit(tid, &regs)?,
                DebugEvent::Signal { tid, signal } => self.handle_signal(tid, signal)?,
                DebugEvent::ThreadExit { tid } => self.handle_thread_exit(tid)?,
                DebugEvent::TargetExited { code } => {
                    self.state = SessionState::Exited;
                    self.pipeline.shutdown().map_err(|e| TraceError::SinkIOError { detail: e.to_string() })?;
                    return Ok(code);
                }
            }
        }
    }

    fn handle_entry(&mut self, tid: u64, regs: &RegisterState) -> Result<(), TraceError> {
        self.state = SessionState::StoppedAtBreakpoint;
        // The entry breakpoint's own address tells us which syscall this
        // is (spec §4.1) — more reliable than reading a register that may
        // not be populated yet at the very first instruction of a stub.
        // Falls back to the architecture's register read only for a stop
        // this controller doesn't recognize (should not happen in
        // practice; kept defensive).
        let number = self
            .controller
            .entry_syscall_number(regs.pc)
            .map(u64::from)
            .unwrap_or_else(|| self.arch.syscall_number(regs));
        let schema = self
            .registry
            .lookup(number as u32)
            .unwrap_or_else(|| unknown_schema(number));

        if !self.filter.accepts(schema) {
            self.state = SessionState::Running;
            return self.backend.resume(tid);
        }

        let now = SystemTime::now();
        let instant = Instant::now();
        let memory = self.backend.memory();
        let resolution = self
            .pairing
            .on_entry(tid, schema, regs, self.arch.as_ref(), memory, now, instant);
        if let Some(Resolution::Unfinished(event)) = resolution {
            self.pipeline.emit(&event).map_err(|e| TraceError::SinkIOError { detail: e.to_string() })?;
        }

        let return_address = self.arch.return_address(regs, memory)?;
        if let Err(e) = self.controller.arm_exit(tid, return_address, memory) {
            dprintln!("exit breakpoint arm failed for tid {tid}: {e}");
        }

        self.state = SessionState::Running;
        self.backend.resume(tid)
    }

    fn handle_exit(&mut self, tid: u64, regs: &RegisterState) -> Result<(), TraceError> {
        self.state = SessionState::StoppedAtBreakpoint;
        let memory = self.backend.memory();
        if let Err(e) = self.controller.disarm_exit(tid, memory) {
            dprintln!("exit breakpoint disarm failed for tid {tid}: {e}");
        }

        let number = self.arch.syscall_number(regs);
        let schema = self.registry.lookup(number as u32).unwrap_or_else(|| unknown_schema(number));
        let now = SystemTime::now();
        let instant = Instant::now();
        if let Some(event) = self.pairing.on_exit(tid, schema, self.arch.as_ref(), regs, memory, now, instant) {
            self.pipeline.emit(&event).map_err(|e| TraceError::SinkIOError { detail: e.to_string() })?;
        }

        self.state = SessionState::Running;
        self.backend.resume(tid)
    }

    fn handle_signal(&mut self, tid: u64, signal: i32) -> Result<(), TraceError> {
        if crate::decode::signal::is_attach_stop_signal(signal) {
            return self.backend.resume(tid);
        }
        vprintln!("thread {tid} received {}", crate::decode::signal::signal_name(signal as u64));
        self.backend.resume(tid)
    }

    fn handle_thread_exit(&mut self, tid: u64) -> Result<(), TraceError> {
        self.controller.sweep_orphan(tid, self.backend.memory());
        if let Some(event) = self.pairing.on_thread_death(tid) {
            self.pipeline.emit(&event).map_err(|e| TraceError::SinkIOError { detail: e.to_string() })?;
        }
        Ok(())
    }

    /// Cancellation (spec §5): stop the target if launched, leave it
    /// running if attached (unless `detach_on_exit`), flush the pipeline.
    pub fn shutdown_on_interrupt(&mut self) {
        self.backend.shutdown(!self.launched || self.detach_on_exit);
        self.state = if self.launched { SessionState::Exited } else { SessionState::Detached };
        let _ = self.pipeline.shutdown();
    }
}

/// Build the degenerate schema for a syscall number the Registry has no
/// entry for — `syscall_NNN(<raw regs>) = <raw ret>` (spec §4.3, §4.10).
/// A `'static` leak is acceptable here: unknown syscall numbers are rare and
/// bounded by the architecture's number space, so this never grows
/// unboundedly over a session's lifetime.
fn unknown_schema(number: u64) -> &'static crate::registry::SyscallSchema {
    use crate::registry::{Category, SyscallSchema};
    use crate::decode::ReturnDecoder;

    let name: &'static str = Box::leak(format!("syscall_{number}").into_boxed_str());
    Box::leak(Box::new(SyscallSchema {
        number: number as u32,
        name,
        category: Category::Misc,
        params: &[],
        ret: ReturnDecoder::Raw,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Arm64Arch;
    use crate::memory::{ReadBytes, ReadString};
    use crate::pipeline::Sink;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullMemory;
    impl crate::memory::MemoryReader for NullMemory {
        fn read_bytes(&self, _addr: u64, len: usize) -> Result<ReadBytes, TraceError> {
            Ok(ReadBytes { data: vec![0; len], truncated: false })
        }
        fn read_cstring(&self, _addr: u64, _max_len: usize) -> Result<ReadString, TraceError> {
            Ok(ReadString { text: String::new(), truncated: true })
        }
    }
    impl BreakpointWriter for NullMemory {
        fn write_bytes(&self, _addr: u64, _data: &[u8]) -> Result<(), TraceError> {
            Ok(())
        }
    }

    struct ScriptedBackend {
        events: Vec<DebugEvent>,
        memory: NullMemory,
        resumed: Vec<u64>,
    }

    impl DebuggerBackend for ScriptedBackend {
        fn launch(&mut self, _program: &str, _args: &[String]) -> Result<(), TraceError> {
            Ok(())
        }
        fn attach(&mut self, _pid: i32) -> Result<(), TraceError> {
            Ok(())
        }
        fn resolve_entry_symbol(&self, _candidates: &[String]) -> Result<u64, TraceError> {
            Ok(0x1000)
        }
        fn wait_for_event(&mut self) -> Result<DebugEvent, TraceError> {
            if self.events.is_empty() {
                return Ok(DebugEvent::TargetExited { code: 0 });
            }
            Ok(self.events.remove(0))
        }
        fn resume(&mut self, tid: u64) -> Result<(), TraceError> {
            self.resumed.push(tid);
            Ok(())
        }
        fn memory(&self) -> &dyn BreakpointWriter {
            &self.memory
        }
        fn shutdown(&mut self, _detach_only: bool) {}
    }

    struct RecordingSink {
        seen: Rc<RefCell<Vec<String>>>,
    }
    impl Sink for RecordingSink {
        fn on_event(&mut self, event: &crate::pipeline::SyscallEvent) -> std::io::Result<()> {
            self.seen.borrow_mut().push(event.name.clone());
            Ok(())
        }
    }

    fn regs_with_args(args: [u64; 6]) -> RegisterState {
        let mut gpr = [0u64; 32];
        gpr[..6].copy_from_slice(&args);
        RegisterState { gpr, pc: 0, sp: 0, lr: 0x2000, flags: 0 }
    }

    #[test]
    fn launch_then_run_pairs_entry_and_exit_into_one_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let pipeline = Pipeline::new(vec![Box::new(RecordingSink { seen: seen.clone() })]);
        let backend = ScriptedBackend {
            events: vec![
                DebugEvent::EntryHit { tid: 1, regs: regs_with_args([0; 6]) },
                DebugEvent::ExitHit { tid: 1, regs: regs_with_args([42, 0, 0, 0, 0, 0]) },
            ],
            memory: NullMemory,
            resumed: Vec::new(),
        };
        let mut session = DebuggerSession::new(
            backend,
            Box::new(Arm64Arch),
            Registry::build(),
            Filter::accept_all(),
            pipeline,
            false,
        );
        session.launch("/bin/true", &[]).unwrap();
        assert_eq!(session.state(), SessionState::Running);
        let code = session.run().unwrap();
        assert_eq!(code, 0);
        assert_eq!(*seen.borrow(), vec!["getpid".to_string()]);
    }

    #[test]
    fn filtered_syscall_resumes_without_emitting() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let pipeline = Pipeline::new(vec![Box::new(RecordingSink { seen: seen.clone() })]);
        let backend = ScriptedBackend {
            events: vec![DebugEvent::EntryHit { tid: 1, regs: regs_with_args([0; 6]) }],
            memory: NullMemory,
            resumed: Vec::new(),
        };
        let mut session = DebuggerSession::new(
            backend,
            Box::new(Arm64Arch),
            Registry::build(),
            Filter::parse("network").unwrap(),
            pipeline,
            false,
        );
        session.attach(123).unwrap();
        let _ = session.run().unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn attach_stop_signal_is_swallowed_not_forwarded() {
        let pipeline = Pipeline::new(vec![]);
        let backend = ScriptedBackend {
            events: vec![DebugEvent::Signal { tid: 1, signal: libc::SIGSTOP }],
            memory: NullMemory,
            resumed: Vec::new(),
        };
        let mut session = DebuggerSession::new(
            backend,
            Box::new(Arm64Arch),
            Registry::build(),
            Filter::accept_all(),
            pipeline,
            false,
        );
        session.attach(123).unwrap();
        let _ = session.run().unwrap();
        assert_eq!(session.backend.resumed, vec![1]);
    }

    #[test]
    fn thread_exit_with_pending_entry_emits_unfinished_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let pipeline = Pipeline::new(vec![Box::new(RecordingSink { seen: seen.clone() })]);
        let backend = ScriptedBackend {
            events: vec![
                DebugEvent::EntryHit { tid: 7, regs: regs_with_args([0; 6]) },
                DebugEvent::ThreadExit { tid: 7 },
            ],
            memory: NullMemory,
            resumed: Vec::new(),
        };
        let mut session = DebuggerSession::new(
            backend,
            Box::new(Arm64Arch),
            Registry::build(),
            Filter::accept_all(),
            pipeline,
            false,
        );
        session.launch("/bin/true", &[]).unwrap();
        let _ = session.run().unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }
}
