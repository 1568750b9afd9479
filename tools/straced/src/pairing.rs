//! The per-thread Pairing State Machine (spec §4.7): holds an entry
//! snapshot until the matching exit-hit arrives, then assembles one
//! [`SyscallEvent`].
//!
//! States per thread are `Idle` and `Awaiting-Exit`; this module doesn't
//! name them as an enum because the state *is* membership in the table —
//! a thread with an entry present is `Awaiting-Exit`, absent is `Idle`.
//! The event loop (spec §5) is the only caller, so no synchronization is
//! needed (spec §5: "Pairing Table ... accessed exclusively from the
//! event-loop thread").

use std::collections::HashMap;
use std::time::{Instant, SystemTime};

use crate::arch::{Arch, RegisterState};
use crate::memory::MemoryReader;
use crate::registry::{Aux, SyscallSchema};
use crate::pipeline::{RenderedArg, SyscallEvent};

/// State captured when a thread hits the entry breakpoint (spec §3).
pub struct EntrySnapshot {
    pub number: u64,
    pub args: [u64; 6],
    pub start: SystemTime,
    start_instant: Instant,
    pub tid: u64,
    /// Argument index -> already-rendered string, for every parameter
    /// whose decoder is [`crate::decode::Decoder::PreCallMem`]. Computed
    /// eagerly at entry time because the kernel hasn't run yet — waiting
    /// until exit would read post-call memory for an `IN` parameter.
    pre_rendered: Vec<(usize, String)>,
}

/// What happened when an exit-hit (or thread death) resolved a pending
/// entry.
pub enum Resolution {
    /// Normal pairing: an event is ready to emit.
    Paired(Box<SyscallEvent>),
    /// The thread died (or was tie-broken away) before its matching exit
    /// fired; emitted only if the caller wants unfinished events visible
    /// (spec §4.7).
    Unfinished(Box<SyscallEvent>),
}

/// Per-thread entry→exit tracking (spec §3 Pairing Table, §4.7).
#[derive(Default)]
pub struct PairingTable {
    pending: HashMap<u64, EntrySnapshot>,
}

impl PairingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads currently awaiting an exit — used by tests and by
    /// `--verbose` diagnostics.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Record entry-hit on `tid`. Captures the raw argument registers and
    /// eagerly renders any pre-call memory-backed parameter.
    ///
    /// If a snapshot was already pending for this thread (spec §4.7 tie-
    /// break: "the later one wins and the earlier is emitted as
    /// unfinished" — this should never happen on a correct kernel, but
    /// must be handled), the stale snapshot is returned as an `Unfinished`
    /// resolution for the caller to emit before continuing.
    pub fn on_entry(
        &mut self,
        tid: u64,
        schema: &SyscallSchema,
        regs: &RegisterState,
        arch: &dyn Arch,
        memory: &dyn MemoryReader,
        now: SystemTime,
        now_instant: Instant,
    ) -> Option<Resolution> {
        let mut args = [0u64; 6];
        for (i, a) in args.iter_mut().enumerate() {
            *a = arch.arg(i, regs);
        }

        let mut pre_rendered = Vec::new();
        for (i, param) in schema.params.iter().enumerate() {
            if let crate::decode::Decoder::PreCallMem(_) = param.decoder {
                let limit = resolve_aux(param.aux, &args, 0);
                pre_rendered.push((i, param.decoder.render_mem(args[i], memory, limit)));
            }
        }

        let snapshot = EntrySnapshot {
            number: schema.number,
            args,
            start: now,
            start_instant: now_instant,
            tid,
            pre_rendered,
        };

        let stale = self.pending.insert(tid, snapshot);
        stale.map(|snap| Resolution::Unfinished(Box::new(unfinished_event(&snap))))
    }

    /// Record exit-hit on `tid`. Removes and consumes the pending
    /// snapshot, rendering post-call parameters now that the kernel has
    /// run, and assembles the finished event.
    ///
    /// Returns `None` if no entry was pending (an orphan exit — spec §4.1
    /// notes a thread that never returns must not leave a dangling exit
    /// breakpoint, but a stray exit-hit with nothing pending is handled
    /// defensively here too).
    #[allow(clippy::too_many_arguments)]
    pub fn on_exit(
        &mut self,
        tid: u64,
        schema: &SyscallSchema,
        arch: &dyn Arch,
        exit_regs: &RegisterState,
        memory: &dyn MemoryReader,
        now: SystemTime,
        now_instant: Instant,
    ) -> Option<Box<SyscallEvent>> {
        let snapshot = self.pending.remove(&tid)?;
        let retval = arch.return_value(exit_regs);
        let error = arch.error_indicator(exit_regs);

        let mut args = Vec::with_capacity(schema.params.len());
        for (i, param) in schema.params.iter().enumerate() {
            let rendered = match param.decoder {
                crate::decode::Decoder::PreCallMem(_) => snapshot
                    .pre_rendered
                    .iter()
                    .find(|(idx, _)| *idx == i)
                    .map(|(_, s)| s.clone())
                    .unwrap_or_else(|| "<unreadable>".to_string()),
                crate::decode::Decoder::PostCallMem(_) => {
                    let limit = resolve_aux(param.aux, &snapshot.args, retval);
                    param.decoder.render_mem(snapshot.args[i], memory, limit)
                }
                crate::decode::Decoder::Scalar(_) => param.decoder.render_scalar(snapshot.args[i]),
            };
            args.push(RenderedArg {
                name: param.name,
                value: rendered,
            });
        }

        let retval_decoded = schema.ret.render(retval, error);
        let duration = now_instant.saturating_duration_since(snapshot.start_instant);

        Some(Box::new(SyscallEvent {
            number: schema.number,
            name: schema.name.to_string(),
            category: schema.category,
            args,
            retval,
            retval_decoded,
            start: snapshot.start,
            end: now,
            duration,
            tid,
            error,
            unfinished: false,
        }))
    }

    /// A thread the debugger session reports as terminated. If it had a
    /// pending entry, discard it and return an unfinished event (spec
    /// §4.7: "the snapshot is discarded; a synthetic 'unfinished' event
    /// may be emitted for debugging").
    pub fn on_thread_death(&mut self, tid: u64) -> Option<Box<SyscallEvent>> {
        let snapshot = self.pending.remove(&tid)?;
        Some(Box::new(unfinished_event(&snapshot)))
    }
}

fn resolve_aux(aux: Aux, args: &[u64; 6], retval: i64) -> usize {
    match aux {
        Aux::None => crate::decode::string_limit(),
        Aux::Arg(i) => args.get(i).copied().unwrap_or(0) as usize,
        Aux::ReturnValue => {
            if retval > 0 {
                retval as usize
            } else {
                0
            }
        }
    }
}

fn unfinished_event(snapshot: &EntrySnapshot) -> SyscallEvent {
    SyscallEvent {
        number: snapshot.number,
        name: format!("syscall_{}", snapshot.number),
        category: crate::registry::Category::Misc,
        args: Vec::new(),
        retval: 0,
        retval_decoded: "<unfinished>".to_string(),
        start: snapshot.start,
        end: snapshot.start,
        duration: std::time::Duration::ZERO,
        tid: snapshot.tid,
        error: false,
        unfinished: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Arm64Arch;
    use crate::error::TraceError;
    use crate::memory::{ReadBytes, ReadString};
    use crate::registry::Registry;

    struct NullMemory;
    impl MemoryReader for NullMemory {
        fn read_bytes(&self, _addr: u64, _len: usize) -> Result<ReadBytes, TraceError> {
            Ok(ReadBytes {
                data: vec![],
                truncated: true,
            })
        }
        fn read_cstring(&self, _addr: u64, _max_len: usize) -> Result<ReadString, TraceError> {
            Ok(ReadString {
                text: String::new(),
                truncated: true,
            })
        }
    }

    fn regs_with_args(gpr_args: [u64; 6]) -> RegisterState {
        let mut gpr = [0u64; 32];
        gpr[..6].copy_from_slice(&gpr_args);
        RegisterState {
            gpr,
            pc: 0,
            sp: 0,
            lr: 0,
            flags: 0,
        }
    }

    #[test]
    fn entry_then_exit_produces_paired_event() {
        let registry = Registry::build();
        let schema = registry.lookup_by_name("getpid").unwrap();
        let arch = Arm64Arch;
        let memory = NullMemory;
        let mut table = PairingTable::new();

        let now = SystemTime::now();
        let instant = Instant::now();
        let stale = table.on_entry(1, schema, &regs_with_args([0; 6]), &arch, &memory, now, instant);
        assert!(stale.is_none());
        assert_eq!(table.pending_count(), 1);

        let exit_regs = regs_with_args([42, 0, 0, 0, 0, 0]);
        let event = table
            .on_exit(1, schema, &arch, &exit_regs, &memory, now, instant)
            .unwrap();
        assert_eq!(event.name, "getpid");
        assert!(!event.unfinished);
        assert_eq!(table.pending_count(), 0);
    }

    #[test]
    fn duplicate_entry_without_exit_emits_stale_as_unfinished() {
        let registry = Registry::build();
        let schema = registry.lookup_by_name("getpid").unwrap();
        let arch = Arm64Arch;
        let memory = NullMemory;
        let mut table = PairingTable::new();
        let now = SystemTime::now();
        let instant = Instant::now();

        table.on_entry(7, schema, &regs_with_args([0; 6]), &arch, &memory, now, instant);
        let resolution = table.on_entry(7, schema, &regs_with_args([0; 6]), &arch, &memory, now, instant);
        match resolution {
            Some(Resolution::Unfinished(event)) => assert!(event.unfinished),
            _ => panic!("expected an unfinished resolution for the stale entry"),
        }
    }

    #[test]
    fn exit_with_no_pending_entry_returns_none() {
        let registry = Registry::build();
        let schema = registry.lookup_by_name("getpid").unwrap();
        let arch = Arm64Arch;
        let memory = NullMemory;
        let mut table = PairingTable::new();
        let now = SystemTime::now();
        let instant = Instant::now();
        assert!(table
            .on_exit(99, schema, &arch, &regs_with_args([0; 6]), &memory, now, instant)
            .is_none());
    }

    #[test]
    fn thread_death_discards_pending_as_unfinished() {
        let registry = Registry::build();
        let schema = registry.lookup_by_name("read").unwrap();
        let arch = Arm64Arch;
        let memory = NullMemory;
        let mut table = PairingTable::new();
        let now = SystemTime::now();
        let instant = Instant::now();
        table.on_entry(3, schema, &regs_with_args([0; 6]), &arch, &memory, now, instant);
        let event = table.on_thread_death(3).unwrap();
        assert!(event.unfinished);
        assert_eq!(table.pending_count(), 0);
    }
}
