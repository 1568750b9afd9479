//! The Event Pipeline (spec §4.9): the `SyscallEvent` record type, and the
//! `Sink` trait formatters and the summary aggregator implement to receive
//! a finished event.
//!
//! Events are delivered synchronously inside the debugger's event loop
//! (spec §5) — nothing here spawns a thread or buffers across stops; a
//! `Sink` that needs to batch output does so internally (see
//! [`crate::format::text::TextFormatter`]'s line buffering).

use std::time::{Duration, SystemTime};

use crate::registry::Category;

/// One rendered `(name, value)` pair in a [`SyscallEvent`]'s argument list,
/// in the syscall's declared parameter order (spec §3).
#[derive(Debug, Clone)]
pub struct RenderedArg {
    pub name: &'static str,
    pub value: String,
}

/// A fully decoded, paired syscall observation (spec §3).
#[derive(Debug, Clone)]
pub struct SyscallEvent {
    pub number: u64,
    pub name: String,
    pub category: Category,
    pub args: Vec<RenderedArg>,
    pub retval: i64,
    pub retval_decoded: String,
    pub start: SystemTime,
    pub end: SystemTime,
    pub duration: Duration,
    pub tid: u64,
    pub error: bool,
    /// Set when the pairing state machine could not observe a normal
    /// exit-hit for this syscall (thread death, tie-broken by a second
    /// entry-hit) — spec §4.7's "unfinished event".
    pub unfinished: bool,
}

impl SyscallEvent {
    /// Microsecond-resolution duration, as the JSON-Lines schema's
    /// `dur_us` field requires (spec §6).
    #[must_use]
    pub fn duration_us(&self) -> u64 {
        self.duration.as_micros().min(u128::from(u64::MAX)) as u64
    }
}

/// Something the pipeline can hand a finished [`SyscallEvent`] to: a
/// formatter writing to the configured output sink, or the summary
/// aggregator accumulating counters instead of emitting per-event output
/// (spec §4.9).
pub trait Sink {
    /// Handle one event. Implementations must not block on the traced
    /// process; blocking on the output sink itself is permitted (spec §5).
    ///
    /// # Errors
    ///
    /// Any I/O failure writing the event is fatal (spec §7: `SinkIOError`
    /// "because the trace stream has lost integrity").
    fn on_event(&mut self, event: &SyscallEvent) -> std::io::Result<()>;

    /// Called once when the session is shutting down, after the last
    /// event — used by the summary aggregator to render its table, and by
    /// formatters to flush any buffered output.
    fn on_shutdown(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Dispatches one finished event to every configured sink, in order,
/// stopping at the first I/O failure (spec §7: a `SinkIOError` is fatal).
pub struct Pipeline {
    sinks: Vec<Box<dyn Sink>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// # Errors
    ///
    /// Propagates the first sink's I/O error, per spec §7.
    pub fn emit(&mut self, event: &SyscallEvent) -> std::io::Result<()> {
        for sink in &mut self.sinks {
            sink.on_event(event)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates the first sink's I/O error during flush.
    pub fn shutdown(&mut self) -> std::io::Result<()> {
        for sink in &mut self.sinks {
            sink.on_shutdown()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingSink {
        seen: Rc<RefCell<Vec<u64>>>,
    }
    impl Sink for RecordingSink {
        fn on_event(&mut self, event: &SyscallEvent) -> std::io::Result<()> {
            self.seen.borrow_mut().push(event.number);
            Ok(())
        }
    }

    fn sample_event(number: u64) -> SyscallEvent {
        let now = SystemTime::now();
        SyscallEvent {
            number,
            name: "read".to_string(),
            category: Category::File,
            args: vec![],
            retval: 4,
            retval_decoded: "4".to_string(),
            start: now,
            end: now,
            duration: Duration::from_micros(10),
            tid: 1,
            error: false,
            unfinished: false,
        }
    }

    #[test]
    fn pipeline_fans_out_to_every_sink() {
        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new(vec![
            Box::new(RecordingSink { seen: seen_a.clone() }),
            Box::new(RecordingSink { seen: seen_b.clone() }),
        ]);
        pipeline.emit(&sample_event(3)).unwrap();
        assert_eq!(*seen_a.borrow(), vec![3]);
        assert_eq!(*seen_b.borrow(), vec![3]);
    }

    #[test]
    fn duration_us_converts_from_duration() {
        let mut e = sample_event(3);
        e.duration = Duration::from_millis(2);
        assert_eq!(e.duration_us(), 2000);
    }
}
