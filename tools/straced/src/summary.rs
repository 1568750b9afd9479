//! The Summary Aggregator (spec §4.9, §2): running per-syscall counters,
//! rendered as a `strace -c`-style table at shutdown.

use std::collections::HashMap;
use std::time::Duration;

use crate::pipeline::{Sink, SyscallEvent};

/// Accumulated counters for one syscall name (spec §3 Summary Table).
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    calls: u64,
    errors: u64,
    elapsed: Duration,
}

/// A [`Sink`] that accumulates counters instead of emitting per-event
/// output, printing a table on [`Sink::on_shutdown`] (spec §6: `--summary`
/// "replace per-event output with a summary table at shutdown").
pub struct SummaryAggregator<W: std::io::Write> {
    counters: HashMap<String, Counters>,
    writer: W,
}

impl<W: std::io::Write> SummaryAggregator<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            counters: HashMap::new(),
            writer,
        }
    }

    /// Render the table body as a string (split out from
    /// [`Sink::on_shutdown`] so tests can assert on content without an
    /// actual writer).
    #[must_use]
    pub fn render_table(&self) -> String {
        let total: Duration = self.counters.values().map(|c| c.elapsed).sum();
        let total_us = total.as_micros().max(1);

        let mut rows: Vec<(&String, &Counters)> = self.counters.iter().collect();
        rows.sort_by(|a, b| b.1.elapsed.cmp(&a.1.elapsed));

        let mut out = String::new();
        out.push_str("% time     seconds  usecs/call     calls    errors syscall\n");
        out.push_str("------ ----------- ----------- --------- --------- ----------------\n");

        let mut total_calls = 0u64;
        let mut total_errors = 0u64;
        for (name, c) in &rows {
            let pct = (c.elapsed.as_micros() as f64 / total_us as f64) * 100.0;
            let secs = c.elapsed.as_secs_f64();
            let per_call = if c.calls > 0 {
                c.elapsed.as_micros() as u64 / c.calls
            } else {
                0
            };
            out.push_str(&format!(
                "{pct:6.2} {secs:11.6} {per_call:11} {calls:9} {errors:9} {name}\n",
                calls = c.calls,
                errors = c.errors,
            ));
            total_calls += c.calls;
            total_errors += c.errors;
        }
        out.push_str("------ ----------- ----------- --------- --------- ----------------\n");
        out.push_str(&format!(
            "100.00 {:11.6} {:11} {total_calls:9} {total_errors:9} total\n",
            total.as_secs_f64(),
            if total_calls > 0 {
                total.as_micros() as u64 / total_calls
            } else {
                0
            },
        ));
        out
    }
}

impl<W: std::io::Write> Sink for SummaryAggregator<W> {
    fn on_event(&mut self, event: &SyscallEvent) -> std::io::Result<()> {
        // Open Question (i), decided in DESIGN.md: rejected-by-filter
        // calls never reach the pipeline at all, so this accumulator
        // only ever sees accepted events — nothing to special-case here.
        if event.unfinished {
            return Ok(());
        }
        let entry = self.counters.entry(event.name.clone()).or_default();
        entry.calls += 1;
        if event.error {
            entry.errors += 1;
        }
        entry.elapsed += event.duration;
        Ok(())
    }

    fn on_shutdown(&mut self) -> std::io::Result<()> {
        write!(self.writer, "{}", self.render_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Category;
    use std::time::{Duration, SystemTime};

    fn event(name: &str, error: bool, micros: u64) -> SyscallEvent {
        let now = SystemTime::now();
        SyscallEvent {
            number: 0,
            name: name.to_string(),
            category: Category::File,
            args: vec![],
            retval: if error { -1 } else { 0 },
            retval_decoded: String::new(),
            start: now,
            end: now,
            duration: Duration::from_micros(micros),
            tid: 1,
            error,
            unfinished: false,
        }
    }

    #[test]
    fn counts_calls_and_errors_per_syscall() {
        let mut agg = SummaryAggregator::new(Vec::new());
        agg.on_event(&event("read", false, 10)).unwrap();
        agg.on_event(&event("read", true, 20)).unwrap();
        agg.on_event(&event("write", false, 5)).unwrap();
        let table = agg.render_table();
        assert!(table.contains("read"));
        assert!(table.contains("write"));
        assert!(table.contains("total"));
    }

    #[test]
    fn unfinished_events_are_not_counted() {
        let mut agg = SummaryAggregator::new(Vec::new());
        let mut e = event("read", false, 10);
        e.unfinished = true;
        agg.on_event(&e).unwrap();
        assert!(agg.counters.is_empty());
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let mut agg = SummaryAggregator::new(Vec::new());
        agg.on_event(&event("read", false, 30)).unwrap();
        agg.on_event(&event("write", false, 70)).unwrap();
        let table = agg.render_table();
        // both rows plus the total line
        assert_eq!(table.lines().filter(|l| l.contains("100.00") || l.contains("30.00") || l.contains("70.00")).count() >= 1, true);
    }
}
