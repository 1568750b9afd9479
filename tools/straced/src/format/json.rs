//! JSON-Lines formatter (spec §4.9, §6): one `serde_json` object per line,
//! flushed whole so a truncated write never emits partial JSON (spec §7).

use std::io::Write;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::pipeline::{Sink, SyscallEvent};

#[derive(Serialize)]
struct JsonArg<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    ts: String,
    dur_us: u64,
    tid: u64,
    syscall: &'a str,
    category: &'a str,
    args: Vec<JsonArg<'a>>,
    retval: i64,
    retval_decoded: &'a str,
    error: bool,
}

/// Renders each event as one JSON object per line, matching the schema
/// spec §6 defines.
pub struct JsonFormatter<W: Write> {
    writer: W,
}

impl<W: Write> JsonFormatter<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn to_record(event: &SyscallEvent) -> JsonRecord<'_> {
        JsonRecord {
            ts: OffsetDateTime::from(event.start)
                .format(&Rfc3339)
                .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string()),
            dur_us: event.duration_us(),
            tid: event.tid,
            syscall: &event.name,
            category: event.category.as_str(),
            args: event
                .args
                .iter()
                .map(|a| JsonArg {
                    name: a.name,
                    value: &a.value,
                })
                .collect(),
            retval: event.retval,
            retval_decoded: &event.retval_decoded,
            error: event.error,
        }
    }
}

impl<W: Write> Sink for JsonFormatter<W> {
    fn on_event(&mut self, event: &SyscallEvent) -> std::io::Result<()> {
        let record = Self::to_record(event);
        let line = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{line}")
    }

    fn on_shutdown(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RenderedArg;
    use crate::registry::Category;
    use std::time::{Duration, SystemTime};

    fn sample() -> SyscallEvent {
        SyscallEvent {
            number: 5,
            name: "open".to_string(),
            category: Category::File,
            args: vec![RenderedArg {
                name: "path",
                value: "\"/etc/hosts\"".to_string(),
            }],
            retval: 3,
            retval_decoded: "3".to_string(),
            start: SystemTime::now(),
            end: SystemTime::now(),
            duration: Duration::from_micros(250),
            tid: 42,
            error: false,
            unfinished: false,
        }
    }

    #[test]
    fn emits_one_well_formed_json_object_per_line() {
        let mut fmt = JsonFormatter::new(Vec::new());
        fmt.on_event(&sample()).unwrap();
        let text = String::from_utf8(fmt.writer).unwrap();
        assert_eq!(text.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["syscall"], "open");
        assert_eq!(value["tid"], 42);
        assert_eq!(value["dur_us"], 250);
        assert_eq!(value["args"][0]["name"], "path");
    }

    #[test]
    fn error_field_reflects_event_error_flag() {
        let mut e = sample();
        e.error = true;
        e.retval = -2;
        e.retval_decoded = "-2 ENOENT (No such file or directory)".to_string();
        let record = JsonFormatter::<Vec<u8>>::to_record(&e);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"error\":true"));
        assert!(json.contains("ENOENT"));
    }
}
