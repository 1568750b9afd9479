//! strace-style text formatter (spec §4.9, §6): `name(arg, arg, …) =
//! retval[ symbol][ (description)]`, with an optional leading timestamp and
//! optional ANSI color classes.

use std::io::Write;

use crossterm::style::Stylize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::pipeline::{Sink, SyscallEvent};

/// Renders one line of output per event (spec §6: "matching GNU strace
/// conventions closely enough for simple grep compatibility").
pub struct TextFormatter<W: Write> {
    writer: W,
    color: bool,
    show_timestamps: bool,
}

impl<W: Write> TextFormatter<W> {
    #[must_use]
    pub fn new(writer: W, color: bool, show_timestamps: bool) -> Self {
        Self {
            writer,
            color,
            show_timestamps,
        }
    }

    fn render_line(&self, event: &SyscallEvent) -> String {
        let mut line = String::new();

        if self.show_timestamps {
            let ts = OffsetDateTime::from(event.start)
                .format(&Rfc3339)
                .unwrap_or_else(|_| "????-??-??T??:??:??Z".to_string());
            line.push_str(&format!("[{ts}] "));
        }

        let name = if self.color {
            event.name.clone().cyan().to_string()
        } else {
            event.name.clone()
        };

        let args = event
            .args
            .iter()
            .map(|a| color_value(&a.value, self.color))
            .collect::<Vec<_>>()
            .join(", ");

        let retval = if self.color {
            if event.error {
                event.retval_decoded.clone().red().to_string()
            } else {
                event.retval_decoded.clone().green().to_string()
            }
        } else {
            event.retval_decoded.clone()
        };

        if event.unfinished {
            line.push_str(&format!("{name}({args} <unfinished ...>"));
        } else {
            line.push_str(&format!("{name}({args}) = {retval}"));
        }
        line
    }
}

/// Distinguish string-literal arguments (double-quoted by every decoder that
/// touches target memory) from plain numeric/symbolic values, per the color
/// class set spec §4.9 names.
fn color_value(value: &str, color: bool) -> String {
    if !color {
        return value.to_string();
    }
    if value.starts_with('"') {
        value.to_string().yellow().to_string()
    } else {
        value.to_string().white().to_string()
    }
}

impl<W: Write> Sink for TextFormatter<W> {
    fn on_event(&mut self, event: &SyscallEvent) -> std::io::Result<()> {
        writeln!(self.writer, "{}", self.render_line(event))
    }

    fn on_shutdown(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Category;
    use std::time::{Duration, SystemTime};

    fn sample() -> SyscallEvent {
        SyscallEvent {
            number: 5,
            name: "open".to_string(),
            category: Category::File,
            args: vec![crate::pipeline::RenderedArg {
                name: "path",
                value: "\"/etc/hosts\"".to_string(),
            }],
            retval: 3,
            retval_decoded: "3".to_string(),
            start: SystemTime::now(),
            end: SystemTime::now(),
            duration: Duration::from_micros(12),
            tid: 1,
            error: false,
            unfinished: false,
        }
    }

    #[test]
    fn renders_name_args_and_retval_without_color() {
        let fmt = TextFormatter::new(Vec::new(), false, false);
        let line = fmt.render_line(&sample());
        assert_eq!(line, "open(\"/etc/hosts\") = 3");
    }

    #[test]
    fn unfinished_events_get_the_unfinished_marker() {
        let fmt = TextFormatter::new(Vec::new(), false, false);
        let mut e = sample();
        e.unfinished = true;
        let line = fmt.render_line(&e);
        assert!(line.ends_with("<unfinished ...>"));
    }

    #[test]
    fn timestamp_prefix_is_added_when_requested() {
        let fmt = TextFormatter::new(Vec::new(), false, true);
        let line = fmt.render_line(&sample());
        assert!(line.starts_with('['));
    }

    #[test]
    fn on_event_writes_a_newline_terminated_line() {
        let mut fmt = TextFormatter::new(Vec::new(), false, false);
        fmt.on_event(&sample()).unwrap();
        assert!(fmt.writer.ends_with(b"\n"));
    }
}
