//! Command-line interface definition (spec §6).

use clap::Parser;

/// A SIP-compatible syscall tracer for macOS.
#[derive(Parser)]
#[command(name = "straced", version, about)]
pub struct Cli {
    /// Program (and its arguments) to launch and trace. Mutually exclusive
    /// with `--pid`.
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,

    /// Attach to an already-running process by pid, instead of launching
    /// one. Mutually exclusive with `command`.
    #[arg(long, conflicts_with = "command")]
    pub pid: Option<i32>,

    /// Redirect the event stream to a file; default is stderr.
    #[arg(long)]
    pub output: Option<String>,

    /// Select the JSON-Lines formatter instead of strace-style text.
    #[arg(long)]
    pub json: bool,

    /// Coloring policy for the text formatter.
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    pub color: ColorArg,

    /// Replace per-event output with a summary table at shutdown.
    #[arg(long, short = 'c')]
    pub summary: bool,

    /// Comma-separated syscall names and/or category tags to trace.
    #[arg(long, short = 'e', value_name = "SPEC")]
    pub trace: Option<String>,

    /// Render flag integers as raw hex instead of symbols.
    #[arg(long)]
    pub no_abbrev: bool,

    /// Cap for buffer/string rendering.
    #[arg(long, default_value_t = 32)]
    pub string_limit: usize,

    /// Follow forked children. Not yet supported; parsed so the usage error
    /// is clear rather than the flag being silently ignored.
    #[arg(long, short = 'f')]
    pub follow_forks: bool,

    /// Suppress all diagnostic output except fatal errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit verbose diagnostic output: breakpoint installs, pairing detail,
    /// timings.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Print the syscall registry (number, name, category) and exit without
    /// launching or attaching to anything.
    #[arg(long)]
    pub list_syscalls: bool,
}

/// `--color` values (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorArg {
    Auto,
    Always,
    Never,
}

impl Cli {
    /// `true` if exactly one of `command`/`--pid` was given, which clap's
    /// `conflicts_with` only half-enforces (it stops both being given, not
    /// neither).
    #[must_use]
    pub fn has_exactly_one_target(&self) -> bool {
        self.command.is_empty() != self.pid.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_target_only_is_valid() {
        let cli = Cli {
            command: vec!["/bin/ls".to_string()],
            pid: None,
            output: None,
            json: false,
            color: ColorArg::Auto,
            summary: false,
            trace: None,
            no_abbrev: false,
            string_limit: 32,
            follow_forks: false,
            quiet: false,
            verbose: false,
            list_syscalls: false,
        };
        assert!(cli.has_exactly_one_target());
    }

    #[test]
    fn neither_command_nor_pid_is_invalid() {
        let cli = Cli {
            command: vec![],
            pid: None,
            output: None,
            json: false,
            color: ColorArg::Auto,
            summary: false,
            trace: None,
            no_abbrev: false,
            string_limit: 32,
            follow_forks: false,
            quiet: false,
            verbose: false,
            list_syscalls: false,
        };
        assert!(!cli.has_exactly_one_target());
    }
}
