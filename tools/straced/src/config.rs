//! Resolves parsed CLI arguments into a single [`Config`] record threaded
//! through session construction (spec §6; mirrors the `gluon` build tool's
//! `config::ResolvedConfig` pattern of a single plain struct produced once
//! at startup).

use crate::filter::Filter;
use crate::format::ColorPolicy;
use crate::error::TraceError;

/// What the session launches or attaches to (spec §4.5, §6).
#[derive(Debug, Clone)]
pub enum Target {
    Launch { program: String, args: Vec<String> },
    Attach { pid: i32 },
}

/// Which formatter renders events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Fully resolved, immutable configuration for one tracer invocation.
pub struct Config {
    pub target: Target,
    pub output_path: Option<String>,
    pub format: OutputFormat,
    pub color: ColorPolicy,
    pub summary_only: bool,
    pub filter: Filter,
    pub abbreviate: bool,
    pub string_limit: usize,
}

impl Config {
    /// Resolve CLI arguments into a `Config`, rejecting malformed
    /// combinations up front (spec §7: `UsageError`).
    ///
    /// # Errors
    ///
    /// [`TraceError::UsageError`] if neither or both of `command`/`--pid`
    /// are given, if `--trace` fails to parse, or if `--follow-forks` is
    /// requested (spec §1 Non-goal, parsed but rejected rather than
    /// silently ignored).
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self, TraceError> {
        if cli.follow_forks {
            return Err(TraceError::UsageError {
                message: "--follow-forks is not yet supported".to_string(),
            });
        }

        if !cli.has_exactly_one_target() {
            return Err(TraceError::UsageError {
                message: "specify exactly one of a command to launch or --pid to attach".to_string(),
            });
        }

        let target = match cli.pid {
            Some(pid) => Target::Attach { pid },
            None => {
                let mut iter = cli.command.iter().cloned();
                let program = iter.next().ok_or_else(|| TraceError::UsageError {
                    message: "missing program to launch".to_string(),
                })?;
                Target::Launch {
                    program,
                    args: iter.collect(),
                }
            }
        };

        let filter = match &cli.trace {
            Some(spec) => Filter::parse(spec).map_err(|message| TraceError::UsageError { message })?,
            None => Filter::accept_all(),
        };

        let color = match cli.color {
            crate::cli::ColorArg::Auto => ColorPolicy::Auto,
            crate::cli::ColorArg::Always => ColorPolicy::Always,
            crate::cli::ColorArg::Never => ColorPolicy::Never,
        };

        Ok(Self {
            target,
            output_path: cli.output.clone(),
            format: if cli.json { OutputFormat::Json } else { OutputFormat::Text },
            color,
            summary_only: cli.summary,
            filter,
            abbreviate: !cli.no_abbrev,
            string_limit: cli.string_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, ColorArg};

    fn base_cli() -> Cli {
        Cli {
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
        }
    }

    #[test]
    fn launch_target_resolves_program_and_args() {
        let mut cli = base_cli();
        cli.command = vec!["/bin/ls".to_string(), "-la".to_string()];
        let config = Config::from_cli(&cli).unwrap();
        match config.target {
            Target::Launch { program, args } => {
                assert_eq!(program, "/bin/ls");
                assert_eq!(args, vec!["-la".to_string()]);
            }
            Target::Attach { .. } => panic!("expected Launch"),
        }
    }

    #[test]
    fn attach_target_resolves_pid() {
        let mut cli = base_cli();
        cli.pid = Some(4242);
        let config = Config::from_cli(&cli).unwrap();
        match config.target {
            Target::Attach { pid } => assert_eq!(pid, 4242),
            Target::Launch { .. } => panic!("expected Attach"),
        }
    }

    #[test]
    fn neither_target_is_a_usage_error() {
        let cli = base_cli();
        assert!(Config::from_cli(&cli).is_err());
    }

    #[test]
    fn both_targets_is_a_usage_error() {
        let mut cli = base_cli();
        cli.command = vec!["/bin/ls".to_string()];
        cli.pid = Some(1);
        assert!(!cli.has_exactly_one_target());
        assert!(Config::from_cli(&cli).is_err());
    }

    #[test]
    fn follow_forks_is_rejected() {
        let mut cli = base_cli();
        cli.command = vec!["/bin/ls".to_string()];
        cli.follow_forks = true;
        let err = Config::from_cli(&cli).unwrap_err();
        assert!(matches!(err, TraceError::UsageError { .. }));
    }

    #[test]
    fn invalid_trace_spec_is_a_usage_error() {
        let mut cli = base_cli();
        cli.command = vec!["/bin/ls".to_string()];
        cli.trace = Some("open,,close".to_string());
        assert!(Config::from_cli(&cli).is_err());
    }
}
