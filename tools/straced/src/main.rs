//! `straced`: a SIP-compatible macOS user-space syscall tracer.
//!
//! Pipeline: parse CLI → resolve config → build registry/filter/sinks →
//!           construct the Mach backend → launch or attach → drive the
//!           session's event loop to completion (spec §1, §4, §5).

mod arch;
mod backend;
mod breakpoint;
mod cli;
mod config;
mod decode;
mod diag;
mod error;
mod filter;
mod format;
mod memory;
mod pairing;
mod pipeline;
mod registry;
mod session;
mod summary;

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use arch::Architecture;
use backend::MachBackend;
use cli::Cli;
use config::{Config, OutputFormat, Target};
use error::TraceError;
use format::json::JsonFormatter;
use format::text::TextFormatter;
use pipeline::{Pipeline, Sink};
use registry::Registry;
use session::DebuggerSession;
use summary::SummaryAggregator;

const PROGRAM_NAME: &str = "straced";

fn main() {
    let cli = Cli::parse();
    diag::init(cli.quiet, cli.verbose);

    if cli.list_syscalls {
        print_registry();
        return;
    }

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            diag::fatal(PROGRAM_NAME, &e);
            std::process::exit(e.exit_code());
        }
    }
}

/// `--list-syscalls` (spec §3 supplemented feature): dump the registry and
/// exit without touching any target.
fn print_registry() {
    let registry = Registry::build();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for schema in registry.iter() {
        let _ = writeln!(out, "{:<5} {:<24} {}", schema.number, schema.name, schema.category.as_str());
    }
}

fn run(cli: &Cli) -> Result<i32, TraceError> {
    let config = Config::from_cli(cli)?;
    decode::configure(config.string_limit, config.abbreviate);

    let registry = Registry::build();
    let arch = Architecture::detect().adapter();
    let pipeline = build_pipeline(&config)?;
    let backend = MachBackend::new(arch.name() == "arm64");

    let detach_on_exit = false;
    let mut session = DebuggerSession::new(backend, arch, registry, config.filter, pipeline, detach_on_exit);

    install_signal_handler();

    match &config.target {
        Target::Launch { program, args } => session.launch(program, args)?,
        Target::Attach { pid } => session.attach(*pid)?,
    }

    match session.run() {
        Ok(code) => Ok(code),
        Err(_) if INTERRUPTED.load(Ordering::Relaxed) => {
            session.shutdown_on_interrupt();
            Err(TraceError::Interrupted)
        }
        Err(e) => Err(e),
    }
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_interrupt(_signum: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install a `SIGINT`/`SIGTERM` handler that flips a flag the event loop
/// checks between stops (spec §5: cancellation must not corrupt an
/// in-flight breakpoint install/disarm, so the actual teardown happens on
/// the main thread rather than inside the signal handler itself).
fn install_signal_handler() {
    // SAFETY: `handle_interrupt` only stores to an `AtomicBool`, which is
    // async-signal-safe; `libc::signal` is the simplest valid way to
    // install a handler for these two signals here.
    unsafe {
        libc::signal(libc::SIGINT, handle_interrupt as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_interrupt as libc::sighandler_t);
    }
}

/// Build the configured output sinks: one formatter (text or JSON) unless
/// `--summary` replaces it with the aggregator (spec §6).
fn build_pipeline(config: &Config) -> Result<Pipeline, TraceError> {
    let is_terminal = config.output_path.is_none() && io::stderr().is_terminal();
    let no_color_set = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    let use_color = config.color.resolve(is_terminal, no_color_set);

    let writer: Box<dyn Write> = match &config.output_path {
        Some(path) => Box::new(File::create(path).map_err(|e| TraceError::SinkIOError {
            detail: format!("{path}: {e}"),
        })?),
        None => Box::new(io::stderr()),
    };

    let sink: Box<dyn Sink> = if config.summary_only {
        // `--summary`'s table has its own fixed formatting (spec §6); ANSI
        // is never applied to it regardless of `--color`.
        Box::new(SummaryAggregator::new(writer))
    } else {
        match config.format {
            OutputFormat::Json => Box::new(JsonFormatter::new(writer)),
            OutputFormat::Text => Box::new(TextFormatter::new(writer, use_color, diag::is_verbose())),
        }
    };

    Ok(Pipeline::new(vec![sink]))
}
