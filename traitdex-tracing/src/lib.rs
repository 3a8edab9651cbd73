//! Tracing utility shared between traitdex crates.

use ansi_term::Colour;
use std::{env, io};
use tracing::{Level, Metadata};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::MakeWriter,
};

const ACTION_COLUMN_WIDTH: usize = 12;

/// Right-aligns `action` in a fixed-width column, cargo style.
fn pad_action(action: &str) -> String {
    format!("{action:>ACTION_COLUMN_WIDTH$}")
}

/// Prints an action message with a green-bold prefix like "   Emitting core::ops::Shr".
pub fn println_action_green(action: &str, txt: &str) {
    println_action(action, txt, Colour::Green);
}

/// Prints an action message with a red-bold prefix like "   Removing out/implementors".
pub fn println_action_red(action: &str, txt: &str) {
    println_action(action, txt, Colour::Red);
}

fn println_action(action: &str, txt: &str, colour: Colour) {
    tracing::info!("{} {}", colour.bold().paint(pad_action(action)), txt);
}

pub fn println_warning(txt: &str) {
    tracing::warn!("{}: {}", Colour::Yellow.bold().paint("warning"), txt);
}

pub fn println_error(txt: &str) {
    tracing::error!("{}: {}", Colour::Red.bold().paint("error"), txt);
}

const LOG_FILTER: &str = "RUST_LOG";

// ERROR and WARN go to stderr, everything else to stdout.
struct StdioTracingWriter {
    writer_mode: TracingWriterMode,
}

impl<'a> MakeWriter<'a> for StdioTracingWriter {
    type Writer = Box<dyn io::Write>;

    fn make_writer(&'a self) -> Self::Writer {
        if self.writer_mode == TracingWriterMode::Stderr {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        if self.writer_mode == TracingWriterMode::Stderr
            || (self.writer_mode == TracingWriterMode::Stdio && meta.level() <= &Level::WARN)
        {
            return Box::new(io::stderr());
        }
        Box::new(io::stdout())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingWriterMode {
    /// Write ERROR and WARN to stderr and everything else to stdout.
    Stdio,
    /// Write everything to stdout.
    Stdout,
    /// Write everything to stderr.
    Stderr,
}

#[derive(Debug, Default)]
pub struct TracingSubscriberOptions {
    pub verbosity: Option<u8>,
    pub silent: Option<bool>,
    pub log_level: Option<LevelFilter>,
    pub writer_mode: Option<TracingWriterMode>,
}

impl TracingSubscriberOptions {
    /// The level overriding `RUST_LOG`, if any. An explicit level wins over verbosity,
    /// which wins over silent mode.
    fn level_filter(&self) -> Option<LevelFilter> {
        self.log_level
            .or_else(|| match self.verbosity {
                Some(1) => Some(LevelFilter::DEBUG), // -v
                Some(2..) => Some(LevelFilter::TRACE), // -vv
                _ => None,
            })
            .or_else(|| match self.silent {
                Some(true) => Some(LevelFilter::OFF),
                _ => None,
            })
    }
}

/// Installs a subscriber whose output reads like plain `println!`: no timestamps, targets or
/// levels.
///
/// `RUST_LOG` sets the minimum level, `INFO` by default. A level, verbosity or silent mode
/// given in `options` overrides it.
pub fn init_tracing_subscriber(options: TracingSubscriberOptions) {
    let env_filter = match env::var_os(LOG_FILTER) {
        Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::new("info"),
    };
    let level_filter = options.level_filter();

    let builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_level(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .with_target(false)
        .with_writer(StdioTracingWriter {
            writer_mode: options.writer_mode.unwrap_or(TracingWriterMode::Stdio),
        });

    if let Some(level_filter) = level_filter {
        builder.with_max_level(level_filter).init();
    } else {
        builder.init();
    }
}
