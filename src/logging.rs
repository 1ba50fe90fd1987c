//! Tracing setup for the binary.
//!
//! Console output always goes to stderr (stdout carries command results). The
//! level comes from `LogLevel` only; RUST_LOG is not consulted. A log file is
//! added as a second, non-blocking layer when one is configured and its path
//! passes the symlink check.

use anyhow::Result;
use chrono::Local;
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::{self as tsfmt, MakeWriter, format::Writer, time::FormatTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use relocator::LogLevel;
use relocator::config::{default_log_path, path_has_symlink_ancestor};
use relocator::output as out;
use relocator::platform::open_log_file_secure_append;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// DD/MM/YY HH:MM:SS in local time.
struct LocalHumanTime;

impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

fn level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

fn fmt_layer<W>(json: bool, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tsfmt::layer()
        .with_timer(LocalHumanTime)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(writer);
    if json { base.json().boxed() } else { base.compact().boxed() }
}

/// Non-blocking appender for `path`, or None (with a note on stderr) when the
/// path has a symlinked ancestor or cannot be opened.
fn open_file_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => {
            out::print_warn(&format!("not logging to {}: an ancestor is a symlink", path.display()));
            return None;
        }
        Err(e) => {
            out::print_warn(&format!("not logging to {}: symlink check failed: {e}", path.display()));
            return None;
        }
    }
    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!("not logging to {}: {e:#}", path.display()));
            None
        }
    }
}

/// Install the global subscriber. The returned guard flushes the file layer on
/// drop, so keep it alive until the command finishes.
pub fn init_tracing(lvl: LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(json, std::io::stderr)];
    let mut guard = None;

    if let Some(path) = log_file {
        match open_file_writer(path) {
            Some((writer, g)) => {
                layers.push(fmt_layer(json, writer));
                guard = Some(g);
            }
            None => {
                if let Some(def) = default_log_path() {
                    out::print_info(&format!("default log location: {}", def.display()));
                }
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(EnvFilter::default().add_directive(level_filter(lvl).into()))
        .try_init()?;
    Ok(guard)
}
