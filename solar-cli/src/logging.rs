//! Process-wide `tracing` setup for the terminal app.
//!
//! Two sinks share one level filter:
//!
//! | Sink    | Writer        | Switch                                        |
//! |---------|---------------|-----------------------------------------------|
//! | console | stderr        | [`set_console_enabled`] (`--quiet`)           |
//! | file    | late-bound    | [`enable_file_logging`] / [`disable_file_logging`] |
//!
//! Prompts go to stdout, so log lines never interleave with the questions.

use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    Layer, // with_filter on the console layer
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

pub const DEFAULT_LEVEL: &str = "info";

/// `12:04:31.207  INFO solar_core::wizard::session location resolved postcode=2000`
struct LineFormat;

impl LineFormat {
    fn level_colour(level: Level) -> &'static str {
        match level {
            Level::ERROR => "1;31",
            Level::WARN => "1;33",
            Level::INFO => "1;32",
            Level::DEBUG => "1;34",
            Level::TRACE => "1;35",
        }
    }
}

/// Writes `text`, wrapped in the SGR `code` when colour is on.
fn paint(
    writer: &mut Writer<'_>,
    code: &str,
    text: impl std::fmt::Display,
) -> std::fmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "\x1b[{code}m{text}\x1b[0m ")
    } else {
        write!(writer, "{text} ")
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();

        paint(&mut writer, "2", Local::now().format("%H:%M:%S%.3f"))?;
        paint(&mut writer, Self::level_colour(level), format_args!("{level:>5}"))?;
        paint(&mut writer, "36", meta.target())?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Log file that can be opened, swapped or closed after the subscriber is
/// installed. Writes are dropped while it is empty.
#[derive(Clone, Default)]
struct FileSlot(Arc<Mutex<Option<File>>>);

impl FileSlot {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the current file; `None` closes it.
    fn set(
        &self,
        file: Option<File>,
    ) {
        *self.lock() = file;
    }
}

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), File::flush)
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.lock())
    }
}

type ConsoleSwitch = Box<dyn Fn(bool) -> Result<()> + Send + Sync>;

static CONSOLE_SWITCH: OnceLock<ConsoleSwitch> = OnceLock::new();
static FILE_SLOT: OnceLock<FileSlot> = OnceLock::new();

/// `RUST_LOG` wins over the configured level; an unparseable level falls
/// back to [`DEFAULT_LEVEL`].
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Hides or restores stderr output. The file sink is unaffected.
pub fn set_console_enabled(enabled: bool) -> Result<()> {
    match CONSOLE_SWITCH.get() {
        Some(switch) => switch(enabled),
        None => bail!("logging not yet initialized"),
    }
}

/// Appends log output to `path`, replacing any open log file. The parent
/// directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let slot = FILE_SLOT
        .get()
        .ok_or_else(|| anyhow!("logging not yet initialized"))?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;
    slot.set(Some(file));
    Ok(())
}

/// Closes the log file, flushing what was written.
pub fn disable_file_logging() {
    if let Some(slot) = FILE_SLOT.get() {
        slot.set(None);
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(level: &str) {
    let slot = FILE_SLOT.get_or_init(FileSlot::default).clone();
    let (console_gate, gate_handle) = reload::Layer::new(EnvFilter::new("trace"));

    let console = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(console_gate);
    let file = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(slot);

    let installed = tracing_subscriber::registry()
        .with(level_filter(level))
        .with(console)
        .with(file)
        .try_init();
    if installed.is_err() {
        return;
    }

    let _ = CONSOLE_SWITCH.set(Box::new(move |enabled: bool| {
        let gate = EnvFilter::new(if enabled { "trace" } else { "off" });
        gate_handle
            .reload(gate)
            .map_err(|e| anyhow!("console reload failed: {e}"))
    }));
}
