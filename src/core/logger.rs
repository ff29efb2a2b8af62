//! Main logger implementation

use super::{
    buffer_pool::BufferPool,
    entry::Entry,
    error::Result,
    fields::{ErrorValue, FieldValue, Fields},
    hooks::{Hook, LevelHooks},
    level::{parse_level, Level},
    secrets,
    writer::LogWriter,
};
use crate::formatters::{Formatter, TextFormatter};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::any::TypeId;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

enum Output {
    /// `io::sink()`: hooks still fire, nothing is rendered.
    Discard,
    Stream(Box<dyn Write + Send>),
}

impl Output {
    fn new<W: Write + Send + 'static>(out: W) -> Self {
        if TypeId::of::<W>() == TypeId::of::<io::Sink>() {
            Output::Discard
        } else {
            Output::Stream(Box::new(out))
        }
    }

    fn is_discard(&self) -> bool {
        matches!(self, Output::Discard)
    }
}

struct LoggerInner {
    level: AtomicU8,
    no_lock: AtomicBool,
    discard: AtomicBool,
    /// Serializes hook firing, rendering and the sink write.
    mu: Mutex<()>,
    out: Mutex<Output>,
    formatter: RwLock<Arc<dyn Formatter>>,
    hooks: RwLock<Arc<LevelHooks>>,
    buffers: BufferPool,
}

/// Shared handle to a logger. Clones share level, sink, formatter and hooks.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Logger writing text to stderr at `Info` and above.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            Level::Info,
            Output::new(io::stderr()),
            Arc::new(TextFormatter::default()),
            LevelHooks::new(),
            false,
        )
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn from_parts(
        level: Level,
        out: Output,
        formatter: Arc<dyn Formatter>,
        hooks: LevelHooks,
        no_lock: bool,
    ) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                level: AtomicU8::new(level.to_u8()),
                no_lock: AtomicBool::new(no_lock),
                discard: AtomicBool::new(out.is_discard()),
                mu: Mutex::new(()),
                out: Mutex::new(out),
                formatter: RwLock::new(formatter),
                hooks: RwLock::new(Arc::new(hooks)),
                buffers: BufferPool::new(),
            }),
        }
    }

    pub fn set_level(&self, level: Level) {
        self.inner.level.store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn get_level(&self) -> Level {
        Level::from_u8(self.inner.level.load(Ordering::Relaxed))
    }

    /// True when an entry at `level` passes the threshold.
    #[inline]
    pub fn is_level_enabled(&self, level: Level) -> bool {
        Level::enabled(self.get_level(), level)
    }

    /// Replace the sink. Passing `std::io::sink()` turns rendering off
    /// entirely while hooks keep firing.
    pub fn set_output<W: Write + Send + 'static>(&self, out: W) {
        let out = Output::new(out);
        let _guard = self.inner.mu.lock();
        let mut current = self.inner.out.lock();
        self.inner.discard.store(out.is_discard(), Ordering::Relaxed);
        *current = out;
    }

    pub fn set_formatter<F: Formatter + 'static>(&self, formatter: F) {
        self.set_shared_formatter(Arc::new(formatter));
    }

    pub fn set_shared_formatter(&self, formatter: Arc<dyn Formatter>) {
        *self.inner.formatter.write() = formatter;
    }

    pub fn formatter(&self) -> Arc<dyn Formatter> {
        self.inner.formatter.read().clone()
    }

    /// Register a hook for every level it declares.
    ///
    /// Meant for setup; entries already being written see the previous set.
    pub fn add_hook(&self, hook: Arc<dyn Hook>) {
        let mut hooks = self.inner.hooks.write();
        Arc::make_mut(&mut *hooks).add(hook);
    }

    /// Swap the hook registry, returning the previous one.
    pub fn replace_hooks(&self, hooks: LevelHooks) -> LevelHooks {
        let previous = std::mem::replace(&mut *self.inner.hooks.write(), Arc::new(hooks));
        Arc::try_unwrap(previous).unwrap_or_else(|shared| (*shared).clone())
    }

    pub fn hooks(&self) -> Arc<LevelHooks> {
        self.inner.hooks.read().clone()
    }

    /// Skip the write lock. Only sound when the caller guarantees a single
    /// writer; the sink is still written in one piece per entry.
    pub fn set_no_lock(&self, no_lock: bool) {
        self.inner.no_lock.store(no_lock, Ordering::Relaxed);
    }

    pub fn flush(&self) -> Result<()> {
        let mut out = self.inner.out.lock();
        if let Output::Stream(writer) = &mut *out {
            writer.flush()?;
        }
        Ok(())
    }

    /// Fire hooks, render, redact and write an already stamped entry.
    ///
    /// Failures are reported to stderr and never reach the caller.
    pub(crate) fn dispatch(&self, entry: &Entry) {
        let inner = &*self.inner;
        let hooks = self.hooks();
        let formatter = self.formatter();

        let _guard = if inner.no_lock.load(Ordering::Relaxed) {
            None
        } else {
            Some(inner.mu.lock())
        };

        // Each failing hook is reported as it fails.
        let _ = hooks.fire(entry.level, entry);

        if inner.discard.load(Ordering::Relaxed) {
            return;
        }

        let mut buf = inner.buffers.get();
        if let Err(e) = formatter.format_into(entry, &mut buf) {
            eprintln!("Failed to obtain reader, {}", e);
            return;
        }
        secrets::redact_in_place(&mut buf);

        let mut out = inner.out.lock();
        if let Output::Stream(writer) = &mut *out {
            if let Err(e) = writer.write_all(&buf) {
                eprintln!("Failed to write to log, {}", e);
            }
        }
    }

    /// Render an entry the way `dispatch` would, without writing it.
    pub(crate) fn render(&self, entry: &Entry) -> Result<String> {
        let mut buf = self.inner.buffers.get();
        self.formatter().format_into(entry, &mut buf)?;
        secrets::redact_in_place(&mut buf);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn new_entry(&self) -> Entry {
        Entry::new(self)
    }

    pub fn with_field<K, V>(&self, key: K, value: V) -> Entry
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.new_entry().with_field(key, value)
    }

    pub fn with_fields(&self, fields: Fields) -> Entry {
        self.new_entry().with_fields(fields)
    }

    pub fn with_error<E>(&self, err: E) -> Entry
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.new_entry().with_error(err)
    }

    pub fn with_error_value(&self, err: ErrorValue) -> Entry {
        self.new_entry().with_error_value(err)
    }

    pub fn with_time(&self, time: DateTime<Utc>) -> Entry {
        self.new_entry().with_time(time)
    }

    pub fn log_fmt(&self, level: Level, args: fmt::Arguments<'_>) {
        self.new_entry().log_fmt(level, args);
    }

    /// Writer that logs each line at `Info`. See [`Entry::writer_level`].
    pub fn writer(&self) -> LogWriter {
        self.new_entry().writer()
    }

    pub fn writer_level(&self, level: Level) -> LogWriter {
        self.new_entry().writer_level(level)
    }
}

macro_rules! logger_level_methods {
    ($($plain:ident, $fmt:ident, $ln:ident;)*) => {
        impl Logger {
            $(
                pub fn $plain(&self, msg: impl fmt::Display) {
                    self.new_entry().$plain(msg);
                }

                pub fn $fmt(&self, args: fmt::Arguments<'_>) {
                    self.new_entry().$fmt(args);
                }

                pub fn $ln(&self, args: &[&dyn fmt::Display]) {
                    self.new_entry().$ln(args);
                }
            )*
        }
    };
}

logger_level_methods! {
    debug, debug_fmt, debugln;
    info, info_fmt, infoln;
    print, print_fmt, println;
    warn, warn_fmt, warnln;
    warning, warning_fmt, warningln;
    error, error_fmt, errorln;
}

impl Logger {
    /// Log at `Fatal`, run exit handlers and exit with status 1.
    pub fn fatal(&self, msg: impl fmt::Display) -> ! {
        self.new_entry().fatal(msg)
    }

    pub fn fatal_fmt(&self, args: fmt::Arguments<'_>) -> ! {
        self.new_entry().fatal_fmt(args)
    }

    pub fn fatalln(&self, args: &[&dyn fmt::Display]) -> ! {
        self.new_entry().fatalln(args)
    }

    /// Log at `Panic`, then panic with the entry as payload.
    pub fn panic(&self, msg: impl fmt::Display) -> ! {
        self.new_entry().panic(msg)
    }

    pub fn panic_fmt(&self, args: fmt::Arguments<'_>) -> ! {
        self.new_entry().panic_fmt(args)
    }

    pub fn panicln(&self, args: &[&dyn fmt::Display]) -> ! {
        self.new_entry().panicln(args)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.get_level())
            .field("formatter", &self.formatter().name())
            .field("hooks", &self.hooks())
            .field("no_lock", &self.inner.no_lock.load(Ordering::Relaxed))
            .field("discard", &self.inner.discard.load(Ordering::Relaxed))
            .finish()
    }
}

/// Fluent construction of a [`Logger`].
///
/// ```
/// use rust_field_logger::{JsonFormatter, Level, Logger};
///
/// let logger = Logger::builder()
///     .level(Level::Debug)
///     .formatter(JsonFormatter::default())
///     .output(std::io::sink())
///     .build();
/// assert_eq!(logger.get_level(), Level::Debug);
/// ```
#[must_use = "builder methods return a new value"]
pub struct LoggerBuilder {
    level: Level,
    out: Output,
    formatter: Arc<dyn Formatter>,
    hooks: LevelHooks,
    no_lock: bool,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            out: Output::new(io::stderr()),
            formatter: Arc::new(TextFormatter::default()),
            hooks: LevelHooks::new(),
            no_lock: false,
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Threshold from a level name such as `"warning"`.
    pub fn level_str(self, level: &str) -> Result<Self> {
        Ok(self.level(parse_level(level)?))
    }

    pub fn output<W: Write + Send + 'static>(mut self, out: W) -> Self {
        self.out = Output::new(out);
        self
    }

    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.add(hook);
        self
    }

    pub fn no_lock(mut self, no_lock: bool) -> Self {
        self.no_lock = no_lock;
        self
    }

    #[must_use]
    pub fn build(self) -> Logger {
        Logger::from_parts(
            self.level,
            self.out,
            self.formatter,
            self.hooks,
            self.no_lock,
        )
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
