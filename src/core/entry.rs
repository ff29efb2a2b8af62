//! Log entries and the level-gated logging API

use super::{
    error::Result,
    exit,
    fields::{ErrorValue, FieldValue, Fields},
    level::Level,
    logger::Logger,
    writer::LogWriter,
};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// One log record in the making.
///
/// Entries are values: every `with_*` call returns a new entry and leaves the
/// receiver untouched, and every logging call stamps a private copy. An entry
/// can therefore be shared freely between threads and reused as a base for
/// any number of log calls.
///
/// ```
/// use rust_field_logger::{Fields, Logger};
///
/// let logger = Logger::builder().output(std::io::sink()).build();
/// let request = logger.with_field("request_id", "r-42");
/// let derived = request.with_fields(Fields::new().with("user", "ana"));
///
/// assert!(!request.data.contains_key("user"));
/// assert_eq!(derived.data["request_id"], "r-42");
/// derived.info("handled");
/// ```
#[derive(Clone)]
pub struct Entry {
    logger: Logger,
    pub data: Fields,
    /// Error attached with `with_error`, rendered under the error label.
    pub err: Option<ErrorValue>,
    /// Level the entry was logged at; set when a logging method runs.
    pub level: Level,
    pub message: String,
    /// Defaults to the current time when the entry is logged.
    pub time: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.clone(),
            data: Fields::new(),
            err: None,
            level: Level::default(),
            message: String::new(),
            time: None,
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    #[must_use]
    pub fn with_field<K, V>(&self, key: K, value: V) -> Entry
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut next = self.clone();
        next.data.insert(key, value);
        next
    }

    /// Merge `fields` over this entry's fields; incoming keys win.
    #[must_use]
    pub fn with_fields(&self, fields: Fields) -> Entry {
        let mut next = self.clone();
        next.data = self.data.merge(&fields);
        next
    }

    #[must_use]
    pub fn with_error<E>(&self, err: E) -> Entry
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.with_error_value(Arc::new(err))
    }

    #[must_use]
    pub fn with_error_value(&self, err: ErrorValue) -> Entry {
        let mut next = self.clone();
        next.err = Some(err);
        next
    }

    /// Override the timestamp that would otherwise be taken at log time.
    #[must_use]
    pub fn with_time(&self, time: DateTime<Utc>) -> Entry {
        let mut next = self.clone();
        next.time = Some(time);
        next
    }

    /// Render through the logger's formatter, secrets masked.
    pub fn render(&self) -> Result<String> {
        self.logger.render(self)
    }

    /// Writer that logs each line at `Info`.
    pub fn writer(&self) -> LogWriter {
        self.writer_level(Level::Info)
    }

    /// Writer that logs each line written to it at `level`, carrying this
    /// entry's fields.
    pub fn writer_level(&self, level: Level) -> LogWriter {
        LogWriter::spawn(self.clone(), level)
    }

    /// Recover the entry carried by a panic raised from a `Panic` level call.
    ///
    /// Returns the payload unchanged when the panic came from elsewhere.
    pub fn from_panic(
        payload: Box<dyn Any + Send>,
    ) -> std::result::Result<Entry, Box<dyn Any + Send>> {
        payload.downcast::<Entry>().map(|entry| *entry)
    }

    /// Stamp a copy of this entry and hand it to the logger.
    fn log(&self, level: Level, message: String) -> Entry {
        let mut entry = self.clone();
        entry.level = level;
        entry.message = message;
        if entry.time.is_none() {
            entry.time = Some(Utc::now());
        }
        self.logger.dispatch(&entry);
        entry
    }

    /// Log at a level chosen at runtime. `Fatal` exits and `Panic` panics as
    /// their dedicated methods do.
    pub fn log_fmt(&self, level: Level, args: fmt::Arguments<'_>) {
        match level {
            Level::Fatal => self.fatal_fmt(args),
            Level::Panic => self.panic_fmt(args),
            _ => {
                if self.logger.is_level_enabled(level) {
                    self.log(level, fmt::format(args));
                }
            }
        }
    }

    pub(crate) fn log_at(&self, level: Level, message: String) {
        match level {
            Level::Fatal => self.fatal(message),
            Level::Panic => self.panic(message),
            _ => {
                if self.logger.is_level_enabled(level) {
                    self.log(level, message);
                }
            }
        }
    }

    fn exit_fatal(&self) -> ! {
        if let Err(e) = self.logger.flush() {
            eprintln!("Failed to write to log, {}", e);
        }
        exit::exit(1)
    }
}

fn join_operands(args: &[&dyn fmt::Display]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

macro_rules! entry_level_methods {
    ($($level:expr => $plain:ident, $fmt:ident, $ln:ident;)*) => {
        impl Entry {
            $(
                pub fn $plain(&self, msg: impl fmt::Display) {
                    if self.logger.is_level_enabled($level) {
                        self.log($level, msg.to_string());
                    }
                }

                /// Arguments are only formatted when the level is enabled.
                pub fn $fmt(&self, args: fmt::Arguments<'_>) {
                    if self.logger.is_level_enabled($level) {
                        self.log($level, fmt::format(args));
                    }
                }

                /// Operands are joined with single spaces.
                pub fn $ln(&self, args: &[&dyn fmt::Display]) {
                    if self.logger.is_level_enabled($level) {
                        self.log($level, join_operands(args));
                    }
                }
            )*
        }
    };
}

entry_level_methods! {
    Level::Debug => debug, debug_fmt, debugln;
    Level::Info => info, info_fmt, infoln;
    Level::Info => print, print_fmt, println;
    Level::Warn => warn, warn_fmt, warnln;
    Level::Warn => warning, warning_fmt, warningln;
    Level::Error => error, error_fmt, errorln;
}

impl Entry {
    /// Log at `Fatal` when enabled, then run exit handlers and exit with
    /// status 1. Exits even when the level is filtered out.
    pub fn fatal(&self, msg: impl fmt::Display) -> ! {
        if self.logger.is_level_enabled(Level::Fatal) {
            self.log(Level::Fatal, msg.to_string());
        }
        self.exit_fatal()
    }

    pub fn fatal_fmt(&self, args: fmt::Arguments<'_>) -> ! {
        if self.logger.is_level_enabled(Level::Fatal) {
            self.log(Level::Fatal, fmt::format(args));
        }
        self.exit_fatal()
    }

    pub fn fatalln(&self, args: &[&dyn fmt::Display]) -> ! {
        if self.logger.is_level_enabled(Level::Fatal) {
            self.log(Level::Fatal, join_operands(args));
        }
        self.exit_fatal()
    }

    /// Log at `Panic` and panic with the stamped entry as payload.
    ///
    /// `Panic` is the most severe level, so no threshold filters it out.
    ///
    /// ```
    /// use rust_field_logger::{Entry, Logger};
    ///
    /// let logger = Logger::builder().output(std::io::sink()).build();
    /// let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    ///     logger.with_field("animal", "walrus").panic("boom");
    /// }))
    /// .unwrap_err();
    ///
    /// let entry = Entry::from_panic(payload).unwrap();
    /// assert_eq!(entry.data["animal"], "walrus");
    /// assert_eq!(entry.message, "boom");
    /// ```
    pub fn panic(&self, msg: impl fmt::Display) -> ! {
        let entry = self.log(Level::Panic, msg.to_string());
        std::panic::panic_any(entry)
    }

    pub fn panic_fmt(&self, args: fmt::Arguments<'_>) -> ! {
        let entry = self.log(Level::Panic, fmt::format(args));
        std::panic::panic_any(entry)
    }

    pub fn panicln(&self, args: &[&dyn fmt::Display]) -> ! {
        let entry = self.log(Level::Panic, join_operands(args));
        std::panic::panic_any(entry)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("data", &self.data)
            .field("err", &self.err.as_ref().map(|e| e.to_string()))
            .field("level", &self.level)
            .field("message", &self.message)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}
