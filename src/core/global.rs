//! Process-wide default logger and its free-function API

use super::{
    entry::Entry,
    fields::{ErrorValue, FieldValue, Fields},
    hooks::Hook,
    level::Level,
    logger::Logger,
    writer::LogWriter,
};
use crate::formatters::Formatter;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Write;
use std::sync::{Arc, OnceLock};

static STD_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The default logger, created on first use: text to stderr at `Info`.
pub fn std_logger() -> &'static Logger {
    STD_LOGGER.get_or_init(Logger::new)
}

pub fn set_output<W: Write + Send + 'static>(out: W) {
    std_logger().set_output(out);
}

pub fn set_formatter<F: Formatter + 'static>(formatter: F) {
    std_logger().set_formatter(formatter);
}

pub fn set_level(level: Level) {
    std_logger().set_level(level);
}

pub fn get_level() -> Level {
    std_logger().get_level()
}

pub fn is_level_enabled(level: Level) -> bool {
    std_logger().is_level_enabled(level)
}

pub fn add_hook(hook: Arc<dyn Hook>) {
    std_logger().add_hook(hook);
}

pub fn new_entry() -> Entry {
    std_logger().new_entry()
}

pub fn with_field<K, V>(key: K, value: V) -> Entry
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    std_logger().with_field(key, value)
}

pub fn with_fields(fields: Fields) -> Entry {
    std_logger().with_fields(fields)
}

pub fn with_error<E>(err: E) -> Entry
where
    E: std::error::Error + Send + Sync + 'static,
{
    std_logger().with_error(err)
}

pub fn with_error_value(err: ErrorValue) -> Entry {
    std_logger().with_error_value(err)
}

pub fn with_time(time: DateTime<Utc>) -> Entry {
    std_logger().with_time(time)
}

pub fn writer() -> LogWriter {
    std_logger().writer()
}

pub fn writer_level(level: Level) -> LogWriter {
    std_logger().writer_level(level)
}

macro_rules! global_level_functions {
    ($($plain:ident, $fmt:ident, $ln:ident;)*) => {
        $(
            pub fn $plain(msg: impl fmt::Display) {
                std_logger().$plain(msg);
            }

            pub fn $fmt(args: fmt::Arguments<'_>) {
                std_logger().$fmt(args);
            }

            pub fn $ln(args: &[&dyn fmt::Display]) {
                std_logger().$ln(args);
            }
        )*
    };
}

global_level_functions! {
    debug, debug_fmt, debugln;
    info, info_fmt, infoln;
    print, print_fmt, println;
    warn, warn_fmt, warnln;
    warning, warning_fmt, warningln;
    error, error_fmt, errorln;
}

pub fn fatal(msg: impl fmt::Display) -> ! {
    std_logger().fatal(msg)
}

pub fn fatal_fmt(args: fmt::Arguments<'_>) -> ! {
    std_logger().fatal_fmt(args)
}

pub fn fatalln(args: &[&dyn fmt::Display]) -> ! {
    std_logger().fatalln(args)
}

pub fn panic(msg: impl fmt::Display) -> ! {
    std_logger().panic(msg)
}

pub fn panic_fmt(args: fmt::Arguments<'_>) -> ! {
    std_logger().panic_fmt(args)
}

pub fn panicln(args: &[&dyn fmt::Display]) -> ! {
    std_logger().panicln(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_logger_is_shared() {
        let first = std_logger() as *const Logger;
        let second = std_logger() as *const Logger;
        assert_eq!(first, second);
    }

    #[test]
    fn test_entry_from_default_logger() {
        let entry = with_field("scope", "global");
        assert_eq!(entry.data["scope"], "global");
        assert!(entry.logger().is_level_enabled(Level::Panic));
    }
}
