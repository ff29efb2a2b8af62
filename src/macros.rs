//! Logging macros for ergonomic log message formatting.
//!
//! Every level macro takes an optional target, a [`Logger`](crate::Logger)
//! or an [`Entry`](crate::Entry), followed by `format!`-style arguments.
//! Without a target the process-wide default logger is used. Arguments are
//! only formatted when the level is enabled.
//!
//! # Examples
//!
//! ```
//! use rust_field_logger::prelude::*;
//! use rust_field_logger::{fields, info, warn};
//!
//! let logger = Logger::builder().output(std::io::sink()).build();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Through an entry carrying fields
//! let entry = logger.with_fields(fields! { "user_id" => 42, "action" => "login" });
//! warn!(entry, "Slow login: {}ms", 950);
//! ```

/// Build a [`Fields`](crate::Fields) literal.
///
/// ```
/// use rust_field_logger::fields;
///
/// let fields = fields! { "animal" => "walrus", "size" => 10 };
/// assert_eq!(fields["animal"], "walrus");
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Fields::new()$(.with($key, $value))+
    };
}

/// Log a message at a level chosen at runtime.
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().output(std::io::sink()).build();
/// use rust_field_logger::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($target:expr, $level:expr, $($arg:tt)+) => {
        $target.log_fmt($level, format_args!($($arg)+))
    };
}

/// Log a debug-level message.
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().level(Level::Debug).output(std::io::sink()).build();
/// use rust_field_logger::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($fmt:literal $($arg:tt)*) => {
        $crate::core::global::debug_fmt(format_args!($fmt $($arg)*))
    };
    ($target:expr, $($arg:tt)+) => {
        $target.debug_fmt(format_args!($($arg)+))
    };
}

/// Log an info-level message.
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().output(std::io::sink()).build();
/// use rust_field_logger::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::core::global::info_fmt(format_args!($fmt $($arg)*))
    };
    ($target:expr, $($arg:tt)+) => {
        $target.info_fmt(format_args!($($arg)+))
    };
}

/// Log a warning-level message.
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().output(std::io::sink()).build();
/// use rust_field_logger::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($fmt:literal $($arg:tt)*) => {
        $crate::core::global::warn_fmt(format_args!($fmt $($arg)*))
    };
    ($target:expr, $($arg:tt)+) => {
        $target.warn_fmt(format_args!($($arg)+))
    };
}

/// Log an error-level message.
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().output(std::io::sink()).build();
/// use rust_field_logger::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($fmt:literal $($arg:tt)*) => {
        $crate::core::global::error_fmt(format_args!($fmt $($arg)*))
    };
    ($target:expr, $($arg:tt)+) => {
        $target.error_fmt(format_args!($($arg)+))
    };
}

/// Log a fatal-level message, run exit handlers and exit with status 1.
#[macro_export]
macro_rules! fatal {
    ($fmt:literal $($arg:tt)*) => {
        $crate::core::global::fatal_fmt(format_args!($fmt $($arg)*))
    };
    ($target:expr, $($arg:tt)+) => {
        $target.fatal_fmt(format_args!($($arg)+))
    };
}

/// Log a panic-level message and panic with the entry as payload.
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().output(std::io::sink()).build();
/// use rust_field_logger::panic_log;
/// let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
///     panic_log!(logger, "invariant broken: {}", 7)
/// }));
/// assert!(caught.is_err());
/// ```
#[macro_export]
macro_rules! panic_log {
    ($fmt:literal $($arg:tt)*) => {
        $crate::core::global::panic_fmt(format_args!($fmt $($arg)*))
    };
    ($target:expr, $($arg:tt)+) => {
        $target.panic_fmt(format_args!($($arg)+))
    };
}
