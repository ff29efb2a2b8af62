//! # Rust Field Logger
//!
//! A structured, field-oriented logging library: entries carry key/value
//! fields, pass through level-filtered hooks and are rendered by a pluggable
//! formatter to any [`std::io::Write`] sink.
//!
//! ## Features
//!
//! - **Immutable entries**: `with_field` and friends derive new entries that
//!   share field storage until one of them writes
//! - **Formatters**: `key="value"` text, JSON (with a colored TTY mode) and a
//!   std-log style line
//! - **Hooks**: per-level callbacks that cannot take down the caller
//! - **Secret redaction**: registered strings are masked in every output
//! - **Caller lookup**: optional call-site and stack trace fields
//!
//! ```
//! use rust_field_logger::prelude::*;
//! use rust_field_logger::hooks::MemoryHook;
//!
//! let (logger, hook) = MemoryHook::null_logger();
//! logger
//!     .with_field("animal", "walrus")
//!     .with_field("size", 10)
//!     .info("A group of walrus emerges from the ocean");
//!
//! assert_eq!(hook.last_entry().unwrap().data["size"], 10);
//! ```

pub mod macros;

pub mod core;
pub mod formatters;
pub mod hooks;

pub mod prelude {
    pub use crate::core::{
        Entry, FieldValue, Fields, Hook, Level, Logger, LoggerBuilder, LoggerError, Result,
        TimestampFormat,
    };
    pub use crate::formatters::{Formatter, JsonFormatter, StdFormatter, TextFormatter};
}

pub use crate::core::{
    add_secret, caller_level, defer_exit_handler, exit, parse_level, redact,
    register_exit_handler, run_exit_handlers, secrets, set_caller_level, std_logger, Entry,
    ErrorValue, FieldValue, Fields, Hook, Level, LevelHooks, LogWriter, Logger, LoggerBuilder,
    LoggerError, OpaqueValue, Result, TimestampFormat,
};
pub use crate::formatters::{
    FieldLabel, FieldMap, Formatter, JsonFormatter, StdFormatter, TextFormatter,
};

#[cfg(test)]
pub(crate) mod test_support {
    use parking_lot::Mutex;
    use std::io::{self, Write};
    use std::sync::Arc;

    /// In-memory sink whose clones share one buffer.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }

        pub fn lines(&self) -> Vec<String> {
            self.contents().lines().map(str::to_string).collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
