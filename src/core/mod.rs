//! Core logger types and traits

pub mod buffer_pool;
pub mod caller;
pub mod entry;
pub mod error;
pub mod exit;
pub mod fields;
pub mod global;
pub mod hooks;
pub mod level;
pub mod logger;
pub mod secrets;
pub mod timestamp;
pub mod writer;

pub use caller::{caller_level, set_caller_level};
pub use entry::Entry;
pub use error::{LoggerError, Result};
pub use exit::{defer_exit_handler, exit, register_exit_handler, run_exit_handlers};
pub use fields::{ErrorValue, FieldValue, Fields, OpaqueValue};
pub use global::std_logger;
pub use hooks::{Hook, LevelHooks};
pub use level::{parse_level, Level};
pub use logger::{Logger, LoggerBuilder};
pub use secrets::{add_secret, redact, secrets, REDACTED_MASK};
pub use timestamp::TimestampFormat;
pub use writer::LogWriter;
