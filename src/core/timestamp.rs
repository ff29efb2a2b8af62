//! Timestamp formatting for rendered entries
//!
//! Formatters render an entry's time through a `TimestampFormat`. The default
//! is RFC 3339 with milliseconds in UTC (`2025-01-08T10:30:45.123Z`).

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// strftime layout used by the plain formatter when none is configured.
pub const STD_TIMESTAMP_LAYOUT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// RFC 3339 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Rfc3339Millis,

    /// RFC 3339 with microseconds: `2025-01-08T10:30:45.123456Z`
    Rfc3339Micros,

    /// RFC 3339 with whole seconds: `2025-01-08T10:30:45Z`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// strftime layout; build through [`TimestampFormat::custom`] to validate it
    Custom(String),
}

impl TimestampFormat {
    /// Validate and wrap a strftime layout.
    ///
    /// ```
    /// use rust_field_logger::TimestampFormat;
    ///
    /// assert!(TimestampFormat::custom("%Y/%m/%d %H:%M:%S").is_ok());
    /// assert!(TimestampFormat::custom("%Y-%").is_err());
    /// ```
    pub fn custom(layout: impl Into<String>) -> Result<Self> {
        let layout = layout.into();
        if layout.is_empty() {
            return Err(LoggerError::config("TimestampFormat", "layout is empty"));
        }
        if StrftimeItems::new(&layout).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "TimestampFormat",
                format!("invalid strftime layout {:?}", layout),
            ));
        }
        Ok(TimestampFormat::Custom(layout))
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Rfc3339Millis => datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
            TimestampFormat::Rfc3339Micros => datetime.to_rfc3339_opts(SecondsFormat::Micros, true),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(layout) => {
                // An unchecked layout that chrono rejects falls back to the default.
                let mut out = String::new();
                match write!(out, "{}", datetime.format(layout)) {
                    Ok(()) => out,
                    Err(_) => datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
                }
            }
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}
