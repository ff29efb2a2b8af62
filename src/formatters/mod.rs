//! Entry renderers
//!
//! Every formatter works from the same [`LogData`] snapshot of an entry, so
//! label remapping, collision renaming and caller lookup behave identically
//! across output formats.

pub mod json;
pub mod plain;
pub mod text;

pub use self::json::JsonFormatter;
pub use self::plain::StdFormatter;
pub use self::text::TextFormatter;

use crate::core::{
    caller::{get_caller, get_trace},
    entry::Entry,
    error::Result,
    fields::FieldValue,
    level::Level,
};
use chrono::{DateTime, Utc};
use colored::Color;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Renders an entry to bytes.
pub trait Formatter: Send + Sync {
    /// Append the rendered entry, newline included, to `buf`.
    fn format_into(&self, entry: &Entry, buf: &mut Vec<u8>) -> Result<()>;

    fn format(&self, entry: &Entry) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.format_into(entry, &mut buf)?;
        Ok(buf)
    }

    fn name(&self) -> &str;
}

/// Built-in output fields whose key names can be remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldLabel {
    Caller,
    Data,
    Error,
    Host,
    Level,
    Msg,
    Time,
    Trace,
}

impl FieldLabel {
    pub const ALL: [FieldLabel; 8] = [
        FieldLabel::Caller,
        FieldLabel::Data,
        FieldLabel::Error,
        FieldLabel::Host,
        FieldLabel::Level,
        FieldLabel::Msg,
        FieldLabel::Time,
        FieldLabel::Trace,
    ];

    pub fn default_name(self) -> &'static str {
        match self {
            FieldLabel::Caller => "caller",
            FieldLabel::Data => "data",
            FieldLabel::Error => "error",
            FieldLabel::Host => "host",
            FieldLabel::Level => "level",
            FieldLabel::Msg => "msg",
            FieldLabel::Time => "time",
            FieldLabel::Trace => "trace",
        }
    }
}

/// Output key names for the built-in fields.
///
/// ```
/// use rust_field_logger::{FieldLabel, FieldMap};
///
/// let map = FieldMap::new().with(FieldLabel::Msg, "@message");
/// assert_eq!(map.resolve(FieldLabel::Msg), "@message");
/// assert_eq!(map.resolve(FieldLabel::Level), "level");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    renames: HashMap<FieldLabel, String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, label: FieldLabel, name: impl Into<String>) -> Self {
        self.renames.insert(label, name.into());
        self
    }

    pub fn resolve(&self, label: FieldLabel) -> &str {
        self.renames
            .get(&label)
            .map(String::as_str)
            .unwrap_or_else(|| label.default_name())
    }
}

/// What [`LogData::collect`] should look up besides the entry itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collect {
    pub caller: bool,
    pub trace: bool,
}

/// Render-ready snapshot of an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogData {
    /// Empty when not collected or when no application frame was found.
    pub caller: String,
    /// User fields under the keys they were logged with.
    pub data: BTreeMap<String, FieldValue>,
    pub error: Option<String>,
    pub host: String,
    pub level: Level,
    pub message: String,
    pub time: DateTime<Utc>,
    pub trace: Vec<String>,
}

impl LogData {
    pub fn collect(entry: &Entry, field_map: &FieldMap, want: Collect) -> LogData {
        let renames = entry.data.clash_renames(field_map);
        let fields = entry.data.prefix_field_clashes(field_map);
        // Output nests fields under the data label already, so renamed keys
        // go back to the name the caller gave them. Keys the caller wrote
        // with a data prefix are left alone.
        let data = fields
            .iter()
            .map(|(key, value)| {
                let key = renames
                    .iter()
                    .find(|(_, to)| to == key)
                    .map_or(key.as_str(), |(from, _)| from.as_str());
                (key.to_string(), value.clone())
            })
            .collect();

        LogData {
            caller: if want.caller { get_caller() } else { String::new() },
            data,
            error: entry.err.as_ref().map(|err| err.to_string()),
            host: std::env::var("HOSTNAME").unwrap_or_default(),
            level: entry.level,
            message: entry.message.clone(),
            time: entry.time.unwrap_or_default(),
            trace: if want.trace { get_trace() } else { Vec::new() },
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Append `text`, wrapped in an ANSI color sequence when `color` is set.
pub(crate) fn paint(buf: &mut Vec<u8>, color: Option<Color>, text: &str) {
    match color {
        Some(color) => {
            buf.extend_from_slice(b"\x1b[");
            buf.extend_from_slice(color.to_fg_str().as_bytes());
            buf.push(b'm');
            buf.extend_from_slice(text.as_bytes());
            buf.extend_from_slice(RESET.as_bytes());
        }
        None => buf.extend_from_slice(text.as_bytes()),
    }
}

/// Remove ANSI SGR sequences, leaving the structural content.
///
/// ```
/// assert_eq!(rust_field_logger::formatters::strip_ansi("\x1b[32minfo\x1b[0m"), "info");
/// ```
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Escape `text` so it is printable ASCII safe to wrap in double quotes.
///
/// Quotes and backslashes are escaped, control characters become `\n`-style
/// or `\xNN` escapes, and non-ASCII characters become `\uNNNN` or
/// `\UNNNNNNNN`.
pub fn escape_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_ascii() => out.push(c),
            c if (c as u32) < 0x10000 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::Fields;
    use crate::core::logger::Logger;

    #[test]
    fn test_field_map_resolve() {
        let map = FieldMap::default();
        for label in FieldLabel::ALL {
            assert_eq!(map.resolve(label), label.default_name());
        }

        let map = map.with(FieldLabel::Time, "@timestamp");
        assert_eq!(map.resolve(FieldLabel::Time), "@timestamp");
    }

    #[test]
    fn test_collect_restores_renamed_keys() {
        let logger = Logger::new();
        let entry = logger.with_fields(
            Fields::new()
                .with("level", "something")
                .with("herp", "derp"),
        );

        let data = LogData::collect(&entry, &FieldMap::default(), Collect::default());
        assert_eq!(data.data["level"], "something");
        assert_eq!(data.data["herp"], "derp");
        assert!(data.caller.is_empty());
        assert!(data.trace.is_empty());
        // source entry untouched by the rename
        assert!(entry.data.contains_key("level"));
    }

    #[test]
    fn test_collect_keeps_both_colliding_fields() {
        let logger = Logger::new();
        let entry = logger.with_fields(
            Fields::new()
                .with("level", "A")
                .with("data.level", "B")
                .with("x", 1)
                .with("data.x", 2),
        );

        let data = LogData::collect(&entry, &FieldMap::default(), Collect::default());
        assert_eq!(data.data.len(), 4);
        assert_eq!(data.data["level"], "A");
        assert_eq!(data.data["data.level"], "B");
        assert_eq!(data.data["x"], 1);
        assert_eq!(data.data["data.x"], 2);
    }

    #[test]
    fn test_collect_caller_reports_test_frame() {
        let entry = Logger::new().with_field("k", "v");
        let data = LogData::collect(
            &entry,
            &FieldMap::default(),
            Collect {
                caller: true,
                trace: true,
            },
        );
        assert!(
            data.caller.contains("test_collect_caller_reports_test_frame"),
            "caller was {:?}",
            data.caller
        );
        assert!(!data.trace.is_empty());
    }

    #[test]
    fn test_collect_error() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "wild walrus");
        let entry = Logger::new().with_error(err);
        let data = LogData::collect(&entry, &FieldMap::default(), Collect::default());
        assert_eq!(data.error.as_deref(), Some("wild walrus"));
    }

    #[test]
    fn test_escape_ascii() {
        assert_eq!(escape_ascii("plain"), "plain");
        assert_eq!(escape_ascii("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(escape_ascii("tab\there"), "tab\\there");
        assert_eq!(escape_ascii("\u{01}"), "\\x01");
        assert_eq!(escape_ascii("caf\u{e9}"), "caf\\u00e9");
        assert_eq!(escape_ascii("\u{1F600}"), "\\U0001f600");
    }

    #[test]
    fn test_paint_and_strip() {
        let mut buf = Vec::new();
        paint(&mut buf, Some(Color::Green), "info");
        paint(&mut buf, None, " plain");
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("\x1b[32m"));
        assert_eq!(strip_ansi(&text), "info plain");
    }
}
