//! Std-log style line formatter

use super::{Collect, FieldLabel, FieldMap, Formatter, LogData};
use crate::core::{
    entry::Entry,
    error::Result,
    timestamp::{TimestampFormat, STD_TIMESTAMP_LAYOUT},
};

/// Renders a line in the shape of the classic `log` package output, with
/// fields appended as JSON-encoded values:
///
/// ```text
/// 2025/01/08 10:30:45 hello level="info" data.user="ana" data.n=3 caller="main.rs:12 app::main"
/// ```
///
/// With `enable_trace` every application frame is appended as `trace.N="…"`.
#[derive(Debug, Clone)]
pub struct StdFormatter {
    pub disable_caller: bool,
    pub disable_hostname: bool,
    pub disable_level: bool,
    pub disable_message: bool,
    pub disable_timestamp: bool,

    /// Append the application stack; also forces the caller on.
    pub enable_trace: bool,

    /// Escape `<`, `>` and `&` inside field values.
    pub escape_html: bool,

    pub timestamp_format: TimestampFormat,
    pub field_map: FieldMap,
}

impl Default for StdFormatter {
    fn default() -> Self {
        Self {
            disable_caller: false,
            disable_hostname: false,
            disable_level: false,
            disable_message: false,
            disable_timestamp: false,
            enable_trace: false,
            escape_html: false,
            timestamp_format: TimestampFormat::Custom(STD_TIMESTAMP_LAYOUT.to_string()),
            field_map: FieldMap::default(),
        }
    }
}

impl StdFormatter {
    fn encode(&self, value: &serde_json::Value) -> Result<String> {
        let encoded = serde_json::to_string(value)?;
        Ok(if self.escape_html {
            encoded
                .replace('<', "\\u003c")
                .replace('>', "\\u003e")
                .replace('&', "\\u0026")
        } else {
            encoded
        })
    }
}

impl Formatter for StdFormatter {
    fn format_into(&self, entry: &Entry, buf: &mut Vec<u8>) -> Result<()> {
        let show_caller = !self.disable_caller || self.enable_trace;
        let data = LogData::collect(
            entry,
            &self.field_map,
            Collect {
                caller: show_caller,
                trace: self.enable_trace,
            },
        );

        let mut parts: Vec<String> = Vec::new();
        if !self.disable_timestamp {
            parts.push(self.timestamp_format.format(&data.time));
        }
        if !self.disable_message && !data.message.is_empty() {
            parts.push(data.message.clone());
        }
        if !self.disable_level {
            parts.push(format!(
                "{}=\"{}\"",
                self.field_map.resolve(FieldLabel::Level),
                data.level
            ));
        }
        if let Some(ref err) = data.error {
            parts.push(format!(
                "{}={}",
                self.field_map.resolve(FieldLabel::Error),
                self.encode(&serde_json::Value::String(err.clone()))?
            ));
        }
        let data_label = self.field_map.resolve(FieldLabel::Data);
        for (key, value) in &data.data {
            parts.push(format!(
                "{}.{}={}",
                data_label,
                key,
                self.encode(&value.to_json_value()?)?
            ));
        }
        if show_caller && !data.caller.is_empty() {
            parts.push(format!(
                "{}=\"{}\"",
                self.field_map.resolve(FieldLabel::Caller),
                data.caller
            ));
        }
        if !self.disable_hostname && !data.host.is_empty() {
            parts.push(format!(
                "{}=\"{}\"",
                self.field_map.resolve(FieldLabel::Host),
                data.host
            ));
        }
        let trace_label = self.field_map.resolve(FieldLabel::Trace);
        for (idx, frame) in data.trace.iter().enumerate() {
            parts.push(format!("{}.{}=\"{}\"", trace_label, idx, frame));
        }

        let line = parts.join(" ");
        buf.extend_from_slice(line.trim_matches(|c| c == ' ' || c == '\n').as_bytes());
        buf.push(b'\n');
        Ok(())
    }

    fn name(&self) -> &str {
        "std"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::{FieldValue, Fields};
    use crate::core::level::Level;
    use crate::core::logger::Logger;
    use chrono::{TimeZone, Utc};

    fn quiet() -> StdFormatter {
        StdFormatter {
            disable_caller: true,
            disable_hostname: true,
            ..StdFormatter::default()
        }
    }

    fn render(formatter: &StdFormatter, entry: &Entry) -> String {
        String::from_utf8(formatter.format(entry).unwrap()).unwrap()
    }

    fn stamped(entry: Entry, level: Level, message: &str) -> Entry {
        let at = Utc.with_ymd_and_hms(1981, 2, 24, 4, 28, 3).unwrap();
        let mut entry = entry.with_time(at);
        entry.level = level;
        entry.message = message.to_string();
        entry
    }

    #[test]
    fn test_basic_line() {
        let entry = stamped(Logger::new().with_field("test", "foo"), Level::Fatal, "");
        assert_eq!(
            render(&quiet(), &entry),
            "1981/02/24 04:28:03 level=\"fatal\" data.test=\"foo\"\n"
        );
    }

    #[test]
    fn test_field_map() {
        let formatter = StdFormatter {
            field_map: FieldMap::new()
                .with(FieldLabel::Data, "data-label")
                .with(FieldLabel::Level, "level-label")
                .with(FieldLabel::Msg, "msg-label")
                .with(FieldLabel::Time, "time-field-label"),
            ..quiet()
        };
        let entry = stamped(
            Logger::new().with_fields(
                Fields::new()
                    .with("field1", "f1")
                    .with("msg-label", "messageData")
                    .with("level-label", "levelData")
                    .with("time-field-label", "timeData"),
            ),
            Level::Warn,
            "oh hi",
        );

        assert_eq!(
            render(&formatter, &entry),
            "1981/02/24 04:28:03 oh hi level-label=\"warn\" \
             data-label.field1=\"f1\" \
             data-label.level-label=\"levelData\" \
             data-label.msg-label=\"messageData\" \
             data-label.time-field-label=\"timeData\"\n"
        );
    }

    #[test]
    fn test_values_json_encoded() {
        let entry = stamped(
            Logger::new()
                .with_field("quote", "ba\"r")
                .with_field("n", 7)
                .with_field("list", FieldValue::from(vec!["a", "b"])),
            Level::Info,
            "m",
        );
        let line = render(&quiet(), &entry);

        assert!(line.contains("data.quote=\"ba\\\"r\""));
        assert!(line.contains("data.n=7"));
        assert!(line.contains("data.list=[\"a\",\"b\"]"));
    }

    #[test]
    fn test_error_quoted() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "error: something went wrong");
        let entry = stamped(Logger::new().with_error(err), Level::Error, "");
        assert!(render(&quiet(), &entry).contains("error=\"error: something went wrong\""));
    }

    #[test]
    fn test_disable_everything_but_data() {
        let formatter = StdFormatter {
            disable_level: true,
            disable_message: true,
            disable_timestamp: true,
            ..quiet()
        };
        let entry = stamped(Logger::new().with_field("k", "v"), Level::Info, "hidden");
        assert_eq!(render(&formatter, &entry), "data.k=\"v\"\n");
    }

    #[test]
    fn test_escape_html() {
        let entry = stamped(Logger::new().with_field("h", "<a&b>"), Level::Info, "m");
        let formatter = StdFormatter {
            escape_html: true,
            ..quiet()
        };
        assert!(render(&formatter, &entry).contains("data.h=\"\\u003ca\\u0026b\\u003e\""));
        assert!(render(&quiet(), &entry).contains("data.h=\"<a&b>\""));
    }

    #[test]
    fn test_trace_forces_caller() {
        let formatter = StdFormatter {
            enable_trace: true,
            ..quiet()
        };
        let entry = stamped(Logger::new().new_entry(), Level::Info, "m");
        let line = render(&formatter, &entry);

        assert!(line.contains(" caller=\""), "line was {:?}", line);
        assert!(line.contains("trace.0=\""), "line was {:?}", line);
        assert!(line.contains("plain::tests::test_trace_forces_caller"));
    }

    #[test]
    fn test_custom_timestamp() {
        let formatter = StdFormatter {
            timestamp_format: TimestampFormat::Rfc3339,
            ..quiet()
        };
        let entry = stamped(Logger::new().new_entry(), Level::Info, "m");
        assert!(render(&formatter, &entry).starts_with("1981-02-24T04:28:03Z m "));
    }
}
