//! JSON formatter, one object per line

use super::{paint, Collect, FieldLabel, FieldMap, Formatter, LogData};
use crate::core::{entry::Entry, error::Result, timestamp::TimestampFormat};
use colored::Color;
use serde_json::{Map, Value};

/// Renders each entry as a JSON object:
///
/// ```text
/// {"caller":"main.rs:12 app::main","data":{"user":"ana"},"host":"web-1","level":"info","msg":"hello","time":"2025-01-08T10:30:45.123Z"}
/// ```
///
/// In TTY mode the object is pretty-printed with colored keys; stripping the
/// color codes leaves JSON with the same structure as the compact form.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub disable_caller: bool,
    pub disable_hostname: bool,
    pub disable_level: bool,
    pub disable_message: bool,
    pub disable_timestamp: bool,

    /// Add the application stack under the trace label (implies caller).
    pub enable_trace: bool,

    /// Escape `<`, `>` and `&` inside strings.
    pub escape_html: bool,

    pub force_tty: bool,
    pub disable_tty: bool,

    /// Whether the destination is a terminal.
    pub terminal: bool,

    pub timestamp_format: TimestampFormat,
    pub field_map: FieldMap,
}

impl JsonFormatter {
    fn tty(&self) -> bool {
        (self.force_tty || self.terminal) && !self.disable_tty
    }

    fn build(&self, entry: &Entry) -> Result<Map<String, Value>> {
        let data = LogData::collect(
            entry,
            &self.field_map,
            Collect {
                caller: !self.disable_caller || self.enable_trace,
                trace: self.enable_trace,
            },
        );
        let label = |l: FieldLabel| self.field_map.resolve(l).to_string();

        let mut fields = Map::new();
        for (key, value) in &data.data {
            fields.insert(key.clone(), value.to_json_value()?);
        }

        let mut object = Map::new();
        if !self.disable_caller || self.enable_trace {
            object.insert(label(FieldLabel::Caller), Value::String(data.caller));
        }
        if self.enable_trace {
            object.insert(
                label(FieldLabel::Trace),
                Value::Array(data.trace.into_iter().map(Value::String).collect()),
            );
        }
        if !self.disable_hostname {
            object.insert(label(FieldLabel::Host), Value::String(data.host));
        }
        if !self.disable_level {
            object.insert(
                label(FieldLabel::Level),
                Value::String(data.level.as_str().to_string()),
            );
        }
        if !self.disable_message {
            object.insert(label(FieldLabel::Msg), Value::String(data.message));
        }
        if !self.disable_timestamp {
            let stamp = self.timestamp_format.format(&data.time);
            let stamp = match stamp.parse::<i64>() {
                Ok(n) if self.timestamp_format.is_numeric() => Value::from(n),
                _ => Value::String(stamp),
            };
            object.insert(label(FieldLabel::Time), stamp);
        }
        if let Some(err) = data.error {
            object.insert(label(FieldLabel::Error), Value::String(err));
        }
        object.insert(label(FieldLabel::Data), Value::Object(fields));
        Ok(object)
    }
}

fn escape_html(text: &str) -> String {
    text.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn indent(buf: &mut Vec<u8>, depth: usize) {
    buf.extend(std::iter::repeat(b' ').take(depth * 4));
}

/// Pretty-print `value`, coloring object keys with `key_color` at the top
/// level and `nested_color` below it.
fn write_pretty(
    buf: &mut Vec<u8>,
    value: &Value,
    depth: usize,
    key_color: Color,
    nested_color: Color,
) -> Result<()> {
    match value {
        Value::Object(map) if !map.is_empty() => {
            buf.extend_from_slice(b"{\n");
            for (idx, (key, item)) in map.iter().enumerate() {
                indent(buf, depth + 1);
                paint(buf, Some(key_color), &serde_json::to_string(key)?);
                buf.extend_from_slice(b": ");
                write_pretty(buf, item, depth + 1, nested_color, nested_color)?;
                if idx + 1 < map.len() {
                    buf.push(b',');
                }
                buf.push(b'\n');
            }
            indent(buf, depth);
            buf.push(b'}');
        }
        Value::Array(items) if !items.is_empty() => {
            buf.extend_from_slice(b"[\n");
            for (idx, item) in items.iter().enumerate() {
                indent(buf, depth + 1);
                write_pretty(buf, item, depth + 1, nested_color, nested_color)?;
                if idx + 1 < items.len() {
                    buf.push(b',');
                }
                buf.push(b'\n');
            }
            indent(buf, depth);
            buf.push(b']');
        }
        scalar => buf.extend_from_slice(serde_json::to_string(scalar)?.as_bytes()),
    }
    Ok(())
}

impl Formatter for JsonFormatter {
    fn format_into(&self, entry: &Entry, buf: &mut Vec<u8>) -> Result<()> {
        let object = Value::Object(self.build(entry)?);

        let rendered = if self.tty() {
            let mut pretty = Vec::new();
            write_pretty(
                &mut pretty,
                &object,
                0,
                entry.level.color(),
                Color::BrightBlue,
            )?;
            String::from_utf8_lossy(&pretty).into_owned()
        } else {
            serde_json::to_string(&object)?
        };

        if self.escape_html {
            buf.extend_from_slice(escape_html(&rendered).as_bytes());
        } else {
            buf.extend_from_slice(rendered.as_bytes());
        }
        buf.push(b'\n');
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}
