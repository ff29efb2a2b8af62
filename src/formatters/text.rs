//! `key="value"` line formatter

use super::{escape_ascii, paint, Collect, FieldLabel, FieldMap, Formatter, LogData};
use crate::core::{entry::Entry, error::Result, timestamp::TimestampFormat};
use colored::Color;

/// Renders one line of quoted `key="value"` pairs:
///
/// ```text
/// time="2025-01-08T10:30:45.123Z" level="info" msg="hello" data.user="ana" caller="main.rs:12 app::main" host="web-1"
/// ```
///
/// User fields are written under the data label. Values are escaped to
/// printable ASCII so every entry stays on one line.
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    pub disable_timestamp: bool,
    pub disable_hostname: bool,
    pub disable_caller: bool,

    /// Color even when `terminal` is false.
    pub force_colors: bool,
    pub disable_colors: bool,

    /// Whether the destination is a terminal. Colors are used when set,
    /// unless disabled.
    pub terminal: bool,

    pub timestamp_format: TimestampFormat,
    pub field_map: FieldMap,
}

impl TextFormatter {
    fn use_colors(&self) -> bool {
        (self.force_colors || self.terminal) && !self.disable_colors
    }
}

struct Line<'a> {
    buf: &'a mut Vec<u8>,
    colors: bool,
    empty: bool,
}

impl Line<'_> {
    fn pair(&mut self, key: &str, key_color: Color, value: &str, value_color: Color) {
        if !self.empty {
            self.buf.push(b' ');
        }
        self.empty = false;

        let (key_color, value_color) = if self.colors {
            (Some(key_color), Some(value_color))
        } else {
            (None, None)
        };
        paint(self.buf, key_color, key);
        self.buf.extend_from_slice(b"=\"");
        paint(self.buf, value_color, value);
        self.buf.push(b'"');
    }
}

impl Formatter for TextFormatter {
    fn format_into(&self, entry: &Entry, buf: &mut Vec<u8>) -> Result<()> {
        let data = LogData::collect(
            entry,
            &self.field_map,
            Collect {
                caller: !self.disable_caller,
                trace: false,
            },
        );

        // Render values first so an unrepresentable one leaves `buf` untouched.
        let data_label = self.field_map.resolve(FieldLabel::Data);
        let mut fields = Vec::with_capacity(data.data.len());
        for (key, value) in &data.data {
            fields.push((
                format!("{}.{}", data_label, key),
                escape_ascii(&value.to_text()?),
            ));
        }

        let level_color = data.level.color();
        let mut line = Line {
            buf,
            colors: self.use_colors(),
            empty: true,
        };

        if !self.disable_timestamp {
            line.pair(
                self.field_map.resolve(FieldLabel::Time),
                level_color,
                &self.timestamp_format.format(&data.time),
                Color::Cyan,
            );
        }
        line.pair(
            self.field_map.resolve(FieldLabel::Level),
            level_color,
            data.level.as_str(),
            level_color,
        );
        if !data.message.is_empty() {
            line.pair(
                self.field_map.resolve(FieldLabel::Msg),
                level_color,
                &escape_ascii(&data.message),
                Color::BrightWhite,
            );
        }
        if let Some(ref err) = data.error {
            line.pair(
                self.field_map.resolve(FieldLabel::Error),
                level_color,
                &escape_ascii(err),
                Color::Red,
            );
        }
        for (key, value) in &fields {
            line.pair(key, Color::BrightBlue, value, Color::Yellow);
        }
        if !data.caller.is_empty() {
            line.pair(
                self.field_map.resolve(FieldLabel::Caller),
                level_color,
                &escape_ascii(&data.caller),
                Color::BrightBlack,
            );
        }
        if !self.disable_hostname && !data.host.is_empty() {
            line.pair(
                self.field_map.resolve(FieldLabel::Host),
                level_color,
                &escape_ascii(&data.host),
                Color::Blue,
            );
        }

        line.buf.push(b'\n');
        Ok(())
    }

    fn name(&self) -> &str {
        "text"
    }
}
