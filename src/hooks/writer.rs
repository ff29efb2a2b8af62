//! Hook that copies selected levels to a second sink

use crate::core::{
    entry::Entry,
    error::{LoggerError, Result},
    hooks::Hook,
    level::Level,
    secrets,
};
use crate::formatters::{Formatter, TextFormatter};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Renders entries with a formatter of its own and writes them to a
/// secondary sink, e.g. errors to a separate file.
pub struct WriterHook {
    levels: Vec<Level>,
    formatter: Arc<dyn Formatter>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterHook {
    pub fn new<W: Write + Send + 'static>(writer: W, levels: impl Into<Vec<Level>>) -> Self {
        Self {
            levels: levels.into(),
            formatter: Arc::new(TextFormatter {
                disable_colors: true,
                ..TextFormatter::default()
            }),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Append to the file at `path`, creating it if needed.
    ///
    /// ```no_run
    /// use rust_field_logger::{hooks::WriterHook, Level};
    ///
    /// let hook = WriterHook::file("/var/log/app-errors.log", [Level::Error, Level::Fatal]).unwrap();
    /// ```
    pub fn file(path: impl AsRef<Path>, levels: impl Into<Vec<Level>>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening hook file",
                    format!("cannot open {}", path.display()),
                    e,
                )
            })?;
        Ok(Self::new(BufWriter::new(file), levels))
    }

    /// Every level at or above `threshold`.
    pub fn at_least(threshold: Level) -> Vec<Level> {
        Level::ALL
            .iter()
            .copied()
            .filter(|level| Level::enabled(threshold, *level))
            .collect()
    }

    #[must_use]
    pub fn with_formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

impl Hook for WriterHook {
    fn levels(&self) -> Vec<Level> {
        self.levels.clone()
    }

    fn fire(&self, entry: &Entry) -> Result<()> {
        let mut buf = self.formatter.format(entry)?;
        secrets::redact_in_place(&mut buf);

        let mut writer = self.writer.lock();
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }
}

impl Drop for WriterHook {
    fn drop(&mut self) {
        let _ = self.writer.get_mut().flush();
    }
}

impl std::fmt::Debug for WriterHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterHook")
            .field("levels", &self.levels)
            .field("formatter", &self.formatter.name())
            .finish_non_exhaustive()
    }
}
