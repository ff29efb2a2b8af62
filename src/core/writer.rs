//! `io::Write` adapter that turns written lines into log calls

use super::{entry::Entry, error::LoggerError, level::Level};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::{self, Write};
use std::thread::{self, JoinHandle};

/// Longest line the reader accepts before giving up.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Pipe whose reading end logs one entry per line.
///
/// Bytes written here travel over a channel to a background thread, which
/// splits them on `\n` and logs every line at the writer's level through the
/// originating entry. A final line without a newline is logged on close.
///
/// Call [`LogWriter::close`] to flush the pipe and wait for the reader.
/// Dropping the writer closes the pipe without waiting.
///
/// ```
/// use std::io::Write;
/// use rust_field_logger::{hooks::MemoryHook, Level};
///
/// let (logger, hook) = MemoryHook::null_logger();
/// let mut writer = logger.writer_level(Level::Warn);
/// writeln!(writer, "disk almost full").unwrap();
/// writer.close();
///
/// assert_eq!(hook.last_entry().unwrap().message, "disk almost full");
/// ```
pub struct LogWriter {
    level: Level,
    sender: Option<Sender<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl LogWriter {
    pub(crate) fn spawn(entry: Entry, level: Level) -> Self {
        let (sender, receiver) = unbounded();
        let reader = thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || scan_lines(&entry, level, &receiver));

        match reader {
            Ok(handle) => Self {
                level,
                sender: Some(sender),
                reader: Some(handle),
            },
            Err(e) => {
                eprintln!("Failed to start log writer, {}", e);
                Self {
                    level,
                    sender: None,
                    reader: None,
                }
            }
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Close the pipe and wait until every written line has been logged.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.sender.take();
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                eprintln!("Log writer thread panicked");
            }
        }
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, LoggerError::WriterClosed)
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let sender = self.sender.as_ref().ok_or_else(closed)?;
        if buf.is_empty() {
            return Ok(0);
        }
        sender.send(buf.to_vec()).map_err(|_| closed())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        // Closing the channel lets the reader drain and exit on its own.
        self.sender.take();
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("level", &self.level)
            .field("open", &self.sender.is_some())
            .finish()
    }
}

fn emit(entry: &Entry, level: Level, line: &[u8]) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    entry.log_at(level, String::from_utf8_lossy(line).into_owned());
}

fn scan_lines(entry: &Entry, level: Level, receiver: &Receiver<Vec<u8>>) {
    let mut pending: Vec<u8> = Vec::new();

    for chunk in receiver.iter() {
        pending.extend_from_slice(&chunk);

        let mut start = 0;
        while let Some(offset) = pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            emit(entry, level, &pending[start..end]);
            start = end + 1;
        }
        pending.drain(..start);

        if pending.len() > MAX_LINE_LENGTH {
            entry.error_fmt(format_args!(
                "Error while reading from Writer: line exceeds {} bytes",
                MAX_LINE_LENGTH
            ));
            // Dropping the receiver makes later writes fail.
            return;
        }
    }

    if !pending.is_empty() {
        emit(entry, level, &pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::memory::MemoryHook;

    #[test]
    fn test_lines_become_entries() {
        let (logger, hook) = MemoryHook::null_logger();
        let mut writer = logger.with_field("source", "child").writer();

        writer.write_all(b"first line\nsecond ").unwrap();
        writer.write_all(b"line\r\nthird").unwrap();
        writer.close();

        let entries = hook.entries();
        let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first line", "second line", "third"]);
        assert!(entries.iter().all(|e| e.level == Level::Info));
        assert!(entries.iter().all(|e| e.data["source"] == "child"));
    }

    #[test]
    fn test_writer_level_respects_threshold() {
        let (logger, hook) = MemoryHook::null_logger();
        logger.set_level(Level::Warn);

        let mut debug = logger.writer_level(Level::Debug);
        writeln!(debug, "hidden").unwrap();
        debug.close();

        let mut error = logger.writer_level(Level::Error);
        writeln!(error, "shown").unwrap();
        error.close();

        assert_eq!(hook.len(), 1);
        assert_eq!(hook.last_entry().unwrap().level, Level::Error);
    }

    #[test]
    fn test_oversized_line_stops_reader() {
        let (logger, hook) = MemoryHook::null_logger();
        let mut writer = logger.writer();

        writer.write_all(&vec![b'x'; MAX_LINE_LENGTH + 1]).unwrap();
        // Wait for the reader to give up.
        let reader = writer.reader.take().unwrap();
        reader.join().unwrap();

        let last = hook.last_entry().unwrap();
        assert_eq!(last.level, Level::Error);
        assert!(last.message.starts_with("Error while reading from Writer:"));

        let err = writer.write_all(b"more\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(err.to_string(), "log writer is closed");
    }

    #[test]
    fn test_drop_without_close_drains() {
        let (logger, hook) = MemoryHook::null_logger();
        let mut writer = logger.writer();
        writeln!(writer, "abandoned").unwrap();
        let reader = writer.reader.take().unwrap();
        drop(writer);

        reader.join().unwrap();
        assert_eq!(hook.last_entry().unwrap().message, "abandoned");
    }

    #[test]
    fn test_panic_level_unwinds_reader() {
        let (logger, hook) = MemoryHook::null_logger();
        let mut writer = logger.writer_level(Level::Panic);
        writer.write_all(b"boom\nnever read\n").unwrap();

        let reader = writer.reader.take().unwrap();
        let payload = reader.join().unwrap_err();
        let entry = Entry::from_panic(payload).ok().unwrap();
        assert_eq!(entry.level, Level::Panic);
        assert_eq!(entry.message, "boom");

        assert_eq!(hook.len(), 1);
        let err = writer.write_all(b"more\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
