//! Hook that records entries in memory, for tests

use crate::core::{entry::Entry, error::Result, hooks::Hook, level::Level, logger::Logger};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every entry it is fired with.
///
/// ```
/// use rust_field_logger::hooks::MemoryHook;
///
/// let (logger, hook) = MemoryHook::null_logger();
/// logger.with_field("k", "v").error("failed");
///
/// let entry = hook.last_entry().unwrap();
/// assert_eq!(entry.message, "failed");
/// assert_eq!(entry.data["k"], "v");
/// ```
#[derive(Debug, Default)]
pub struct MemoryHook {
    entries: Mutex<Vec<Entry>>,
}

impl MemoryHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new hook to `logger` for every level.
    ///
    /// Recorded entries hold their logger, and the logger holds the hook, so
    /// neither is freed while entries remain. Call [`MemoryHook::reset`] to
    /// release them.
    pub fn install(logger: &Logger) -> Arc<MemoryHook> {
        let hook = Arc::new(MemoryHook::new());
        logger.add_hook(hook.clone());
        hook
    }

    /// Logger that renders nothing, with a recording hook attached.
    pub fn null_logger() -> (Logger, Arc<MemoryHook>) {
        let logger = Logger::builder().output(std::io::sink()).build();
        let hook = Self::install(&logger);
        (logger, hook)
    }

    /// Snapshot of the recorded entries, oldest first.
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    pub fn last_entry(&self) -> Option<Entry> {
        self.entries.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop the recorded entries, along with the logger handles they hold.
    pub fn reset(&self) {
        self.entries.lock().clear();
    }
}

impl Hook for MemoryHook {
    fn levels(&self) -> Vec<Level> {
        Level::ALL.to_vec()
    }

    fn fire(&self, entry: &Entry) -> Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
