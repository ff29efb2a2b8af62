//! Hook trait and the per-level hook registry

use super::{
    entry::Entry,
    error::{LoggerError, Result},
    level::Level,
};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Side effect fired for every entry logged at one of its levels.
///
/// Hooks run synchronously while the logger's write lock is held, so slow
/// hooks should hand work off to a thread of their own.
pub trait Hook: Send + Sync {
    /// Levels this hook fires for.
    fn levels(&self) -> Vec<Level>;

    fn fire(&self, entry: &Entry) -> Result<()>;
}

/// Ordered hook buckets keyed by level.
#[derive(Clone, Default)]
pub struct LevelHooks {
    buckets: HashMap<Level, Vec<Arc<dyn Hook>>>,
}

impl LevelHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hook` to the bucket of every level it declares.
    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        for level in hook.levels() {
            self.buckets.entry(level).or_default().push(Arc::clone(&hook));
        }
    }

    /// Number of hooks registered for `level`.
    pub fn len(&self, level: Level) -> usize {
        self.buckets.get(&level).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Fire every hook registered for `level`, in insertion order.
    ///
    /// A hook that fails or panics is reported to stderr and the remaining
    /// hooks still run. Returns `HookFailed` when any of them failed.
    pub fn fire(&self, level: Level, entry: &Entry) -> Result<()> {
        let Some(bucket) = self.buckets.get(&level) else {
            return Ok(());
        };

        let mut failed = 0;
        for (idx, hook) in bucket.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| hook.fire(entry))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("Failed to fire hook: {}", e);
                    failed += 1;
                }
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    eprintln!(
                        "Failed to fire hook: hook #{} panicked: {}. Other hooks continue to run.",
                        idx, panic_msg
                    );
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            Err(LoggerError::hook_failed(failed, bucket.len()))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for LevelHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(Level, usize)> =
            self.buckets.iter().map(|(level, hooks)| (*level, hooks.len())).collect();
        counts.sort();
        f.debug_struct("LevelHooks").field("buckets", &counts).finish()
    }
}
