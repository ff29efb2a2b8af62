//! Exit handlers run before a fatal log terminates the process

use parking_lot::{const_mutex, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type ExitHandler = Arc<dyn Fn() + Send + Sync>;

static HANDLERS: Mutex<Vec<ExitHandler>> = const_mutex(Vec::new());

/// Append a handler to run when the process exits through [`exit`] or a
/// fatal log call.
///
/// Handlers run in registration order, each to completion. Use this to flush
/// or close resources that would otherwise be lost, since `std::process::exit`
/// skips destructors.
pub fn register_exit_handler<F>(handler: F)
where
    F: Fn() + Send + Sync + 'static,
{
    HANDLERS.lock().push(Arc::new(handler));
}

/// Prepend a handler so it runs before every handler registered so far.
pub fn defer_exit_handler<F>(handler: F)
where
    F: Fn() + Send + Sync + 'static,
{
    HANDLERS.lock().insert(0, Arc::new(handler));
}

/// Number of registered handlers.
pub fn exit_handler_count() -> usize {
    HANDLERS.lock().len()
}

/// Run every registered handler in order.
///
/// A panicking handler is reported to stderr and the remaining handlers still
/// run. Handlers may register further handlers; those run on the next call.
pub fn run_exit_handlers() {
    let snapshot: Vec<ExitHandler> = HANDLERS.lock().clone();

    for (idx, handler) in snapshot.iter().enumerate() {
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| handler())) {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            eprintln!("Error: exit handler #{} panicked: {}", idx, panic_msg);
        }
    }
}

/// Run all exit handlers, then terminate the process with `code`.
pub fn exit(code: i32) -> ! {
    run_exit_handlers();
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_register() {
        let before = exit_handler_count();
        register_exit_handler(|| {});
        assert!(exit_handler_count() > before);
    }

    #[test]
    fn test_run_order_and_panic_isolation() {
        static STEP: AtomicUsize = AtomicUsize::new(0);
        static FIRST_AT: AtomicUsize = AtomicUsize::new(usize::MAX);
        static LAST_AT: AtomicUsize = AtomicUsize::new(usize::MAX);

        register_exit_handler(|| {
            FIRST_AT.store(STEP.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        });
        register_exit_handler(|| panic!("bad handler"));
        register_exit_handler(|| {
            LAST_AT.store(STEP.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        });

        run_exit_handlers();

        let first = FIRST_AT.load(Ordering::SeqCst);
        let last = LAST_AT.load(Ordering::SeqCst);
        assert_ne!(last, usize::MAX, "handler after the panicking one must run");
        assert!(first < last);
    }
}
