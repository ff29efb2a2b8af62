//! Call-site lookup for the `caller` and `trace` output fields
//!
//! The stack is walked fresh on every call. Frames that belong to this crate
//! are skipped (unless they live in a `tests` module) as are frames of the
//! standard library and the stack walker itself, so the first remaining frame
//! is the application code that issued the log call.

use backtrace::{resolve_frame, trace as walk_stack, SymbolName};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicIsize, Ordering};

/// Upper bound on logical frames collected per walk.
pub const MAX_FRAMES: usize = 128;

const LIBRARY_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

const RUNTIME_PREFIXES: &[&str] = &["std::", "core::", "alloc::", "backtrace::", "test::"];

static CALLER_LEVEL: AtomicIsize = AtomicIsize::new(0);

/// Shift reported call sites by `level` frames relative to the first
/// application frame.
///
/// A wrapper around the logger sets a positive offset to report its own
/// caller instead of itself. Offsets that point outside the stack fall back to
/// the unshifted frame.
pub fn set_caller_level(level: isize) {
    CALLER_LEVEL.store(level, Ordering::Relaxed);
}

pub fn caller_level() -> isize {
    CALLER_LEVEL.load(Ordering::Relaxed)
}

/// One resolved logical frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: Option<String>,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
}

impl Frame {
    /// Judged on the symbol alone, since builds without debuginfo resolve
    /// names but no source locations.
    fn is_runtime(&self) -> bool {
        match self.function.as_deref() {
            // Rust symbols carry a crate path; bare names are C entry points.
            Some(function) => {
                !function.contains("::")
                    || RUNTIME_PREFIXES.iter().any(|p| function.starts_with(p))
            }
            None => true,
        }
    }

    fn is_library(&self) -> bool {
        self.function
            .as_deref()
            .map_or(false, |f| f.starts_with(LIBRARY_PREFIX) && !f.contains("::tests::"))
    }

    fn qualifies(&self) -> bool {
        !self.is_runtime() && !self.is_library()
    }

    /// `file.rs:42 crate::module::function`
    pub fn location(&self) -> String {
        let file = self
            .file
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "???".to_string());
        format!(
            "{}:{} {}",
            file,
            self.line.unwrap_or(0),
            self.function.as_deref().unwrap_or("???")
        )
    }
}

fn function_name(name: &SymbolName<'_>) -> String {
    // Alternate form omits the trailing hash.
    let rendered = format!("{:#}", name);
    rendered.trim_start_matches(['<', '&']).to_string()
}

/// Collect the current stack as logical frames, innermost first.
pub fn capture_frames() -> Vec<Frame> {
    let mut frames = Vec::new();
    walk_stack(|raw| {
        let mut resolved_any = false;
        resolve_frame(raw, |symbol| {
            resolved_any = true;
            if frames.len() < MAX_FRAMES {
                frames.push(Frame {
                    function: symbol.name().map(|name| function_name(&name)),
                    file: symbol.filename().map(Path::to_path_buf),
                    line: symbol.lineno(),
                });
            }
        });
        if !resolved_any && frames.len() < MAX_FRAMES {
            frames.push(Frame {
                function: None,
                file: None,
                line: None,
            });
        }
        frames.len() < MAX_FRAMES
    });
    frames
}

fn shifted(frames: &[Frame], idx: usize, level: isize) -> &Frame {
    if level == 0 {
        return &frames[idx];
    }
    idx.checked_add_signed(level)
        .and_then(|target| frames.get(target))
        .unwrap_or(&frames[idx])
}

/// Location of the first application frame, or an empty string when the
/// whole stack belongs to the library or the runtime.
pub fn get_caller() -> String {
    let frames = capture_frames();
    let level = caller_level();
    frames
        .iter()
        .position(Frame::qualifies)
        .map(|idx| shifted(&frames, idx, level).location())
        .unwrap_or_default()
}

/// Locations of every application frame, innermost first.
pub fn get_trace() -> Vec<String> {
    let frames = capture_frames();
    let level = caller_level();
    frames
        .iter()
        .enumerate()
        .filter(|(_, frame)| frame.qualifies())
        .map(|(idx, _)| shifted(&frames, idx, level).location())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(function: &str, file: &str, line: u32) -> Frame {
        Frame {
            function: Some(function.to_string()),
            file: Some(PathBuf::from(file)),
            line: Some(line),
        }
    }

    #[test]
    fn test_location_uses_basename() {
        let f = frame("app::handler", "/src/app/handler.rs", 42);
        assert_eq!(f.location(), "handler.rs:42 app::handler");
    }

    #[test]
    fn test_frame_classification() {
        assert!(frame("app::main", "main.rs", 1).qualifies());
        assert!(!frame("std::rt::lang_start", "rt.rs", 1).qualifies());
        let library = format!("{}core::entry::Entry::info", LIBRARY_PREFIX);
        assert!(!frame(&library, "entry.rs", 1).qualifies());
        let library_test = format!("{}core::caller::tests::t", LIBRARY_PREFIX);
        assert!(frame(&library_test, "caller.rs", 1).qualifies());

        let c_entry = Frame {
            function: Some("__libc_start_main".to_string()),
            file: None,
            line: None,
        };
        assert!(!c_entry.qualifies());

        let unresolved = Frame {
            function: None,
            file: None,
            line: None,
        };
        assert!(!unresolved.qualifies());
    }

    #[test]
    fn test_frame_without_debuginfo_qualifies() {
        let stripped = Frame {
            function: Some("app::main".to_string()),
            file: None,
            line: None,
        };
        assert!(stripped.qualifies());
        assert_eq!(stripped.location(), "???:0 app::main");

        let runtime = Frame {
            function: Some("std::rt::lang_start".to_string()),
            file: None,
            line: None,
        };
        assert!(!runtime.qualifies());
    }

    #[test]
    fn test_shifted_falls_back_out_of_range() {
        let frames = vec![frame("a", "a.rs", 1), frame("b", "b.rs", 2)];
        assert_eq!(shifted(&frames, 0, 1).location(), "b.rs:2 b");
        assert_eq!(shifted(&frames, 0, 5).location(), "a.rs:1 a");
        assert_eq!(shifted(&frames, 0, -1).location(), "a.rs:1 a");
        assert_eq!(shifted(&frames, 1, -1).location(), "a.rs:1 a");
    }

    #[test]
    fn test_get_caller_reports_test_frame() {
        let caller = get_caller();
        assert!(caller.contains("test_get_caller_reports_test_frame"), "caller was {:?}", caller);
        // Source locations need debuginfo.
        if cfg!(debug_assertions) {
            assert!(caller.starts_with("caller.rs:"), "caller was {:?}", caller);
        }
    }

    #[test]
    fn test_get_trace_is_bounded_and_fresh() {
        let first = get_trace();
        let second = get_trace();
        assert!(!first.is_empty());
        assert!(first.len() <= MAX_FRAMES);
        assert!(first[0].contains("test_get_trace_is_bounded_and_fresh"));
        assert_eq!(first.len(), second.len());
    }
}
