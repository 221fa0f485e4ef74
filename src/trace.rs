//! Tracing infrastructure for step-by-step comparison of refinement runs.
//!
//! When the `trace` feature is enabled, engines that were handed a
//! `TraceWriter` record one tagged line per event. Two runs (serial vs.
//! parallel, before vs. after a refactor) can then be diffed line by line.
//!
//! The trace output format is a series of tagged lines:
//! ```text
//! TRACE LEARN round=<k> mid=<point> queue=<len>
//! TRACE REFINE rect=<rect> children=<count>
//! TRACE HAUSDORFF round=<k> lo=<val> hi=<val>
//! ```

use std::fmt::Write as FmtWrite;
use std::sync::Mutex;

/// A thread-safe buffer that collects trace lines.
pub struct TraceWriter {
    buffer: Mutex<String>,
}

impl TraceWriter {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(String::with_capacity(16 * 1024)),
        }
    }

    fn buffer(&self) -> std::sync::MutexGuard<'_, String> {
        // A panic while holding the lock leaves a usable string behind.
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write a trace line.
    pub fn write_line(&self, line: &str) {
        let mut buf = self.buffer();
        buf.push_str(line);
        buf.push('\n');
    }

    /// Write a trace line using format args.
    pub fn write_fmt(&self, args: std::fmt::Arguments<'_>) {
        let mut buf = self.buffer();
        let _ = buf.write_fmt(args);
        buf.push('\n');
    }

    /// All collected trace output.
    pub fn get_output(&self) -> String {
        self.buffer().clone()
    }

    /// Trace output split into lines.
    pub fn get_lines(&self) -> Vec<String> {
        self.buffer().lines().map(|s| s.to_string()).collect()
    }
}

impl Default for TraceWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TraceWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceWriter")
            .field("lines", &self.buffer().lines().count())
            .finish()
    }
}

/// Macro for conditional trace output (only active with `trace` feature).
#[cfg(feature = "trace")]
#[macro_export]
macro_rules! trace_write {
    ($tracer:expr, $($arg:tt)*) => {
        if let Some(ref tw) = $tracer {
            tw.write_fmt(format_args!($($arg)*));
        }
    };
}

/// No-op when trace feature is disabled.
#[cfg(not(feature = "trace"))]
#[macro_export]
macro_rules! trace_write {
    ($tracer:expr, $($arg:tt)*) => {
        let _ = &$tracer;
    };
}
