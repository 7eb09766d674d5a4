#![deny(missing_docs)]
//! Shared logging utilities for the harvester workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every message is
//! prefixed with the scroll tick of the session running on the current thread,
//! so interleaved mutation and tick output can be told apart in a log file.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the current scroll tick count.
    static SCROLL_TICK: Cell<u64> = const { Cell::new(0) };
}

/// Sets the scroll tick count for the current thread.
/// The session runtime calls this once per scroll tick.
pub fn set_scroll_tick(tick: u64) {
    SCROLL_TICK.with(|v| v.set(tick));
}

/// Retrieves the scroll tick count for the current thread.
/// Returns 0 before the first tick.
pub fn scroll_tick() -> u64 {
    SCROLL_TICK.with(|v| v.get())
}

/// Logs a trace-level message prefixed with the scroll tick.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[tick {}] {}", $crate::scroll_tick(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message prefixed with the scroll tick.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[tick {}] {}", $crate::scroll_tick(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message prefixed with the scroll tick.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[tick {}] {}", $crate::scroll_tick(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message prefixed with the scroll tick.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[tick {}] {}", $crate::scroll_tick(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message prefixed with the scroll tick.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[tick {}] {}", $crate::scroll_tick(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{scroll_tick, set_scroll_tick};

    #[test]
    fn tick_is_per_thread() {
        set_scroll_tick(7);
        assert_eq!(scroll_tick(), 7);
        let other = std::thread::spawn(scroll_tick).join().unwrap();
        assert_eq!(other, 0);
    }
}
