#![deny(missing_docs)]
//! Shared logging utilities for the extraction workspace.
//!
//! This crate provides the `extract_*` logging macros used across the codebase,
//! a drop-guard that reports how long a pipeline stage took, and a minimal
//! test initializer for the global logger.

use std::time::{Duration, Instant};

#[doc(hidden)]
pub use log;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! extract_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! extract_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! extract_info {
    ($($arg:tt)*) => {{
        $crate::log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! extract_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! extract_error {
    ($($arg:tt)*) => {{
        $crate::log::error!($($arg)*);
    }};
}

/// Measures one stage of an extraction and logs its duration when dropped.
///
/// ```
/// let _timer = extract_logging::StageTimer::new("fetch", "https://example.com");
/// // ... stage work ...
/// ```
pub struct StageTimer {
    stage: &'static str,
    subject: String,
    started: Instant,
}

impl StageTimer {
    /// Starts timing `stage` for `subject` (usually the page URL).
    pub fn new(stage: &'static str, subject: impl Into<String>) -> Self {
        Self {
            stage,
            subject: subject.into(),
            started: Instant::now(),
        }
    }

    /// Time elapsed since the timer was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        log::debug!(
            "stage {} for {} took {} ms",
            self.stage,
            self.subject,
            self.started.elapsed().as_millis()
        );
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Never,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_timer_reports_monotonic_elapsed() {
        initialize_for_tests();
        let timer = StageTimer::new("unit", "subject");
        let first = timer.elapsed();
        let second = timer.elapsed();
        assert!(second >= first);
        extract_info!("timer for {} alive", "subject");
    }
}
