#![deny(missing_docs)]
//! Shared logging utilities for the explorer workspace.
//!
//! This crate provides the `explorer_*` logging macros used by the core,
//! the engine and the host application, and a test initializer for the
//! global logger. Every macro forwards to the `log` facade, so whichever
//! backend the host installs receives the records.

/// Log target used for search-session lifecycle records.
///
/// Hosts can raise or lower this target independently of the rest of the
/// crate when tracing trigger and tick traffic.
pub const SESSION_TARGET: &str = "explorer::session";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! explorer_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! explorer_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! explorer_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! explorer_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! explorer_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs a session lifecycle message at info level under [`SESSION_TARGET`].
#[macro_export]
macro_rules! session_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::SESSION_TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Trace in debug builds so stale-tick drops show up; info in release.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Trace
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
