#![deny(missing_docs)]
//! Shared logging utilities for the genwatch workspace.
//!
//! Several sessions can be alive in one process, so every `genwatch_*` macro
//! takes an optional `session: <user id>;` prefix that tags the line:
//!
//! ```ignore
//! genwatch_warn!(session: user_id; "Push channel lost, reconnecting");
//! // [u1] Push channel lost, reconnecting
//! ```

/// Shared body of the level macros. Not part of the public surface.
#[doc(hidden)]
#[macro_export]
macro_rules! __genwatch_log {
    ($level:expr, session: $session:expr; $($arg:tt)*) => {{
        log::log!($level, "[{}] {}", $session, format_args!($($arg)*));
    }};
    ($level:expr, $($arg:tt)*) => {{
        log::log!($level, $($arg)*);
    }};
}

/// Logs a trace-level message, optionally tagged with a session.
#[macro_export]
macro_rules! genwatch_trace {
    ($($arg:tt)*) => {
        $crate::__genwatch_log!(log::Level::Trace, $($arg)*)
    };
}

/// Logs a debug-level message, optionally tagged with a session.
#[macro_export]
macro_rules! genwatch_debug {
    ($($arg:tt)*) => {
        $crate::__genwatch_log!(log::Level::Debug, $($arg)*)
    };
}

/// Logs an info-level message, optionally tagged with a session.
#[macro_export]
macro_rules! genwatch_info {
    ($($arg:tt)*) => {
        $crate::__genwatch_log!(log::Level::Info, $($arg)*)
    };
}

/// Logs a warn-level message, optionally tagged with a session.
#[macro_export]
macro_rules! genwatch_warn {
    ($($arg:tt)*) => {
        $crate::__genwatch_log!(log::Level::Warn, $($arg)*)
    };
}

/// Logs an error-level message, optionally tagged with a session.
#[macro_export]
macro_rules! genwatch_error {
    ($($arg:tt)*) => {
        $crate::__genwatch_log!(log::Level::Error, $($arg)*)
    };
}

/// Initializes a terminal logger for genwatch crates in tests.
///
/// Dependency crates (hyper, tungstenite, wiremock) are filtered out. This
/// no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("genwatch")
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
