#![deny(missing_docs)]
//! Shared logging utilities for the coder workspace.
//!
//! The `coder_*` macros log through the `log` facade with the caller's
//! module as target. While a coding session is active its id is prefixed to
//! every line, so interleaved runs can be told apart in `coder.log`.

use std::fmt;
use std::sync::{PoisonError, RwLock};

#[doc(hidden)]
pub use log as __log;

static SESSION_TAG: RwLock<Option<String>> = RwLock::new(None);

/// Sets the session id prefixed to subsequent log lines; `None` removes it.
///
/// The tag is process-wide rather than per thread because sync work hops
/// between runtime worker threads.
pub fn set_session_tag(tag: Option<&str>) {
    let mut current = SESSION_TAG.write().unwrap_or_else(PoisonError::into_inner);
    *current = tag.map(str::to_owned);
}

/// The session id currently prefixed to log lines, if any.
pub fn session_tag() -> Option<String> {
    SESSION_TAG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Emits one record; used by the logging macros.
#[doc(hidden)]
pub fn __emit(target: &str, level: log::Level, args: fmt::Arguments<'_>) {
    if level > log::max_level() {
        return;
    }
    match session_tag() {
        Some(tag) => log::log!(target: target, level, "[{}] {}", tag, args),
        None => log::log!(target: target, level, "{}", args),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! coder_trace {
    ($($arg:tt)*) => {{
        $crate::__emit(module_path!(), $crate::__log::Level::Trace, format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! coder_debug {
    ($($arg:tt)*) => {{
        $crate::__emit(module_path!(), $crate::__log::Level::Debug, format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! coder_info {
    ($($arg:tt)*) => {{
        $crate::__emit(module_path!(), $crate::__log::Level::Info, format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! coder_warn {
    ($($arg:tt)*) => {{
        $crate::__emit(module_path!(), $crate::__log::Level::Warn, format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! coder_error {
    ($($arg:tt)*) => {{
        $crate::__emit(module_path!(), $crate::__log::Level::Error, format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tag_is_set_and_cleared() {
        initialize_for_tests();
        set_session_tag(Some("s-42"));
        assert_eq!(session_tag().as_deref(), Some("s-42"));
        coder_info!("tagged line {}", 1);

        set_session_tag(None);
        assert_eq!(session_tag(), None);
        coder_debug!("untagged line");
    }
}
