//! Internal logging system for the Orrery engine
//!
//! This module provides a small pluggable logging system:
//! - Customizable logger via the Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - File and line information for ERROR logs
//!
//! Device selection, queue negotiation, swapchain (re)creation and uploads
//! all report through the `engine_*` macros below.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to redirect engine logs (file logging, test capture, etc.)
///
/// # Example
///
/// ```no_run
/// use orrery_engine::orrery::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "orrery::vulkan", "orrery::vulkan::swapchain")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (with file:line details)
    Error,
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    /// Format a timestamp as `YYYY-MM-DD HH:MM:SS.mmm` in local time
    pub fn format_timestamp(timestamp: SystemTime) -> String {
        let datetime: DateTime<Local> = timestamp.into();
        datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let timestamp = Self::format_timestamp(entry.timestamp);

        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                severity_str,
                source,
                entry.message
            );
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::orrery::Engine::log(
            $crate::orrery::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
///
/// # Example
///
/// ```no_run
/// # use orrery_engine::engine_debug;
/// # let size = 64;
/// engine_debug!("orrery::vulkan", "Uploading {} bytes", size);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::orrery::Engine::log(
            $crate::orrery::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::orrery::Engine::log(
            $crate::orrery::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::orrery::Engine::log(
            $crate::orrery::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```no_run
/// # use orrery_engine::engine_error;
/// # let error = "device lost";
/// engine_error!("orrery::vulkan", "Failed to submit upload: {}", error);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::orrery::Engine::log_detailed(
            $crate::orrery::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

// ===== ERROR HELPERS =====

/// Log an ERROR message and evaluate to an `Error::BackendError` with the same text
///
/// # Example
///
/// ```no_run
/// # use orrery_engine::engine_err;
/// let error = engine_err!("orrery::vulkan", "Image index {} out of range", 7);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::orrery::Engine::log_detailed(
            $crate::orrery::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::orrery::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an `Error::BackendError`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log an ERROR message and evaluate to a typed driver failure
///
/// `$kind` names one of the `{ operation, status }` variants of `Error`.
/// A literal status is taken as written; any other status is rendered with
/// `{:?}` so driver codes keep their symbolic name.
///
/// # Example
///
/// ```no_run
/// # use orrery_engine::engine_fail;
/// # #[derive(Debug)] struct Status;
/// # let status = Status;
/// let error = engine_fail!("orrery::vulkan", SubmitFailed, "vkQueueSubmit", status);
/// let error = engine_fail!("orrery::vulkan", SwapchainCreationFailed, "choose surface format", "surface reports no formats");
/// ```
#[macro_export]
macro_rules! engine_fail {
    (@build $source:expr, $kind:ident, $operation:expr, $status:expr) => {{
        let error = $crate::orrery::Error::$kind {
            operation: ($operation).to_string(),
            status: $status,
        };
        $crate::orrery::Engine::log_detailed(
            $crate::orrery::log::LogSeverity::Error,
            $source,
            error.to_string(),
            file!(),
            line!()
        );
        error
    }};
    ($source:expr, $kind:ident, $operation:expr, $status:literal) => {
        $crate::engine_fail!(@build $source, $kind, $operation, ($status).to_string())
    };
    ($source:expr, $kind:ident, $operation:expr, $status:expr) => {
        $crate::engine_fail!(@build $source, $kind, $operation, format!("{:?}", $status))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
