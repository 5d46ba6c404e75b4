//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger and the error helper macros.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::orrery::{Engine, Error};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "orrery::test".to_string(),
        message: format!("{:?} message", severity),
        file,
        line,
    }
}

/// Captures entries emitted under one source so parallel tests do not interfere
struct CapturingLogger {
    source: &'static str,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == self.source {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

fn capture(source: &'static str) -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CapturingLogger { source, entries: entries.clone() });
    entries
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Info), "Info");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_creation_with_file_line() {
    let entry = entry(LogSeverity::Error, Some("vulkan.rs"), Some(42));

    assert_eq!(entry.severity, LogSeverity::Error);
    assert_eq!(entry.source, "orrery::test");
    assert_eq!(entry.file, Some("vulkan.rs"));
    assert_eq!(entry.line, Some(42));
}

#[test]
fn test_log_entry_clone() {
    let entry1 = entry(LogSeverity::Warn, Some("test.rs"), Some(10));
    let entry2 = entry1.clone();

    assert_eq!(entry1.severity, entry2.severity);
    assert_eq!(entry1.source, entry2.source);
    assert_eq!(entry1.message, entry2.message);
    assert_eq!(entry1.file, entry2.file);
    assert_eq!(entry1.line, entry2.line);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;

    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("test.rs"), Some(42)));
    }
}

#[test]
fn test_default_logger_timestamp_format() {
    let formatted = DefaultLogger::format_timestamp(SystemTime::now());
    // YYYY-MM-DD HH:MM:SS.mmm
    assert_eq!(formatted.len(), 23);
    assert_eq!(&formatted[4..5], "-");
    assert_eq!(&formatted[10..11], " ");
    assert_eq!(&formatted[19..20], ".");
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// ERROR HELPER MACROS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = capture("orrery::test::err");

    let error = crate::engine_err!("orrery::test::err", "Image index {} out of range", 7);
    assert_eq!(error, Error::BackendError("Image index 7 out of range".to_string()));

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert_eq!(captured[0].message, "Image index 7 out of range");
    assert!(captured[0].file.is_some());
    assert!(captured[0].line.is_some());
    drop(captured);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = capture("orrery::test::bail");

    fn bails(value: u32) -> crate::orrery::Result<u32> {
        if value == 0 {
            crate::engine_bail!("orrery::test::bail", "value must be non-zero");
        }
        Ok(value)
    }

    assert_eq!(bails(3), Ok(3));
    assert!(matches!(bails(0), Err(Error::BackendError(msg)) if msg == "value must be non-zero"));
    assert_eq!(entries.lock().unwrap().len(), 1);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_fail_builds_typed_variant() {
    #[derive(Debug)]
    #[allow(non_camel_case_types, dead_code)]
    enum FakeStatus {
        ERROR_DEVICE_LOST,
    }

    let entries = capture("orrery::test::fail");

    let error = crate::engine_fail!(
        "orrery::test::fail",
        SubmitFailed,
        "vkQueueSubmit",
        FakeStatus::ERROR_DEVICE_LOST
    );

    assert_eq!(
        error,
        Error::SubmitFailed {
            operation: "vkQueueSubmit".to_string(),
            status: "ERROR_DEVICE_LOST".to_string(),
        }
    );

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].message.contains("vkQueueSubmit"));
    assert!(captured[0].message.contains("ERROR_DEVICE_LOST"));
    drop(captured);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_fail_keeps_text_status_verbatim() {
    let entries = capture("orrery::test::fail_text");

    let error = crate::engine_fail!(
        "orrery::test::fail_text",
        SwapchainCreationFailed,
        "choose surface format",
        "surface reports no formats"
    );

    assert_eq!(error.status(), Some("surface reports no formats"));
    assert_eq!(
        entries.lock().unwrap()[0].message,
        "Swapchain creation failed: choose surface format (surface reports no formats)"
    );

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_fail_reports_instance_driver_failure() {
    #[derive(Debug)]
    #[allow(non_camel_case_types, dead_code)]
    enum FakeStatus {
        ERROR_INCOMPATIBLE_DRIVER,
    }

    let entries = capture("orrery::test::fail_instance");

    let error = crate::engine_fail!(
        "orrery::test::fail_instance",
        InstanceCreationFailed,
        "vkCreateInstance",
        FakeStatus::ERROR_INCOMPATIBLE_DRIVER
    );

    assert_eq!(error.operation(), Some("vkCreateInstance"));
    assert_eq!(error.status(), Some("ERROR_INCOMPATIBLE_DRIVER"));
    assert_eq!(
        entries.lock().unwrap()[0].message,
        "Instance creation failed: vkCreateInstance (ERROR_INCOMPATIBLE_DRIVER)"
    );

    Engine::reset_logger();
}
