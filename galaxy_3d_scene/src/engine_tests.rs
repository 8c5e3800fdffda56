//! Unit tests for the Engine logging services
//!
//! The logger is a process-wide OnceLock shared across all tests.
//! All tests are marked with #[serial] and restore the default logger.

use super::*;
use crate::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

fn install() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGER MANAGEMENT
// ============================================================================

#[test]
#[serial]
fn test_log_reaches_installed_logger() {
    let entries = install();

    Engine::log(LogSeverity::Info, "galaxy3d::Camera", "Frustum updated".to_string());
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].source, "galaxy3d::Camera");
    assert_eq!(entries[0].message, "Frustum updated");
    assert!(entries[0].file.is_none());
    assert!(entries[0].line.is_none());
}

#[test]
#[serial]
fn test_log_detailed_carries_location() {
    let entries = install();

    Engine::log_detailed(LogSeverity::Error, "galaxy3d::Skinning", "Bad weights".to_string(), "skinning.rs", 17);
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries[0].file, Some("skinning.rs"));
    assert_eq!(entries[0].line, Some(17));
}

#[test]
#[serial]
fn test_reset_logger_detaches_previous_logger() {
    let entries = install();
    Engine::log(LogSeverity::Warn, "test", "captured".to_string());

    Engine::reset_logger();
    Engine::log(LogSeverity::Warn, "test", "not captured".to_string());

    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn test_set_logger_replaces_previous_logger() {
    let first = install();
    let second = install();

    Engine::log(LogSeverity::Debug, "test", "to second".to_string());
    Engine::reset_logger();

    assert!(first.lock().unwrap().is_empty());
    assert_eq!(second.lock().unwrap().len(), 1);
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
#[serial]
fn test_macros_use_their_severity() {
    let entries = install();

    crate::engine_trace!("galaxy3d::test", "t {}", 1);
    crate::engine_debug!("galaxy3d::test", "d {}", 2);
    crate::engine_info!("galaxy3d::test", "i {}", 3);
    crate::engine_warn!("galaxy3d::test", "w {}", 4);
    crate::engine_error!("galaxy3d::test", "e {}", 5);
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    let severities: Vec<_> = entries.iter().map(|e| e.severity).collect();
    assert_eq!(
        severities,
        vec![LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error]
    );
    assert_eq!(entries[2].message, "i 3");

    // Only errors carry file:line
    assert!(entries[..4].iter().all(|e| e.line.is_none()));
    assert_eq!(entries[4].file, Some(file!()));
    assert!(entries[4].line.is_some());
}
