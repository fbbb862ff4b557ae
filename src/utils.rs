//! Utility functions for timestamps and log lines

use chrono::{SecondsFormat, Utc};

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a task log line as `"[<RFC3339 timestamp>] <message>"`
pub fn log_line(message: &str) -> String {
    format!(
        "[{}] {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        message
    )
}
