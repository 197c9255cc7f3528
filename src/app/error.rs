use serde::Serialize;
use std::fmt;

pub const ERR_CONNECTION: &str = "ERR_CONNECTION";
pub const ERR_CAPTURE: &str = "ERR_CAPTURE";
pub const ERR_EXEC: &str = "ERR_EXEC";
pub const ERR_VALIDATION: &str = "ERR_VALIDATION";
pub const ERR_DEPENDENCY: &str = "ERR_DEPENDENCY";
pub const ERR_SYSTEM: &str = "ERR_SYSTEM";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn connection(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_CONNECTION, message, trace_id)
    }

    pub fn capture(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_CAPTURE, message, trace_id)
    }

    pub fn exec(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_EXEC, message, trace_id)
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_VALIDATION, message, trace_id)
    }

    pub fn dependency(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_DEPENDENCY, message, trace_id)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_SYSTEM, message, trace_id)
    }

    pub fn is_connection(&self) -> bool {
        self.code == ERR_CONNECTION
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let err = AppError::capture("screencap exited with 1", "trace-1");
        assert_eq!(err.to_string(), "screencap exited with 1 (ERR_CAPTURE)");
        assert_eq!(err.trace_id, "trace-1");
    }

    #[test]
    fn only_connection_errors_are_flagged_as_connection() {
        assert!(AppError::connection("no device", "").is_connection());
        assert!(!AppError::exec("boom", "").is_connection());
        assert!(!AppError::dependency("adb missing", "").is_connection());
    }
}
