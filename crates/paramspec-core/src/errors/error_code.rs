//! ParamSpecErrorCode trait for stable, machine-readable error codes.

/// Every error enum implements this to expose a structured error code
/// string that callers (CLIs, bindings) can match on without parsing text.
pub trait ParamSpecErrorCode {
    /// Returns the error code string (e.g., "VALIDATION_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const TYPE_RESOLUTION_ERROR: &str = "TYPE_RESOLUTION_ERROR";
pub const DIMENSION_DEFINITION_ERROR: &str = "DIMENSION_DEFINITION_ERROR";
pub const PARAMETER_COMPILATION_ERROR: &str = "PARAMETER_COMPILATION_ERROR";
pub const INVALID_DEFINITION: &str = "INVALID_DEFINITION";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const UNKNOWN_PARAMETER: &str = "UNKNOWN_PARAMETER";
pub const CONTEXT_RESOLUTION_ERROR: &str = "CONTEXT_RESOLUTION_ERROR";
pub const LOAD_ERROR: &str = "LOAD_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const NOT_BUILT: &str = "NOT_BUILT";
