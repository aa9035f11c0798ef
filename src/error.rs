//! Error types for the personnel core.
//!
//! Access decisions are not errors; they are returned as
//! [`Decision`](crate::policy::Decision) values.  The variants here cover
//! broken static tables and malformed caller input.

use thiserror::Error;

/// Errors raised by the catalog, the policy tables and the report
/// builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A static table entry is missing or malformed.  Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller asked for a report type outside attendance, payroll
    /// and leave.
    #[error("invalid report type `{0}`")]
    InvalidReportType(String),

    /// A date bound could not be parsed as `YYYY-MM-DD`.
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl CoreError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns whether the error was caused by caller input rather than
    /// by the process configuration.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidReportType(_) | Self::InvalidDate(_))
    }
}
