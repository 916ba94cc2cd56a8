//! Store error types
//!
//! Error codes:
//! - AUD_STORE_UNIQUE_VIOLATION (ERROR) - correction collides with a stored order
//! - AUD_STORE_ROW_COUNT_MISMATCH (ERROR) - correction matched zero or several rows
//! - AUD_STORE_WRITE_FAILED (ERROR) - any other failed correction
//! - AUD_STORE_SAVEPOINT_FAILED (FATAL)
//! - AUD_STORE_QUERY_FAILED (FATAL)
//! - AUD_STORE_COMMIT_FAILED (FATAL)
//! - AUD_STORE_INVALID_TABLE (FATAL)
//! - AUD_UNEXPECTED_REVTYPE (FATAL)
//!
//! ERROR means one correction is lost and needs a manual fix; the run goes
//! on. FATAL aborts the run and nothing is committed.

use std::fmt;

use crate::revision::RevisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// One correction lost, run continues
    Error,
    /// Run aborted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    UniqueViolation,
    RowCountMismatch,
    WriteFailed,
    SavepointFailed,
    QueryFailed,
    CommitFailed,
    InvalidTable,
    UnexpectedRevType,
}

impl StoreErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::UniqueViolation => "AUD_STORE_UNIQUE_VIOLATION",
            StoreErrorCode::RowCountMismatch => "AUD_STORE_ROW_COUNT_MISMATCH",
            StoreErrorCode::WriteFailed => "AUD_STORE_WRITE_FAILED",
            StoreErrorCode::SavepointFailed => "AUD_STORE_SAVEPOINT_FAILED",
            StoreErrorCode::QueryFailed => "AUD_STORE_QUERY_FAILED",
            StoreErrorCode::CommitFailed => "AUD_STORE_COMMIT_FAILED",
            StoreErrorCode::InvalidTable => "AUD_STORE_INVALID_TABLE",
            StoreErrorCode::UnexpectedRevType => "AUD_UNEXPECTED_REVTYPE",
        }
    }

    /// Get the severity of this code
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::UniqueViolation
            | StoreErrorCode::RowCountMismatch
            | StoreErrorCode::WriteFailed => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
}

impl StoreError {
    /// Create a new store error
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Correction collides with a stored order
    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::UniqueViolation, message)
    }

    /// Correction matched `updated` rows instead of exactly one
    pub fn row_count_mismatch(updated: usize) -> Self {
        Self::new(
            StoreErrorCode::RowCountMismatch,
            format!("expected one row to be updated, got {}", updated),
        )
    }

    /// Correction write failed for another reason
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::WriteFailed, message)
    }

    /// Savepoint could not be created or released
    pub fn savepoint_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::SavepointFailed, message)
    }

    /// Query failed
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::QueryFailed, message)
    }

    /// Commit or rollback failed
    pub fn commit_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::CommitFailed, message)
    }

    /// Table name rejected
    pub fn invalid_table(name: &str) -> Self {
        Self::new(
            StoreErrorCode::InvalidTable,
            format!("'{}' is not a valid table name", name),
        )
    }

    /// Get the error code
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Get the severity
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the run must abort
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::query_failed(e.to_string())
    }
}

impl From<RevisionError> for StoreError {
    fn from(e: RevisionError) -> Self {
        Self::new(StoreErrorCode::UnexpectedRevType, e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_errors_are_not_fatal() {
        assert!(!StoreError::unique_violation("dup").is_fatal());
        assert!(!StoreError::row_count_mismatch(0).is_fatal());
        assert!(!StoreError::write_failed("disk").is_fatal());
    }

    #[test]
    fn test_run_level_errors_are_fatal() {
        assert!(StoreError::query_failed("gone").is_fatal());
        assert!(StoreError::commit_failed("busy").is_fatal());
        assert!(StoreError::savepoint_failed("gone").is_fatal());
        assert!(StoreError::invalid_table("x;drop").is_fatal());
    }

    #[test]
    fn test_unexpected_revtype_converts_to_fatal() {
        let err: StoreError = RevisionError::UnexpectedRevType {
            value: 9,
            entity_id: 1,
            rev: 2,
        }
        .into();
        assert_eq!(err.code(), StoreErrorCode::UnexpectedRevType);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_display() {
        let display = StoreError::row_count_mismatch(2).to_string();
        assert!(display.contains("AUD_STORE_ROW_COUNT_MISMATCH"));
        assert!(display.contains("ERROR"));
        assert!(display.contains("got 2"));
    }
}
