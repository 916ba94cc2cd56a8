//! Log categories
//!
//! Category strings are stable: post-run tooling greps for them.

use std::fmt;

use super::logger::Severity;

/// Tag carried by every log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    // Corrections
    /// INSERT row re-ordered to its live position
    InsertCorrection,
    /// UPDATE row with a null order filled in
    UpdateCorrection,
    /// DELETE row restored to its last known position
    DeleteCorrection,
    /// Live line renumbered after a delete (rescan policy)
    RenumberCorrection,

    // Anomalies
    /// UPDATE/DELETE references a line that is not live
    DataCorruption,
    /// INSERT position collides with recorded history
    AmbiguousOrder,
    /// Retry heuristic started for an entity
    RetryAttempt,
    /// Retry heuristic resolved the ambiguity
    RetryResolved,
    /// Something needs a human
    ManualFixRequired,

    // Lifecycle
    ConfigLoaded,
    RunBegin,
    RunCommitted,
    RunRolledBack,
    RunComplete,
    RunFailed,
}

impl Category {
    /// Stable category string
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::InsertCorrection => "INSERT_CORRECTION",
            Category::UpdateCorrection => "UPDATE_CORRECTION",
            Category::DeleteCorrection => "DELETE_CORRECTION",
            Category::RenumberCorrection => "RENUMBER_CORRECTION",
            Category::DataCorruption => "DATA_CORRUPTION",
            Category::AmbiguousOrder => "AMBIGUOUS_ORDER",
            Category::RetryAttempt => "RETRY_ATTEMPT",
            Category::RetryResolved => "RETRY_RESOLVED",
            Category::ManualFixRequired => "MANUAL_FIX_REQUIRED",
            Category::ConfigLoaded => "CONFIG_LOADED",
            Category::RunBegin => "RUN_BEGIN",
            Category::RunCommitted => "RUN_COMMITTED",
            Category::RunRolledBack => "RUN_ROLLED_BACK",
            Category::RunComplete => "RUN_COMPLETE",
            Category::RunFailed => "RUN_FAILED",
        }
    }

    /// Severity used when the caller does not pick one
    pub fn default_severity(&self) -> Severity {
        match self {
            Category::DataCorruption | Category::AmbiguousOrder => Severity::Warn,
            Category::ManualFixRequired => Severity::Error,
            Category::RunFailed => Severity::Fatal,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_strings_are_screaming_snake() {
        let categories = [
            Category::InsertCorrection,
            Category::UpdateCorrection,
            Category::DeleteCorrection,
            Category::RenumberCorrection,
            Category::DataCorruption,
            Category::AmbiguousOrder,
            Category::RetryAttempt,
            Category::RetryResolved,
            Category::ManualFixRequired,
            Category::ConfigLoaded,
            Category::RunBegin,
            Category::RunCommitted,
            Category::RunRolledBack,
            Category::RunComplete,
            Category::RunFailed,
        ];

        for category in categories {
            let s = category.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_manual_fix_is_error() {
        assert_eq!(
            Category::ManualFixRequired.default_severity(),
            Severity::Error
        );
        assert_eq!(Category::RunFailed.default_severity(), Severity::Fatal);
        assert_eq!(
            Category::InsertCorrection.default_severity(),
            Severity::Info
        );
    }
}
