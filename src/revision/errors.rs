//! Revision decoding errors

use thiserror::Error;

/// Result type for revision decoding
pub type RevisionResult<T> = Result<T, RevisionError>;

/// Errors raised while turning stored audit rows into tuples.
///
/// Every variant is fatal for the whole run: it means an assumption about
/// the audit table no longer holds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionError {
    #[error("unexpected revtype {value} for entity {entity_id} at rev {rev}")]
    UnexpectedRevType { value: i64, entity_id: i64, rev: i64 },
}

impl RevisionError {
    /// Error code string
    pub fn code(&self) -> &'static str {
        match self {
            RevisionError::UnexpectedRevType { .. } => "AUD_UNEXPECTED_REVTYPE",
        }
    }
}
