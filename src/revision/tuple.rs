//! Revision tuple and identity types

use std::fmt;

use serde::Serialize;

use super::errors::{RevisionError, RevisionResult};

/// Classification of one audit row.
///
/// Stored as 0/1/2. Within one revision the replay order visits DELETE
/// first, then UPDATE, then INSERT (revtype descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevType {
    Insert,
    Update,
    Delete,
}

impl RevType {
    /// Stored integer value
    pub fn code(&self) -> i64 {
        match self {
            RevType::Insert => 0,
            RevType::Update => 1,
            RevType::Delete => 2,
        }
    }

    /// Decode a stored value; anything outside 0..=2 is rejected.
    pub fn from_code(value: i64) -> Option<Self> {
        match value {
            0 => Some(RevType::Insert),
            1 => Some(RevType::Update),
            2 => Some(RevType::Delete),
            _ => None,
        }
    }

    /// Name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RevType::Insert => "INSERT",
            RevType::Update => "UPDATE",
            RevType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RevType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Logical identity of an address line: owning entity plus content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineIdentity {
    pub entity_id: i64,
    pub content: Option<String>,
}

/// Physical audit row addressed by a correction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RowKey {
    pub rev: i64,
    pub entity_id: i64,
    pub content: Option<String>,
    pub rev_type: RevType,
}

/// One row of the audit trail.
///
/// Everything except `order_id` is fixed once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionTuple {
    pub rev: i64,
    pub entity_id: i64,
    pub content: Option<String>,
    pub rev_type: RevType,
    pub order_id: Option<i64>,
    /// Diagnostic rank from the loader; replay ignores it.
    pub row_number: i64,
}

impl RevisionTuple {
    /// Build a tuple from already-typed values
    pub fn new(
        rev: i64,
        entity_id: i64,
        content: Option<String>,
        rev_type: RevType,
        order_id: Option<i64>,
        row_number: i64,
    ) -> Self {
        Self {
            rev,
            entity_id,
            content,
            rev_type,
            order_id,
            row_number,
        }
    }

    /// Build a tuple from raw stored values, rejecting unknown revtypes.
    pub fn from_stored(
        rev: i64,
        entity_id: i64,
        content: Option<String>,
        rev_type: i64,
        order_id: Option<i64>,
        row_number: i64,
    ) -> RevisionResult<Self> {
        let decoded = RevType::from_code(rev_type).ok_or(RevisionError::UnexpectedRevType {
            value: rev_type,
            entity_id,
            rev,
        })?;
        Ok(Self::new(rev, entity_id, content, decoded, order_id, row_number))
    }

    /// Logical-line identity (entity + content)
    pub fn identity(&self) -> LineIdentity {
        LineIdentity {
            entity_id: self.entity_id,
            content: self.content.clone(),
        }
    }

    /// True when both tuples describe the same logical line.
    pub fn same_line(&self, other: &RevisionTuple) -> bool {
        self.entity_id == other.entity_id && self.content == other.content
    }

    /// Key of the physical audit row
    pub fn row_key(&self) -> RowKey {
        RowKey {
            rev: self.rev,
            entity_id: self.entity_id,
            content: self.content.clone(),
            rev_type: self.rev_type,
        }
    }

    /// True for INSERT rows
    pub fn is_insert(&self) -> bool {
        self.rev_type == RevType::Insert
    }
}

impl fmt::Display for RevisionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tuple{{entity={}, line={:?}, rev={}, revtype={}, row={}}}",
            self.entity_id,
            self.content.as_deref().unwrap_or(""),
            self.rev,
            self.rev_type,
            self.row_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(rev: i64, content: &str, rev_type: RevType, order_id: Option<i64>) -> RevisionTuple {
        RevisionTuple::new(rev, 10, Some(content.to_string()), rev_type, order_id, 1)
    }

    #[test]
    fn test_identity_ignores_rev_and_type() {
        let a = tuple(1, "12 Main St", RevType::Insert, Some(0));
        let b = tuple(5, "12 Main St", RevType::Delete, None);
        assert!(a.same_line(&b));
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.row_key(), b.row_key());
    }

    #[test]
    fn test_identity_distinguishes_entity_and_content() {
        let a = tuple(1, "12 Main St", RevType::Insert, Some(0));
        let mut b = tuple(1, "Suite 4", RevType::Insert, Some(0));
        assert!(!a.same_line(&b));

        b.content = a.content.clone();
        b.entity_id = 11;
        assert!(!a.same_line(&b));
    }

    #[test]
    fn test_null_contents_are_the_same_line() {
        let a = RevisionTuple::new(1, 10, None, RevType::Insert, None, 1);
        let b = RevisionTuple::new(2, 10, None, RevType::Delete, None, 2);
        assert!(a.same_line(&b));
    }

    #[test]
    fn test_rev_type_codes() {
        for rev_type in [RevType::Insert, RevType::Update, RevType::Delete] {
            assert_eq!(RevType::from_code(rev_type.code()), Some(rev_type));
        }
        assert_eq!(RevType::from_code(3), None);
        assert_eq!(RevType::from_code(-1), None);
    }

    #[test]
    fn test_from_stored_rejects_unknown_revtype() {
        let err = RevisionTuple::from_stored(4, 99, None, 3, None, 1).unwrap_err();
        assert_eq!(
            err,
            RevisionError::UnexpectedRevType {
                value: 3,
                entity_id: 99,
                rev: 4
            }
        );
    }
}
