//! Correction requests emitted by replay

use std::fmt;

use serde::Serialize;

use crate::observability::Category;
use crate::revision::{RevisionTuple, RowKey};

/// Which replay rule produced a correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionKind {
    Insert,
    Update,
    Delete,
    Renumber,
}

impl CorrectionKind {
    /// Lowercase name used in output
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionKind::Insert => "insert",
            CorrectionKind::Update => "update",
            CorrectionKind::Delete => "delete",
            CorrectionKind::Renumber => "renumber",
        }
    }

    /// Log category for an applied correction of this kind
    pub fn category(&self) -> Category {
        match self {
            CorrectionKind::Insert => Category::InsertCorrection,
            CorrectionKind::Update => Category::UpdateCorrection,
            CorrectionKind::Delete => Category::DeleteCorrection,
            CorrectionKind::Renumber => Category::RenumberCorrection,
        }
    }
}

/// Request to set `order_id` of exactly one audit row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub kind: CorrectionKind,
    pub row: RowKey,
    /// Stored value before the correction
    pub previous: Option<i64>,
    pub order: i64,
}

impl Correction {
    /// Correction moving `tuple` to `order`, remembering its stored value
    pub fn for_tuple(kind: CorrectionKind, tuple: &RevisionTuple, order: i64) -> Self {
        Self {
            kind,
            row: tuple.row_key(),
            previous: tuple.order_id,
            order,
        }
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} order {} -> {} (entity={}, rev={}, revtype={}, line={:?})",
            self.kind.as_str(),
            self.previous.unwrap_or(-1),
            self.order,
            self.row.entity_id,
            self.row.rev,
            self.row.rev_type,
            self.row.content.as_deref().unwrap_or("")
        )
    }
}

/// Ordered corrections of one replay pass, at most one per row.
///
/// A second correction of the same row replaces the first in place. If it
/// puts the row back to the value originally stored, the entry is dropped.
#[derive(Debug, Clone, Default)]
pub struct CorrectionSet {
    items: Vec<Correction>,
}

impl CorrectionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a correction, coalescing with an earlier one for the same row
    pub fn push(&mut self, correction: Correction) {
        match self.items.iter().position(|c| c.row == correction.row) {
            Some(pos) if self.items[pos].previous == Some(correction.order) => {
                self.items.remove(pos);
            }
            Some(pos) => {
                let existing = &mut self.items[pos];
                existing.kind = correction.kind;
                existing.order = correction.order;
            }
            None => self.items.push(correction),
        }
    }

    /// Number of rows that will be written
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no row needs a write
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Corrections in emission order
    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.items.iter()
    }

    /// Set each corrected tuple's stored order to the value the sink will
    /// hold once the set is applied.
    pub fn write_back(&self, tuples: &mut [RevisionTuple]) {
        for correction in self.iter() {
            if let Some(tuple) = tuples.iter_mut().find(|t| t.row_key() == correction.row) {
                tuple.order_id = Some(correction.order);
            }
        }
    }

    /// Consume the set, keeping emission order
    pub fn into_vec(self) -> Vec<Correction> {
        self.items
    }
}

impl Extend<Correction> for CorrectionSet {
    fn extend<I: IntoIterator<Item = Correction>>(&mut self, iter: I) {
        for correction in iter {
            self.push(correction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::RevType;

    fn tuple(content: &str, order_id: Option<i64>) -> RevisionTuple {
        RevisionTuple::new(1, 7, Some(content.to_string()), RevType::Insert, order_id, 1)
    }

    #[test]
    fn test_distinct_rows_keep_emission_order() {
        let mut set = CorrectionSet::new();
        set.push(Correction::for_tuple(CorrectionKind::Insert, &tuple("B", None), 1));
        set.push(Correction::for_tuple(CorrectionKind::Insert, &tuple("A", None), 0));

        let items = set.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].row.content.as_deref(), Some("B"));
        assert_eq!(items[1].row.content.as_deref(), Some("A"));
    }

    #[test]
    fn test_same_row_keeps_latest_value_and_first_previous() {
        let mut set = CorrectionSet::new();
        let original = tuple("A", Some(5));
        set.push(Correction::for_tuple(CorrectionKind::Insert, &original, 1));

        let mut rewritten = original.clone();
        rewritten.order_id = Some(1);
        set.push(Correction::for_tuple(CorrectionKind::Renumber, &rewritten, 0));

        let items = set.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].previous, Some(5));
        assert_eq!(items[0].order, 0);
        assert_eq!(items[0].kind, CorrectionKind::Renumber);
    }

    #[test]
    fn test_same_row_back_to_stored_value_is_dropped() {
        let mut set = CorrectionSet::new();
        let original = tuple("A", Some(0));
        set.push(Correction::for_tuple(CorrectionKind::Insert, &original, 1));

        let mut rewritten = original.clone();
        rewritten.order_id = Some(1);
        set.push(Correction::for_tuple(CorrectionKind::Renumber, &rewritten, 0));

        assert!(set.is_empty());
    }

    #[test]
    fn test_write_back_sets_stored_order() {
        let mut tuples = vec![tuple("A", None), tuple("B", Some(4))];
        let mut set = CorrectionSet::new();
        set.push(Correction::for_tuple(CorrectionKind::Insert, &tuples[1], 1));

        set.write_back(&mut tuples);

        assert_eq!(tuples[0].order_id, None);
        assert_eq!(tuples[1].order_id, Some(1));
    }

    #[test]
    fn test_extend_coalesces_later_pass() {
        let original = tuple("A", None);
        let mut set = CorrectionSet::new();
        set.push(Correction::for_tuple(CorrectionKind::Insert, &original, 0));

        let mut written = original.clone();
        written.order_id = Some(0);
        set.extend(vec![
            Correction::for_tuple(CorrectionKind::Insert, &written, 1),
            Correction::for_tuple(CorrectionKind::Insert, &tuple("B", None), 0),
        ]);

        let items = set.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].previous, None);
        assert_eq!(items[0].order, 1);
        assert_eq!(items[1].row.content.as_deref(), Some("B"));
    }

    #[test]
    fn test_kind_maps_to_log_category() {
        let expected = [
            (CorrectionKind::Insert, "INSERT_CORRECTION"),
            (CorrectionKind::Update, "UPDATE_CORRECTION"),
            (CorrectionKind::Delete, "DELETE_CORRECTION"),
            (CorrectionKind::Renumber, "RENUMBER_CORRECTION"),
        ];
        for (kind, category) in expected {
            assert_eq!(kind.category().as_str(), category);
        }
    }

    #[test]
    fn test_display_uses_minus_one_for_null() {
        let c = Correction::for_tuple(CorrectionKind::Insert, &tuple("A", None), 2);
        assert!(c.to_string().contains("-1 -> 2"));
    }
}
