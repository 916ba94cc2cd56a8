//! Collaborators the driver needs from storage

use crate::replay::Correction;
use crate::revision::RevisionTuple;
use crate::store::StoreResult;

/// Source of candidate entity ids
pub trait CandidateSelect {
    /// Next page of candidate ids strictly greater than `after`, ascending.
    ///
    /// An empty page means there are no more candidates.
    fn candidate_batch(&mut self, after: Option<i64>, limit: usize) -> StoreResult<Vec<i64>>;
}

/// Source of one entity's audit trail
pub trait RevisionLoad {
    /// All tuples of `entity_id` ordered by rev asc, revtype desc, order asc
    fn load_revisions(&mut self, entity_id: i64) -> StoreResult<Vec<RevisionTuple>>;
}

/// Destination of corrective writes
pub trait CorrectionSink {
    /// Apply one correction; must touch exactly one row.
    ///
    /// A failed write must leave every earlier write intact.
    fn apply(&mut self, correction: &Correction) -> StoreResult<usize>;
}
