//! Single corrective retry after an ambiguous pass
//!
//! The usual cause of a collision is two INSERTs of the same revision that
//! the loader returned in the wrong relative order. The heuristic swaps the
//! first adjacent pair of same-revision INSERTs and replays once more.

use crate::observability::{Category, Logger};
use crate::revision::RevisionTuple;

use super::engine::{ReplayEngine, ReplayOutcome};

/// Result of the retry heuristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Second pass did not collide
    Resolved(ReplayOutcome),
    /// Second pass collided again
    StillAmbiguous(ReplayOutcome),
    /// No adjacent same-revision INSERT pair to swap
    NoSwapCandidate,
}

impl RetryOutcome {
    /// True when the second pass did not collide
    pub fn is_resolved(&self) -> bool {
        matches!(self, RetryOutcome::Resolved(_))
    }
}

/// Swap the first adjacent pair of INSERTs sharing a revision.
///
/// Returns the index of the first element of the swapped pair.
pub fn swap_first_insert_pair(tuples: &mut [RevisionTuple]) -> Option<usize> {
    let i = tuples
        .windows(2)
        .position(|pair| pair[0].is_insert() && pair[1].is_insert() && pair[0].rev == pair[1].rev)?;
    tuples.swap(i, i + 1);
    Some(i)
}

impl ReplayEngine {
    /// Perturb `tuples` in place and replay exactly once more.
    pub fn retry(&self, tuples: &mut [RevisionTuple]) -> RetryOutcome {
        let Some(i) = swap_first_insert_pair(tuples) else {
            return RetryOutcome::NoSwapCandidate;
        };

        Logger::info(
            Category::RetryAttempt,
            &[
                ("entity_id", &tuples[i].entity_id.to_string()),
                ("rev", &tuples[i].rev.to_string()),
                ("first", tuples[i].content.as_deref().unwrap_or("")),
                ("second", tuples[i + 1].content.as_deref().unwrap_or("")),
            ],
        );

        let outcome = self.replay(tuples);
        if outcome.succeeded() {
            RetryOutcome::Resolved(outcome)
        } else {
            RetryOutcome::StillAmbiguous(outcome)
        }
    }
}
