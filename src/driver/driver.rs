//! Candidate iteration and per-entity reconciliation

use crate::observability::{log_category, Category, Logger};
use crate::replay::{
    Correction, CorrectionSet, ReplayEngine, ReplayOutcome, ReplayStatus, RetryOutcome,
};
use crate::store::StoreResult;

use super::outcome::{EntityOutcome, EntityReport, RunStats};
use super::traits::{CandidateSelect, CorrectionSink, RevisionLoad};

/// Default number of candidate ids fetched per page
pub const DEFAULT_FETCH_SIZE: usize = 50;

/// Drives replay over every candidate entity, sequentially
#[derive(Debug, Clone)]
pub struct ReorderDriver {
    engine: ReplayEngine,
    fetch_size: usize,
}

impl Default for ReorderDriver {
    fn default() -> Self {
        Self::new(ReplayEngine::default(), DEFAULT_FETCH_SIZE)
    }
}

impl ReorderDriver {
    /// Create a driver; a zero fetch size is raised to one
    pub fn new(engine: ReplayEngine, fetch_size: usize) -> Self {
        Self {
            engine,
            fetch_size: fetch_size.max(1),
        }
    }

    /// Get the replay engine
    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    /// Reconcile every candidate entity.
    ///
    /// Candidates are consumed forward-only, one page of `fetch_size` ids at
    /// a time. Entity-level problems are reported in the stats; only fatal
    /// storage errors end the run early.
    pub fn run<S>(&self, store: &mut S) -> StoreResult<RunStats>
    where
        S: CandidateSelect + RevisionLoad + CorrectionSink,
    {
        let mut stats = RunStats::default();
        let mut after = None;

        loop {
            let batch = store.candidate_batch(after, self.fetch_size)?;
            let Some(&last) = batch.last() else {
                break;
            };

            for &entity_id in &batch {
                let report = self.reconcile_entity(store, entity_id)?;
                stats.record(&report);
            }
            after = Some(last);
        }

        Ok(stats)
    }

    /// Replay one entity and apply its corrections.
    pub fn reconcile_entity<S>(&self, store: &mut S, entity_id: i64) -> StoreResult<EntityReport>
    where
        S: RevisionLoad + CorrectionSink,
    {
        let mut report = self.plan_entity(store, entity_id)?;

        for correction in &report.corrections {
            match store.apply(correction) {
                Ok(_) => {
                    report.applied += 1;
                    log_applied(correction);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    report.failed += 1;
                    Logger::error(
                        Category::ManualFixRequired,
                        &[
                            ("entity_id", &entity_id.to_string()),
                            ("rev", &correction.row.rev.to_string()),
                            ("revtype", correction.row.rev_type.as_str()),
                            ("line", correction.row.content.as_deref().unwrap_or("")),
                            ("order", &correction.order.to_string()),
                            ("code", e.code().code()),
                            ("reason", e.message()),
                        ],
                    );
                }
            }
        }

        Ok(report)
    }

    /// Replay one entity (retrying once if ambiguous) without writing.
    ///
    /// Corrections a failed pass emitted before its collision are kept and
    /// written like any other. The retry replays on top of them, so the
    /// returned list is the net write per row.
    pub fn plan_entity<L>(&self, loader: &mut L, entity_id: i64) -> StoreResult<EntityReport>
    where
        L: RevisionLoad + ?Sized,
    {
        let mut tuples = loader.load_revisions(entity_id)?;
        let revisions = tuples.len();

        let first = self.engine.replay(&tuples);
        let (outcome, corrections) = if first.succeeded() {
            accept(first, EntityOutcome::Reconciled)
        } else {
            let mut pending = CorrectionSet::new();
            pending.extend(first.corrections);
            pending.write_back(&mut tuples);

            match self.engine.retry(&mut tuples) {
                RetryOutcome::Resolved(second) => {
                    Logger::info(
                        Category::RetryResolved,
                        &[("entity_id", &entity_id.to_string())],
                    );
                    let (outcome, corrections) = accept(second, EntityOutcome::ResolvedOnRetry);
                    pending.extend(corrections);
                    (outcome, pending.into_vec())
                }
                RetryOutcome::StillAmbiguous(second) => {
                    pending.extend(second.corrections);
                    log_manual_entity(entity_id, "still ambiguous after retry", &pending);
                    (EntityOutcome::ManualFixRequired, pending.into_vec())
                }
                RetryOutcome::NoSwapCandidate => {
                    log_manual_entity(entity_id, "no same-revision insert pair to swap", &pending);
                    (EntityOutcome::ManualFixRequired, pending.into_vec())
                }
            }
        };

        Ok(EntityReport {
            entity_id,
            outcome,
            revisions,
            corrections,
            applied: 0,
            failed: 0,
        })
    }
}

fn accept(outcome: ReplayOutcome, complete: EntityOutcome) -> (EntityOutcome, Vec<Correction>) {
    let status = match outcome.status {
        ReplayStatus::Abandoned(_) => EntityOutcome::Corrupted,
        _ => complete,
    };
    (status, outcome.corrections)
}

fn log_applied(correction: &Correction) {
    let from = correction
        .previous
        .map(|v| v.to_string())
        .unwrap_or_else(|| "null".to_string());
    log_category(
        correction.kind.category(),
        &[
            ("entity_id", &correction.row.entity_id.to_string()),
            ("rev", &correction.row.rev.to_string()),
            ("revtype", correction.row.rev_type.as_str()),
            ("line", correction.row.content.as_deref().unwrap_or("")),
            ("from", &from),
            ("to", &correction.order.to_string()),
        ],
    );
}

fn log_manual_entity(entity_id: i64, reason: &str, pending: &CorrectionSet) {
    Logger::error(
        Category::ManualFixRequired,
        &[
            ("entity_id", &entity_id.to_string()),
            ("reason", reason),
            ("partial_corrections", &pending.len().to_string()),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::revision::{RevType, RevisionTuple};
    use crate::store::StoreError;

    struct MockStore {
        entities: BTreeMap<i64, Vec<RevisionTuple>>,
        applied: Vec<Correction>,
        reject: Option<(i64, &'static str)>,
        fatal_on_write: bool,
        pages: usize,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                entities: BTreeMap::new(),
                applied: Vec::new(),
                reject: None,
                fatal_on_write: false,
                pages: 0,
            }
        }

        fn with_entity(mut self, entity_id: i64, rows: &[(i64, &str, RevType, Option<i64>)]) -> Self {
            let tuples = rows
                .iter()
                .enumerate()
                .map(|(n, (rev, line, rev_type, order))| {
                    RevisionTuple::new(
                        *rev,
                        entity_id,
                        Some(line.to_string()),
                        *rev_type,
                        *order,
                        n as i64 + 1,
                    )
                })
                .collect();
            self.entities.insert(entity_id, tuples);
            self
        }
    }

    impl CandidateSelect for MockStore {
        fn candidate_batch(&mut self, after: Option<i64>, limit: usize) -> StoreResult<Vec<i64>> {
            self.pages += 1;
            Ok(self
                .entities
                .keys()
                .copied()
                .filter(|id| after.map_or(true, |a| *id > a))
                .take(limit)
                .collect())
        }
    }

    impl RevisionLoad for MockStore {
        fn load_revisions(&mut self, entity_id: i64) -> StoreResult<Vec<RevisionTuple>> {
            Ok(self.entities.get(&entity_id).cloned().unwrap_or_default())
        }
    }

    impl CorrectionSink for MockStore {
        fn apply(&mut self, correction: &Correction) -> StoreResult<usize> {
            if self.fatal_on_write {
                return Err(StoreError::savepoint_failed("connection lost"));
            }
            if let Some((entity_id, line)) = self.reject {
                if correction.row.entity_id == entity_id
                    && correction.row.content.as_deref() == Some(line)
                {
                    return Err(StoreError::unique_violation("order_id taken"));
                }
            }
            self.applied.push(correction.clone());
            Ok(1)
        }
    }

    use RevType::{Delete, Insert, Update};

    #[test]
    fn test_run_visits_every_candidate_in_pages() {
        let mut store = MockStore::new()
            .with_entity(1, &[(1, "A", Insert, None)])
            .with_entity(2, &[(1, "A", Insert, Some(0))])
            .with_entity(3, &[(1, "A", Insert, Some(4))]);

        let driver = ReorderDriver::new(ReplayEngine::default(), 2);
        let stats = driver.run(&mut store).unwrap();

        assert_eq!(stats.entities, 3);
        assert_eq!(stats.reconciled, 3);
        assert_eq!(stats.corrections_applied, 2);
        // two full/partial pages plus the empty one
        assert_eq!(store.pages, 3);
    }

    #[test]
    fn test_corrupted_entity_does_not_stop_others() {
        let mut store = MockStore::new()
            .with_entity(1, &[(1, "A", Insert, None), (2, "Z", Update, None)])
            .with_entity(2, &[(1, "B", Insert, None)]);

        let stats = ReorderDriver::default().run(&mut store).unwrap();

        assert_eq!(stats.corrupted, 1);
        assert_eq!(stats.reconciled, 1);
        let touched: Vec<_> = store.applied.iter().map(|c| c.row.entity_id).collect();
        assert_eq!(touched, vec![1, 2]);
    }

    #[test]
    fn test_ambiguous_entity_resolved_on_retry() {
        let mut store = MockStore::new().with_entity(
            5,
            &[
                (1, "A", Insert, Some(0)),
                (1, "B", Insert, Some(1)),
                (2, "A", Delete, Some(0)),
                (2, "C", Insert, Some(1)),
            ],
        );

        let report = ReorderDriver::default().reconcile_entity(&mut store, 5).unwrap();

        assert_eq!(report.outcome, EntityOutcome::ResolvedOnRetry);
        assert_eq!(report.applied, 3);
        assert_eq!(store.applied.len(), 3);
    }

    #[test]
    fn test_unswappable_entity_keeps_partial_corrections() {
        let mut store = MockStore::new().with_entity(
            6,
            &[
                (1, "A", Insert, None),
                (2, "B", Insert, None),
                (3, "A", Delete, None),
                (4, "C", Insert, None),
            ],
        );

        let report = ReorderDriver::default().reconcile_entity(&mut store, 6).unwrap();

        assert_eq!(report.outcome, EntityOutcome::ManualFixRequired);
        let written: Vec<_> = store
            .applied
            .iter()
            .map(|c| (c.row.rev, c.order))
            .collect();
        assert_eq!(written, vec![(1, 0), (2, 1), (3, 0)]);
        assert_eq!(report.applied, 3);
    }

    #[test]
    fn test_still_ambiguous_entity_gets_net_corrections_of_both_passes() {
        let mut store = MockStore::new().with_entity(
            7,
            &[
                (1, "A", Insert, None),
                (1, "B", Insert, None),
                (1, "C", Insert, None),
                (2, "A", Delete, None),
                (2, "D", Insert, None),
            ],
        );

        let report = ReorderDriver::default().reconcile_entity(&mut store, 7).unwrap();

        assert_eq!(report.outcome, EntityOutcome::ManualFixRequired);
        let written: Vec<_> = store
            .applied
            .iter()
            .map(|c| (c.row.content.clone().unwrap_or_default(), c.row.rev_type, c.order))
            .collect();
        // first pass wrote A=0 B=1 C=2 A(del)=0; the swapped retry moves A and B
        assert_eq!(
            written,
            vec![
                ("A".to_string(), Insert, 1),
                ("B".to_string(), Insert, 0),
                ("C".to_string(), Insert, 2),
                ("A".to_string(), Delete, 1),
            ]
        );
        assert!(store.applied.iter().all(|c| c.previous.is_none()));
    }

    #[test]
    fn test_failed_write_is_isolated() {
        let mut store = MockStore::new()
            .with_entity(
                1,
                &[(1, "A", Insert, None), (1, "B", Insert, None), (1, "C", Insert, None)],
            )
            .with_entity(2, &[(1, "D", Insert, None)]);
        store.reject = Some((1, "B"));

        let stats = ReorderDriver::default().run(&mut store).unwrap();

        assert_eq!(stats.corrections_failed, 1);
        assert_eq!(stats.corrections_applied, 3);
        let lines: Vec<_> = store
            .applied
            .iter()
            .map(|c| c.row.content.clone().unwrap_or_default())
            .collect();
        assert_eq!(lines, vec!["A", "C", "D"]);
    }

    #[test]
    fn test_fatal_write_error_aborts_run() {
        let mut store = MockStore::new().with_entity(1, &[(1, "A", Insert, None)]);
        store.fatal_on_write = true;

        let err = ReorderDriver::default().run(&mut store).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_plan_does_not_write() {
        let mut store = MockStore::new().with_entity(1, &[(1, "A", Insert, None)]);

        let report = ReorderDriver::default().plan_entity(&mut store, 1).unwrap();

        assert_eq!(report.corrections.len(), 1);
        assert_eq!(report.applied, 0);
        assert!(store.applied.is_empty());
    }
}
