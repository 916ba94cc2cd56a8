//! Per-entity reports and run totals

use serde::Serialize;

use crate::replay::Correction;

/// How an entity ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOutcome {
    /// First pass replayed the whole history
    Reconciled,
    /// First pass was ambiguous, the retry replayed the whole history
    ResolvedOnRetry,
    /// Replay abandoned on a line missing from the live list
    Corrupted,
    /// Ambiguous even after the retry, or nothing to swap
    ManualFixRequired,
}

impl EntityOutcome {
    /// Outcome name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityOutcome::Reconciled => "reconciled",
            EntityOutcome::ResolvedOnRetry => "resolved_on_retry",
            EntityOutcome::Corrupted => "corrupted",
            EntityOutcome::ManualFixRequired => "manual_fix_required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub entity_id: i64,
    pub outcome: EntityOutcome,
    pub revisions: usize,
    /// Corrections of the accepted replay pass
    pub corrections: Vec<Correction>,
    pub applied: usize,
    pub failed: usize,
}

/// Totals over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub entities: u64,
    pub reconciled: u64,
    pub resolved_on_retry: u64,
    pub corrupted: u64,
    pub manual_fix_required: u64,
    pub corrections_applied: u64,
    pub corrections_failed: u64,
}

impl RunStats {
    /// Fold one entity report into the totals
    pub fn record(&mut self, report: &EntityReport) {
        self.entities += 1;
        match report.outcome {
            EntityOutcome::Reconciled => self.reconciled += 1,
            EntityOutcome::ResolvedOnRetry => self.resolved_on_retry += 1,
            EntityOutcome::Corrupted => self.corrupted += 1,
            EntityOutcome::ManualFixRequired => self.manual_fix_required += 1,
        }
        self.corrections_applied += report.applied as u64;
        self.corrections_failed += report.failed as u64;
    }

    /// True when nothing was left for an operator
    pub fn is_clean(&self) -> bool {
        self.corrupted == 0 && self.manual_fix_required == 0 && self.corrections_failed == 0
    }
}
