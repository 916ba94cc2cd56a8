//! Replay engine
//!
//! Rules per revtype:
//!
//! - INSERT: append to the live list (even if the line is already live);
//!   order = new index. If a live line already holds that order in the
//!   history map the pass is ambiguous and stops. Otherwise record the
//!   order and correct the row when its stored order is null or different.
//! - UPDATE: order = (last index of the line in the live list) - 1. Record
//!   it; correct the row only when its stored order is null.
//! - DELETE: remove the first copy of the line from the live list. If the history map holds a
//!   different order than the row stores, restore the history value. Forget
//!   the line. Under `DeletePolicy::Rescan` every remaining live line is
//!   then renumbered to its index.
//!
//! An UPDATE or DELETE of a line that is not live abandons the pass with
//! the corrections gathered so far.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::observability::{Category, Logger};
use crate::revision::{LineIdentity, RevType, RevisionTuple};

use super::correction::{Correction, CorrectionKind, CorrectionSet};

/// What a DELETE does besides removing the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Restore the deleted row's last known order only
    #[default]
    History,
    /// Restore, then renumber every remaining live line to its index
    Rescan,
}

impl DeletePolicy {
    /// Config name of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletePolicy::History => "history",
            DeletePolicy::Rescan => "rescan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionReason {
    /// UPDATE or DELETE of a line that is not live
    MissingLine,
}

impl CorruptionReason {
    /// Reason text for log records
    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptionReason::MissingLine => "line not in live list",
        }
    }
}

/// Row at which a pass was abandoned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Corruption {
    pub reason: CorruptionReason,
    pub tuple: RevisionTuple,
}

/// INSERT whose position was already claimed by a live line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub tuple: RevisionTuple,
    pub order: i64,
    /// Live line whose recorded history holds `order`
    pub holder: RevisionTuple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplayStatus {
    Complete,
    Abandoned(Corruption),
    Ambiguous(Collision),
}

/// Result of one replay pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    pub status: ReplayStatus,
    pub corrections: Vec<Correction>,
}

impl ReplayOutcome {
    /// False only when the pass hit an order collision
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, ReplayStatus::Ambiguous(_))
    }
}

/// Why a pass stopped early
enum Halt {
    Corrupt(Corruption),
    Ambiguous(Collision),
}

/// State owned by a single pass.
///
/// `live` holds indices into `work`, the pass's own copy of the tuples.
struct ReplayState {
    work: Vec<RevisionTuple>,
    live: Vec<usize>,
    history: HashMap<LineIdentity, i64>,
    corrections: CorrectionSet,
}

impl ReplayState {
    fn new(tuples: &[RevisionTuple]) -> Self {
        Self {
            work: tuples.to_vec(),
            live: Vec::new(),
            history: HashMap::new(),
            corrections: CorrectionSet::new(),
        }
    }

    fn live_position(&self, idx: usize) -> Option<usize> {
        let tuple = &self.work[idx];
        self.live.iter().position(|&i| self.work[i].same_line(tuple))
    }

    fn last_live_position(&self, idx: usize) -> Option<usize> {
        let tuple = &self.work[idx];
        self.live.iter().rposition(|&i| self.work[i].same_line(tuple))
    }
}

/// Deterministic replay of one entity's audit trail
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayEngine {
    policy: DeletePolicy,
}

impl ReplayEngine {
    /// Create an engine with the given delete policy
    pub fn new(policy: DeletePolicy) -> Self {
        Self { policy }
    }

    /// Get the delete policy
    pub fn policy(&self) -> DeletePolicy {
        self.policy
    }

    /// Replay `tuples` (already in tie-break order) from an empty list.
    ///
    /// Replaying the same input twice yields the same outcome; the input
    /// itself is never modified.
    pub fn replay(&self, tuples: &[RevisionTuple]) -> ReplayOutcome {
        let mut state = ReplayState::new(tuples);
        let mut status = ReplayStatus::Complete;

        for idx in 0..state.work.len() {
            let step = match state.work[idx].rev_type {
                RevType::Insert => self.insert(&mut state, idx),
                RevType::Update => self.update(&mut state, idx),
                RevType::Delete => self.delete(&mut state, idx),
            };

            match step {
                Ok(()) => {}
                Err(Halt::Corrupt(corruption)) => {
                    log_corruption(&corruption);
                    status = ReplayStatus::Abandoned(corruption);
                    break;
                }
                Err(Halt::Ambiguous(collision)) => {
                    log_collision(&collision);
                    status = ReplayStatus::Ambiguous(collision);
                    break;
                }
            }
        }

        ReplayOutcome {
            status,
            corrections: state.corrections.into_vec(),
        }
    }

    fn insert(&self, state: &mut ReplayState, idx: usize) -> Result<(), Halt> {
        // A line may be live more than once; the latest INSERT owns its
        // history entry and DELETE removes the earliest copy.
        let order = state.live.len() as i64;
        let holder = state
            .live
            .iter()
            .find(|&&i| state.history.get(&state.work[i].identity()) == Some(&order));
        if let Some(&holder) = holder {
            return Err(Halt::Ambiguous(Collision {
                tuple: state.work[idx].clone(),
                order,
                holder: state.work[holder].clone(),
            }));
        }

        state.live.push(idx);
        state.history.insert(state.work[idx].identity(), order);

        let tuple = &mut state.work[idx];
        if tuple.order_id != Some(order) {
            state
                .corrections
                .push(Correction::for_tuple(CorrectionKind::Insert, tuple, order));
            tuple.order_id = Some(order);
        }
        Ok(())
    }

    fn update(&self, state: &mut ReplayState, idx: usize) -> Result<(), Halt> {
        let pos = state.last_live_position(idx).ok_or_else(|| {
            Halt::Corrupt(Corruption {
                reason: CorruptionReason::MissingLine,
                tuple: state.work[idx].clone(),
            })
        })?;

        // Offset carried over from the legacy writer; kept as is.
        let order = pos as i64 - 1;
        let tuple = &state.work[idx];
        state.history.insert(tuple.identity(), order);

        if tuple.order_id.is_none() {
            state
                .corrections
                .push(Correction::for_tuple(CorrectionKind::Update, tuple, order));
        }
        Ok(())
    }

    fn delete(&self, state: &mut ReplayState, idx: usize) -> Result<(), Halt> {
        let pos = state.live_position(idx).ok_or_else(|| {
            Halt::Corrupt(Corruption {
                reason: CorruptionReason::MissingLine,
                tuple: state.work[idx].clone(),
            })
        })?;
        state.live.remove(pos);

        let tuple = &state.work[idx];
        if let Some(recorded) = state.history.remove(&tuple.identity()) {
            if tuple.order_id != Some(recorded) {
                state
                    .corrections
                    .push(Correction::for_tuple(CorrectionKind::Delete, tuple, recorded));
            }
        }

        if self.policy == DeletePolicy::Rescan {
            renumber_live(state);
        }
        Ok(())
    }
}

fn renumber_live(state: &mut ReplayState) {
    for (pos, &i) in state.live.iter().enumerate() {
        let order = pos as i64;
        let tuple = &mut state.work[i];
        if tuple.order_id != Some(order) {
            state
                .corrections
                .push(Correction::for_tuple(CorrectionKind::Renumber, tuple, order));
            tuple.order_id = Some(order);
        }
        state.history.insert(tuple.identity(), order);
    }
}

fn log_corruption(corruption: &Corruption) {
    let tuple = &corruption.tuple;
    Logger::warn(
        Category::DataCorruption,
        &[
            ("entity_id", &tuple.entity_id.to_string()),
            ("rev", &tuple.rev.to_string()),
            ("revtype", tuple.rev_type.as_str()),
            ("line", tuple.content.as_deref().unwrap_or("")),
            ("row_number", &tuple.row_number.to_string()),
            ("reason", corruption.reason.as_str()),
        ],
    );
}

fn log_collision(collision: &Collision) {
    let tuple = &collision.tuple;
    Logger::warn(
        Category::AmbiguousOrder,
        &[
            ("entity_id", &tuple.entity_id.to_string()),
            ("rev", &tuple.rev.to_string()),
            ("line", tuple.content.as_deref().unwrap_or("")),
            ("row_number", &tuple.row_number.to_string()),
            ("order", &collision.order.to_string()),
            ("held_by", collision.holder.content.as_deref().unwrap_or("")),
        ],
    );
}
