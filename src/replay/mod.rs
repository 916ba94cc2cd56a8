//! Revision replay
//!
//! Rebuilds, revision by revision, the ordered list of lines an entity had
//! and derives the order value every audit row should carry.
//!
//! # Replay state
//!
//! Each replay pass owns two containers:
//!
//! - the live order list: lines believed to exist after the revision being
//!   processed, in position order
//! - the history map: last order assigned to each logical line, consulted
//!   when the line is deleted
//!
//! Neither outlives the pass.
//!
//! # Input order
//!
//! Tuples must arrive sorted by rev ascending, revtype descending, stored
//! order ascending. The engine never re-sorts.
//!
//! # Outcomes
//!
//! - Complete: every tuple replayed
//! - Abandoned: an UPDATE/DELETE referenced a line that is not live;
//!   partial corrections are kept and the entity is not retried
//! - Ambiguous: an INSERT position collided with recorded history; the only
//!   outcome the retry heuristic handles

mod correction;
mod engine;
mod retry;

pub use correction::{Correction, CorrectionKind, CorrectionSet};
pub use engine::{
    Collision, Corruption, CorruptionReason, DeletePolicy, ReplayEngine, ReplayOutcome,
    ReplayStatus,
};
pub use retry::{swap_first_insert_pair, RetryOutcome};
