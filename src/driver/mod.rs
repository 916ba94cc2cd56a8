//! Entity driver
//!
//! Walks candidate entities in id order, replays each one (retrying once
//! on an ambiguous pass) and forwards the accepted corrections to the
//! correction sink.
//!
//! # Failure isolation
//!
//! - A corrupted or ambiguous entity never stops the run
//! - A failed correction write never stops the run
//! - Selector/loader failures and unknown revtypes are fatal

mod driver;
mod outcome;
mod traits;

pub use driver::{ReorderDriver, DEFAULT_FETCH_SIZE};
pub use outcome::{EntityOutcome, EntityReport, RunStats};
pub use traits::{CandidateSelect, CorrectionSink, RevisionLoad};
