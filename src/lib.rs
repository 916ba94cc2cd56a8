//! audit-reorder - repairs `order_id` in an address-line audit table
//!
//! Each candidate entity's audit trail is replayed revision by revision to
//! rebuild the ordered list of lines it had at every point in time. Rows
//! whose stored order disagrees with the replay get one targeted
//! correction; anything replay cannot resolve is logged for a human.
//!
//! Layers, leaves first: `revision` (data model), `replay` (engine and
//! retry heuristic), `driver` (per-entity orchestration), `store` (SQLite
//! collaborators), `observability`, `cli`.

pub mod cli;
pub mod driver;
pub mod observability;
pub mod replay;
pub mod revision;
pub mod store;
