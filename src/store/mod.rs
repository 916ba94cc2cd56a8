//! SQLite audit store
//!
//! Implements the driver's collaborators over an address-line audit table:
//!
//! - candidate selection: entities with more than one row sharing a rev
//! - revision loading in replay order, with a diagnostic row number
//! - corrective writes, one savepoint each, inside a single run transaction
//!
//! # Transaction shape
//!
//! ```text
//! BEGIN IMMEDIATE
//!   SAVEPOINT  UPDATE ... (exactly one row)  RELEASE | ROLLBACK TO
//!   ...
//! COMMIT (once, at the end of the run)
//! ```
//!
//! A rejected write is rolled back to its savepoint alone; every other
//! write in the transaction survives.

mod errors;
mod schema;
mod sqlite;

pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use schema::{AuditTable, DEFAULT_AUDIT_TABLE};
pub use sqlite::{AuditTransaction, SqliteAuditStore};
