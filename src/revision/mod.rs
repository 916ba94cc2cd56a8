//! Revision data model
//!
//! One `RevisionTuple` is one row of the address-line audit trail.
//!
//! # Identity
//!
//! Two tuples describe the same logical line iff their entity id and
//! content match. Revision number, revision type and stored order do not
//! take part in identity. The replay state keys on `LineIdentity`, never on
//! the revision number.

mod errors;
mod tuple;

pub use errors::{RevisionError, RevisionResult};
pub use tuple::{LineIdentity, RevType, RevisionTuple, RowKey};
