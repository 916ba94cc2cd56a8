//! Observability for reorder runs
//!
//! Every corrective action and every anomaly is one JSON line tagged with a
//! `Category`. Operators scan this stream after a run to find entities that
//! need repair by hand, so the category names are part of the tool's
//! contract.
//!
//! # Principles
//!
//! 1. Logging never changes reconciliation results
//! 2. Synchronous, one line per record
//! 3. Deterministic key ordering

mod category;
mod logger;

pub use category::Category;
pub use logger::{Logger, Severity};

/// Log a category at its default severity
pub fn log_category(category: Category, fields: &[(&str, &str)]) {
    Logger::log(category.default_severity(), category, fields);
}
