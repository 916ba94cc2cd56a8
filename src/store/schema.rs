//! Audit table name and the SQL issued against it

use regex::Regex;

use super::errors::{StoreError, StoreResult};

/// Default audit table
pub const DEFAULT_AUDIT_TABLE: &str = "addresslines_aud";

const IDENTIFIER: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$";

/// Validated (optionally schema-qualified) audit table name.
///
/// The name is interpolated into SQL, so it is checked once here and never
/// accepted from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTable {
    name: String,
}

impl Default for AuditTable {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUDIT_TABLE.to_string(),
        }
    }
}

impl AuditTable {
    /// Validate a table name
    pub fn new(name: &str) -> StoreResult<Self> {
        let pattern = Regex::new(IDENTIFIER).map_err(|e| StoreError::query_failed(e.to_string()))?;
        if !pattern.is_match(name) {
            return Err(StoreError::invalid_table(name));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create statement, including the uniqueness rule
    pub(crate) fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                rev INTEGER NOT NULL,
                addresslines_id INTEGER NOT NULL,
                addresslines TEXT,
                revtype INTEGER NOT NULL,
                order_id INTEGER,
                UNIQUE (addresslines_id, rev, revtype, order_id)
            )",
            self.name
        )
    }

    /// Insert of one raw row
    pub(crate) fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (rev, addresslines_id, addresslines, revtype, order_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            self.name
        )
    }

    /// Entities with more than one row sharing a rev, paged by id
    pub(crate) fn candidate_sql(&self) -> String {
        format!(
            "SELECT DISTINCT addresslines_id FROM {}
             WHERE ?1 IS NULL OR addresslines_id > ?1
             GROUP BY addresslines_id, rev HAVING count(rev) > 1
             ORDER BY addresslines_id
             LIMIT ?2",
            self.name
        )
    }

    /// Load one entity's rows in replay order
    pub(crate) fn load_sql(&self) -> String {
        format!(
            "SELECT rev, addresslines, revtype, order_id,
                    row_number() OVER (ORDER BY rev, revtype DESC, order_id)
             FROM {}
             WHERE addresslines_id = ?1
             ORDER BY rev, revtype DESC, order_id",
            self.name
        )
    }

    /// Set order_id on exactly one row
    pub(crate) fn update_sql(&self) -> String {
        format!(
            "UPDATE {} SET order_id = ?1
             WHERE rev = ?2 AND addresslines_id = ?3 AND addresslines IS ?4 AND revtype = ?5",
            self.name
        )
    }
}
