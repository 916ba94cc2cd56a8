//! rusqlite-backed store

use std::path::Path;

use rusqlite::{ffi, params, Connection, ErrorCode, Transaction, TransactionBehavior};

use crate::driver::{CandidateSelect, CorrectionSink, RevisionLoad};
use crate::replay::Correction;
use crate::revision::RevisionTuple;

use super::errors::{StoreError, StoreResult};
use super::schema::AuditTable;

/// Savepoint wrapped around every corrective write
const CORRECTION_SAVEPOINT: &str = "audit_correction";

/// Connection to a database holding the audit table
pub struct SqliteAuditStore {
    conn: Connection,
    table: AuditTable,
}

impl SqliteAuditStore {
    /// Open a database file
    pub fn open(path: impl AsRef<Path>, table: AuditTable) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn, table })
    }

    /// Open a private in-memory database
    pub fn open_in_memory(table: AuditTable) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, table })
    }

    /// Get the audit table
    pub fn table(&self) -> &AuditTable {
        &self.table
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the audit table if it does not exist
    pub fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(&self.table.create_sql())?;
        Ok(())
    }

    /// Insert one raw audit row (fixtures and imports)
    pub fn insert_row(
        &self,
        rev: i64,
        entity_id: i64,
        content: Option<&str>,
        rev_type: i64,
        order_id: Option<i64>,
    ) -> StoreResult<()> {
        self.conn.execute(
            &self.table.insert_sql(),
            params![rev, entity_id, content, rev_type, order_id],
        )?;
        Ok(())
    }

    /// Open the run transaction. Nothing is persisted until `commit`.
    pub fn begin(&mut self) -> StoreResult<AuditTransaction<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(AuditTransaction {
            tx,
            table: self.table.clone(),
        })
    }
}

impl CandidateSelect for SqliteAuditStore {
    fn candidate_batch(&mut self, after: Option<i64>, limit: usize) -> StoreResult<Vec<i64>> {
        select_candidates(&self.conn, &self.table, after, limit)
    }
}

impl RevisionLoad for SqliteAuditStore {
    fn load_revisions(&mut self, entity_id: i64) -> StoreResult<Vec<RevisionTuple>> {
        load_tuples(&self.conn, &self.table, entity_id)
    }
}

/// The single transaction a run writes through
pub struct AuditTransaction<'conn> {
    tx: Transaction<'conn>,
    table: AuditTable,
}

impl AuditTransaction<'_> {
    /// Commit every applied correction
    pub fn commit(self) -> StoreResult<()> {
        self.tx
            .commit()
            .map_err(|e| StoreError::commit_failed(e.to_string()))
    }

    /// Discard every applied correction
    pub fn rollback(self) -> StoreResult<()> {
        self.tx
            .rollback()
            .map_err(|e| StoreError::commit_failed(e.to_string()))
    }
}

impl CandidateSelect for AuditTransaction<'_> {
    fn candidate_batch(&mut self, after: Option<i64>, limit: usize) -> StoreResult<Vec<i64>> {
        select_candidates(&self.tx, &self.table, after, limit)
    }
}

impl RevisionLoad for AuditTransaction<'_> {
    fn load_revisions(&mut self, entity_id: i64) -> StoreResult<Vec<RevisionTuple>> {
        load_tuples(&self.tx, &self.table, entity_id)
    }
}

impl CorrectionSink for AuditTransaction<'_> {
    fn apply(&mut self, correction: &Correction) -> StoreResult<usize> {
        let sql = self.table.update_sql();
        let mut savepoint = self
            .tx
            .savepoint_with_name(CORRECTION_SAVEPOINT)
            .map_err(|e| StoreError::savepoint_failed(e.to_string()))?;

        let result = savepoint.execute(
            &sql,
            params![
                correction.order,
                correction.row.rev,
                correction.row.entity_id,
                correction.row.content,
                correction.row.rev_type.code()
            ],
        );

        let failure = match result {
            Ok(1) => {
                savepoint
                    .commit()
                    .map_err(|e| StoreError::savepoint_failed(e.to_string()))?;
                return Ok(1);
            }
            Ok(updated) => StoreError::row_count_mismatch(updated),
            Err(rusqlite::Error::SqliteFailure(err, message))
                if err.code == ErrorCode::ConstraintViolation
                    && (err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                        || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
            {
                StoreError::unique_violation(message.unwrap_or_else(|| err.to_string()))
            }
            Err(e) => StoreError::write_failed(e.to_string()),
        };

        // ROLLBACK TO keeps the savepoint open; commit releases it
        savepoint
            .rollback()
            .map_err(|e| StoreError::savepoint_failed(e.to_string()))?;
        savepoint
            .commit()
            .map_err(|e| StoreError::savepoint_failed(e.to_string()))?;
        Err(failure)
    }
}

fn select_candidates(
    conn: &Connection,
    table: &AuditTable,
    after: Option<i64>,
    limit: usize,
) -> StoreResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached(&table.candidate_sql())?;
    let ids = stmt
        .query_map(params![after, limit as i64], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn load_tuples(conn: &Connection, table: &AuditTable, entity_id: i64) -> StoreResult<Vec<RevisionTuple>> {
    let mut stmt = conn.prepare_cached(&table.load_sql())?;
    let rows = stmt
        .query_map(params![entity_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tuples = Vec::with_capacity(rows.len());
    for (rev, content, rev_type, order_id, row_number) in rows {
        tuples.push(RevisionTuple::from_stored(
            rev, entity_id, content, rev_type, order_id, row_number,
        )?);
    }
    Ok(tuples)
}
