//! Configuration file
//!
//! ```json
//! {
//!   "database_path": "/var/lib/grid/audit.db",
//!   "audit_table": "addresslines_aud",
//!   "fetch_size": 50,
//!   "delete_policy": "history",
//!   "dry_run": false
//! }
//! ```
//!
//! Only `database_path` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::driver::{ReorderDriver, DEFAULT_FETCH_SIZE};
use crate::replay::{DeletePolicy, ReplayEngine};
use crate::store::{AuditTable, SqliteAuditStore};

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQLite database holding the audit table (required)
    pub database_path: PathBuf,

    /// Audit table, optionally schema-qualified
    #[serde(default = "default_audit_table")]
    pub audit_table: String,

    /// Candidate ids fetched per page
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    /// What a DELETE revision does to the remaining lines
    #[serde(default)]
    pub delete_policy: DeletePolicy,

    /// Roll back instead of committing
    #[serde(default)]
    pub dry_run: bool,
}

fn default_audit_table() -> String {
    crate::store::DEFAULT_AUDIT_TABLE.to_string()
}

fn default_fetch_size() -> usize {
    DEFAULT_FETCH_SIZE
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(CliError::config_error("database_path must not be empty"));
        }

        if self.fetch_size == 0 {
            return Err(CliError::config_error("fetch_size must be > 0"));
        }

        self.table()?;

        Ok(())
    }

    /// Validated audit table
    pub fn table(&self) -> CliResult<AuditTable> {
        AuditTable::new(&self.audit_table)
            .map_err(|e| CliError::config_error(e.message().to_string()))
    }

    /// Driver configured from this file
    pub fn driver(&self) -> ReorderDriver {
        ReorderDriver::new(ReplayEngine::new(self.delete_policy), self.fetch_size)
    }

    /// Open the configured database
    pub fn open_store(&self) -> CliResult<SqliteAuditStore> {
        Ok(SqliteAuditStore::open(&self.database_path, self.table()?)?)
    }
}
