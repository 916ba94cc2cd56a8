//! CLI command implementations
//!
//! `run` is the only command that writes. It opens one transaction, drives
//! every candidate entity through replay, and commits once at the end (or
//! rolls back for a dry run). Any fatal error drops the transaction, so
//! nothing is persisted.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::driver::{CandidateSelect, RunStats};
use crate::observability::{Category, Logger};
use crate::store::{AuditTable, SqliteAuditStore, StoreResult};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// What `run` prints when it finishes
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: String,
    pub finished_at: String,
    pub dry_run: bool,
    pub committed: bool,
    pub stats: RunStats,
}

/// Main CLI entry point; the only function main.rs calls.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Execute a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Run { config, dry_run } => {
            let mut config = Config::load(&config)?;
            config.dry_run |= dry_run;
            let summary = run_reorder(&config)?;
            write_response(&summary)
        }
        Command::Candidates { config } => candidates(&config),
        Command::Inspect { config, entity } => inspect(&config, entity),
        Command::Init { config } => init(&config),
    }
}

/// Reconcile every candidate entity inside one transaction.
pub fn run_reorder(config: &Config) -> CliResult<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now().to_rfc3339();
    let run_id_str = run_id.to_string();

    Logger::info(
        Category::ConfigLoaded,
        &[
            ("database_path", &config.database_path.display().to_string()),
            ("audit_table", &config.audit_table),
            ("fetch_size", &config.fetch_size.to_string()),
            ("delete_policy", config.delete_policy.as_str()),
        ],
    );
    Logger::info(
        Category::RunBegin,
        &[
            ("run_id", &run_id_str),
            ("started_at", &started_at),
            ("dry_run", &config.dry_run.to_string()),
        ],
    );

    let stats = match execute(config, &run_id_str) {
        Ok(stats) => stats,
        Err(e) => {
            Logger::fatal(
                Category::RunFailed,
                &[
                    ("run_id", &run_id_str),
                    ("code", e.code().code()),
                    ("reason", e.message()),
                ],
            );
            return Err(CliError::from(e));
        }
    };

    let finished_at = Utc::now().to_rfc3339();
    Logger::info(
        Category::RunComplete,
        &[
            ("run_id", &run_id_str),
            ("finished_at", &finished_at),
            ("entities", &stats.entities.to_string()),
            ("corrections_applied", &stats.corrections_applied.to_string()),
            ("corrections_failed", &stats.corrections_failed.to_string()),
            ("manual_fix_required", &stats.manual_fix_required.to_string()),
            ("corrupted", &stats.corrupted.to_string()),
        ],
    );

    Ok(RunSummary {
        run_id,
        started_at,
        finished_at,
        dry_run: config.dry_run,
        committed: !config.dry_run,
        stats,
    })
}

fn execute(config: &Config, run_id: &str) -> StoreResult<RunStats> {
    let table = AuditTable::new(&config.audit_table)?;
    let mut store = SqliteAuditStore::open(&config.database_path, table)?;

    let mut tx = store.begin()?;
    let stats = config.driver().run(&mut tx)?;

    if config.dry_run {
        tx.rollback()?;
        Logger::info(Category::RunRolledBack, &[("run_id", run_id)]);
    } else {
        tx.commit()?;
        Logger::info(Category::RunCommitted, &[("run_id", run_id)]);
    }

    Ok(stats)
}

/// Print every candidate entity id
pub fn candidates(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let mut store = config.open_store()?;

    let mut ids = Vec::new();
    loop {
        let batch = store.candidate_batch(ids.last().copied(), config.fetch_size)?;
        if batch.is_empty() {
            break;
        }
        ids.extend(batch);
    }

    write_response(&json!({ "count": ids.len(), "candidates": ids }))
}

/// Replay one entity (with retry) and print the outcome; writes nothing
pub fn inspect(config_path: &Path, entity_id: i64) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let mut store = config.open_store()?;

    let report = config.driver().plan_entity(&mut store, entity_id)?;
    write_response(&report)
}

/// Create the audit table if it is missing
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let store = config.open_store()?;
    store.init_schema()?;

    write_response(&json!({ "table": store.table().name(), "initialized": true }))
}
