//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::ReportKind;
use crate::extract::Record;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, report_kind, started_at, finished_at, config_hash, status, records_emitted";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let kind: String = row.get(1)?;
    let status: String = row.get(5)?;
    let records: i64 = row.get(6)?;

    Ok(RunRecord {
        id: row.get(0)?,
        report_kind: ReportKind::from_name(&kind).unwrap_or(ReportKind::Account),
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Failed),
        records_emitted: records.max(0) as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, kind: ReportKind, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (report_kind, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                kind.as_str(),
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self, kind: ReportKind) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM runs WHERE report_kind = ?1 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![kind.as_str()],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, records: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, records_emitted = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, records as i64, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Records =====

    fn insert_record(
        &mut self,
        run_id: i64,
        kind: ReportKind,
        record: &Record,
    ) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO records (run_id, report_kind, created_at) VALUES (?1, ?2, ?3)",
            params![run_id, kind.as_str(), Utc::now().to_rfc3339()],
        )?;
        let record_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO record_fields (record_id, position, name, value) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, (name, value)) in record.iter().enumerate() {
                stmt.execute(params![record_id, position as i64, name, value])?;
            }
        }

        tx.commit()?;
        Ok(record_id)
    }

    fn get_record(&self, record_id: i64) -> StorageResult<Record> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM records WHERE id = ?1",
                params![record_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::RecordNotFound(record_id));
        }

        let mut stmt = self.conn.prepare(
            "SELECT name, value FROM record_fields WHERE record_id = ?1 ORDER BY position",
        )?;
        let fields = stmt.query_map(params![record_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut record = Record::new();
        for field in fields {
            let (name, value) = field?;
            record.set(name, value);
        }
        Ok(record)
    }

    // ===== Statistics =====

    fn count_records(&self, kind: ReportKind) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE report_kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_runs(&self, kind: ReportKind) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM runs WHERE report_kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_distinct_fields(&self, kind: ReportKind) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT f.name)
             FROM record_fields f JOIN records r ON r.id = f.record_id
             WHERE r.report_kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        let mut record = Record::new();
        record.set("Account_Holder_Name", "Stadtwerke Linz");
        record.set("EU_Compliance_2021_Compliance_Code", "A");
        record.set("Account_Status", "");
        record
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run(ReportKind::Account, "abc123").unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.report_kind, ReportKind::Account);
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.config_hash, "abc123");
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn test_finish_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run(ReportKind::Transaction, "abc").unwrap();

        storage.finish_run(run_id, RunStatus::Skipped, 0).unwrap();

        let run = storage.get_latest_run(ReportKind::Transaction).unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Skipped);
        assert!(run.finished_at.is_some());
        assert!(storage.get_latest_run(ReportKind::Account).unwrap().is_none());
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.finish_run(42, RunStatus::Completed, 0),
            Err(StorageError::RunNotFound(42))
        ));
    }

    #[test]
    fn test_record_round_trip_keeps_field_order() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run(ReportKind::Account, "abc").unwrap();

        let record_id = storage
            .insert_record(run_id, ReportKind::Account, &sample_record())
            .unwrap();

        assert_eq!(storage.get_record(record_id).unwrap(), sample_record());
        assert!(matches!(
            storage.get_record(record_id + 1),
            Err(StorageError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_counts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run(ReportKind::Account, "abc").unwrap();

        storage
            .insert_record(run_id, ReportKind::Account, &sample_record())
            .unwrap();
        let mut other = sample_record();
        other.set("CH_Compliance_2021_Compliance_Code", "B");
        storage
            .insert_record(run_id, ReportKind::Account, &other)
            .unwrap();

        assert_eq!(storage.count_records(ReportKind::Account).unwrap(), 2);
        assert_eq!(storage.count_records(ReportKind::Transaction).unwrap(), 0);
        assert_eq!(storage.count_runs(ReportKind::Account).unwrap(), 1);
        assert_eq!(storage.count_distinct_fields(ReportKind::Account).unwrap(), 4);
    }
}
