use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::{error::Result, storage::models::RunRecord};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS report_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                generated_at TEXT NOT NULL,
                report_window TEXT NOT NULL,
                source TEXT NOT NULL,
                records_read INTEGER NOT NULL,
                case_count INTEGER NOT NULL,
                ntp_total REAL NOT NULL,
                structure_total REAL NOT NULL,
                final_total REAL NOT NULL,
                grand_total REAL NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_generated_at ON report_runs(generated_at)",
            [],
        )?;

        Ok(())
    }

    /// Append a run, returning its id
    pub fn save_run(&self, run: &RunRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO report_runs
             (generated_at, report_window, source, records_read, case_count,
              ntp_total, structure_total, final_total, grand_total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.generated_at.to_rfc3339(),
                run.window,
                run.source,
                run.records_read as i64,
                run.case_count as i64,
                run.ntp_total,
                run.structure_total,
                run.final_total,
                run.grand_total,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Saved report run {}", id);
        Ok(id)
    }

    /// Most recent runs first
    pub fn get_run_history(&self, limit: Option<usize>) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, generated_at, report_window, source, records_read, case_count,
                    ntp_total, structure_total, final_total, grand_total
             FROM report_runs
             ORDER BY generated_at DESC, id DESC
             LIMIT ?1",
        )?;

        // SQLite treats a negative limit as unbounded
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let runs = stmt
            .query_map([limit], Self::row_to_run)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    pub fn run_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM report_runs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        let generated_at: String = row.get(1)?;
        let generated_at: DateTime<Utc> = generated_at.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(RunRecord {
            id: row.get(0)?,
            generated_at,
            window: row.get(2)?,
            source: row.get(3)?,
            records_read: row.get::<_, i64>(4)? as usize,
            case_count: row.get::<_, i64>(5)? as usize,
            ntp_total: row.get(6)?,
            structure_total: row.get(7)?,
            final_total: row.get(8)?,
            grand_total: row.get(9)?,
        })
    }
}
