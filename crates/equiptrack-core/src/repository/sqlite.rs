//! SQLite backend. Every change is written as it happens.

use super::{format_date, parse_date, BackendKind, LoadedRows, RecordRepository, SaveOutcome};
use crate::error::{MalformedRow, Result, StoreError};
use crate::models::{EquipmentRecord, RecordId, StoredRecord};
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS EquipmentInventory (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Material TEXT NOT NULL,
    Quantity INTEGER NOT NULL,
    FirstDate TEXT NOT NULL,
    LastIssueDate TEXT NOT NULL,
    Status TEXT NOT NULL
);
"#;

/// Row-level persistence in an `EquipmentInventory` table.
pub struct SqliteRepository {
    conn: Connection,
}

fn db_err(context: &str, e: rusqlite::Error) -> StoreError {
    StoreError::persistence(context, e)
}

impl SqliteRepository {
    /// Open (or create) the database file and make sure the table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| db_err(&format!("Failed to open database {}", path.display()), e))?;
        tracing::debug!("Opened database {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("Failed to open database", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| db_err("Failed to create schema", e))?;
        Ok(Self { conn })
    }
}

type RawRow = (i64, String, String, i64, String, String);

fn convert_row(row: usize, raw: RawRow) -> std::result::Result<StoredRecord, MalformedRow> {
    let (id, name, material, quantity, first, last) = raw;
    let malformed = |reason: String| MalformedRow { row, reason };

    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|&q| q > 0)
        .ok_or_else(|| malformed(format!("invalid quantity {quantity}")))?;
    let first_issue_date =
        parse_date(&first).ok_or_else(|| malformed(format!("invalid first date '{first}'")))?;
    let last_issue_date =
        parse_date(&last).ok_or_else(|| malformed(format!("invalid last date '{last}'")))?;

    Ok(StoredRecord {
        id: Some(RecordId(id)),
        name,
        material,
        quantity,
        first_issue_date,
        last_issue_date,
    })
}

impl RecordRepository for SqliteRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    fn load(&mut self) -> Result<LoadedRows> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT Id, Name, Material, Quantity, FirstDate, LastIssueDate
                 FROM EquipmentInventory ORDER BY Id",
            )
            .map_err(|e| db_err("Failed to query records", e))?;

        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .map_err(|e| db_err("Failed to query records", e))?
            .collect::<rusqlite::Result<Vec<RawRow>>>()
            .map_err(|e| db_err("Failed to read records", e))?;

        let mut loaded = LoadedRows::default();
        for (index, raw) in raw_rows.into_iter().enumerate() {
            match convert_row(index + 1, raw) {
                Ok(record) => loaded.rows.push(record),
                Err(bad) => loaded.malformed.push(bad),
            }
        }
        Ok(loaded)
    }

    fn insert(&mut self, record: &EquipmentRecord) -> Result<RecordId> {
        self.conn
            .execute(
                "INSERT INTO EquipmentInventory (Name, Material, Quantity, FirstDate, LastIssueDate, Status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.name,
                    record.material,
                    record.quantity,
                    format_date(record.first_issue_date),
                    format_date(record.last_issue_date),
                    record.status.label(),
                ],
            )
            .map_err(|e| db_err("Failed to insert record", e))?;
        Ok(RecordId(self.conn.last_insert_rowid()))
    }

    fn update(&mut self, record: &EquipmentRecord) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE EquipmentInventory
                 SET Name = ?1, Material = ?2, Quantity = ?3, FirstDate = ?4, LastIssueDate = ?5, Status = ?6
                 WHERE Id = ?7",
                params![
                    record.name,
                    record.material,
                    record.quantity,
                    format_date(record.first_issue_date),
                    format_date(record.last_issue_date),
                    record.status.label(),
                    record.id.0,
                ],
            )
            .map_err(|e| db_err("Failed to update record", e))?;
        if changed == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }

    fn delete(&mut self, id: RecordId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM EquipmentInventory WHERE Id = ?1", params![id.0])
            .map_err(|e| db_err("Failed to delete record", e))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn save_all(&mut self, _records: &[&EquipmentRecord]) -> Result<SaveOutcome> {
        Ok(SaveOutcome::AlreadyPersisted)
    }
}
