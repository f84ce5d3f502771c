//! Persistence backends.
//!
//! The store talks to a single [`RecordRepository`]; the flat-file and SQLite
//! backends differ only in when writes happen. The file backend keeps
//! nothing on disk until [`RecordRepository::save_all`], while the database
//! backend writes every insert, update and delete immediately and treats
//! `save_all` as a no-op.

mod csv_file;
mod sqlite;

pub use csv_file::CsvRepository;
pub use sqlite::SqliteRepository;

use crate::error::{MalformedRow, Result};
use crate::models::{EquipmentRecord, RecordId, StoredRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which backend a repository writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    Database,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => f.write_str("file"),
            BackendKind::Database => f.write_str("database"),
        }
    }
}

/// Everything a repository could read, good rows and bad.
#[derive(Debug, Default)]
pub struct LoadedRows {
    pub rows: Vec<StoredRecord>,
    pub malformed: Vec<MalformedRow>,
}

/// What a save actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// This many records were written.
    Written(usize),
    /// The backend persists incrementally; nothing left to write.
    AlreadyPersisted,
}

/// Storage capability behind an [`EquipmentStore`](crate::EquipmentStore).
pub trait RecordRepository {
    fn kind(&self) -> BackendKind;

    /// Read every stored row.
    fn load(&mut self) -> Result<LoadedRows>;

    /// Persist a new record and return the id it is stored under.
    ///
    /// `record.id` is the store's proposal; backends with their own identity
    /// column may return a different one.
    fn insert(&mut self, record: &EquipmentRecord) -> Result<RecordId>;

    fn update(&mut self, record: &EquipmentRecord) -> Result<()>;

    fn delete(&mut self, id: RecordId) -> Result<()>;

    /// Write the given records as the complete stored set.
    fn save_all(&mut self, records: &[&EquipmentRecord]) -> Result<SaveOutcome>;
}

/// Open the repository for `kind`, using the matching path.
pub fn open(
    kind: BackendKind,
    csv_path: &Path,
    database_path: &Path,
) -> Result<Box<dyn RecordRepository>> {
    tracing::info!("Opening {} backend", kind);
    Ok(match kind {
        BackendKind::File => Box::new(CsvRepository::new(csv_path)),
        BackendKind::Database => Box::new(SqliteRepository::open(database_path)?),
    })
}

/// Date format used when writing.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Display format of older exports, still accepted when reading.
const LEGACY_DATE_FORMAT: &str = "%d/%m/%Y";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(text, LEGACY_DATE_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_and_legacy_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date("2024-03-09"), Some(expected));
        assert_eq!(parse_date(" 09/03/2024 "), Some(expected));
        assert_eq!(parse_date("03/31/2024"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn formats_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_date(date), "2024-03-09");
    }

    #[test]
    fn backend_kind_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            backend: BackendKind,
        }
        let w: Wrapper = toml::from_str("backend = \"database\"").unwrap();
        assert_eq!(w.backend, BackendKind::Database);
    }
}
